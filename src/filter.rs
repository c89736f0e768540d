/// Include/exclude rules applied to feed names before they are parsed.
///
/// A feed name is the archive entry's base name without the `.xml` suffix
/// (`feeds-master/NodeJS.xml` is `NodeJS`).
#[derive(Debug, Clone, Default)]
pub struct FeedFilter {
    /// Feeds to keep, by exact name or glob pattern (empty keeps all)
    pub include: Vec<String>,
    /// Feeds to drop, by exact name or glob pattern
    pub exclude: Vec<String>,
}

impl FeedFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    pub fn matches(&self, name: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|p| pattern_matches(p, name)) {
            return false;
        }

        !self.exclude.iter().any(|p| pattern_matches(p, name))
    }
}

fn pattern_matches(pattern: &str, name: &str) -> bool {
    if has_glob_chars(pattern) {
        glob_match(pattern, name)
    } else {
        pattern == name
    }
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            // Star: skip it (empty match) or consume one character and keep it
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}
