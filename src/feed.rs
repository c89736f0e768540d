//! Feed descriptors.
//!
//! A feed is a small XML document naming the current version of a docset and
//! the mirrors it can be downloaded from:
//!
//! ```xml
//! <entry>
//!     <version>1.22.0</version>
//!     <url>https://sanfrancisco.kapeli.com/feeds/Go.tgz</url>
//!     <url>https://london.kapeli.com/feeds/Go.tgz</url>
//!     <other-versions>...</other-versions>
//! </entry>
//! ```
//!
//! Decoding is lenient: only well-formedness is enforced. The root element's
//! name is not checked, unknown elements are skipped, a repeated `<version>`
//! keeps its last value, and elements nested inside `<version>` or `<url>`
//! are dropped while the surrounding character data is kept.

use anyhow::{Result, bail};
use quick_xml::Reader;
use quick_xml::events::Event;

/// One parsed feed: a version tag and candidate URLs in priority order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedDescriptor {
    /// Informational only, never compared
    pub version: String,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Version,
    Url,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"version" => Some(Field::Version),
            b"url" => Some(Field::Url),
            _ => None,
        }
    }
}

impl FeedDescriptor {
    /// Decode a feed document.
    ///
    /// Only direct children of the root element named `version` and `url`
    /// are read; their text is trimmed. `url` elements are collected in
    /// document order.
    pub fn from_xml(content: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(content);
        let mut buf = Vec::new();
        let mut descriptor = FeedDescriptor::default();

        let mut seen_root = false;
        let mut depth = 0usize;
        // Field being collected, with its character data so far
        let mut field: Option<(Field, String)> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    if depth == 0 {
                        seen_root = true;
                    } else if depth == 1 {
                        field = Field::from_name(e.local_name().as_ref()).map(|f| (f, String::new()));
                    }
                    depth += 1;
                }
                Event::Empty(e) => {
                    if depth == 0 {
                        seen_root = true;
                    } else if depth == 1 {
                        if let Some(f) = Field::from_name(e.local_name().as_ref()) {
                            descriptor.set(f, String::new());
                        }
                    }
                }
                Event::End(_) => {
                    let Some(d) = depth.checked_sub(1) else {
                        bail!("unmatched end tag in feed document");
                    };
                    depth = d;
                    if depth == 1 {
                        if let Some((f, text)) = field.take() {
                            descriptor.set(f, text);
                        }
                    }
                }
                Event::Text(e) if depth == 2 => {
                    if let Some((_, text)) = field.as_mut() {
                        text.push_str(&e.unescape()?);
                    }
                }
                Event::CData(e) if depth == 2 => {
                    if let Some((_, text)) = field.as_mut() {
                        text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !seen_root {
            bail!("feed document has no root element");
        }
        if depth != 0 {
            bail!("unexpected end of feed document");
        }

        Ok(descriptor)
    }

    fn set(&mut self, field: Field, text: String) {
        let text = text.trim().to_string();
        match field {
            Field::Version => self.version = text,
            Field::Url => self.urls.push(text),
        }
    }
}
