use anyhow::{Context, Result};
use std::io::Read;
use std::slice;
use tracing::info;

use crate::feed::FeedDescriptor;
use crate::filter::FeedFilter;
use crate::zip::{ZipArchive, ZipFileEntry};

/// Suffix marking archive entries that hold feed documents
pub const FEED_SUFFIX: &str = ".xml";

/// A feed document found in the archive
#[derive(Debug, Clone)]
pub struct Feed {
    /// Base name of the entry without the `.xml` suffix
    pub name: String,
    pub descriptor: FeedDescriptor,
}

/// Name of the feed stored in `entry`, or `None` if the entry is not a feed
pub fn feed_name(entry: &ZipFileEntry) -> Option<&str> {
    if entry.is_directory || !entry.file_name.ends_with(FEED_SUFFIX) {
        return None;
    }
    let base = entry.base_name();
    Some(base.strip_suffix(FEED_SUFFIX).unwrap_or(base))
}

/// Walks the archive in directory order and yields every selected feed.
///
/// Entries that are not feeds, or that the filter rejects, are skipped
/// without being read. Callers are expected to stop at the first error.
pub struct FeedScanner<'a> {
    archive: &'a ZipArchive,
    filter: &'a FeedFilter,
    entries: slice::Iter<'a, ZipFileEntry>,
}

impl<'a> FeedScanner<'a> {
    pub fn new(archive: &'a ZipArchive, filter: &'a FeedFilter) -> Self {
        Self {
            archive,
            filter,
            entries: archive.entries().iter(),
        }
    }
}

/// Open, read and decode one feed entry; the entry reader is released before parsing
fn load(archive: &ZipArchive, entry: &ZipFileEntry, name: &str) -> Result<Feed> {
    let content = {
        let mut reader = archive
            .open(entry)
            .with_context(|| format!("Can't open {}", entry.file_name))?;
        let mut content = Vec::with_capacity(entry.uncompressed_size.min(1 << 20) as usize);
        reader
            .read_to_end(&mut content)
            .with_context(|| format!("Can't read {}", entry.file_name))?;
        content
    };

    let descriptor = FeedDescriptor::from_xml(&content)
        .with_context(|| format!("Can't parse feed {}", entry.file_name))?;

    Ok(Feed {
        name: name.to_string(),
        descriptor,
    })
}

impl Iterator for FeedScanner<'_> {
    type Item = Result<Feed>;

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.entries.by_ref() {
            let Some(name) = feed_name(entry) else {
                continue;
            };
            if !self.filter.matches(name) {
                continue;
            }

            info!("+ {}", name);
            return Some(load(self.archive, entry, name));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn archive(files: &[(&str, &str)]) -> ZipArchive {
        ZipArchive::new(archive_bytes(files)).unwrap()
    }

    /// Stored entries, so contents can be patched in the raw bytes
    fn archive_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, content) in files {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn yields_only_xml_entries_in_directory_order() {
        // README.md and the .xml.bak are not feeds and would fail to parse
        let archive = archive(&[
            ("feeds-master/", ""),
            ("feeds-master/Rust.xml", "<entry><version>1.80</version></entry>"),
            ("feeds-master/README.md", "<<< not xml"),
            ("feeds-master/Go.xml.bak", "<<< not xml"),
            ("feeds-master/Go.xml", "<entry><url>https://x/Go.tgz</url></entry>"),
        ]);
        let filter = FeedFilter::default();

        let feeds: Vec<Feed> = FeedScanner::new(&archive, &filter)
            .collect::<Result<_>>()
            .unwrap();

        let names: Vec<_> = feeds.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Rust", "Go"]);
        assert_eq!(feeds[0].descriptor.version, "1.80");
        assert_eq!(feeds[1].descriptor.urls, ["https://x/Go.tgz"]);
    }

    #[test]
    fn filtered_entries_are_not_parsed() {
        let archive = archive(&[
            ("Broken.xml", "<entry><url>"),
            ("Go.xml", "<entry/>"),
        ]);
        let filter = FeedFilter::new(vec!["Go".into()], vec![]);

        let feeds: Vec<Feed> = FeedScanner::new(&archive, &filter)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].name, "Go");
    }

    #[test]
    fn malformed_feed_names_the_entry() {
        let archive = archive(&[("feeds-master/Broken.xml", "<entry><url>")]);
        let filter = FeedFilter::default();

        let err = FeedScanner::new(&archive, &filter).next().unwrap().unwrap_err();
        assert!(err.to_string().contains("Can't parse feed feeds-master/Broken.xml"));
    }

    #[test]
    fn unreadable_entry_ends_the_scan() {
        let mut data = archive_bytes(&[
            ("feeds-master/Bad.xml", "<entry><version>1.0</version></entry>"),
            ("feeds-master/Go.xml", "<entry/>"),
        ]);
        let at = data.windows(4).position(|w| w == b"1.0<").unwrap();
        data[at] = b'2';
        let archive = ZipArchive::new(data).unwrap();
        let filter = FeedFilter::default();

        let err = FeedScanner::new(&archive, &filter).next().unwrap().unwrap_err();
        assert!(err.to_string().contains("Can't read feeds-master/Bad.xml"));
        assert!(format!("{:#}", err).contains("CRC-32 mismatch"));

        // Collecting into a Result stops at the first failing entry
        let feeds: Result<Vec<Feed>> = FeedScanner::new(&archive, &filter).collect();
        assert!(feeds.is_err());
    }
}
