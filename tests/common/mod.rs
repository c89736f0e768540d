//! Shared fixtures for pipeline tests

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;

use feed_mirror::{ArchiveSource, Config, FeedFilter, FetchConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use zip::write::SimpleFileOptions;

/// Build a deflated ZIP archive from (name, content) pairs; names ending in `/` become directories
pub fn feed_archive(files: &[(&str, String)]) -> Vec<u8> {
    build_archive(files, zip::CompressionMethod::Deflated)
}

/// Like [`feed_archive`], but entry contents are stored verbatim so tests can
/// patch them in place
pub fn stored_feed_archive(files: &[(&str, String)]) -> Vec<u8> {
    build_archive(files, zip::CompressionMethod::Stored)
}

fn build_archive(files: &[(&str, String)], method: zip::CompressionMethod) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(method);

    for (name, content) in files {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }

    // GitHub branch archives carry the commit id as archive comment
    writer.set_comment("5c0a8e3f2b9d41e7a6c8f0d2b4e6a8c0e2f4a6b8");
    writer.finish().unwrap().into_inner()
}

/// Overwrite the first occurrence of `from` in `data` with `to` (same length)
pub fn patch_bytes(data: &mut [u8], from: &[u8], to: &[u8]) {
    assert_eq!(from.len(), to.len());
    let at = data
        .windows(from.len())
        .position(|w| w == from)
        .expect("pattern not found in archive");
    data[at..at + to.len()].copy_from_slice(to);
}

/// A feed document with the given version and candidate URLs
pub fn feed_xml(version: &str, urls: &[String]) -> String {
    let mut xml = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<entry>\n  <version>{}</version>\n", version);
    for url in urls {
        xml.push_str(&format!("  <url>{}</url>\n", url));
    }
    xml.push_str("</entry>\n");
    xml
}

pub fn config(archive_url: String, output_dir: &Path) -> Config {
    Config {
        source: ArchiveSource::Url(archive_url),
        output_dir: output_dir.to_path_buf(),
        fetch: FetchConfig::default(),
        filter: FeedFilter::default(),
        list_only: false,
    }
}

/// Names of the files in `dir`, sorted
pub fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Start a server whose responses announce `declared` bytes but deliver only
/// `body` before closing the connection, so the body stream fails mid-copy.
///
/// Returns the base URL of the server.
pub async fn truncating_server(body: &'static [u8], declared: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            // Consume the whole request head so closing doesn't reset the connection
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }

            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                declared
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(body).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}", addr)
}
