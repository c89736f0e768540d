//! In-memory ZIP archive reading.
//!
//! The feed repository arrives as a single ZIP download which is kept in
//! memory and read with random access.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from the raw buffer
//! - [`archive`]: Entry listing and decompressing readers
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions
//! - Archive comments (GitHub branch archives carry one)
//! - STORED and DEFLATE compression methods, with CRC-32 verification
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod archive;
mod parser;
mod structures;

pub use archive::{EntryReader, ZipArchive};
pub use structures::{CompressionMethod, ZipFileEntry};
