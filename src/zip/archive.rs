use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::{self, Read};

use anyhow::{Result, bail};

use super::parser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// A ZIP archive held entirely in memory.
///
/// The central directory is parsed once on construction; entry contents are
/// decoded lazily through [`ZipArchive::open`].
pub struct ZipArchive {
    data: Vec<u8>,
    entries: Vec<ZipFileEntry>,
}

impl ZipArchive {
    /// Parse the archive's central directory.
    ///
    /// Fails when the buffer is not a ZIP archive or its directory is damaged.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        let entries = parser::read_central_directory(&data)?;
        Ok(Self { data, entries })
    }

    /// All entries, in central directory order
    pub fn entries(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    /// Open an entry for reading.
    ///
    /// Validates the local file header and the compression method; the
    /// returned reader decompresses on the fly and checks size and CRC-32
    /// once the end of the data is reached.
    pub fn open(&self, entry: &ZipFileEntry) -> Result<EntryReader<'_>> {
        let raw = &self.data[parser::data_range(&self.data, entry)?];

        let decoder = match entry.compression_method {
            CompressionMethod::Stored => Decoder::Stored(raw),
            CompressionMethod::Deflate => Decoder::Deflate(DeflateDecoder::new(raw)),
            CompressionMethod::Unknown(method) => bail!(
                "Unsupported compression method: {} (only STORED and DEFLATE are supported)",
                method
            ),
        };

        Ok(EntryReader {
            decoder,
            crc: Crc::new(),
            read: 0,
            expected_size: entry.uncompressed_size,
            expected_crc: entry.crc32,
        })
    }
}

enum Decoder<'a> {
    Stored(&'a [u8]),
    Deflate(DeflateDecoder<&'a [u8]>),
}

/// Streaming reader over one archive entry's decompressed content
pub struct EntryReader<'a> {
    decoder: Decoder<'a>,
    crc: Crc,
    read: u64,
    expected_size: u64,
    expected_crc: u32,
}

impl EntryReader<'_> {
    fn verify(&self) -> io::Result<()> {
        if self.read != self.expected_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "entry size mismatch: expected {} bytes, got {}",
                    self.expected_size, self.read
                ),
            ));
        }
        if self.crc.sum() != self.expected_crc {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "CRC-32 mismatch: expected {:08x}, got {:08x}",
                    self.expected_crc,
                    self.crc.sum()
                ),
            ));
        }
        Ok(())
    }
}

impl Read for EntryReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = match &mut self.decoder {
            Decoder::Stored(raw) => raw.read(buf)?,
            Decoder::Deflate(inflater) => inflater.read(buf)?,
        };

        if n == 0 && !buf.is_empty() {
            self.verify()?;
            return Ok(0);
        }

        self.read += n as u64;
        if self.read > self.expected_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "entry is larger than its declared size",
            ));
        }
        self.crc.update(&buf[..n]);

        Ok(n)
    }
}
