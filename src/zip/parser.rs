//! Low-level ZIP archive parser.
//!
//! Works on an archive that is fully held in memory. ZIP files are designed
//! to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the buffer's end
//! 2. If ZIP64, read the ZIP64 EOCD for large archive support
//! 3. Read the Central Directory to get metadata for all entries
//! 4. For reading an entry, resolve its Local File Header to the data range

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::ops::Range;

use anyhow::{Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: usize = 65535;

/// Bounds-checked range of `len` bytes at `offset`.
fn range_at(data: &[u8], offset: u64, len: u64) -> Result<Range<usize>> {
    let start = usize::try_from(offset)?;
    let len = usize::try_from(len)?;
    match start.checked_add(len) {
        Some(end) if end <= data.len() => Ok(start..end),
        _ => bail!("Truncated ZIP archive"),
    }
}

fn slice_at(data: &[u8], offset: u64, len: u64) -> Result<&[u8]> {
    Ok(&data[range_at(data, offset, len)?])
}

/// Find and parse the End of Central Directory record.
///
/// Searches backwards from the end of the buffer, so the common case (no
/// archive comment) is the first position checked. Archives downloaded from
/// GitHub carry the commit id as a comment and need the longer walk.
///
/// # Returns
///
/// A tuple of (EOCD record, offset of EOCD in the buffer).
pub fn find_eocd(data: &[u8]) -> Result<(EndOfCentralDirectory, usize)> {
    if data.len() < EndOfCentralDirectory::SIZE {
        bail!("Not a valid ZIP file");
    }

    let last = data.len() - EndOfCentralDirectory::SIZE;
    let first = last.saturating_sub(MAX_COMMENT_SIZE);

    for i in (first..=last).rev() {
        if &data[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
            continue;
        }

        // A real EOCD's comment length accounts for every remaining byte
        let comment_len = u16::from_le_bytes([data[i + 20], data[i + 21]]) as usize;
        if comment_len == data.len() - i - EndOfCentralDirectory::SIZE {
            let eocd = EndOfCentralDirectory::from_bytes(&data[i..i + EndOfCentralDirectory::SIZE])?;
            return Ok((eocd, i));
        }
    }

    bail!("Not a valid ZIP file")
}

/// Read the ZIP64 End of Central Directory record through its locator,
/// which sits immediately before the regular EOCD.
pub fn read_zip64_eocd(data: &[u8], eocd_offset: usize) -> Result<Zip64EOCD> {
    let Some(locator_offset) = eocd_offset.checked_sub(Zip64EOCDLocator::SIZE) else {
        bail!("Invalid ZIP64 locator");
    };
    let locator = Zip64EOCDLocator::from_bytes(slice_at(
        data,
        locator_offset as u64,
        Zip64EOCDLocator::SIZE as u64,
    )?)?;

    Zip64EOCD::from_bytes(slice_at(
        data,
        locator.eocd64_offset,
        Zip64EOCD::MIN_SIZE as u64,
    )?)
}

/// Parse every Central Directory entry, in directory order.
pub fn read_central_directory(data: &[u8]) -> Result<Vec<ZipFileEntry>> {
    let (eocd, eocd_offset) = find_eocd(data)?;

    let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
        let eocd64 = read_zip64_eocd(data, eocd_offset)?;
        (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
    } else {
        (
            eocd.cd_offset as u64,
            eocd.cd_size as u64,
            eocd.total_entries as u64,
        )
    };

    let cd_data = slice_at(data, cd_offset, cd_size)?;

    // Every header needs at least CDFH_MIN_SIZE bytes; don't trust the count for the allocation
    let capacity = total_entries.min((cd_data.len() / CDFH_MIN_SIZE) as u64) as usize;
    let mut entries = Vec::with_capacity(capacity);
    let mut cursor = Cursor::new(cd_data);

    for _ in 0..total_entries {
        entries.push(parse_cdfh(&mut cursor)?);
    }

    Ok(entries)
}

/// Parse a Central Directory File Header from a cursor.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        bail!("Invalid Central Directory File Header");
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let _flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();
    let is_directory = file_name.ends_with('/');

    // ZIP64 extended information lives in extra field 0x0001; a value is
    // present only when the matching header field is saturated
    let extra_field_end = cursor.position() + extra_field_length as u64;

    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()? as u64;
        let field_end = (cursor.position() + field_size).min(extra_field_end);

        if header_id == 0x0001 {
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>()?;
            }
        }

        cursor.set_position(field_end);
    }

    // Skip what is left of the extra field and the entry comment
    cursor.set_position(extra_field_end + file_comment_length as u64);
    if cursor.position() > cursor.get_ref().len() as u64 {
        bail!("Truncated Central Directory File Header");
    }

    Ok(ZipFileEntry {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        is_directory,
    })
}

/// Resolve the byte range holding an entry's (compressed) data.
///
/// The Local File Header repeats the file name and carries its own extra
/// field, whose length may differ from the Central Directory copy, so the
/// data offset can only be known after reading it.
pub fn data_range(data: &[u8], entry: &ZipFileEntry) -> Result<Range<usize>> {
    let lfh = slice_at(data, entry.lfh_offset, LFH_SIZE as u64)?;
    if &lfh[0..4] != LFH_SIGNATURE {
        bail!("Invalid Local File Header");
    }

    let mut cursor = Cursor::new(&lfh[26..]);
    let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
    let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

    let data_offset = entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length;

    range_at(data, data_offset, entry.compressed_size)
}
