//! ZIP archive handle for EPUB containers
//!
//! Reads the central directory once on open, then inflates individual entries
//! on demand. Entries are looked up by path with the leniency real EPUBs need
//! (case differences, a stray leading `/`). DEFLATE is handled by miniz_oxide
//! and every entry is CRC-checked when the archive records a checksum.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use miniz_oxide::inflate::stream::{inflate, InflateState};
use miniz_oxide::{DataFormat, MZFlush, MZStatus};
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

pub use crate::error::ZipError;
use crate::error::EpubError;

/// Upper bound on central directory entries loaded from one archive
const MAX_CD_ENTRIES: usize = 16_384;

/// Maximum filename length in ZIP entries
const MAX_FILENAME_LEN: usize = 1024;

/// Local file header signature (little-endian)
const SIG_LOCAL_FILE_HEADER: u32 = 0x04034b50;
/// Central directory entry signature (little-endian)
const SIG_CD_ENTRY: u32 = 0x02014b50;
/// End of central directory signature (little-endian)
const SIG_EOCD: u32 = 0x06054b50;
/// ZIP64 end of central directory locator signature (little-endian)
const SIG_ZIP64_EOCD_LOCATOR: u32 = 0x07064b50;
/// Minimum EOCD record size in bytes
const EOCD_MIN_SIZE: usize = 22;
/// Maximum EOCD search window (EOCD + max comment length)
const MAX_EOCD_SCAN: usize = EOCD_MIN_SIZE + u16::MAX as usize;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;

const CHUNK_SIZE: usize = 8 * 1024;

/// Runtime-configurable ZIP safety limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZipLimits {
    /// Maximum compressed or uncompressed entry size allowed for reads.
    pub max_entry_size: usize,
    /// Whether a central directory larger than the entry cap is an error.
    pub strict: bool,
    /// Maximum bytes scanned from the file tail while searching for EOCD.
    pub max_eocd_scan: usize,
}

impl ZipLimits {
    /// Create limits with an explicit per-entry size cap.
    pub fn new(max_entry_size: usize) -> Self {
        Self {
            max_entry_size,
            strict: false,
            max_eocd_scan: MAX_EOCD_SCAN,
        }
    }

    /// Enable or disable strict central directory handling.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set a cap for EOCD tail scan bytes.
    pub fn with_max_eocd_scan(mut self, max_eocd_scan: usize) -> Self {
        self.max_eocd_scan = max_eocd_scan.max(EOCD_MIN_SIZE);
        self
    }
}

#[derive(Clone, Copy, Debug)]
struct CentralDirectory {
    offset: u64,
    size: u32,
    entry_count: u16,
    uses_zip64: bool,
}

/// Central directory record for one archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    /// Path of the entry inside the archive
    pub name: String,
    /// Compression method (0=stored, 8=deflated)
    pub method: u16,
    /// Compressed size in bytes
    pub compressed_size: u32,
    /// Uncompressed size in bytes
    pub uncompressed_size: u32,
    /// Offset to the local file header
    pub local_header_offset: u32,
    /// CRC32 checksum recorded by the archiver
    pub crc32: u32,
}

impl ZipEntry {
    fn matches(&self, name: &str) -> bool {
        let stored = self.name.trim_start_matches('/');
        let wanted = name.trim_start_matches('/');
        stored == wanted || stored.eq_ignore_ascii_case(wanted)
    }
}

/// Read-only handle over an EPUB's zip container
pub struct EpubArchive<R: Read + Seek> {
    reader: R,
    entries: Vec<ZipEntry>,
    limits: Option<ZipLimits>,
}

impl EpubArchive<File> {
    /// Open an archive from disk.
    pub fn open_file<P: AsRef<Path>>(
        path: P,
        limits: Option<ZipLimits>,
    ) -> Result<Self, EpubError> {
        let file = File::open(path).map_err(|e| EpubError::Io(e.to_string()))?;
        Self::new_with_limits(file, limits).map_err(EpubError::Zip)
    }
}

impl EpubArchive<Cursor<Vec<u8>>> {
    /// Open an archive held entirely in memory.
    pub fn from_bytes(bytes: Vec<u8>, limits: Option<ZipLimits>) -> Result<Self, ZipError> {
        Self::new_with_limits(Cursor::new(bytes), limits)
    }
}

impl<R: Read + Seek> EpubArchive<R> {
    /// Open an archive and read its central directory.
    pub fn new(reader: R) -> Result<Self, ZipError> {
        Self::new_with_limits(reader, None)
    }

    /// Open an archive with explicit runtime limits.
    pub fn new_with_limits(mut reader: R, limits: Option<ZipLimits>) -> Result<Self, ZipError> {
        let max_eocd_scan = limits
            .map(|l| l.max_eocd_scan.min(MAX_EOCD_SCAN))
            .unwrap_or(MAX_EOCD_SCAN);
        let directory = locate_central_directory(&mut reader, max_eocd_scan)?;
        if directory.uses_zip64 {
            return Err(ZipError::UnsupportedZip64);
        }
        let strict = limits.is_some_and(|l| l.strict);
        let declared = directory.entry_count as usize;
        if strict && declared > MAX_CD_ENTRIES {
            return Err(ZipError::CentralDirFull);
        }

        reader
            .seek(SeekFrom::Start(directory.offset))
            .map_err(|_| ZipError::IoError)?;
        let cd_end = directory.offset + directory.size as u64;

        let mut entries = Vec::with_capacity(declared.min(MAX_CD_ENTRIES));
        while entries.len() < declared.min(MAX_CD_ENTRIES) {
            let pos = reader.stream_position().map_err(|_| ZipError::IoError)?;
            if pos >= cd_end {
                if strict {
                    return Err(ZipError::InvalidFormat);
                }
                break;
            }
            match read_cd_entry(&mut reader)? {
                Some(entry) => entries.push(entry),
                None if strict => return Err(ZipError::InvalidFormat),
                None => break,
            }
        }

        if declared > entries.len() {
            log::warn!(
                "[ZIP] Archive declares {} entries but only {} were loaded",
                declared,
                entries.len()
            );
        }
        log::debug!(
            "[ZIP] Parsed {} central directory entries (offset {})",
            entries.len(),
            directory.offset
        );

        Ok(Self {
            reader,
            entries,
            limits,
        })
    }

    /// Look up an entry by archive path.
    ///
    /// Exact matches win over case-insensitive ones.
    pub fn find(&self, name: &str) -> Option<&ZipEntry> {
        let wanted = name.trim_start_matches('/');
        self.entries
            .iter()
            .find(|e| e.name.trim_start_matches('/') == wanted)
            .or_else(|| self.entries.iter().find(|e| e.matches(name)))
    }

    /// Whether an entry exists at `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Decompress an entry into memory.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>, ZipError> {
        let entry = self.find(name).cloned().ok_or(ZipError::FileNotFound)?;
        let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
        self.read_entry_to(&entry, &mut out)?;
        Ok(out)
    }

    /// Raw bytes of an entry, or `None` when it is absent or unreadable.
    ///
    /// Read failures other than a missing entry are logged.
    pub fn entry(&mut self, name: &str) -> Option<Vec<u8>> {
        match self.read(name) {
            Ok(bytes) => Some(bytes),
            Err(ZipError::FileNotFound) => None,
            Err(err) => {
                log::warn!("[ZIP] Failed to read entry '{}': {}", name, err);
                None
            }
        }
    }

    /// Entry content decoded as text (invalid UTF-8 is replaced).
    pub fn entry_text(&mut self, name: &str) -> Option<String> {
        self.entry(name)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Stream an entry's decompressed bytes into a writer.
    pub fn read_entry_to<W: Write>(
        &mut self,
        entry: &ZipEntry,
        writer: &mut W,
    ) -> Result<usize, ZipError> {
        if let Some(limits) = self.limits {
            if entry.uncompressed_size as usize > limits.max_entry_size
                || entry.compressed_size as usize > limits.max_entry_size
            {
                return Err(ZipError::FileTooLarge);
            }
        }

        let data_offset = self.data_offset(entry)?;
        self.reader
            .seek(SeekFrom::Start(data_offset))
            .map_err(|_| ZipError::IoError)?;

        let mut input = alloc::vec![0u8; CHUNK_SIZE];
        let mut hasher = crc32fast::Hasher::new();
        let written = match entry.method {
            METHOD_STORED => {
                let mut remaining = entry.compressed_size as usize;
                let mut written = 0usize;
                while remaining > 0 {
                    let take = remaining.min(input.len());
                    self.reader
                        .read_exact(&mut input[..take])
                        .map_err(|_| ZipError::IoError)?;
                    writer
                        .write_all(&input[..take])
                        .map_err(|_| ZipError::IoError)?;
                    hasher.update(&input[..take]);
                    written += take;
                    remaining -= take;
                }
                written
            }
            METHOD_DEFLATED => {
                let mut output = alloc::vec![0u8; CHUNK_SIZE];
                self.inflate_to(entry, writer, &mut input, &mut output, &mut hasher)?
            }
            _ => return Err(ZipError::UnsupportedCompression),
        };

        if entry.crc32 != 0 && hasher.finalize() != entry.crc32 {
            return Err(ZipError::CrcMismatch);
        }
        Ok(written)
    }

    fn inflate_to<W: Write>(
        &mut self,
        entry: &ZipEntry,
        writer: &mut W,
        input: &mut [u8],
        output: &mut [u8],
        hasher: &mut crc32fast::Hasher,
    ) -> Result<usize, ZipError> {
        let mut state = alloc::boxed::Box::new(InflateState::new(DataFormat::Raw));
        let mut compressed_remaining = entry.compressed_size as usize;
        let mut pending_start = 0usize;
        let mut pending_end = 0usize;
        let mut written = 0usize;

        loop {
            if pending_start == pending_end && compressed_remaining > 0 {
                let take = compressed_remaining.min(input.len());
                self.reader
                    .read_exact(&mut input[..take])
                    .map_err(|_| ZipError::IoError)?;
                pending_start = 0;
                pending_end = take;
                compressed_remaining -= take;
            }

            let flush = if compressed_remaining == 0 {
                MZFlush::Finish
            } else {
                MZFlush::None
            };
            let result = inflate(
                &mut state,
                &input[pending_start..pending_end],
                output,
                flush,
            );
            pending_start += result.bytes_consumed;

            if result.bytes_written > 0 {
                let produced = &output[..result.bytes_written];
                writer.write_all(produced).map_err(|_| ZipError::IoError)?;
                hasher.update(produced);
                written += result.bytes_written;
            }

            match result.status {
                Ok(MZStatus::StreamEnd) => {
                    if compressed_remaining != 0 || pending_start != pending_end {
                        return Err(ZipError::DecompressError);
                    }
                    return Ok(written);
                }
                Ok(MZStatus::Ok) => {
                    if result.bytes_consumed == 0 && result.bytes_written == 0 {
                        return Err(ZipError::DecompressError);
                    }
                }
                Ok(MZStatus::NeedDict) | Err(_) => return Err(ZipError::DecompressError),
            }
        }
    }

    /// Offset of the entry data, past the local header
    fn data_offset(&mut self, entry: &ZipEntry) -> Result<u64, ZipError> {
        let offset = entry.local_header_offset as u64;
        self.reader
            .seek(SeekFrom::Start(offset))
            .map_err(|_| ZipError::IoError)?;

        let mut header = [0u8; 30];
        self.reader
            .read_exact(&mut header)
            .map_err(|_| ZipError::IoError)?;
        if read_u32_le(&header, 0) != SIG_LOCAL_FILE_HEADER {
            return Err(ZipError::InvalidFormat);
        }

        // The local header may carry a different extra field than the CD record.
        let name_len = read_u16_le(&header, 26) as u64;
        let extra_len = read_u16_le(&header, 28) as u64;
        Ok(offset + 30 + name_len + extra_len)
    }

    /// Number of loaded entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive has no loaded entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entry names in central directory order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Active limits used by this archive
    pub fn limits(&self) -> Option<ZipLimits> {
        self.limits
    }
}

fn locate_central_directory<R: Read + Seek>(
    reader: &mut R,
    max_eocd_scan: usize,
) -> Result<CentralDirectory, ZipError> {
    let file_size = reader.seek(SeekFrom::End(0)).map_err(|_| ZipError::IoError)?;
    if file_size < EOCD_MIN_SIZE as u64 {
        return Err(ZipError::InvalidFormat);
    }

    let scan_range = file_size.min(max_eocd_scan as u64) as usize;
    if scan_range < EOCD_MIN_SIZE {
        return Err(ZipError::InvalidFormat);
    }
    let scan_base = file_size - scan_range as u64;
    let mut tail = alloc::vec![0u8; scan_range];
    reader
        .seek(SeekFrom::Start(scan_base))
        .map_err(|_| ZipError::IoError)?;
    reader.read_exact(&mut tail).map_err(|_| ZipError::IoError)?;

    for i in (0..=scan_range - EOCD_MIN_SIZE).rev() {
        if read_u32_le(&tail, i) != SIG_EOCD {
            continue;
        }
        let entry_count = read_u16_le(&tail, i + 10);
        let size = read_u32_le(&tail, i + 12);
        let offset = read_u32_le(&tail, i + 16) as u64;
        let comment_len = read_u16_le(&tail, i + 20) as u64;
        let eocd_pos = scan_base + i as u64;
        // A signature inside the comment is not the real record.
        if eocd_pos + EOCD_MIN_SIZE as u64 + comment_len != file_size {
            continue;
        }

        let cd_end = offset
            .checked_add(size as u64)
            .ok_or(ZipError::InvalidFormat)?;
        if cd_end > eocd_pos {
            return Err(ZipError::InvalidFormat);
        }

        let sentinel = entry_count == u16::MAX || size == u32::MAX || offset == u32::MAX as u64;
        let locator = if eocd_pos >= 20 {
            reader
                .seek(SeekFrom::Start(eocd_pos - 20))
                .map_err(|_| ZipError::IoError)?;
            let mut sig = [0u8; 4];
            reader.read_exact(&mut sig).map_err(|_| ZipError::IoError)?;
            u32::from_le_bytes(sig) == SIG_ZIP64_EOCD_LOCATOR
        } else {
            false
        };

        return Ok(CentralDirectory {
            offset,
            size,
            entry_count,
            uses_zip64: sentinel || locator,
        });
    }

    Err(ZipError::InvalidFormat)
}

fn read_cd_entry<R: Read + Seek>(reader: &mut R) -> Result<Option<ZipEntry>, ZipError> {
    let mut sig = [0u8; 4];
    if reader.read_exact(&mut sig).is_err() || u32::from_le_bytes(sig) != SIG_CD_ENTRY {
        return Ok(None);
    }

    // Fixed part of the record after the signature; buf[n] is record offset n + 4.
    let mut buf = [0u8; 42];
    reader.read_exact(&mut buf).map_err(|_| ZipError::IoError)?;

    let method = read_u16_le(&buf, 6);
    let crc32 = read_u32_le(&buf, 12);
    let compressed_size = read_u32_le(&buf, 16);
    let uncompressed_size = read_u32_le(&buf, 20);
    let name_len = read_u16_le(&buf, 24) as usize;
    let extra_len = read_u16_le(&buf, 26) as usize;
    let comment_len = read_u16_le(&buf, 28) as usize;
    let local_header_offset = read_u32_le(&buf, 38);

    let name = if name_len <= MAX_FILENAME_LEN {
        let mut name_buf = alloc::vec![0u8; name_len];
        reader
            .read_exact(&mut name_buf)
            .map_err(|_| ZipError::IoError)?;
        String::from_utf8_lossy(&name_buf).into_owned()
    } else {
        reader
            .seek(SeekFrom::Current(name_len as i64))
            .map_err(|_| ZipError::IoError)?;
        String::new()
    };

    let skip = extra_len + comment_len;
    if skip > 0 {
        reader
            .seek(SeekFrom::Current(skip as i64))
            .map_err(|_| ZipError::IoError)?;
    }

    Ok(Some(ZipEntry {
        name,
        method,
        compressed_size,
        uncompressed_size,
        local_header_offset,
        crc32,
    }))
}

fn read_u16_le(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn read_u32_le(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

/// Test helper: build an archive from `(name, content, deflate)` triples.
#[cfg(test)]
pub(crate) fn build_zip(files: &[(&str, &[u8], bool)]) -> Vec<u8> {
    let mut zip = Vec::new();
    let mut central = Vec::new();

    for (name, content, deflate) in files {
        let (method, data) = if *deflate {
            (
                METHOD_DEFLATED,
                miniz_oxide::deflate::compress_to_vec(content, 6),
            )
        } else {
            (METHOD_STORED, content.to_vec())
        };
        let crc = crc32fast::hash(content);
        let offset = zip.len() as u32;

        zip.extend_from_slice(&SIG_LOCAL_FILE_HEADER.to_le_bytes());
        zip.extend_from_slice(&20u16.to_le_bytes()); // version needed
        zip.extend_from_slice(&0u16.to_le_bytes()); // flags
        zip.extend_from_slice(&method.to_le_bytes());
        zip.extend_from_slice(&0u32.to_le_bytes()); // mod time + date
        zip.extend_from_slice(&crc.to_le_bytes());
        zip.extend_from_slice(&(data.len() as u32).to_le_bytes());
        zip.extend_from_slice(&(content.len() as u32).to_le_bytes());
        zip.extend_from_slice(&(name.len() as u16).to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes()); // extra length
        zip.extend_from_slice(name.as_bytes());
        zip.extend_from_slice(&data);

        central.extend_from_slice(&SIG_CD_ENTRY.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes()); // version made by
        central.extend_from_slice(&20u16.to_le_bytes()); // version needed
        central.extend_from_slice(&0u16.to_le_bytes()); // flags
        central.extend_from_slice(&method.to_le_bytes());
        central.extend_from_slice(&0u32.to_le_bytes()); // mod time + date
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&(data.len() as u32).to_le_bytes());
        central.extend_from_slice(&(content.len() as u32).to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes()); // extra length
        central.extend_from_slice(&0u16.to_le_bytes()); // comment length
        central.extend_from_slice(&0u16.to_le_bytes()); // disk number
        central.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        central.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
    }

    let cd_offset = zip.len() as u32;
    zip.extend_from_slice(&central);
    zip.extend_from_slice(&SIG_EOCD.to_le_bytes());
    zip.extend_from_slice(&0u16.to_le_bytes()); // disk number
    zip.extend_from_slice(&0u16.to_le_bytes()); // disk with CD
    zip.extend_from_slice(&(files.len() as u16).to_le_bytes());
    zip.extend_from_slice(&(files.len() as u16).to_le_bytes());
    zip.extend_from_slice(&(central.len() as u32).to_le_bytes());
    zip.extend_from_slice(&cd_offset.to_le_bytes());
    zip.extend_from_slice(&0u16.to_le_bytes()); // comment length
    zip
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_zip_comment(mut zip: Vec<u8>, comment_len: usize) -> Vec<u8> {
        let eocd_pos = zip.len() - EOCD_MIN_SIZE;
        zip[eocd_pos + 20..eocd_pos + 22].copy_from_slice(&(comment_len as u16).to_le_bytes());
        zip.extend_from_slice(&vec![b'A'; comment_len]);
        zip
    }

    #[test]
    fn test_read_stored_entry() {
        let data = build_zip(&[("mimetype", b"application/epub+zip", false)]);
        let mut archive = EpubArchive::from_bytes(data, None).unwrap();
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.read("mimetype").unwrap(), b"application/epub+zip");
    }

    #[test]
    fn test_read_deflated_entry() {
        let text = "The quick brown fox. ".repeat(2_000);
        let data = build_zip(&[("OEBPS/ch1.xhtml", text.as_bytes(), true)]);
        let mut archive = EpubArchive::from_bytes(data, None).unwrap();
        let entry = archive.find("OEBPS/ch1.xhtml").unwrap().clone();
        assert_eq!(entry.method, METHOD_DEFLATED);
        assert_eq!(archive.entry_text("OEBPS/ch1.xhtml").unwrap(), text);
    }

    #[test]
    fn test_lookup_ignores_case_and_leading_slash() {
        let data = build_zip(&[("OEBPS/Content.opf", b"<package/>", false)]);
        let archive = EpubArchive::from_bytes(data, None).unwrap();
        assert!(archive.contains("oebps/content.opf"));
        assert!(archive.contains("/OEBPS/Content.opf"));
        assert!(!archive.contains("OEBPS/other.opf"));
    }

    #[test]
    fn test_exact_match_preferred_over_case_insensitive() {
        let data = build_zip(&[("a.txt", b"lower", false), ("A.txt", b"upper", false)]);
        let mut archive = EpubArchive::from_bytes(data, None).unwrap();
        assert_eq!(archive.read("A.txt").unwrap(), b"upper");
    }

    #[test]
    fn test_missing_entry_is_none() {
        let data = build_zip(&[("mimetype", b"application/epub+zip", false)]);
        let mut archive = EpubArchive::from_bytes(data, None).unwrap();
        assert!(archive.entry("META-INF/container.xml").is_none());
        assert_eq!(
            archive.read("META-INF/container.xml"),
            Err(ZipError::FileNotFound)
        );
    }

    #[test]
    fn test_crc_mismatch_detected() {
        let mut data = build_zip(&[("data.txt", b"hello world", false)]);
        // Corrupt the stored payload (local header is 30 bytes + name).
        let payload = 30 + "data.txt".len();
        data[payload] ^= 0xff;
        let mut archive = EpubArchive::from_bytes(data, None).unwrap();
        assert_eq!(archive.read("data.txt"), Err(ZipError::CrcMismatch));
        assert!(archive.entry("data.txt").is_none());
    }

    #[test]
    fn test_eocd_found_with_long_comment() {
        let data = add_zip_comment(build_zip(&[("mimetype", b"x", false)]), 2_000);
        let archive = EpubArchive::from_bytes(data, None).expect("EOCD should be discoverable");
        assert!(archive.contains("mimetype"));
    }

    #[test]
    fn test_eocd_scan_limit_rejects_long_tail() {
        let data = add_zip_comment(build_zip(&[("mimetype", b"x", false)]), 2_000);
        let limits = ZipLimits::new(1024).with_max_eocd_scan(128);
        let result = EpubArchive::from_bytes(data, Some(limits));
        assert!(matches!(result, Err(ZipError::InvalidFormat)));
    }

    #[test]
    fn test_zip64_sentinel_rejected() {
        let mut data = build_zip(&[("mimetype", b"x", false)]);
        let eocd_pos = data.len() - EOCD_MIN_SIZE;
        data[eocd_pos + 10..eocd_pos + 12].copy_from_slice(&u16::MAX.to_le_bytes());
        let result = EpubArchive::from_bytes(data, None);
        assert!(matches!(result, Err(ZipError::UnsupportedZip64)));
    }

    #[test]
    fn test_not_a_zip() {
        let result = EpubArchive::from_bytes(b"plain text, not an archive".to_vec(), None);
        assert!(matches!(result, Err(ZipError::InvalidFormat)));
    }

    #[test]
    fn test_limits_enforced_when_configured() {
        let data = build_zip(&[("data.txt", b"1234567890", false)]);
        let mut archive = EpubArchive::from_bytes(data, Some(ZipLimits::new(8))).unwrap();
        assert_eq!(archive.read("data.txt"), Err(ZipError::FileTooLarge));
    }

    #[test]
    fn test_names_in_directory_order() {
        let data = build_zip(&[
            ("mimetype", b"application/epub+zip", false),
            ("META-INF/container.xml", b"<container/>", true),
        ]);
        let archive = EpubArchive::from_bytes(data, None).unwrap();
        let names: Vec<&str> = archive.names().collect();
        assert_eq!(names, vec!["mimetype", "META-INF/container.xml"]);
    }
}
