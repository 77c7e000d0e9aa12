//! Metadata parsers for both container layouts.
//!
//! A parser is an iterator over [`RawEntry`] records; each call to `next`
//! drives the file cursor and the metadata keystream forward. The directory
//! tree builder consumes the records and never touches the file itself.
//!
//! Legacy archives (v1/v2) interleave metadata and payloads: every record is
//! a keyed filename-length word, the filename in 8-bit mode, a size word,
//! then the payload bytes, which the parser steps over without decrypting.
//! The keystream value in force after the size word is captured as the
//! payload's seed.
//!
//! Version 3 and Fux2Pack archives store a table of 16-byte records up
//! front, all XORed against a single metadata key, terminated by a record
//! whose offset field decrypts to zero.

use std::io::{Read, Seek};

use crate::crypto::{Keystream, LcgKeystream, StaticKeystream, XorReader};
use crate::format::{ArchiveFormat, HEADER_LEN};
use crate::{Error, Result};

/// One parsed metadata record, handed to the tree builder.
///
/// `path` uses the archive's own backslash separators; splitting and
/// normalization happen in the tree builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawEntry {
    /// Entry path as stored in the archive.
    pub path: String,
    /// Absolute byte offset of the payload in the archive file.
    pub offset: u64,
    /// Payload length in bytes.
    pub size: u32,
    /// Initial keystream value for the payload.
    pub key: u32,
}

/// Iterator over the entry records of an archive.
///
/// Expects `reader` to be positioned just past the 8-byte header.
pub(crate) enum EntryParser<'a, R: Read + Seek> {
    Legacy(LegacyParser<'a, R>),
    Modern(ModernParser<'a, R>),
}

impl<'a, R: Read + Seek> EntryParser<'a, R> {
    pub(crate) fn new(reader: &'a mut R, format: ArchiveFormat, file_size: u64) -> Result<Self> {
        if format.uses_legacy_layout() {
            Ok(EntryParser::Legacy(LegacyParser::new(reader, file_size)))
        } else {
            Ok(EntryParser::Modern(ModernParser::new(
                reader, format, file_size,
            )?))
        }
    }
}

impl<R: Read + Seek> Iterator for EntryParser<'_, R> {
    type Item = Result<RawEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            EntryParser::Legacy(p) => p.next(),
            EntryParser::Modern(p) => p.next(),
        }
    }
}

/// Parser for the v1/v2 inline layout.
pub(crate) struct LegacyParser<'a, R: Read + Seek> {
    xor: XorReader<&'a mut R, LcgKeystream>,
    file_size: u64,
    failed: bool,
}

impl<'a, R: Read + Seek> LegacyParser<'a, R> {
    fn new(reader: &'a mut R, file_size: u64) -> Self {
        Self {
            xor: XorReader::new(reader, LcgKeystream::default())
                .with_position(HEADER_LEN as u64),
            file_size,
            failed: false,
        }
    }

    fn read_word(&mut self, what: &'static str) -> Result<u32> {
        let words = self.xor.read_words(1)?;
        words
            .first()
            .copied()
            .ok_or_else(|| Error::truncated(self.xor.position(), what))
    }

    fn next_entry(&mut self) -> Result<Option<RawEntry>> {
        if self.xor.position() >= self.file_size {
            return Ok(None);
        }

        let fn_len = self.read_word("archive ended inside an entry record")?;
        if u64::from(fn_len) > self.file_size - self.xor.position() {
            return Err(Error::truncated(
                self.xor.position(),
                "entry name extends past end of file",
            ));
        }
        let name = self.xor.read_bytes(fn_len as usize)?;
        if name.len() < fn_len as usize {
            return Err(Error::truncated(
                self.xor.position(),
                "archive ended inside an entry name",
            ));
        }
        let path = String::from_utf8(name).map_err(Error::InvalidName)?;
        let size = self.read_word("archive ended inside an entry record")?;

        let offset = self.xor.position();
        let key = self.xor.keystream().current_key();
        if u64::from(size) > self.file_size - offset {
            return Err(Error::truncated(
                offset,
                format!("payload of {size} bytes extends past end of file"),
            ));
        }
        self.xor.skip_raw(u64::from(size))?;

        log::debug!("entry {path:?}: offset={offset:#x} size={size} key={key:#010x}");
        Ok(Some(RawEntry {
            path,
            offset,
            size,
            key,
        }))
    }
}

impl<R: Read + Seek> Iterator for LegacyParser<'_, R> {
    type Item = Result<RawEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Parser for the v3/Fux2Pack entry-table layout.
pub(crate) struct ModernParser<'a, R: Read + Seek> {
    xor: XorReader<&'a mut R, StaticKeystream>,
    file_size: u64,
    done: bool,
    failed: bool,
}

impl<'a, R: Read + Seek> ModernParser<'a, R> {
    fn new(reader: &'a mut R, format: ArchiveFormat, file_size: u64) -> Result<Self> {
        let mut seed_bytes = [0u8; 4];
        reader.read_exact(&mut seed_bytes).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::truncated(HEADER_LEN as u64, "missing metadata key seed")
            } else {
                Error::Io(e)
            }
        })?;
        let seed = u32::from_le_bytes(seed_bytes);
        let metadata_key = if format.derives_metadata_key() {
            seed.wrapping_mul(9).wrapping_add(3)
        } else {
            seed
        };
        log::debug!("metadata key {metadata_key:#010x} ({format})");

        Ok(Self {
            xor: XorReader::new(reader, StaticKeystream::new(metadata_key))
                .with_position(HEADER_LEN as u64 + 4),
            file_size,
            done: false,
            failed: false,
        })
    }

    fn next_entry(&mut self) -> Result<Option<RawEntry>> {
        if self.done {
            return Ok(None);
        }

        let words = self.xor.read_words(4)?;
        if words.len() < 4 {
            return Err(Error::truncated(
                self.xor.position(),
                "archive ended before the entry-table terminator",
            ));
        }
        let (offset, size, key, fn_len) = (words[0], words[1], words[2], words[3]);
        if offset == 0 {
            self.done = true;
            return Ok(None);
        }

        if u64::from(fn_len) > self.file_size - self.xor.position() {
            return Err(Error::truncated(
                self.xor.position(),
                "entry name extends past end of file",
            ));
        }
        let name = self.xor.read_unaligned(fn_len as usize, 0)?;
        let path = String::from_utf8(name).map_err(Error::InvalidName)?;

        if u64::from(offset) + u64::from(size) > self.file_size {
            return Err(Error::truncated(
                u64::from(offset),
                format!("payload of {size} bytes extends past end of file"),
            ));
        }

        log::debug!("entry {path:?}: offset={offset:#x} size={size} key={key:#010x}");
        Ok(Some(RawEntry {
            path,
            offset: u64::from(offset),
            size,
            key,
        }))
    }
}

impl<R: Read + Seek> Iterator for ModernParser<'_, R> {
    type Item = Result<RawEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
