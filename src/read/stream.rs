//! A seekable, decrypted view of one archive entry.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::crypto::{Keystream, LcgKeystream, XorReader};
use crate::{Error, Result};

/// A read-only stream over one entry's decrypted payload.
///
/// Owns an independent handle on the archive file and a keystream seeded
/// for this entry, so any number of streams — over the same entry or
/// different ones — can be read concurrently, one per thread.
///
/// The stream implements [`Read`] and [`Seek`]; positions are virtual, with
/// 0 at the start of the entry. Seeking repositions the keystream by the
/// block delta: forward seeks compose skip steps, and backward seeks either
/// rewind (when the target is in the second half of the traversed range) or
/// reset and skip from the seed, whichever composes fewer steps.
///
/// Dropping the stream closes its file handle.
#[derive(Debug)]
pub struct EntryStream {
    xor: XorReader<File, LcgKeystream>,
    base: u64,
    len: u32,
    pos: u64,
}

impl EntryStream {
    pub(crate) fn open(archive: &Path, offset: u64, size: u32, key: u32) -> Result<Self> {
        let file = File::open(archive)?;
        let mut xor = XorReader::new(file, LcgKeystream::new(key));
        xor.seek_raw(offset)?;
        Ok(Self {
            xor,
            base: offset,
            len: size,
            pos: 0,
        })
    }

    /// Entry payload length in bytes.
    pub fn len(&self) -> u64 {
        u64::from(self.len)
    }

    /// Whether the entry is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current virtual position within the entry.
    pub fn tell(&self) -> u64 {
        self.pos
    }

    /// Bytes left between the current position and the end of the entry.
    pub fn remaining(&self) -> u64 {
        self.len().saturating_sub(self.pos)
    }

    /// Reads everything from the current position to the end of the entry.
    pub fn read_to_vec(&mut self) -> Result<Vec<u8>> {
        let remaining = self.remaining() as usize;
        self.read_decrypted(remaining)
    }

    fn read_decrypted(&mut self, len: usize) -> Result<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let left_offset = (self.pos % 4) as usize;
        let data = self.xor.read_unaligned(len, left_offset)?;
        self.pos += data.len() as u64;
        Ok(data)
    }

    /// Moves the keystream and the raw cursor to virtual position `target`.
    fn seek_to(&mut self, target: u64) -> Result<()> {
        let cur_block = self.pos / 4;
        let target_block = target / 4;
        let keystream = self.xor.keystream_mut();

        if target_block >= cur_block {
            keystream.skip(target_block - cur_block);
        } else if keystream.supports_rewind() && target_block >= cur_block / 2 {
            // Rewinding costs O(log delta) versus O(log target) for a reset
            // and re-skip; it wins when the target is past the halfway mark.
            log::debug!(
                "seek {} -> {}: rewinding {} block(s)",
                self.pos,
                target,
                cur_block - target_block
            );
            keystream.rewind(cur_block - target_block);
        } else {
            log::debug!(
                "seek {} -> {}: reset and skip {} block(s)",
                self.pos,
                target,
                target_block
            );
            keystream.reset();
            keystream.skip(target_block);
        }

        self.xor.seek_raw(self.base + target)?;
        self.pos = target;
        Ok(())
    }
}

impl Read for EntryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let want = (buf.len() as u64).min(self.remaining()) as usize;
        if want == 0 {
            return Ok(0);
        }
        let data = self.read_decrypted(want).map_err(into_io)?;
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }
}

impl Seek for EntryStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.pos) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(self.len) + i128::from(delta),
        };
        if target < 0 {
            let position = target.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64;
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                Error::NegativeSeek { position },
            ));
        }
        let target = u64::try_from(target)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "seek out of range"))?;
        self.seek_to(target).map_err(into_io)?;
        Ok(self.pos)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.pos)
    }
}

fn into_io(e: Error) -> io::Error {
    match e {
        Error::Io(e) => e,
        other => io::Error::other(other),
    }
}
