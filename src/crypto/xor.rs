//! Applies a keystream to a byte source.
//!
//! [`XorReader`] wraps a reader and a [`Keystream`] and decrypts on the fly.
//! Three block modes exist in the wild:
//!
//! - 32-bit aligned: each little-endian word XORs against one fresh key
//!   (entry table fields).
//! - 8-bit: each byte XORs against the low byte of a fresh key (legacy
//!   filenames).
//! - 32-bit unaligned: a read starting 0–3 bytes into a block, used for
//!   payload reads at arbitrary offsets and version 3 filenames.
//!
//! The invariant maintained across reads is that the keystream position
//! always equals the block index of the next unread byte, where block index
//! is `pos / 4` within the stream. An unaligned read that only partially
//! fills its final block consumes one key too many and rolls the keystream
//! back one step to restore the invariant.

use std::io::{self, Read, Seek, SeekFrom};

use super::Keystream;
use crate::{Error, Result};

/// A decrypting reader: a byte source combined with a [`Keystream`].
///
/// Tracks the absolute position of the next source read so truncation
/// errors can point at the offending offset.
#[derive(Debug)]
pub struct XorReader<R, K> {
    source: R,
    keystream: K,
    position: u64,
}

impl<R: Read, K: Keystream> XorReader<R, K> {
    /// Creates a reader over `source` with the given keystream.
    ///
    /// The position starts at 0; use [`with_position`][Self::with_position]
    /// when the source is already mid-file.
    pub fn new(source: R, keystream: K) -> Self {
        Self {
            source,
            keystream,
            position: 0,
        }
    }

    /// Sets the absolute byte offset the next source read corresponds to.
    pub fn with_position(mut self, position: u64) -> Self {
        self.position = position;
        self
    }

    /// Absolute byte offset of the next source read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// The wrapped keystream.
    pub fn keystream(&self) -> &K {
        &self.keystream
    }

    /// Mutable access to the wrapped keystream.
    pub fn keystream_mut(&mut self) -> &mut K {
        &mut self.keystream
    }

    /// Consumes the reader, returning the source and keystream.
    pub fn into_inner(self) -> (R, K) {
        (self.source, self.keystream)
    }

    /// Reads up to `count` XORed little-endian 32-bit words.
    ///
    /// At end of input the result is truncated to the whole words actually
    /// read and the keystream advances only for those; a trailing partial
    /// word is reported as [`Error::Truncated`].
    pub fn read_words(&mut self, count: usize) -> Result<Vec<u32>> {
        let mut buf = vec![0u8; count * 4];
        let got = read_full(&mut self.source, &mut buf)?;
        self.position += got as u64;
        if got % 4 != 0 {
            return Err(Error::truncated(
                self.position,
                "input ends inside a 32-bit word",
            ));
        }
        let mut words = Vec::with_capacity(got / 4);
        for chunk in buf[..got].chunks_exact(4) {
            let raw = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            words.push(raw ^ self.keystream.next_key());
        }
        Ok(words)
    }

    /// Reads up to `count` bytes in 8-bit mode.
    ///
    /// Each byte XORs against the low byte of a freshly produced key — one
    /// full keystream step per byte. Short data at end of input truncates
    /// the result.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; count];
        let got = read_full(&mut self.source, &mut buf)?;
        self.position += got as u64;
        buf.truncate(got);
        for byte in &mut buf {
            *byte ^= self.keystream.next_key() as u8;
        }
        Ok(buf)
    }

    /// Reads `len` bytes of plaintext starting `left_offset` (0–3) bytes
    /// into the current 32-bit block.
    ///
    /// The source must supply all `len` bytes; anything short is
    /// [`Error::Truncated`]. If the final block is only partially occupied,
    /// the keystream is rolled back one step so the next read — which will
    /// see that block again as its first — decrypts correctly.
    pub fn read_unaligned(&mut self, len: usize, left_offset: usize) -> Result<Vec<u8>> {
        debug_assert!(left_offset < 4);
        if len == 0 && left_offset == 0 {
            return Ok(Vec::new());
        }

        let blocks = (left_offset + len).div_ceil(4);
        let mut buf = vec![0u8; blocks * 4];
        let got = read_full(&mut self.source, &mut buf[left_offset..left_offset + len])?;
        self.position += got as u64;
        if got < len {
            return Err(Error::truncated(
                self.position,
                format!("expected {len} bytes, got {got}"),
            ));
        }

        for chunk in buf.chunks_exact_mut(4) {
            let raw = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let plain = raw ^ self.keystream.next_key();
            chunk.copy_from_slice(&plain.to_le_bytes());
        }

        // The tail block was consumed but not drained; its remaining bytes
        // belong to the next read.
        if (left_offset + len) % 4 != 0 {
            self.keystream.rollback();
        }

        Ok(buf[left_offset..left_offset + len].to_vec())
    }
}

impl<R: Read + Seek, K: Keystream> XorReader<R, K> {
    /// Skips `n` raw source bytes without touching the keystream.
    ///
    /// Used by the legacy parser to step over payloads, which are decrypted
    /// later with their own captured seed.
    pub fn skip_raw(&mut self, n: u64) -> Result<()> {
        self.source.seek(SeekFrom::Current(n as i64))?;
        self.position += n;
        Ok(())
    }

    /// Repositions the raw source to an absolute offset without touching
    /// the keystream.
    pub fn seek_raw(&mut self, offset: u64) -> Result<()> {
        self.source.seek(SeekFrom::Start(offset))?;
        self.position = offset;
        Ok(())
    }
}

/// Reads until `buf` is full or the source is exhausted; returns the byte
/// count actually read.
fn read_full<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
