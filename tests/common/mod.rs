//! Shared test utilities for integration tests.
//!
//! The builders here are the encoder side of the container formats: they
//! produce byte-exact archives for the parser and stream tests to consume.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test
//! file compiles as a separate crate and may only use a subset of these
//! helpers.

#![allow(dead_code)]

use std::io::Write;

/// One step of the keystream generator.
pub fn lcg_next(key: u32) -> u32 {
    key.wrapping_mul(7).wrapping_add(3)
}

/// Encrypts a payload the way archives store it: zero-pad to whole 4-byte
/// blocks, XOR each little-endian word with a fresh key, truncate back to
/// the original length.
pub fn encrypt_payload(data: &[u8], seed: u32) -> Vec<u8> {
    let mut key = seed;
    let mut padded = data.to_vec();
    padded.resize(data.len().div_ceil(4) * 4, 0);
    for chunk in padded.chunks_exact_mut(4) {
        let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) ^ key;
        chunk.copy_from_slice(&word.to_le_bytes());
        key = lcg_next(key);
    }
    padded.truncate(data.len());
    padded
}

/// Encrypts bytes with a single fixed key (the v3 metadata cipher),
/// zero-padding the tail block.
fn encrypt_static(data: &[u8], key: u32) -> Vec<u8> {
    let mut padded = data.to_vec();
    padded.resize(data.len().div_ceil(4) * 4, 0);
    for chunk in padded.chunks_exact_mut(4) {
        let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) ^ key;
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    padded.truncate(data.len());
    padded
}

/// Builds a v1 archive from `(path, payload)` pairs. Paths use backslash
/// separators as real archives do.
pub fn build_v1(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let raw: Vec<(Vec<u8>, &[u8])> = entries
        .iter()
        .map(|(name, data)| (name.as_bytes().to_vec(), *data))
        .collect();
    build_legacy(b"RGSSAD\0\x01", &raw)
}

/// Builds a v2 archive; identical layout to v1 apart from the version byte.
pub fn build_v2(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let raw: Vec<(Vec<u8>, &[u8])> = entries
        .iter()
        .map(|(name, data)| (name.as_bytes().to_vec(), *data))
        .collect();
    build_legacy(b"RGSSAD\0\x02", &raw)
}

/// Builds a v1 archive with raw (possibly non-UTF-8) entry names.
pub fn build_v1_raw_names(entries: &[(&[u8], &[u8])]) -> Vec<u8> {
    let raw: Vec<(Vec<u8>, &[u8])> = entries
        .iter()
        .map(|(name, data)| (name.to_vec(), *data))
        .collect();
    build_legacy(b"RGSSAD\0\x01", &raw)
}

fn build_legacy(header: &[u8; 8], entries: &[(Vec<u8>, &[u8])]) -> Vec<u8> {
    let mut out = header.to_vec();
    let mut key = 0xDEAD_CAFEu32;
    for (name, data) in entries {
        out.extend((name.len() as u32 ^ key).to_le_bytes());
        key = lcg_next(key);
        for &b in name {
            out.push(b ^ key as u8);
            key = lcg_next(key);
        }
        out.extend((data.len() as u32 ^ key).to_le_bytes());
        key = lcg_next(key);
        // The payload is encrypted with the keystream as it stands after
        // the size field; the metadata keystream does not advance over it.
        out.extend(encrypt_payload(data, key));
    }
    out
}

/// Builds a v3 archive (`RGSSAD\0\x03`): the metadata key is derived from
/// the stored seed as `seed·9 + 3`.
pub fn build_v3(seed: u32, entries: &[(&str, u32, &[u8])]) -> Vec<u8> {
    build_table(
        b"RGSSAD\0\x03",
        seed,
        seed.wrapping_mul(9).wrapping_add(3),
        entries,
    )
}

/// Builds a Fux2Pack archive: the stored seed is the metadata key as-is.
pub fn build_fux2pack(seed: u32, entries: &[(&str, u32, &[u8])]) -> Vec<u8> {
    build_table(b"Fux2Pack", seed, seed, entries)
}

/// Entry-table layout shared by v3 and Fux2Pack. `entries` are
/// `(path, payload_key, payload)` triples; payload offsets are computed so
/// payloads sit back-to-back after the terminator record.
fn build_table(header: &[u8; 8], seed: u32, key: u32, entries: &[(&str, u32, &[u8])]) -> Vec<u8> {
    let table_len: usize = entries.iter().map(|(name, _, _)| 16 + name.len()).sum();
    let mut cursor = 8 + 4 + table_len + 16;

    let mut out = header.to_vec();
    out.extend(seed.to_le_bytes());
    let mut payloads = Vec::new();
    for (name, payload_key, data) in entries {
        for field in [
            cursor as u32,
            data.len() as u32,
            *payload_key,
            name.len() as u32,
        ] {
            out.extend((field ^ key).to_le_bytes());
        }
        out.extend(encrypt_static(name.as_bytes(), key));
        payloads.push(encrypt_payload(data, *payload_key));
        cursor += data.len();
    }
    // Terminator: a record whose offset field decrypts to zero.
    for _ in 0..4 {
        out.extend(key.to_le_bytes());
    }
    for payload in payloads {
        out.extend(payload);
    }
    out
}

/// Writes archive bytes to a temp file; keep the handle alive while the
/// archive is open.
pub fn temp_archive(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(bytes).expect("write archive bytes");
    file.flush().expect("flush archive bytes");
    file
}

/// Writes the bytes out and opens them as an archive, returning the temp
/// file guard alongside.
pub fn open_archive(bytes: &[u8]) -> (tempfile::NamedTempFile, rgssvfs::Archive) {
    let file = temp_archive(bytes);
    let archive = rgssvfs::Archive::open(file.path()).expect("open archive");
    (file, archive)
}
