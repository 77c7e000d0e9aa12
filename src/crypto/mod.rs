//! XOR cipher primitives for RGSSAD metadata and payloads.
//!
//! Everything stored in an RGSSAD container is obfuscated with a keyed XOR:
//! a 32-bit keystream value is combined with each little-endian 32-bit block
//! of data (or, for legacy filenames, the low byte of a fresh value with each
//! byte). The keystream itself is produced by the linear congruential
//! generator behind [`LcgKeystream`]; [`XorReader`] applies it to a byte
//! source, including reads that start in the middle of a block.
//!
//! This is obfuscation, not confidentiality — the seed for every stream is
//! stored in the archive itself.

mod keystream;
mod xor;

pub use keystream::{Keystream, LcgKeystream, StaticKeystream};
pub use xor::XorReader;
