//! # rgssvfs
//!
//! A read-only virtual filesystem over RPG Maker RGSSAD archives.
//!
//! RPG Maker XP, VX, and VX Ace ship their game resources in encrypted
//! container files (`Game.rgssad`, `Game.rgss2a`, `Game.rgss3a`). This crate
//! parses the encrypted metadata of such a container, builds an in-memory
//! directory tree, and hands out seekable streams that decrypt file payloads
//! lazily on read — including reads at arbitrary, unaligned offsets.
//!
//! ## Supported containers
//!
//! | Header | Layout |
//! |--------|--------|
//! | `RGSSAD\0` version 1 or 2 | Legacy: entries inline, LCG-keyed metadata |
//! | `RGSSAD\0` version 3 | Entry table with derived metadata key |
//! | `Fux2Pack` | Version 3 layout with a raw (un-derived) metadata key |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rgssvfs::{Archive, Result, ROOT_INODE};
//! use std::io::Read;
//!
//! fn main() -> Result<()> {
//!     let archive = Archive::open("Game.rgssad")?;
//!
//!     // Walk the root directory
//!     for entry in archive.readdir(ROOT_INODE, 0)? {
//!         let stat = archive.stat(entry.id)?;
//!         println!("{}: {:?}, {} bytes", entry.name, stat.kind, stat.size);
//!     }
//!
//!     // Resolve a POSIX-style path and read the file it names
//!     if let Some(inode) = archive.lookup_path("Data/Scripts.rvdata") {
//!         let mut stream = archive.open_entry(inode)?;
//!         let mut contents = Vec::new();
//!         stream.read_to_end(&mut contents)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Random access
//!
//! [`EntryStream`] implements [`std::io::Read`] and [`std::io::Seek`]. The
//! XOR keystream that encrypts payloads is a linear congruential generator
//! advanced once per 4-byte block; seeking repositions it in O(log n) using
//! precomputed composition tables, so backwards seeks do not re-decrypt from
//! the start of the entry.
//!
//! ## Error handling
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Parse errors abort [`Archive::open`];
//! no partially-built archive is ever returned.
//!
//! ## Concurrency
//!
//! The inode table is immutable after [`Archive::open`] and safe to share
//! between threads. Each [`EntryStream`] owns an independent file handle and
//! keystream, so concurrent readers simply open one stream each; a single
//! stream is not thread-safe.
//!
//! This crate never writes: archives are opened read-only and payloads are
//! stored uncompressed under XOR, so there is nothing to decompress.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod crypto;
pub mod error;
pub mod format;
pub mod read;
pub mod tree;

pub use error::{Error, Result};
pub use format::ArchiveFormat;
pub use read::{Archive, EntryStream};
pub use tree::{DirEntry, InodeId, InodeKind, ROOT_INODE, Stat};
