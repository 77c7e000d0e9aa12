//! Archive opening and querying.
//!
//! [`Archive::open`] parses the container metadata and builds the inode
//! table in one pass; afterwards the archive is immutable and every query is
//! an in-memory lookup. Payloads are only touched when a stream is opened.
//!
//! # Example
//!
//! ```rust,no_run
//! use rgssvfs::{Archive, ROOT_INODE};
//!
//! # fn main() -> rgssvfs::Result<()> {
//! let archive = Archive::open("Game.rgssad")?;
//! for entry in archive.readdir(ROOT_INODE, 0)? {
//!     println!("{} -> inode {}", entry.name, entry.id);
//! }
//! # Ok(())
//! # }
//! ```

mod stream;

pub use stream::EntryStream;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::format::parser::EntryParser;
use crate::format::{ArchiveFormat, HEADER_LEN, detect_format};
use crate::tree::{DirEntry, DirectoryTree, InodeId, ROOT_INODE, Stat};
use crate::{Error, Result};

/// An opened RGSSAD archive.
///
/// Holds the parsed inode table and the archive's path; each entry stream
/// reopens the file so streams never share a cursor. The table is immutable
/// after [`open`][Self::open] and safe to share across threads.
#[derive(Debug)]
pub struct Archive {
    path: PathBuf,
    format: ArchiveFormat,
    tree: DirectoryTree,
}

impl Archive {
    /// Opens and fully indexes an archive.
    ///
    /// # Errors
    ///
    /// * [`Error::UnsupportedFormat`] — the file does not start with a
    ///   known container header.
    /// * [`Error::Truncated`] — the metadata ends mid-record or declares a
    ///   payload past the end of the file.
    /// * [`Error::InvalidName`] / [`Error::InvalidPath`] — an entry name is
    ///   not UTF-8 or its path is unusable.
    /// * [`Error::Io`] — the file could not be read.
    ///
    /// No partially-indexed archive is ever returned.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;
        let file_size = file.metadata()?.len();

        let mut header = [0u8; HEADER_LEN];
        file.read_exact(&mut header).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::UnsupportedFormat("file too short to hold a header".into())
            } else {
                Error::Io(e)
            }
        })?;
        let format = detect_format(&header)?;
        log::debug!("opening {} archive {}", format, path.display());

        let mut tree = DirectoryTree::new();
        for entry in EntryParser::new(&mut file, format, file_size)? {
            let entry = entry?;
            tree.insert_path(&entry.path, entry.offset, entry.size, entry.key)?;
        }
        log::debug!("indexed {} file(s)", tree.file_count());

        Ok(Self { path, format, tree })
    }

    /// The detected container format.
    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Path of the archive file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inode id of the root directory.
    pub fn root_inode(&self) -> InodeId {
        ROOT_INODE
    }

    /// Iterates over the children of a directory, starting at `offset`
    /// (0-based, inclusive) into the child list.
    ///
    /// The synthetic `.` and `..` entries occupy positions 0 and 1, so
    /// `readdir(inode, 0)` yields them first and a caller resuming from a
    /// previously returned position passes that position straight back.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for an unknown inode, [`Error::NotADirectory`]
    /// for a file inode.
    pub fn readdir(
        &self,
        inode: InodeId,
        offset: usize,
    ) -> Result<impl Iterator<Item = &DirEntry>> {
        let children = self.tree.children(inode)?;
        Ok(children.get(offset..).unwrap_or_default().iter())
    }

    /// Finds `name` among the children of `parent`.
    ///
    /// Returns `None` when the parent does not exist, is not a directory,
    /// or has no child of that name. The synthetic `.` and `..` entries are
    /// matched like any other child.
    pub fn lookup(&self, parent: InodeId, name: &str) -> Option<InodeId> {
        self.tree.lookup(parent, name)
    }

    /// Resolves a POSIX-style path (forward slashes, optionally absolute)
    /// from the root.
    pub fn lookup_path(&self, path: &str) -> Option<InodeId> {
        self.tree.lookup_path(path)
    }

    /// Kind and size of an inode.
    pub fn stat(&self, inode: InodeId) -> Result<Stat> {
        self.tree.stat(inode)
    }

    /// Whether an inode id is valid in this archive.
    pub fn exists(&self, inode: InodeId) -> bool {
        self.tree.exists(inode)
    }

    /// Whether the inode is a file.
    pub fn is_file(&self, inode: InodeId) -> bool {
        self.tree.is_file(inode)
    }

    /// Whether the inode is a directory.
    pub fn is_dir(&self, inode: InodeId) -> bool {
        self.tree.is_dir(inode)
    }

    /// Number of files in the archive.
    pub fn file_count(&self) -> usize {
        self.tree.file_count()
    }

    /// All file paths in the archive, depth-first, with `/` separators.
    pub fn paths(&self) -> Vec<String> {
        self.tree.paths()
    }

    /// Opens a decrypting, seekable stream over a file inode.
    ///
    /// The stream holds its own file handle and keystream; streams opened
    /// from the same archive are fully independent.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for an unknown inode, [`Error::NotAFile`] for a
    /// directory, [`Error::Io`] if the archive file cannot be reopened.
    pub fn open_entry(&self, inode: InodeId) -> Result<EntryStream> {
        let (offset, size, key) = self.tree.file_meta(inode)?;
        EntryStream::open(&self.path, offset, size, key)
    }

    /// Reads a whole entry into memory.
    pub fn read_to_vec(&self, inode: InodeId) -> Result<Vec<u8>> {
        self.open_entry(inode)?.read_to_vec()
    }
}
