//! The inode table and directory tree of an opened archive.
//!
//! Inodes live in an append-only array indexed by [`InodeId`]; id 0 is the
//! root directory. A directory's children are an ordered vector of
//! `(id, name)` pairs whose first two entries are always the synthetic `.`
//! and `..` (the root's `..` points back at the root). Files carry the
//! payload location and keystream seed recorded by the parser.
//!
//! Entry paths in the archive use backslash separators and arbitrary depth;
//! the builder splits them into components, creating intermediate
//! directories on demand. Empty directories never occur in RGSSAD archives
//! and are never constructed.

use crate::{Error, Result};

/// Index into an archive's inode table.
pub type InodeId = usize;

/// Inode id of the root directory.
pub const ROOT_INODE: InodeId = 0;

/// Whether an inode is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InodeKind {
    /// A directory with child entries.
    Directory,
    /// A regular file backed by an archive payload.
    File,
}

/// Metadata for one inode, as reported by [`Archive::stat`].
///
/// [`Archive::stat`]: crate::Archive::stat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// File or directory.
    pub kind: InodeKind,
    /// Payload size in bytes; 0 for directories.
    pub size: u64,
}

/// One entry in a directory's child list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Inode id of the child.
    pub id: InodeId,
    /// Name of the child within this directory.
    pub name: String,
}

#[derive(Debug)]
pub(crate) enum Inode {
    Directory {
        children: Vec<DirEntry>,
    },
    File {
        offset: u64,
        size: u32,
        key: u32,
    },
}

/// The immutable-after-build inode index of an archive.
#[derive(Debug)]
pub(crate) struct DirectoryTree {
    inodes: Vec<Inode>,
}

impl DirectoryTree {
    pub(crate) fn new() -> Self {
        Self {
            inodes: vec![Inode::Directory {
                children: vec![
                    DirEntry {
                        id: ROOT_INODE,
                        name: ".".into(),
                    },
                    DirEntry {
                        id: ROOT_INODE,
                        name: "..".into(),
                    },
                ],
            }],
        }
    }

    fn get(&self, inode: InodeId) -> Option<&Inode> {
        self.inodes.get(inode)
    }

    /// Appends a directory inode under `parent` and returns its id.
    fn mkdir(&mut self, parent: InodeId, name: &str) -> InodeId {
        let id = self.inodes.len();
        self.inodes.push(Inode::Directory {
            children: vec![
                DirEntry {
                    id,
                    name: ".".into(),
                },
                DirEntry {
                    id: parent,
                    name: "..".into(),
                },
            ],
        });
        self.push_child(parent, id, name);
        id
    }

    fn push_child(&mut self, parent: InodeId, id: InodeId, name: &str) {
        match &mut self.inodes[parent] {
            Inode::Directory { children } => children.push(DirEntry {
                id,
                name: name.to_string(),
            }),
            Inode::File { .. } => unreachable!("parent inode is always a directory"),
        }
    }

    /// Walks to `name` under `parent`, creating the directory if absent.
    fn ensure_dir(&mut self, parent: InodeId, name: &str) -> Result<InodeId> {
        match self.lookup(parent, name) {
            Some(id) => match self.get(id) {
                Some(Inode::Directory { .. }) => Ok(id),
                _ => Err(Error::NotADirectory { inode: id }),
            },
            None => Ok(self.mkdir(parent, name)),
        }
    }

    /// Inserts a file entry at a backslash-separated archive path, creating
    /// intermediate directories.
    pub(crate) fn insert_path(
        &mut self,
        path: &str,
        offset: u64,
        size: u32,
        key: u32,
    ) -> Result<InodeId> {
        let components = normalize(path).ok_or_else(|| Error::InvalidPath(path.to_string()))?;
        let (name, dirs) = components
            .split_last()
            .ok_or_else(|| Error::InvalidPath(path.to_string()))?;

        let mut dir = ROOT_INODE;
        for component in dirs {
            dir = self.ensure_dir(dir, component)?;
        }

        let file = Inode::File { offset, size, key };
        match self.lookup(dir, name) {
            // A later entry with the same path shadows the earlier one; the
            // inode is overwritten in place so child names stay unique.
            Some(existing) => match &mut self.inodes[existing] {
                slot @ Inode::File { .. } => {
                    log::warn!("duplicate entry {path:?}; keeping the later one");
                    *slot = file;
                    Ok(existing)
                }
                Inode::Directory { .. } => Err(Error::NotADirectory { inode: existing }),
            },
            None => {
                let id = self.inodes.len();
                self.inodes.push(file);
                self.push_child(dir, id, name);
                Ok(id)
            }
        }
    }

    /// Child entries of a directory inode.
    pub(crate) fn children(&self, inode: InodeId) -> Result<&[DirEntry]> {
        match self.get(inode) {
            Some(Inode::Directory { children }) => Ok(children),
            Some(Inode::File { .. }) => Err(Error::NotADirectory { inode }),
            None => Err(Error::NotFound { inode }),
        }
    }

    /// Finds `name` among the children of `parent`.
    pub(crate) fn lookup(&self, parent: InodeId, name: &str) -> Option<InodeId> {
        match self.get(parent)? {
            Inode::Directory { children } => children
                .iter()
                .find(|entry| entry.name == name)
                .map(|entry| entry.id),
            Inode::File { .. } => None,
        }
    }

    /// Resolves a forward-slash path from the root.
    ///
    /// `.` components are skipped; `..` resolves through the synthetic
    /// parent entry, so it can never escape the root.
    pub(crate) fn lookup_path(&self, path: &str) -> Option<InodeId> {
        let mut inode = ROOT_INODE;
        for component in path.split('/') {
            if component.is_empty() || component == "." {
                continue;
            }
            inode = self.lookup(inode, component)?;
        }
        Some(inode)
    }

    pub(crate) fn stat(&self, inode: InodeId) -> Result<Stat> {
        match self.get(inode) {
            Some(Inode::Directory { .. }) => Ok(Stat {
                kind: InodeKind::Directory,
                size: 0,
            }),
            Some(Inode::File { size, .. }) => Ok(Stat {
                kind: InodeKind::File,
                size: u64::from(*size),
            }),
            None => Err(Error::NotFound { inode }),
        }
    }

    pub(crate) fn exists(&self, inode: InodeId) -> bool {
        inode < self.inodes.len()
    }

    pub(crate) fn is_file(&self, inode: InodeId) -> bool {
        matches!(self.get(inode), Some(Inode::File { .. }))
    }

    pub(crate) fn is_dir(&self, inode: InodeId) -> bool {
        matches!(self.get(inode), Some(Inode::Directory { .. }))
    }

    /// Payload location and seed of a file inode.
    pub(crate) fn file_meta(&self, inode: InodeId) -> Result<(u64, u32, u32)> {
        match self.get(inode) {
            Some(Inode::File { offset, size, key }) => Ok((*offset, *size, *key)),
            Some(Inode::Directory { .. }) => Err(Error::NotAFile { inode }),
            None => Err(Error::NotFound { inode }),
        }
    }

    pub(crate) fn file_count(&self) -> usize {
        self.inodes
            .iter()
            .filter(|inode| matches!(inode, Inode::File { .. }))
            .count()
    }

    /// All file paths in the tree, depth-first, with `/` separators.
    pub(crate) fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths(ROOT_INODE, String::new(), &mut out);
        out
    }

    fn collect_paths(&self, inode: InodeId, prefix: String, out: &mut Vec<String>) {
        let Some(Inode::Directory { children }) = self.get(inode) else {
            return;
        };
        for entry in children.iter().skip(2) {
            let path = if prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{prefix}/{}", entry.name)
            };
            match self.get(entry.id) {
                Some(Inode::File { .. }) => out.push(path),
                Some(Inode::Directory { .. }) => self.collect_paths(entry.id, path, out),
                None => {}
            }
        }
    }
}

/// Splits an archive path on both separator styles and resolves `.` and
/// `..` components lexically. Returns `None` when the path normalizes to
/// nothing or would climb above the root.
fn normalize(path: &str) -> Option<Vec<&str>> {
    let mut components = Vec::new();
    for component in path.split(['\\', '/']) {
        match component {
            "" | "." => {}
            ".." => {
                components.pop()?;
            }
            name => components.push(name),
        }
    }
    if components.is_empty() {
        None
    } else {
        Some(components)
    }
}
