//! Content-block reference resolution.
//!
//! Control rows and digest entries point at markdown blocks by reference:
//!
//! | reference            | resolves to                    |
//! |----------------------|--------------------------------|
//! | `""`                 | no block (empty body)          |
//! | `/abs/path.md`       | the absolute path as given     |
//! | `notes/intro.md`     | `<content root>/notes/intro.md`|
//! | `intro.md`           | `<content root>/blocks/intro.md` |
//!
//! Whatever the form, the resolved file must live inside the content root.
//! Existing files are canonicalized (following symlinks) and compared
//! component-wise against the canonical root; references to files that do not
//! exist are normalized lexically so an escaping `../` is still reported as an
//! escape rather than a missing file. Both cases abort the build.

use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directory bare block names resolve into.
pub const BLOCKS_DIR: &str = "blocks";

#[derive(Error, Debug)]
pub enum BlockError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Content block '{reference}' resolves outside the content root")]
    OutsideRoot { reference: String },
    #[error("Content block '{reference}' not found at {path}")]
    Missing { reference: String, path: PathBuf },
}

/// Resolves and reads block references relative to one content root.
#[derive(Debug, Clone)]
pub struct BlockResolver {
    root: PathBuf,
}

impl BlockResolver {
    pub fn new(content_root: &Path) -> Result<Self, BlockError> {
        Ok(Self {
            root: content_root.canonicalize()?,
        })
    }

    /// Canonical content root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidate(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() {
            path.to_path_buf()
        } else if reference.contains(['/', '\\']) {
            self.root.join(path)
        } else {
            self.root.join(BLOCKS_DIR).join(path)
        }
    }

    /// Resolve a reference to a file inside the content root.
    ///
    /// Returns `Ok(None)` for an empty reference.
    pub fn resolve(&self, reference: &str) -> Result<Option<PathBuf>, BlockError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Ok(None);
        }
        self.contain(&self.candidate(reference), reference).map(Some)
    }

    /// Check that `candidate` lies inside the content root and return its
    /// canonical path. `reference` is how the caller names it in errors.
    ///
    /// Used directly for paths that do not follow block naming, such as the
    /// source files listed in the blog post table.
    pub fn contain(&self, candidate: &Path, reference: &str) -> Result<PathBuf, BlockError> {
        if candidate.exists() {
            let canonical = candidate.canonicalize()?;
            if !canonical.starts_with(&self.root) {
                return Err(BlockError::OutsideRoot {
                    reference: reference.to_string(),
                });
            }
            return Ok(canonical);
        }

        match lexical_normalize(candidate) {
            Some(normalized) if normalized.starts_with(&self.root) => Err(BlockError::Missing {
                reference: reference.to_string(),
                path: normalized,
            }),
            _ => Err(BlockError::OutsideRoot {
                reference: reference.to_string(),
            }),
        }
    }

    /// Resolve and read a block. Empty references yield an empty body.
    pub fn read(&self, reference: &str) -> Result<(Option<PathBuf>, String), BlockError> {
        match self.resolve(reference)? {
            Some(path) => {
                let body = fs::read_to_string(&path)?;
                Ok((Some(path), body))
            }
            None => Ok((None, String::new())),
        }
    }
}

/// Collapse `.` and `..` without touching the filesystem.
///
/// Returns `None` when `..` climbs above the first component.
pub(crate) fn lexical_normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    Some(out)
}
