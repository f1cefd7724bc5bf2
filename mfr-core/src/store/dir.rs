use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{MfrError, Result};
use crate::store::{EntryHandle, FileStore};

/// Entries are `/`-separated paths relative to a host directory.
#[derive(Clone, Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, rel: &str) -> Result<PathBuf> {
        if rel.is_empty() || rel.starts_with('/') || Path::new(rel).is_absolute() {
            return Err(MfrError::invalid(format!("unsafe path: {rel:?}")));
        }
        let mut p = self.root.clone();
        for seg in rel.split('/') {
            if seg.is_empty() || seg == "." || seg == ".." || seg.contains('\\') {
                return Err(MfrError::invalid(format!("unsafe path: {rel:?}")));
            }
            p.push(seg);
        }
        Ok(p)
    }
}

impl FileStore for DirStore {
    fn stat(&self, path: &str) -> Result<u64> {
        let full = self.resolve(path)?;
        let md = std::fs::metadata(&full).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                MfrError::NotFound {
                    path: path.to_string(),
                }
            } else {
                MfrError::Stat {
                    path: path.to_string(),
                    source: e,
                }
            }
        })?;
        if !md.is_file() {
            return Err(MfrError::Stat {
                path: path.to_string(),
                source: std::io::Error::new(ErrorKind::Other, "not a regular file"),
            });
        }
        Ok(md.len())
    }

    fn open(&self, path: &str) -> Result<Box<dyn EntryHandle>> {
        let full = self.resolve(path)?;
        let f = File::open(&full).map_err(|e| MfrError::Open {
            path: path.to_string(),
            source: e,
        })?;
        Ok(Box::new(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_paths_escaping_root() {
        let store = DirStore::new("/tmp/mfr-root");
        for bad in ["", "/etc/passwd", "../x", "a/../b", "a//b", "./a", "a/", "a\\b"] {
            assert!(
                matches!(store.resolve(bad), Err(MfrError::InvalidArgument(_))),
                "{bad:?} should be rejected"
            );
        }
        assert_eq!(
            store.resolve("a/b.txt").unwrap(),
            Path::new("/tmp/mfr-root").join("a").join("b.txt")
        );
    }
}
