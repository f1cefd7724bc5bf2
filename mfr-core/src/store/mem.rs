use std::collections::BTreeMap;
use std::io::{Cursor, ErrorKind};
use std::sync::Arc;

use crate::error::{MfrError, Result};
use crate::store::{EntryHandle, FileStore};

/// In-memory store; every open hands out an independent cursor over shared bytes.
#[derive(Clone, Debug, Default)]
pub struct MemStore {
    files: BTreeMap<String, Arc<[u8]>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), Arc::from(data.into()));
    }

    pub fn remove(&mut self, path: &str) -> bool {
        self.files.remove(path).is_some()
    }
}

impl FileStore for MemStore {
    fn stat(&self, path: &str) -> Result<u64> {
        self.files
            .get(path)
            .map(|d| d.len() as u64)
            .ok_or_else(|| MfrError::NotFound {
                path: path.to_string(),
            })
    }

    fn open(&self, path: &str) -> Result<Box<dyn EntryHandle>> {
        let data = self.files.get(path).ok_or_else(|| MfrError::Open {
            path: path.to_string(),
            source: std::io::Error::new(ErrorKind::NotFound, "no such entry"),
        })?;
        Ok(Box::new(Cursor::new(Arc::clone(data))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn stat_and_open() {
        let store = MemStore::new().with("b", "bee").with("a", "ay");
        assert_eq!(store.stat("a").unwrap(), 2);
        assert_eq!(store.stat("b").unwrap(), 3);
        assert!(matches!(store.stat("c"), Err(MfrError::NotFound { .. })));

        let mut s = String::new();
        store.open("b").unwrap().read_to_string(&mut s).unwrap();
        assert_eq!(s, "bee");
        assert!(matches!(store.open("c"), Err(MfrError::Open { .. })));
    }
}
