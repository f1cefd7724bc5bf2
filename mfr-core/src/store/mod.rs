// mfr_core/src/store/mod.rs
use crate::error::Result;
use std::io::{Cursor, Read, Seek};
use std::sync::Arc;

pub mod dir;
pub mod mem;

pub use dir::DirStore;
pub use mem::MemStore;

/// An open, seekable view of one entry's bytes.
///
/// Releasing a handle goes through [`EntryHandle::close`] so stores whose
/// handles can fail on release get a chance to report it. The default just
/// drops the handle.
pub trait EntryHandle: Read + Seek + Send {
    fn close(self: Box<Self>) -> std::io::Result<()> {
        Ok(())
    }
}

impl EntryHandle for std::fs::File {}

impl<T: AsRef<[u8]> + Send> EntryHandle for Cursor<T> {}

/// Where entries come from: a size lookup and a way to open one entry.
///
/// `stat` reports `NotFound` for a missing entry and `Stat` for any other
/// metadata failure; `open` reports `Open`.
pub trait FileStore: Send + Sync {
    fn stat(&self, path: &str) -> Result<u64>;

    fn open(&self, path: &str) -> Result<Box<dyn EntryHandle>>;
}

impl<T: FileStore + ?Sized> FileStore for &T {
    fn stat(&self, path: &str) -> Result<u64> {
        (**self).stat(path)
    }

    fn open(&self, path: &str) -> Result<Box<dyn EntryHandle>> {
        (**self).open(path)
    }
}

impl<T: FileStore + ?Sized> FileStore for Box<T> {
    fn stat(&self, path: &str) -> Result<u64> {
        (**self).stat(path)
    }

    fn open(&self, path: &str) -> Result<Box<dyn EntryHandle>> {
        (**self).open(path)
    }
}

impl<T: FileStore + ?Sized> FileStore for Arc<T> {
    fn stat(&self, path: &str) -> Result<u64> {
        (**self).stat(path)
    }

    fn open(&self, path: &str) -> Result<Box<dyn EntryHandle>> {
        (**self).open(path)
    }
}
