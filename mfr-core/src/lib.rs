#![forbid(unsafe_code)]

pub mod domain;
pub mod error;
pub mod options;
pub mod store;

pub mod util {
    pub mod hash_read;
    pub mod hex;
}

pub mod read {
    pub mod layout;
    pub mod stream;
}

pub mod list;

// Re-exports: stable API surface
pub use list::collect_entries;
pub use options::ReaderOptions;
pub use read::layout::Layout;
pub use read::stream::{MultiFileReader, ReadOutcome, Status, Whence};
pub use store::{DirStore, EntryHandle, FileStore, MemStore};
pub use util::hash_read::{HashingReader, digest_reader};
