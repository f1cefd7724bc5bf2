use super::layout::Layout;
use crate::error::{MfrError, Result};
use crate::options::ReaderOptions;
use crate::store::{EntryHandle, FileStore};
use rayon::prelude::*;
use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, trace, warn};

/// Anchor for [`MultiFileReader::seek_raw`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

impl TryFrom<i32> for Whence {
    type Error = MfrError;

    /// POSIX numbering: 0 = start, 1 = current, 2 = end.
    fn try_from(v: i32) -> Result<Self> {
        match v {
            0 => Ok(Whence::Start),
            1 => Ok(Whence::Current),
            2 => Ok(Whence::End),
            _ => Err(MfrError::invalid(format!("invalid whence: {v}"))),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    EndOfStream,
}

/// Result of [`MultiFileReader::read_raw`]: bytes written into the buffer
/// plus how the call ended. `n` is meaningful on error too.
#[derive(Debug)]
pub struct ReadOutcome {
    pub n: usize,
    pub status: Result<Status>,
}

/// Reads an ordered list of entries from a [`FileStore`] as one seekable
/// stream, as if the entries had been concatenated.
///
/// Entry sizes are captured once by the constructor. At most one entry
/// handle is open at any time: it is opened on demand, and released when the
/// cursor runs off the end of its entry, on every seek, and on
/// [`close`](Self::close).
///
/// The reader is not reentrant. Sharing one instance between threads needs
/// external serialization; `&mut self` on every operation enforces this for
/// safe code.
pub struct MultiFileReader<S: FileStore> {
    store: S,
    entries: Vec<String>,
    layout: Layout,
    // virtual offset across all entries
    cursor: u64,
    // entry the cursor falls in; == entries.len() at end of stream
    current: usize,
    // cursor position inside `current`
    file_offset: u64,
    handle: Option<Box<dyn EntryHandle>>,
}

impl<S: FileStore> MultiFileReader<S> {
    pub fn new<I, P>(store: S, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self::with_options(store, entries, &ReaderOptions::default())
    }

    /// Stats every entry up front. Fails on the first (lowest-indexed)
    /// entry that is missing or cannot be stat'ed.
    pub fn with_options<I, P>(store: S, entries: I, opts: &ReaderOptions) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let entries: Vec<String> = entries.into_iter().map(Into::into).collect();
        let sizes = stat_all(&store, &entries, opts)?;
        let layout = Layout::new(sizes)?;
        debug!(
            entries = entries.len(),
            total_size = layout.total(),
            "multi-file reader ready"
        );
        Ok(Self {
            store,
            entries,
            layout,
            cursor: 0,
            current: 0,
            file_offset: 0,
            handle: None,
        })
    }

    pub fn total_size(&self) -> u64 {
        self.layout.total()
    }

    /// Current virtual offset.
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// `(entry index, offset within entry)` of the cursor. The index equals
    /// the entry count once the stream is exhausted.
    pub fn physical_position(&self) -> (usize, u64) {
        (self.current, self.file_offset)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn sizes(&self) -> &[u64] {
        self.layout.sizes()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Fills `buf` across as many entries as needed. Returns as soon as the
    /// buffer is full (`Status::Ok`) or the last entry is exhausted
    /// (`Status::EndOfStream`). On error, `n` still counts the bytes that
    /// were written before it.
    pub fn read_raw(&mut self, buf: &mut [u8]) -> ReadOutcome {
        let mut n = 0;
        let status = self.fill(buf, &mut n);
        trace!(
            requested = buf.len(),
            read = n,
            cursor = self.cursor,
            "read"
        );
        ReadOutcome { n, status }
    }

    fn fill(&mut self, buf: &mut [u8], read: &mut usize) -> Result<Status> {
        if buf.is_empty() {
            return Ok(Status::Ok);
        }
        loop {
            if self.handle.is_none() {
                if self.current >= self.entries.len() {
                    return Ok(Status::EndOfStream);
                }
                self.acquire()?;
            }
            let Some(handle) = self.handle.as_mut() else {
                return Ok(Status::EndOfStream);
            };

            // Never read past the size captured at construction, so the
            // cursor cannot outgrow the total even if the entry grew since.
            let remaining = self.layout.sizes()[self.current].saturating_sub(self.file_offset);
            let n = if remaining == 0 {
                0
            } else {
                if self.file_offset > 0 {
                    let got = handle.seek(SeekFrom::Start(self.file_offset))?;
                    if got != self.file_offset {
                        return Err(MfrError::Seek {
                            path: self.entries[self.current].clone(),
                            expected: self.file_offset,
                            got,
                        });
                    }
                }
                let want =
                    (buf.len() - *read).min(usize::try_from(remaining).unwrap_or(usize::MAX));
                handle.read(&mut buf[*read..*read + want])?
            };

            if n == 0 && remaining > 0 {
                // entry shrank since it was stat'ed; moving on would
                // desync the cursor from the layout
                return Err(MfrError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!(
                        "{} ended {} bytes short of its size",
                        self.entries[self.current], remaining
                    ),
                )));
            }

            if n == 0 {
                // end of this entry; move on to the next one
                self.release();
                self.current += 1;
                self.file_offset = 0;
                continue;
            }

            *read += n;
            self.file_offset += n as u64;
            self.cursor += n as u64;

            if *read == buf.len() {
                return Ok(Status::Ok);
            }
        }
    }

    /// Moves the cursor. Past-the-end targets clamp the cursor to the total
    /// size and report `(0, EndOfStream)`; exactly the total size reports
    /// `(total, Ok)`. Negative targets fail without touching any state.
    pub fn seek_raw(&mut self, offset: i64, whence: Whence) -> Result<(u64, Status)> {
        let base = match whence {
            Whence::Start => 0i128,
            Whence::Current => i128::from(self.cursor),
            Whence::End => i128::from(self.layout.total()),
        };
        let abs = base + i128::from(offset);
        if abs < 0 {
            return Err(MfrError::invalid("negative position"));
        }

        self.release();

        let located = u64::try_from(abs)
            .ok()
            .and_then(|a| self.layout.locate(a).map(|pos| (a, pos)));
        match located {
            Some((abs, (index, file_offset))) => {
                self.current = index;
                self.file_offset = file_offset;
                self.cursor = abs;
                debug!(abs, index, file_offset, "seek");
                Ok((abs, Status::Ok))
            }
            None => {
                let total = self.layout.total();
                self.current = self.entries.len();
                self.file_offset = 0;
                self.cursor = total;
                if abs == i128::from(total) {
                    debug!(abs = total, "seek to end");
                    Ok((total, Status::Ok))
                } else {
                    debug!(requested = %abs, total, "seek past end, clamped");
                    Ok((0, Status::EndOfStream))
                }
            }
        }
    }

    /// Releases the open handle, if any, returning its close result.
    /// Calling it again is a no-op. A later read reopens at the cursor.
    pub fn close(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(h) => {
                debug!(index = self.current, "close");
                h.close()?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn acquire(&mut self) -> Result<()> {
        // release before acquire
        self.release();
        let path = &self.entries[self.current];
        let h = self.store.open(path)?;
        debug!(index = self.current, path = %path, "open entry");
        self.handle = Some(h);
        Ok(())
    }

    fn release(&mut self) {
        if let Some(h) = self.handle.take() {
            if let Err(e) = h.close() {
                warn!(index = self.current, error = %e, "closing entry handle failed");
            }
            trace!(index = self.current, "released entry handle");
        }
    }
}

impl<S: FileStore> Drop for MultiFileReader<S> {
    fn drop(&mut self) {
        self.release();
    }
}

fn stat_all<S: FileStore>(
    store: &S,
    entries: &[String],
    opts: &ReaderOptions,
) -> Result<Vec<u64>> {
    if opts.parallel_stat && entries.len() >= opts.parallel_stat_threshold {
        // collect per-entry results first so the reported error is the
        // lowest-indexed one, same as the sequential path
        let stats: Vec<Result<u64>> = entries.par_iter().map(|e| store.stat(e)).collect();
        stats.into_iter().collect()
    } else {
        entries.iter().map(|e| store.stat(e)).collect()
    }
}

impl<S: FileStore> Read for MultiFileReader<S> {
    /// Bytes produced before an error are returned as a successful short
    /// read; the error comes back on the next call since the reader
    /// re-syncs the entry handle every time.
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let out = self.read_raw(buf);
        match out.status {
            Ok(_) => Ok(out.n),
            Err(_) if out.n > 0 => Ok(out.n),
            Err(e) => Err(e.into()),
        }
    }
}

impl<S: FileStore> Seek for MultiFileReader<S> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let (offset, whence) = match pos {
            // anything beyond i64::MAX is past the end anyway
            SeekFrom::Start(n) => (i64::try_from(n).unwrap_or(i64::MAX), Whence::Start),
            SeekFrom::Current(n) => (n, Whence::Current),
            SeekFrom::End(n) => (n, Whence::End),
        };
        match self.seek_raw(offset, whence)? {
            (abs, Status::Ok) => Ok(abs),
            (_, Status::EndOfStream) => Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "seek past end of stream",
            )),
        }
    }

    fn stream_position(&mut self) -> std::io::Result<u64> {
        Ok(self.cursor)
    }
}

impl<S: FileStore> fmt::Debug for MultiFileReader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiFileReader")
            .field("entries", &self.entries)
            .field("total_size", &self.layout.total())
            .field("cursor", &self.cursor)
            .field("current", &self.current)
            .field("file_offset", &self.file_offset)
            .field("open", &self.handle.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use std::io::{Cursor, ErrorKind};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn two_files() -> MemStore {
        MemStore::new()
            .with("file1.txt", "file1 content")
            .with("file2.txt", "file2 content")
    }

    #[test]
    fn read_crosses_boundary_in_one_call() {
        let mut r = MultiFileReader::new(two_files(), ["file1.txt", "file2.txt"]).unwrap();
        assert_eq!(r.seek_raw(11, Whence::Start).unwrap(), (11, Status::Ok));
        assert_eq!(r.physical_position(), (0, 11));

        let mut buf = [0u8; 5];
        let out = r.read_raw(&mut buf);
        assert_eq!(out.n, 5);
        assert_eq!(out.status.unwrap(), Status::Ok);
        assert_eq!(&buf, b"ntfil");
        assert_eq!(r.position(), 16);
        assert_eq!(r.physical_position(), (1, 3));
    }

    #[test]
    fn end_of_stream_comes_with_last_bytes() {
        let mut r = MultiFileReader::new(two_files(), ["file1.txt", "file2.txt"]).unwrap();
        let mut buf = [0u8; 64];
        let out = r.read_raw(&mut buf);
        assert_eq!(out.n, 26);
        assert_eq!(out.status.unwrap(), Status::EndOfStream);
        assert_eq!(&buf[..26], b"file1 contentfile2 content");
        assert!(!r.is_open());
        assert_eq!(r.physical_position(), (2, 0));

        let out = r.read_raw(&mut buf);
        assert_eq!(out.n, 0);
        assert_eq!(out.status.unwrap(), Status::EndOfStream);
    }

    #[test]
    fn empty_buffer_is_a_no_op() {
        let mut r = MultiFileReader::new(two_files(), ["file1.txt"]).unwrap();
        let out = r.read_raw(&mut []);
        assert_eq!(out.n, 0);
        assert_eq!(out.status.unwrap(), Status::Ok);
        assert!(!r.is_open());
    }

    #[test]
    fn whence_from_int() {
        assert_eq!(Whence::try_from(0).unwrap(), Whence::Start);
        assert_eq!(Whence::try_from(1).unwrap(), Whence::Current);
        assert_eq!(Whence::try_from(2).unwrap(), Whence::End);
        let err = Whence::try_from(3).unwrap_err();
        assert!(err.to_string().contains("invalid whence"));
    }

    #[test]
    fn seek_relative_anchors() {
        let mut r = MultiFileReader::new(two_files(), ["file1.txt", "file2.txt"]).unwrap();
        assert_eq!(r.seek_raw(20, Whence::Start).unwrap(), (20, Status::Ok));
        assert_eq!(r.seek_raw(-4, Whence::Current).unwrap(), (16, Status::Ok));
        assert_eq!(r.seek_raw(-26, Whence::End).unwrap(), (0, Status::Ok));
        assert_eq!(r.seek_raw(0, Whence::End).unwrap(), (26, Status::Ok));
        assert_eq!(
            r.seek_raw(i64::MAX, Whence::End).unwrap(),
            (0, Status::EndOfStream)
        );
        assert_eq!(r.position(), 26);
    }

    // Handle instrumentation: counts live handles and can misreport seeks.
    struct Tracked {
        inner: Cursor<Vec<u8>>,
        live: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
        seek_skew: u64,
    }

    impl Read for Tracked {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Seek for Tracked {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            Ok(self.inner.seek(pos)? + self.seek_skew)
        }
    }

    impl EntryHandle for Tracked {
        fn close(self: Box<Self>) -> std::io::Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    struct TrackedStore {
        mem: MemStore,
        live: Arc<AtomicUsize>,
        max_live: Arc<AtomicUsize>,
        opens: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
        seek_skew: u64,
    }

    impl TrackedStore {
        fn new(mem: MemStore) -> Self {
            Self {
                mem,
                live: Arc::default(),
                max_live: Arc::default(),
                opens: Arc::default(),
                closes: Arc::default(),
                seek_skew: 0,
            }
        }
    }

    impl FileStore for TrackedStore {
        fn stat(&self, path: &str) -> Result<u64> {
            self.mem.stat(path)
        }

        fn open(&self, path: &str) -> Result<Box<dyn EntryHandle>> {
            let mut data = Vec::new();
            self.mem.open(path)?.read_to_end(&mut data)?;
            let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_live.fetch_max(now, Ordering::SeqCst);
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Tracked {
                inner: Cursor::new(data),
                live: Arc::clone(&self.live),
                closes: Arc::clone(&self.closes),
                seek_skew: self.seek_skew,
            }))
        }
    }

    #[test]
    fn at_most_one_handle_is_ever_open() {
        let mem = MemStore::new()
            .with("a", "aaaa")
            .with("b", "")
            .with("c", "cc")
            .with("d", "dddddd");
        let store = TrackedStore::new(mem);
        let live = Arc::clone(&store.live);
        let max_live = Arc::clone(&store.max_live);
        let opens = Arc::clone(&store.opens);

        let mut r = MultiFileReader::new(store, ["a", "b", "c", "d"]).unwrap();
        assert_eq!(opens.load(Ordering::SeqCst), 0);

        let mut out = Vec::new();
        let mut buf = [0u8; 3];
        loop {
            let o = r.read_raw(&mut buf);
            out.extend_from_slice(&buf[..o.n]);
            if o.status.unwrap() == Status::EndOfStream {
                break;
            }
        }
        assert_eq!(out, b"aaaaccdddddd");
        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert_eq!(max_live.load(Ordering::SeqCst), 1);

        r.seek_raw(5, Whence::Start).unwrap();
        assert_eq!(r.read_raw(&mut buf).n, 3);
        assert_eq!(live.load(Ordering::SeqCst), 1);
        r.seek_raw(0, Whence::Current).unwrap();
        assert_eq!(live.load(Ordering::SeqCst), 0);

        r.read_raw(&mut buf);
        r.close().unwrap();
        r.close().unwrap();
        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert_eq!(max_live.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_closes_open_handle() {
        let store = TrackedStore::new(two_files());
        let live = Arc::clone(&store.live);
        let opens = Arc::clone(&store.opens);
        let closes = Arc::clone(&store.closes);

        let mut r = MultiFileReader::new(store, ["file1.txt", "file2.txt"]).unwrap();
        let mut buf = [0u8; 15];
        assert_eq!(r.read_raw(&mut buf).n, 15);
        assert!(r.is_open());
        drop(r);

        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert_eq!(opens.load(Ordering::SeqCst), 2);
        assert_eq!(closes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn lying_seek_is_a_hard_error() {
        let mut store = TrackedStore::new(MemStore::new().with("a", "0123456789"));
        store.seek_skew = 1;
        let mut r = MultiFileReader::new(store, ["a"]).unwrap();
        r.seek_raw(4, Whence::Start).unwrap();

        let mut buf = [0u8; 4];
        let out = r.read_raw(&mut buf);
        assert_eq!(out.n, 0);
        match out.status {
            Err(MfrError::Seek { expected, got, .. }) => {
                assert_eq!((expected, got), (4, 5));
            }
            other => panic!("expected seek error, got {other:?}"),
        }
        assert_eq!(r.position(), 4);
    }

    #[test]
    fn open_failure_reports_partial_count() {
        let mut mem = two_files();
        let store_for_stat = mem.clone();
        mem.remove("file2.txt");

        // sizes come from the full store, opens from the one missing file2
        struct Split(MemStore, MemStore);
        impl FileStore for Split {
            fn stat(&self, path: &str) -> Result<u64> {
                self.0.stat(path)
            }
            fn open(&self, path: &str) -> Result<Box<dyn EntryHandle>> {
                self.1.open(path)
            }
        }

        let mut r = MultiFileReader::new(Split(store_for_stat, mem), ["file1.txt", "file2.txt"])
            .unwrap();
        let mut buf = [0u8; 20];
        let out = r.read_raw(&mut buf);
        assert_eq!(out.n, 13);
        assert!(matches!(out.status, Err(MfrError::Open { ref path, .. }) if path == "file2.txt"));

        // std adapter: short read first, then the error
        r.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(r.read(&mut buf).unwrap(), 13);
        let err = r.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[test]
    fn io_seek_maps_degenerate_cases_to_errors() {
        let mut r = MultiFileReader::new(two_files(), ["file1.txt", "file2.txt"]).unwrap();
        assert_eq!(r.seek(SeekFrom::End(0)).unwrap(), 26);
        let err = r.seek(SeekFrom::Start(27)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
        assert_eq!(r.stream_position().unwrap(), 26);

        let err = r.seek(SeekFrom::Current(-27)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(r.stream_position().unwrap(), 26);

        let err = r.seek(SeekFrom::Start(u64::MAX)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }
}
