use std::io::{Read, Result};

/// Read adapter that feeds everything passing through into a blake3 hasher.
pub struct HashingReader<'a, R: Read> {
    inner: R,
    hasher: &'a mut blake3::Hasher,
    pub counted: u64,
}

impl<'a, R: Read> HashingReader<'a, R> {
    pub fn new(inner: R, hasher: &'a mut blake3::Hasher) -> Self {
        Self {
            inner,
            hasher,
            counted: 0,
        }
    }
}

impl<'a, R: Read> Read for HashingReader<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.counted += n as u64;
        Ok(n)
    }
}

/// Drains `r`, returning the blake3 digest and byte count of what it produced.
pub fn digest_reader<R: Read>(r: R) -> Result<(blake3::Hash, u64)> {
    let mut hasher = blake3::Hasher::new();
    let mut hr = HashingReader::new(r, &mut hasher);
    std::io::copy(&mut hr, &mut std::io::sink())?;
    let n = hr.counted;
    Ok((hasher.finalize(), n))
}
