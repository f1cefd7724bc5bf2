use crate::error::{MfrError, Result};

/// Sizes of the concatenated entries and the arithmetic that maps a virtual
/// offset onto `(entry index, offset within entry)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    sizes: Vec<u64>,
    total: u64,
}

impl Layout {
    pub fn new(sizes: Vec<u64>) -> Result<Self> {
        let total = sizes
            .iter()
            .try_fold(0u64, |acc, &s| acc.checked_add(s))
            .ok_or_else(|| MfrError::invalid("combined entry size overflows u64"))?;
        Ok(Self { sizes, total })
    }

    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Entry holding byte `abs`, scanning from the first entry. Empty entries
    /// never hold a byte, so they are skipped. `None` once `abs >= total`.
    pub fn locate(&self, abs: u64) -> Option<(usize, u64)> {
        let mut start = 0u64;
        for (i, &size) in self.sizes.iter().enumerate() {
            if start + size > abs {
                return Some((i, abs - start));
            }
            start += size;
        }
        None
    }
}
