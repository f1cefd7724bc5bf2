/// Knobs for building a [`crate::MultiFileReader`].
#[derive(Clone, Debug)]
pub struct ReaderOptions {
    /// Stat entries on the rayon pool instead of one after another.
    pub parallel_stat: bool,
    /// Below this many entries the sequential path is used even when
    /// `parallel_stat` is set.
    pub parallel_stat_threshold: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            parallel_stat: true,
            parallel_stat_threshold: 64,
        }
    }
}
