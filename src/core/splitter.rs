// File: src/core/splitter.rs

/// Longest fragment considered by the default splitter, in characters.
pub const DEFAULT_MAX_FRAGMENT: usize = 24;

/// Enumerates the ways to cut a leading fragment off a string.
pub trait Splitter {
    /// Byte offsets `cut` such that `text.split_at(cut)` is a candidate
    /// `(first_fragment, rest)` pair. Every offset is a char boundary in `1..=text.len()`.
    fn split_points(&self, text: &str) -> Vec<usize>;
}

/// Offers every prefix up to `max_len` characters, shortest first.
#[derive(Debug, Clone, Copy)]
pub struct PrefixSplitter {
    max_len: usize,
}

impl PrefixSplitter {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }
}

impl Default for PrefixSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAGMENT)
    }
}

impl Splitter for PrefixSplitter {
    fn split_points(&self, text: &str) -> Vec<usize> {
        text.char_indices()
            .skip(1)
            .map(|(idx, _)| idx)
            .chain(std::iter::once(text.len()))
            .filter(|&idx| idx > 0)
            .take(self.max_len)
            .collect()
    }
}
