//! Stable key → color pair assignment.
//!
//! A word's color is a pure function of its text: a small multiplicative
//! string hash, reduced modulo the palette length. No per-process seed, so
//! the same host name is the same color in every run and on every machine.
//!
//! Assignments are memoized in a map that is never evicted. Keys are the
//! words the catalog extracts (hosts, services, error codes), a set that is
//! bounded in practice; a catalog that extracts unbounded values such as
//! timestamps grows the map for the life of the process.

use std::collections::HashMap;

use crate::palette::{ColorPair, Palette};

/// Order- and length-sensitive 32-bit string hash.
///
/// For each character at position `i`:
///   h = h * 33 + codepoint * (i + 1)
/// then h += char count * 31, all modulo 2³².
///
/// # Examples
///
/// ```
/// use pw_theme::allocator::stable_hash;
///
/// assert_eq!(stable_hash("a"), 128);
/// assert_ne!(stable_hash("ab"), stable_hash("ba"));
/// ```
#[must_use]
pub fn stable_hash(key: &str) -> u32 {
    let mut h: u32 = 0;
    let mut count: u32 = 0;
    for (i, ch) in (1u32..).zip(key.chars()) {
        h = h
            .wrapping_shl(5)
            .wrapping_add(h)
            .wrapping_add(u32::from(ch).wrapping_mul(i));
        count = i;
    }
    h.wrapping_add(count.wrapping_mul(31))
}

/// Memoizing key → [`ColorPair`] allocator over a fixed [`Palette`].
#[derive(Debug, Clone)]
pub struct ColorAllocator {
    palette: Palette,
    assigned: HashMap<String, usize>,
}

impl ColorAllocator {
    /// Allocator over `palette`, or over the standard palette if `palette`
    /// is empty.
    #[must_use]
    pub fn new(palette: Palette) -> Self {
        let palette = if palette.is_empty() {
            Palette::build()
        } else {
            palette
        };
        Self {
            palette,
            assigned: HashMap::new(),
        }
    }

    /// Color pair for `key`. Deterministic; the first call per key records
    /// the assignment.
    pub fn pair_for(&mut self, key: &str) -> ColorPair {
        let idx = match self.assigned.get(key) {
            Some(&idx) => idx,
            None => {
                let idx = stable_hash(key) as usize % self.palette.len();
                self.assigned.insert(key.to_owned(), idx);
                idx
            }
        };
        // The palette is non-empty and immutable, so the index is in range.
        self.palette.get(idx).unwrap_or(ColorPair::new(0, 0))
    }

    /// Color pair for `key`, or `None` for the empty key.
    ///
    /// Empty words are never colored.
    pub fn pair_for_nonempty(&mut self, key: &str) -> Option<ColorPair> {
        if key.is_empty() {
            None
        } else {
            Some(self.pair_for(key))
        }
    }

    /// Number of keys assigned so far.
    #[must_use]
    pub fn assigned(&self) -> usize {
        self.assigned.len()
    }
}

impl Default for ColorAllocator {
    fn default() -> Self {
        Self::new(Palette::build())
    }
}
