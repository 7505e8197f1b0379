//! Chip palette construction: background screening and foreground choice.
//!
//! Walks the 6×6×6 color cube plus a band of mid grays, pairs each usable
//! background with its best foreground, then drops the combinations that
//! read poorly in practice even when the ratio looks fine on paper.

use pw_term::color::{BLACK, CUBE_END, CUBE_START, WHITE, ansi256_to_rgb, brightness8};

use crate::contrast::best_foreground;

/// A palette always holds at least this many pairs before filtering.
pub const MIN_PAIRS: usize = 120;

/// Upper bound on palette size.
pub const MAX_PAIRS: usize = 240;

/// Backgrounds with 8-bit brightness outside this range are skipped in the
/// first pass.
const BRIGHTNESS_RANGE: std::ops::RangeInclusive<f64> = 25.0..=245.0;

/// Mid grays from the ramp that carry a chip well.
const GRAY_BAND: std::ops::RangeInclusive<u8> = 238..=246;

// ---------------------------------------------------------------------------
// ColorPair
// ---------------------------------------------------------------------------

/// A foreground/background pair of ANSI-256 indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorPair {
    pub fg: u8,
    pub bg: u8,
}

impl ColorPair {
    #[must_use]
    pub const fn new(fg: u8, bg: u8) -> Self {
        Self { fg, bg }
    }

    /// Pair for background `bg` with its best foreground.
    #[must_use]
    pub fn for_background(bg: u8) -> Self {
        Self::new(best_foreground(bg), bg)
    }

    /// Whether this combination is known to read poorly: saturated dark
    /// blues, near-black under black text, near-white under white text.
    #[must_use]
    pub fn is_problematic(self) -> bool {
        let (r, g, b) = ansi256_to_rgb(self.bg);
        if r < 50 && g < 50 && b > 100 {
            return true;
        }
        if self.fg == BLACK && r < 30 && g < 30 && b < 30 {
            return true;
        }
        self.fg == WHITE && r > 220 && g > 220 && b > 220
    }
}

impl std::fmt::Display for ColorPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.fg, self.bg)
    }
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// An ordered, immutable set of chip color pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pairs: Vec<ColorPair>,
}

impl Palette {
    /// Build the standard chip palette.
    ///
    /// 1. Every cube color whose 8-bit brightness lies in 25..=245, then the
    ///    mid-gray band 238..=246, each with its best foreground.
    /// 2. Deduplicate by pair, keeping first occurrence.
    /// 3. If fewer than [`MIN_PAIRS`] remain, top up from the full cube.
    /// 4. Drop [problematic](ColorPair::is_problematic) pairs and cap at
    ///    [`MAX_PAIRS`].
    #[must_use]
    pub fn build() -> Self {
        let screened = (CUBE_START..=CUBE_END)
            .filter(|&bg| BRIGHTNESS_RANGE.contains(&brightness8(bg)))
            .chain(GRAY_BAND)
            .map(ColorPair::for_background);

        let mut pairs: Vec<ColorPair> = Vec::with_capacity(MAX_PAIRS);
        for pair in screened {
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }

        if pairs.len() < MIN_PAIRS {
            for bg in CUBE_START..=CUBE_END {
                let pair = ColorPair::for_background(bg);
                if !pairs.contains(&pair) {
                    pairs.push(pair);
                }
                if pairs.len() >= MIN_PAIRS {
                    break;
                }
            }
        }

        pairs.retain(|p| !p.is_problematic());
        pairs.truncate(MAX_PAIRS);
        Self { pairs }
    }

    /// Palette from explicit pairs.
    ///
    /// [`ColorAllocator`](crate::ColorAllocator) replaces an empty palette
    /// with the standard one.
    #[must_use]
    pub const fn from_pairs(pairs: Vec<ColorPair>) -> Self {
        Self { pairs }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Option<ColorPair> {
        self.pairs.get(idx).copied()
    }

    #[must_use]
    pub fn pairs(&self) -> &[ColorPair] {
        &self.pairs
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::build()
    }
}
