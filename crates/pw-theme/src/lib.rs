//! # pw-theme — Deterministic, contrast-safe word coloring
//!
//! Every distinct word the watcher shows gets a background from the
//! xterm-256 palette and a foreground (white or black) chosen so the chip
//! stays readable. The same word always gets the same colors, across
//! cycles and across runs.
//!
//! # Architecture
//!
//! ```text
//! ANSI-256 index
//!     │
//!     ▼
//! contrast.rs:  relative luminance, contrast ratio, best foreground
//!     │
//!     ▼
//! palette.rs:   screen the background space into ≥ 120 ColorPairs
//!     │
//!     ▼
//! allocator.rs: stable string hash → palette index, memoized per key
//! ```
//!
//! The palette is computed once and never changes. The allocator's
//! key → index map only grows.

// Single-char math variables are standard in color science.
#![allow(clippy::many_single_char_names)]

pub mod allocator;
pub mod contrast;
pub mod palette;

pub use allocator::ColorAllocator;
pub use palette::{ColorPair, Palette};
