// SPDX-License-Identifier: MIT
//
// pw-term — Terminal plumbing for patwatch.
//
// The watcher paints plain text lines, not a cell grid, so this crate is
// the thin slice of terminal control that a line-oriented live view needs:
// the ANSI-256 color table, SGR "chip" escapes, display-width measurement
// that ignores escape overhead, grapheme-safe truncation, terminal size,
// and a cbreak input mode with a background key reader.
//
// No TUI framework. Every escape sequence is written by hand, and every
// width is measured after escapes are stripped.

pub mod ansi;
pub mod color;
pub mod reader;
pub mod terminal;
pub mod width;
