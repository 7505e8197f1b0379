// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation and removal.
//
// Two kinds of output live here:
//
//   - Screen control (cursor, clear, reset) written to any `impl io::Write`.
//     These go straight to the terminal at frame time.
//
//   - Colored "chips" written to any `impl fmt::Write`. Chips are built into
//     `String`s by the layout engine long before anything reaches stdout, so
//     they use the formatting trait rather than the I/O one.
//
// Chips always use the 256-color extended form (`38;5;N` / `48;5;N`), even
// for indices below 16, so a consumer can recognize them with one pattern.
//
// `strip` is the inverse: it removes CSI and two-byte escape sequences so
// widths can be measured on what the user actually sees.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};

/// The SGR reset sequence (SGR 0).
pub const RESET: &str = "\x1b[0m";

/// Foreground/background used for the watch header bar: black text on the
/// dark green of tmux's default status line.
pub const HEADER_STYLE: &str = "\x1b[30;48;5;22m";

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to the top-left corner.
#[inline]
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[H")
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Clear from the cursor to the end of the screen (ED 0).
#[inline]
pub fn clear_below(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[J")
}

/// Clear from the cursor to the end of the line (EL 0).
///
/// Written after every repainted row so a shorter row fully replaces the
/// longer one it overwrites.
#[inline]
pub fn clear_line_right(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[K")
}

/// Reset all SGR attributes to terminal defaults (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(RESET.as_bytes())
}

// ─── Chips ───────────────────────────────────────────────────────────────────

/// Write `text` wrapped in a foreground/background 256-color set and a reset.
///
/// An empty `text` writes nothing: an empty chip would be pure escape
/// overhead with no visible cell.
pub fn write_chip(out: &mut impl fmt::Write, fg: u8, bg: u8, text: &str) -> fmt::Result {
    if text.is_empty() {
        return Ok(());
    }
    write!(out, "\x1b[38;5;{fg};48;5;{bg}m{text}{RESET}")
}

/// Build a chip as an owned string.
///
/// # Examples
///
/// ```
/// use pw_term::ansi::chip;
///
/// assert_eq!(chip(15, 22, "db1"), "\x1b[38;5;15;48;5;22mdb1\x1b[0m");
/// assert_eq!(chip(15, 22, ""), "");
/// ```
#[must_use]
pub fn chip(fg: u8, bg: u8, text: &str) -> String {
    let mut s = String::with_capacity(text.len() + 24);
    // Writing into a String cannot fail.
    let _ = write_chip(&mut s, fg, bg, text);
    s
}

/// Wrap a header line in [`HEADER_STYLE`].
#[must_use]
pub fn header_bar(text: &str) -> String {
    format!("{HEADER_STYLE}{text}{RESET}")
}

// ─── Stripping ───────────────────────────────────────────────────────────────

/// Remove ANSI escape sequences from `s`.
///
/// Recognizes CSI sequences (`ESC [` parameters, intermediates, one final
/// byte) and two-byte `ESC X` sequences with `X` in `@`..=`_`. A lone
/// trailing ESC is dropped. Returns the input unchanged (borrowed) when it
/// contains no ESC at all, which is the common case for plain layouts.
///
/// # Examples
///
/// ```
/// use pw_term::ansi::strip;
///
/// assert_eq!(strip("\x1b[38;5;15;48;5;22mdb1\x1b[0m"), "db1");
/// assert_eq!(strip("plain"), "plain");
/// ```
#[must_use]
pub fn strip(s: &str) -> Cow<'_, str> {
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\x1b' {
            out.push(ch);
            continue;
        }
        match chars.peek().copied() {
            Some('[') => {
                chars.next();
                // Parameter bytes 0x30–0x3F, intermediate bytes 0x20–0x2F,
                // then exactly one final byte 0x40–0x7E.
                while let Some(&c) = chars.peek() {
                    if ('\x30'..='\x3f').contains(&c) || ('\x20'..='\x2f').contains(&c) {
                        chars.next();
                    } else {
                        break;
                    }
                }
                if let Some(&c) = chars.peek() {
                    if ('\x40'..='\x7e').contains(&c) {
                        chars.next();
                    }
                }
            }
            Some(c) if ('@'..='_').contains(&c) => {
                chars.next();
            }
            _ => {}
        }
    }

    Cow::Owned(out)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
