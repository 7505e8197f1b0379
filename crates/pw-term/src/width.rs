// SPDX-License-Identifier: MIT
//
// Display-width measurement and width-bounded truncation.
//
// Every width in patwatch is a *visual* width: terminal columns as the user
// sees them. Escape sequences occupy zero columns, CJK and most emoji occupy
// two, combining marks occupy none. Truncation never splits a grapheme
// cluster, so a cut can land short of the requested width by one column when
// a wide cluster straddles the boundary.

use std::borrow::Cow;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use crate::ansi;

/// Tab stops sit on multiples of this many columns.
pub const TAB_STOP: usize = 8;

/// The ellipsis used for elided content. Three ASCII dots, three columns.
pub const ELLIPSIS: &str = "...";

/// Display width of a single character in terminal columns.
///
/// Returns 0 for control characters and zero-width characters,
/// 1 for most characters, 2 for wide characters (CJK, some emoji).
#[inline]
#[must_use]
pub fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

/// Display width of a string in terminal columns.
///
/// Sums per-character widths; the ESC byte itself counts 0 but the
/// printable bytes of an escape sequence do not, so strip first.
///
/// # Examples
///
/// ```
/// use pw_term::width::string_width;
///
/// assert_eq!(string_width("hello"), 5);
/// assert_eq!(string_width("中文"), 4);
/// ```
#[must_use]
pub fn string_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// Display width of `s` after removing ANSI escape sequences.
///
/// # Examples
///
/// ```
/// use pw_term::{ansi, width::visual_width};
///
/// assert_eq!(visual_width(&ansi::chip(15, 22, "db1")), 3);
/// ```
#[must_use]
pub fn visual_width(s: &str) -> usize {
    string_width(&ansi::strip(s))
}

/// `s` made safe to measure and print on one line.
///
/// Escape sequences are removed. Whitespace controls (tab, newline,
/// carriage return, vertical tab, form feed) become a space and any other
/// control character becomes `?`, so every remaining character has the
/// width [`string_width`] gives it.
///
/// # Examples
///
/// ```
/// use pw_term::width::printable;
///
/// assert_eq!(printable("plain"), "plain");
/// assert_eq!(printable("a\tb\nc"), "a b c");
/// assert_eq!(printable("\x1b[31mred\x1b[0m\x07"), "red?");
/// ```
#[must_use]
pub fn printable(s: &str) -> Cow<'_, str> {
    if !s.chars().any(char::is_control) {
        return Cow::Borrowed(s);
    }
    let cleaned = ansi::strip(s)
        .chars()
        .map(|ch| match ch {
            '\t' | '\n' | '\r' | '\x0b' | '\x0c' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();
    Cow::Owned(cleaned)
}

/// Column reached after writing `s` starting at column `start`, with tabs
/// advancing to the next [`TAB_STOP`] multiple and escapes ignored.
#[must_use]
pub fn advance_column(start: usize, s: &str) -> usize {
    let plain = ansi::strip(s);
    let mut col = start;
    for g in plain.graphemes(true) {
        if g == "\t" {
            col = (col / TAB_STOP + 1) * TAB_STOP;
        } else {
            col += string_width(g);
        }
    }
    col
}

/// Longest prefix of `s` whose display width is at most `max`.
///
/// Cuts on grapheme-cluster boundaries. `s` is expected to be plain text;
/// strip escapes first if it may contain any.
///
/// # Examples
///
/// ```
/// use pw_term::width::truncate_to_width;
///
/// assert_eq!(truncate_to_width("abcdef", 3), "abc");
/// assert_eq!(truncate_to_width("中文字", 5), "中文");
/// ```
#[must_use]
pub fn truncate_to_width(s: &str, max: usize) -> &str {
    let mut used = 0;
    for (idx, g) in s.grapheme_indices(true) {
        let w = string_width(g);
        if used + w > max {
            return &s[..idx];
        }
        used += w;
    }
    s
}

/// Truncate `s` to fit `max` columns, replacing the tail with [`ELLIPSIS`]
/// when it does not fit as-is.
///
/// When `max` is smaller than the ellipsis itself, the ellipsis is cut
/// down to `max` dots.
///
/// # Examples
///
/// ```
/// use pw_term::width::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
/// assert_eq!(truncate_with_ellipsis("hello world", 8), "hello...");
/// assert_eq!(truncate_with_ellipsis("hello", 2), "..");
/// ```
#[must_use]
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    if string_width(s) <= max {
        return s.to_owned();
    }
    if max <= ELLIPSIS.len() {
        return ELLIPSIS[..max].to_owned();
    }
    let head = truncate_to_width(s, max - ELLIPSIS.len());
    format!("{head}{ELLIPSIS}")
}

/// Longest suffix of `s` whose display width is at most `max`, cut on a
/// grapheme boundary.
///
/// Used for left-first header truncation, where the newest information
/// lives at the right edge.
#[must_use]
pub fn truncate_start_to_width(s: &str, max: usize) -> &str {
    let mut used = 0;
    let mut start = s.len();
    for (idx, g) in s.grapheme_indices(true).rev() {
        let w = string_width(g);
        if used + w > max {
            break;
        }
        used += w;
        start = idx;
    }
    &s[start..]
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── Width ────────────────────────────────────────────────────────────

    #[test]
    fn char_width_ascii() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width(' '), 1);
        assert_eq!(char_width('~'), 1);
    }

    #[test]
    fn char_width_cjk() {
        assert_eq!(char_width('中'), 2);
        assert_eq!(char_width('文'), 2);
    }

    #[test]
    fn char_width_control_is_zero() {
        assert_eq!(char_width('\x1b'), 0);
        assert_eq!(char_width('\0'), 0);
    }

    #[test]
    fn visual_width_ignores_chips() {
        let s = format!("{} {}", ansi::chip(15, 22, "ab"), ansi::chip(16, 190, "中"));
        assert_eq!(visual_width(&s), 5);
    }

    #[test]
    fn visual_width_plain() {
        assert_eq!(visual_width("a b c"), 5);
        assert_eq!(visual_width(""), 0);
    }

    // ── Printable ────────────────────────────────────────────────────────

    #[test]
    fn printable_borrows_clean_text() {
        assert!(matches!(printable("db1 中"), Cow::Borrowed("db1 中")));
    }

    #[test]
    fn printable_flattens_line_breaks_and_tabs() {
        let out = printable("aa\nbb\r\ncc\tdd");
        assert_eq!(out, "aa bb  cc dd");
        assert_eq!(advance_column(0, &out), string_width(&out));
    }

    #[test]
    fn printable_drops_escapes_and_marks_other_controls() {
        assert_eq!(printable("\x1b[1mX\x1b[0m\0"), "X?");
        assert_eq!(string_width(&printable("\x07\x7f")), 2);
    }

    // ── Tab stops ────────────────────────────────────────────────────────

    #[test]
    fn tab_advances_to_next_stop() {
        assert_eq!(advance_column(0, "\t"), 8);
        assert_eq!(advance_column(3, "\t"), 8);
        assert_eq!(advance_column(8, "\t"), 16);
    }

    #[test]
    fn advance_mixed_text() {
        assert_eq!(advance_column(0, "ERR\t12\t"), 16);
        assert_eq!(advance_column(0, "LONGPATTERNID\t"), 16);
    }

    #[test]
    fn advance_ignores_escapes() {
        assert_eq!(advance_column(0, "\x1b[1mab\x1b[0m\t"), 8);
    }

    // ── Truncation ───────────────────────────────────────────────────────

    #[test]
    fn truncate_fits_unchanged() {
        assert_eq!(truncate_to_width("abc", 3), "abc");
        assert_eq!(truncate_to_width("abc", 10), "abc");
    }

    #[test]
    fn truncate_to_zero() {
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn truncate_never_splits_wide_char() {
        assert_eq!(truncate_to_width("中文", 3), "中");
        assert_eq!(truncate_to_width("中文", 1), "");
    }

    #[test]
    fn truncate_keeps_combining_mark_with_base() {
        // "e" + COMBINING ACUTE ACCENT is one cluster of width 1.
        let s = "e\u{301}x";
        assert_eq!(truncate_to_width(s, 1), "e\u{301}");
    }

    #[test]
    fn ellipsis_when_too_long() {
        assert_eq!(truncate_with_ellipsis("abcdefghij", 6), "abc...");
    }

    #[test]
    fn ellipsis_degenerate_widths() {
        assert_eq!(truncate_with_ellipsis("abcdef", 3), "...");
        assert_eq!(truncate_with_ellipsis("abcdef", 1), ".");
        assert_eq!(truncate_with_ellipsis("abcdef", 0), "");
    }

    #[test]
    fn ellipsis_result_never_exceeds_max() {
        for max in 0..12 {
            let out = truncate_with_ellipsis("中文中文中文", max);
            assert!(string_width(&out) <= max, "max {max}: {out:?}");
        }
    }

    #[test]
    fn truncate_start_keeps_right_edge() {
        assert_eq!(truncate_start_to_width("abcdef", 3), "def");
        assert_eq!(truncate_start_to_width("abc", 5), "abc");
        assert_eq!(truncate_start_to_width("中文", 3), "文");
        assert_eq!(truncate_start_to_width("abc", 0), "");
    }
}
