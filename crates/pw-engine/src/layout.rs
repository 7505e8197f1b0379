//! Width-bounded word layout.
//!
//! Turns a pattern's word list into one line of at most `max_width`
//! visible columns. When everything fits, the words are simply joined.
//! Otherwise the line keeps a run of words from the start and a run from
//! the end with an ellipsis between them, so both the oldest and the newest
//! matches stay on screen:
//!
//! ```text
//! alpha beta...psi omega
//! ```
//!
//! Widths are display widths (wide characters count 2) measured with color
//! escapes stripped. Words and the separator go through
//! [`printable`](pw_term::width::printable) first, so a tab or newline
//! produced by a template cannot stretch or break the line. In colored mode
//! empty words are dropped.

use std::borrow::Cow;

use pw_term::ansi;
use pw_term::width::{
    ELLIPSIS, printable, string_width, truncate_to_width, truncate_with_ellipsis, visual_width,
};
use pw_theme::ColorAllocator;

/// Below this width only a fragment of the first word is shown.
const NARROW_WIDTH: usize = 8;

/// One word to lay out and the key that picks its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word<'a> {
    pub text: &'a str,
    key: &'a str,
}

impl<'a> Word<'a> {
    /// Word colored by its own text.
    #[must_use]
    pub const fn plain(text: &'a str) -> Self {
        Self { text, key: text }
    }

    /// Word colored by `key`, or by its own text when `key` is empty.
    #[must_use]
    pub const fn keyed(text: &'a str, key: &'a str) -> Self {
        if key.is_empty() {
            Self::plain(text)
        } else {
            Self { text, key }
        }
    }

    #[must_use]
    pub const fn key(&self) -> &'a str {
        self.key
    }
}

/// Lay out `words` in at most `max_width` visible columns.
///
/// Words are joined by `sep`. With `colors`, each word becomes a chip
/// colored by its key.
///
/// # Examples
///
/// ```
/// use pw_engine::layout::{layout, Word};
///
/// let words = ["one", "two", "three", "four", "five"].map(Word::plain);
/// assert_eq!(layout(&words, 40, " ", None), "one two three four five");
/// assert_eq!(layout(&words, 17, " ", None), "one two...five");
/// ```
#[must_use]
pub fn layout(
    words: &[Word<'_>],
    max_width: usize,
    sep: &str,
    colors: Option<&mut ColorAllocator>,
) -> String {
    let colored = colors.is_some();
    let sep = printable(sep);
    let texts: Vec<Cow<'_, str>> = words.iter().map(|w| printable(w.text)).collect();
    let words: Vec<Word<'_>> = words
        .iter()
        .zip(&texts)
        .map(|(w, text)| Word {
            text: text.as_ref(),
            key: w.key,
        })
        .filter(|w| !(colored && w.text.is_empty()))
        .collect();
    let words = words.as_slice();
    let mut painter = Painter::new(&sep, colors);

    let Some(first) = words.first() else {
        return String::new();
    };

    if max_width <= ELLIPSIS.len() {
        return ELLIPSIS[..max_width].to_owned();
    }

    let budget = max_width - ELLIPSIS.len();
    if max_width <= NARROW_WIDTH {
        let text = truncate_to_width(first.text, budget);
        return format!("{}{ELLIPSIS}", painter.paint(Word::keyed(text, first.key)));
    }

    let full = painter.join(words);
    if visual_width(&full) <= max_width {
        return full;
    }

    let left_budget = budget / 2;
    let right_budget = budget - left_budget;
    let sep_width = painter.sep_width();

    let left_n = pack(words.iter(), left_budget, sep_width);
    let right_n = pack(words[left_n..].iter().rev(), right_budget, sep_width);
    let left = &words[..left_n];
    let right = &words[words.len() - right_n..];

    let result = match (left.is_empty(), right.is_empty()) {
        (false, false) => format!("{}{ELLIPSIS}{}", painter.join(left), painter.join(right)),
        (false, true) => format!("{}{ELLIPSIS}", painter.join(left)),
        (true, false) => format!("{ELLIPSIS}{}", painter.join(right)),
        (true, true) => match words.iter().find(|w| !w.text.is_empty()) {
            // No whole word fits either side: show the start of the first one.
            Some(w) => {
                let text = truncate_to_width(w.text, budget);
                format!("{}{ELLIPSIS}", painter.paint(Word::keyed(text, w.key)))
            }
            None => ELLIPSIS.to_owned(),
        },
    };

    if visual_width(&result) <= max_width {
        return result;
    }
    log::debug!(
        "layout overflow: {} > {max_width} columns, hard-truncating",
        visual_width(&result)
    );
    truncate_with_ellipsis(&ansi::strip(&result), max_width)
}

/// Plain layout of bare strings.
#[must_use]
pub fn layout_plain(words: &[&str], max_width: usize, sep: &str) -> String {
    let words: Vec<Word<'_>> = words.iter().map(|w| Word::plain(w)).collect();
    layout(&words, max_width, sep, None)
}

/// How many words from `iter` fit in `budget` columns, separators included.
fn pack<'w, 'a: 'w>(
    iter: impl Iterator<Item = &'w Word<'a>>,
    budget: usize,
    sep_width: usize,
) -> usize {
    let mut used = 0;
    let mut n = 0;
    for w in iter {
        let need = string_width(w.text) + if n > 0 { sep_width } else { 0 };
        if used + need > budget {
            break;
        }
        used += need;
        n += 1;
    }
    n
}

/// Renders words either as plain text or as colored chips.
struct Painter<'s, 'c> {
    sep: &'s str,
    colors: Option<&'c mut ColorAllocator>,
}

impl<'s, 'c> Painter<'s, 'c> {
    const fn new(sep: &'s str, colors: Option<&'c mut ColorAllocator>) -> Self {
        Self { sep, colors }
    }

    fn sep_width(&self) -> usize {
        string_width(self.sep)
    }

    fn paint(&mut self, word: Word<'_>) -> String {
        match self.colors.as_deref_mut() {
            Some(alloc) if !word.text.is_empty() => {
                let pair = alloc.pair_for(word.key);
                ansi::chip(pair.fg, pair.bg, word.text)
            }
            _ => word.text.to_owned(),
        }
    }

    fn join(&mut self, words: &[Word<'_>]) -> String {
        let sep = self.sep;
        let mut out = String::new();
        for (i, w) in words.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            out.push_str(&self.paint(*w));
        }
        out
    }
}
