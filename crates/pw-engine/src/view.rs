//! Projecting accumulated state onto the screen.
//!
//! [`ViewState`] is a two-state machine (Normal / Alt) plus a color-debug
//! flag. Toggling changes only which fields of each [`PatternState`] are
//! laid out; nothing is re-matched.
//!
//! Rows read `<id>\t<count>\t<content>`. The whole row fits in
//! [`row_width`] columns, with tabs advancing to the next multiple of 8.

use std::fmt;

use pw_term::width::advance_column;
use pw_theme::ColorAllocator;

use crate::layout::{Word, layout};
use crate::options::{EngineOptions, MAX_ALT_WORDS, ViewMode};
use crate::state::PatternState;

/// Separator between chips in Normal view and the legend.
pub const CHIP_SEP: &str = " ";

/// Alt-view chips sit edge to edge.
pub const ALT_CHIP_SEP: &str = "";

/// Rows are never laid out narrower than this.
pub const MIN_ROW_WIDTH: usize = 20;

/// Usable row width for a terminal `cols` wide. The last column is left
/// free so a full row never wraps.
#[must_use]
pub fn row_width(cols: usize) -> usize {
    cols.saturating_sub(1).max(MIN_ROW_WIDTH)
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// Which projection is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewState {
    mode: ViewMode,
    color_debug: bool,
}

impl ViewState {
    #[must_use]
    pub const fn new(mode: ViewMode) -> Self {
        Self {
            mode,
            color_debug: false,
        }
    }

    #[must_use]
    pub const fn mode(self) -> ViewMode {
        self.mode
    }

    /// Whether Normal view shows color codes instead of words.
    #[must_use]
    pub const fn color_debug(self) -> bool {
        self.color_debug
    }

    /// Flip Normal/Alt and return the new mode.
    pub const fn toggle(&mut self) -> ViewMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    /// Flip color-debug and return the new setting.
    pub const fn toggle_color_debug(&mut self) -> bool {
        self.color_debug = !self.color_debug;
        self.color_debug
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One rendered cycle: optional legend line plus one row per pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Distinct first-group values, empty when there are none.
    pub legend: String,

    /// One row per pattern, in catalog order.
    pub rows: Vec<String>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.legend.is_empty() {
            writeln!(f, "{}", self.legend)?;
        }
        for row in &self.rows {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

/// Render every pattern for a terminal `cols` wide.
///
/// `alloc` is only consulted when `opts.colorize` is set.
#[must_use]
pub fn render_frame(
    states: &[PatternState],
    view: ViewState,
    opts: &EngineOptions,
    cols: usize,
    alloc: &mut ColorAllocator,
) -> Frame {
    let width = row_width(cols);
    let rows = states
        .iter()
        .map(|s| render_row(s, view, opts, width, alloc))
        .collect();
    let colors = opts.colorize.then_some(&mut *alloc);
    Frame {
        legend: render_legend(states, width, colors),
        rows,
    }
}

/// Render one pattern's row in at most `width` columns.
#[must_use]
pub fn render_row(
    state: &PatternState,
    view: ViewState,
    opts: &EngineOptions,
    width: usize,
    alloc: &mut ColorAllocator,
) -> String {
    let mut row = format!("{}\t{}\t", state.id(), state.count());
    let used = advance_column(0, &row);
    let Some(avail) = width.checked_sub(used).filter(|&a| a > 0) else {
        return row;
    };
    let mut colors = opts.colorize.then_some(alloc);
    let sep = match (colors.is_some(), view.mode()) {
        (false, _) => opts.word_sep.as_str(),
        (true, ViewMode::Normal) => CHIP_SEP,
        (true, ViewMode::Alt) => ALT_CHIP_SEP,
    };

    let content = match view.mode() {
        ViewMode::Normal if view.color_debug() && colors.is_some() => {
            let codes: Vec<String> = state
                .keys()
                .iter()
                .map(|key| {
                    colors
                        .as_deref_mut()
                        .and_then(|a| a.pair_for_nonempty(key))
                        .map_or_else(|| "none".to_owned(), |p| p.to_string())
                })
                .collect();
            let words: Vec<Word<'_>> = codes
                .iter()
                .zip(state.keys())
                .map(|(code, key)| Word::keyed(code, key))
                .collect();
            layout(&words, avail, sep, colors)
        }
        ViewMode::Normal => {
            let words: Vec<Word<'_>> = state
                .words()
                .iter()
                .zip(state.keys())
                .map(|(w, k)| Word::keyed(w, k))
                .collect();
            layout(&words, avail, sep, colors)
        }
        ViewMode::Alt => {
            let alts = state.alts();
            if alts.len() > MAX_ALT_WORDS {
                log::warn!(
                    "pattern '{}': alt view limited to {MAX_ALT_WORDS} of {} words",
                    state.id(),
                    alts.len()
                );
            }
            let words: Vec<Word<'_>> = alts
                .iter()
                .take(MAX_ALT_WORDS)
                .map(|w| Word::plain(w))
                .collect();
            layout(&words, avail, sep, colors)
        }
    };

    row.push_str(&content);
    row
}

/// Distinct first-group values across all patterns: sorted within each
/// pattern, first occurrence wins across patterns. Each value is colored
/// by itself.
#[must_use]
pub fn render_legend(
    states: &[PatternState],
    width: usize,
    colors: Option<&mut ColorAllocator>,
) -> String {
    let mut items: Vec<&str> = Vec::new();
    for value in states.iter().flat_map(|s| s.refs()) {
        if !items.contains(&value.as_str()) {
            items.push(value);
        }
    }
    if items.is_empty() {
        return String::new();
    }
    let words: Vec<Word<'_>> = items.into_iter().map(Word::plain).collect();
    layout(&words, width, CHIP_SEP, colors)
}
