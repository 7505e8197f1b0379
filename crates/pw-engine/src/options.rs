//! Engine options: every tunable of the matching and rendering core.
//!
//! The binary maps its command-line flags onto [`EngineOptions`]; tests
//! build one with struct-update syntax over [`Default`].
//!
//! | Field         | Flag             | Default  |
//! |---------------|------------------|----------|
//! | `field_sep`   | `--fs`           | tab      |
//! | `word_sep`    | `--sep`          | `" "`    |
//! | `group_sep`   | `--cg-sep`       | `""`     |
//! | `ignore_case` | `--ignorecase`   | false    |
//! | `strip_punct` | `--strip-punct`  | false    |
//! | `colorize`    | `--color`        | false    |
//! | `initial_view`| `--alt-view`     | Normal   |

use std::fmt;

/// Alt view renders at most this many words per pattern.
pub const MAX_ALT_WORDS: usize = 1000;

// ---------------------------------------------------------------------------
// ViewMode
// ---------------------------------------------------------------------------

/// Which projection of the accumulated state is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ViewMode {
    /// Original extracted words, colored by their alternate word.
    #[default]
    Normal,

    /// Transformed words, colored by their own value.
    Alt,
}

impl ViewMode {
    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Normal => Self::Alt,
            Self::Alt => Self::Normal,
        }
    }

    #[must_use]
    pub const fn is_alt(self) -> bool {
        matches!(self, Self::Alt)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Alt => write!(f, "ALT"),
        }
    }
}

// ---------------------------------------------------------------------------
// EngineOptions
// ---------------------------------------------------------------------------

/// Options for catalog loading, matching, and rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Field separator in catalog lines.
    pub field_sep: String,

    /// Separator between words in plain (uncolored) layouts.
    pub word_sep: String,

    /// Separator used to join multiple non-empty capture groups.
    pub group_sep: String,

    /// Case-insensitive line and word regexes.
    pub ignore_case: bool,

    /// Strip leading/trailing punctuation from extracted words.
    pub strip_punct: bool,

    /// Render words as colored chips.
    pub colorize: bool,

    /// View shown before the first toggle.
    pub initial_view: ViewMode,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            field_sep: "\t".to_owned(),
            word_sep: " ".to_owned(),
            group_sep: String::new(),
            ignore_case: false,
            strip_punct: false,
            colorize: false,
            initial_view: ViewMode::Normal,
        }
    }
}

/// Decode backslash escapes in a command-line separator.
///
/// Recognized: `\t`, `\n`, `\r`, `\0`, `\\`, and `\xHH`. Anything else,
/// including a trailing backslash, is kept literally so a separator such
/// as `\|` survives.
///
/// # Examples
///
/// ```
/// use pw_engine::options::decode_escapes;
///
/// assert_eq!(decode_escapes("\\t"), "\t");
/// assert_eq!(decode_escapes("a\\x2cb"), "a,b");
/// assert_eq!(decode_escapes("\\|"), "\\|");
/// ```
#[must_use]
pub fn decode_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.peek().copied() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('x') => {
                let mut probe = chars.clone();
                probe.next();
                let hex: String = probe.by_ref().take(2).collect();
                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) if hex.len() == 2 && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
                        out.push(char::from(byte));
                        chars = probe;
                        continue;
                    }
                    _ => {
                        out.push('\\');
                        continue;
                    }
                }
            }
            _ => {
                out.push('\\');
                continue;
            }
        }
        chars.next();
    }

    out
}
