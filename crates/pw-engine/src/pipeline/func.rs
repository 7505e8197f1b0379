//! Pipeline function table.
//!
//! Every function takes the current word plus literal string arguments and
//! returns the new word or a [`StageError`]. Numeric arguments are parsed
//! per call; regex arguments are compiled once when the pipeline is parsed
//! and handed in ready to use.
//!
//! Slicing follows half-open `[start, end)` ranges over characters, with
//! negative indices counting from the end and out-of-range bounds clamped.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};

use crate::error::{StageError, StageResult};
use crate::matcher::MatchContext;
use crate::template;

/// A known pipeline function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
    // Case
    Upper,
    Lower,
    Title,
    SwapCase,
    // Slicing
    First,
    Last,
    Slice,
    // Trimming
    Strip,
    LStrip,
    RStrip,
    CollapseWs,
    // Replacement
    ReplaceStr,
    Replace,
    Tr,
    // Splitting / extraction
    Split,
    RSplit,
    RExtract,
    // Padding / formatting
    PadLeft,
    PadRight,
    ZFill,
    EnsurePrefix,
    EnsureSuffix,
    // Numbers
    Int,
    Float,
    Round,
    // Composition
    Set,
    Append,
    Prepend,
    Concat,
}

/// Name → function. Lookup is by lowercased name; `subst` is an alias.
const TABLE: &[(&str, Func)] = &[
    ("upper", Func::Upper),
    ("lower", Func::Lower),
    ("title", Func::Title),
    ("swapcase", Func::SwapCase),
    ("first", Func::First),
    ("last", Func::Last),
    ("slice", Func::Slice),
    ("subst", Func::Slice),
    ("strip", Func::Strip),
    ("lstrip", Func::LStrip),
    ("rstrip", Func::RStrip),
    ("collapse_ws", Func::CollapseWs),
    ("replace_str", Func::ReplaceStr),
    ("replace", Func::Replace),
    ("tr", Func::Tr),
    ("split", Func::Split),
    ("rsplit", Func::RSplit),
    ("rextract", Func::RExtract),
    ("padleft", Func::PadLeft),
    ("padright", Func::PadRight),
    ("zfill", Func::ZFill),
    ("ensure_prefix", Func::EnsurePrefix),
    ("ensure_suffix", Func::EnsureSuffix),
    ("int", Func::Int),
    ("float", Func::Float),
    ("round", Func::Round),
    ("set", Func::Set),
    ("append", Func::Append),
    ("prepend", Func::Prepend),
    ("concat", Func::Concat),
];

impl Func {
    /// Look up a function by (already lowercased) name.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        TABLE.iter().find(|(n, _)| *n == name).map(|&(_, f)| f)
    }

    /// Canonical name.
    #[must_use]
    pub fn name(self) -> &'static str {
        TABLE
            .iter()
            .find(|&&(_, f)| f == self)
            .map_or("?", |&(n, _)| n)
    }

    /// All recognized names, aliases included.
    pub fn names() -> impl Iterator<Item = &'static str> {
        TABLE.iter().map(|&(n, _)| n)
    }

    /// Accepted argument count as `(min, max)`.
    ///
    /// Composition functions use only their first argument and ignore the
    /// rest.
    #[must_use]
    pub const fn arity(self) -> (usize, usize) {
        match self {
            Self::Upper
            | Self::Lower
            | Self::Title
            | Self::SwapCase
            | Self::CollapseWs
            | Self::Int
            | Self::Float => (0, 0),
            Self::First | Self::Last | Self::Strip | Self::LStrip | Self::RStrip | Self::Round => {
                (0, 1)
            }
            Self::Slice => (0, 2),
            Self::ReplaceStr | Self::Tr => (2, 2),
            Self::Replace => (2, 3),
            Self::Split | Self::RSplit | Self::RExtract | Self::PadLeft | Self::PadRight => (1, 2),
            Self::ZFill | Self::EnsurePrefix | Self::EnsureSuffix => (1, 1),
            Self::Set | Self::Append | Self::Prepend | Self::Concat => (1, usize::MAX),
        }
    }

    /// Compile this call's regex argument, if the function takes one.
    ///
    /// `replace` honors an `i` anywhere in its third argument as the
    /// case-insensitive flag.
    #[must_use]
    pub fn compile_regex(self, args: &[String]) -> Option<Result<Regex, regex::Error>> {
        let pattern = args.first()?;
        match self {
            Self::Replace => {
                let ci = args.get(2).is_some_and(|f| f.to_lowercase().contains('i'));
                Some(RegexBuilder::new(pattern).case_insensitive(ci).build())
            }
            Self::RExtract => Some(Regex::new(pattern)),
            _ => None,
        }
    }

    /// Apply to `word`.
    ///
    /// `regex` is the compiled pattern from [`compile_regex`](Self::compile_regex);
    /// when absent for a regex function it is compiled here.
    ///
    /// # Errors
    ///
    /// Any [`StageError`]: wrong argument count, unparsable numeric argument,
    /// bad regex, non-numeric input to a numeric function, or a negative
    /// index past the start.
    pub fn apply(
        self,
        word: &str,
        args: &[String],
        regex: Option<&Regex>,
        ctx: Option<&MatchContext>,
    ) -> StageResult<String> {
        let func = self.name();
        let (min, max) = self.arity();
        if args.len() < min {
            return Err(StageError::MissingArgument { func });
        }
        if args.len() > max {
            return Err(StageError::TooManyArguments {
                func,
                max,
                got: args.len(),
            });
        }
        let arg = |i: usize| args.get(i).map_or("", String::as_str);

        let out = match self {
            Self::Upper => word.to_uppercase(),
            Self::Lower => word.to_lowercase(),
            Self::Title => title_case(word),
            Self::SwapCase => swap_case(word),

            Self::First => {
                let n = int_or(func, arg(0), 1)?;
                slice_chars(word, None, Some(n))
            }
            Self::Last => {
                let n = int_or(func, arg(0), 1)?;
                slice_chars(word, Some(n.saturating_neg()), None)
            }
            Self::Slice => {
                let a = opt_int(func, arg(0))?;
                let b = opt_int(func, arg(1))?;
                slice_chars(word, a, b)
            }

            Self::Strip => strip_with(word, arg(0), true, true),
            Self::LStrip => strip_with(word, arg(0), true, false),
            Self::RStrip => strip_with(word, arg(0), false, true),
            Self::CollapseWs => word.split_whitespace().collect::<Vec<_>>().join(" "),

            Self::ReplaceStr => word.replace(arg(0), arg(1)),
            Self::Replace => {
                let re = self.regex_for(regex, args)?;
                re.replace_all(word, |caps: &regex::Captures<'_>| {
                    template::render(arg(1), Some(caps))
                })
                .into_owned()
            }
            Self::Tr => transliterate(func, word, arg(0), arg(1))?,

            Self::Split => split_nth(func, word, arg(0), int_or(func, arg(1), 0)?, false)?,
            Self::RSplit => split_nth(func, word, arg(0), int_or(func, arg(1), 0)?, true)?,
            Self::RExtract => {
                let re = self.regex_for(regex, args)?;
                extract_group(func, &re, word, args.get(1).map_or("1", |g| g.trim()))?
            }

            Self::PadLeft => pad(word, width(func, arg(0))?, fill_char(arg(1)), true),
            Self::PadRight => pad(word, width(func, arg(0))?, fill_char(arg(1)), false),
            Self::ZFill => zero_fill(word, width(func, arg(0))?),
            Self::EnsurePrefix => {
                if word.starts_with(arg(0)) {
                    word.to_owned()
                } else {
                    format!("{}{word}", arg(0))
                }
            }
            Self::EnsureSuffix => {
                if word.ends_with(arg(0)) {
                    word.to_owned()
                } else {
                    format!("{word}{}", arg(0))
                }
            }

            Self::Int | Self::Float | Self::Round if word.trim().is_empty() => word.to_owned(),
            Self::Int => {
                let v = parse_number(func, word)?;
                if !v.is_finite() {
                    return Err(StageError::Overflow {
                        func,
                        input: word.to_owned(),
                    });
                }
                let t = v.trunc();
                if t == 0.0 { "0".to_owned() } else { format!("{t:.0}") }
            }
            Self::Float => float_repr(parse_number(func, word)?),
            Self::Round => {
                let digits = int_or(func, arg(0), 0)?;
                if digits < 0 {
                    return Err(StageError::BadArgument {
                        func,
                        arg: arg(0).to_owned(),
                    });
                }
                let digits = bounded(func, digits)?;
                let v = parse_number(func, word)?;
                if v.is_finite() {
                    format!("{v:.digits$}")
                } else {
                    float_repr(v)
                }
            }

            Self::Set => template::render(arg(0), ctx),
            Self::Append | Self::Concat => format!("{word}{}", template::render(arg(0), ctx)),
            Self::Prepend => format!("{}{word}", template::render(arg(0), ctx)),
        };
        Ok(out)
    }

    fn regex_for(self, compiled: Option<&Regex>, args: &[String]) -> StageResult<Regex> {
        if let Some(re) = compiled {
            return Ok(re.clone());
        }
        match self.compile_regex(args) {
            Some(result) => Ok(result?),
            None => Err(StageError::MissingArgument { func: self.name() }),
        }
    }
}

// ── Argument parsing ────────────────────────────────────────────────────────

fn parse_int(func: &'static str, arg: &str) -> StageResult<i64> {
    arg.trim().parse().map_err(|_| StageError::BadArgument {
        func,
        arg: arg.to_owned(),
    })
}

/// Integer argument, `default` when blank.
fn int_or(func: &'static str, arg: &str, default: i64) -> StageResult<i64> {
    if arg.trim().is_empty() {
        Ok(default)
    } else {
        parse_int(func, arg)
    }
}

/// Optional slice bound: blank means open-ended.
fn opt_int(func: &'static str, arg: &str) -> StageResult<Option<i64>> {
    if arg.trim().is_empty() {
        Ok(None)
    } else {
        parse_int(func, arg).map(Some)
    }
}

/// Largest width or precision a pad, fill or `round` call accepts.
pub const MAX_WIDTH: usize = 4096;

/// Target width; negative widths pad nothing.
fn width(func: &'static str, arg: &str) -> StageResult<usize> {
    bounded(func, parse_int(func, arg)?)
}

/// `w` as a width, zero when negative.
fn bounded(func: &'static str, w: i64) -> StageResult<usize> {
    let width = usize::try_from(w).unwrap_or(0);
    if width > MAX_WIDTH {
        return Err(StageError::TooWide {
            func,
            width: w,
            max: MAX_WIDTH,
        });
    }
    Ok(width)
}

fn fill_char(arg: &str) -> char {
    arg.chars().next().unwrap_or(' ')
}

fn parse_number(func: &'static str, word: &str) -> StageResult<f64> {
    word.trim().parse().map_err(|_| StageError::NotANumber {
        func,
        input: word.to_owned(),
    })
}

// ── String helpers ──────────────────────────────────────────────────────────

/// Uppercase the first letter of every run of letters, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

fn swap_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_lowercase() {
            out.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Character slice `[start, end)` with negative indices from the end.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn slice_chars(s: &str, start: Option<i64>, end: Option<i64>) -> String {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let resolve = |i: i64| -> usize {
        if i < 0 {
            (i + len).max(0) as usize
        } else {
            i.min(len) as usize
        }
    };
    let a = start.map_or(0, resolve);
    let b = end.map_or(chars.len(), resolve);
    if a >= b {
        String::new()
    } else {
        chars[a..b].iter().collect()
    }
}

fn strip_with(s: &str, set: &str, left: bool, right: bool) -> String {
    let pred = |c: char| {
        if set.is_empty() {
            c.is_whitespace()
        } else {
            set.contains(c)
        }
    };
    let mut out = s;
    if left {
        out = out.trim_start_matches(pred);
    }
    if right {
        out = out.trim_end_matches(pred);
    }
    out.to_owned()
}

fn transliterate(func: &'static str, s: &str, src: &str, dst: &str) -> StageResult<String> {
    if src.chars().count() != dst.chars().count() {
        return Err(StageError::BadArgument {
            func,
            arg: format!("'{src}' and '{dst}' differ in length"),
        });
    }
    // Later duplicates in `src` win.
    let map: HashMap<char, char> = src.chars().zip(dst.chars()).collect();
    Ok(s.chars().map(|c| map.get(&c).copied().unwrap_or(c)).collect())
}

/// Segment `idx` of `s` split on `delim`; `reverse` counts from the end.
///
/// Missing delimiter or an index past the end gives `""`. A negative index
/// counts back from the other end and must land inside the segment list.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn split_nth(
    func: &'static str,
    s: &str,
    delim: &str,
    idx: i64,
    reverse: bool,
) -> StageResult<String> {
    if delim.is_empty() {
        return Err(StageError::BadArgument {
            func,
            arg: String::new(),
        });
    }
    if !s.contains(delim) {
        return Ok(String::new());
    }

    let mut parts: Vec<&str> = s.split(delim).collect();
    if reverse {
        parts.reverse();
    }
    let len = parts.len() as i64;
    let pos = if idx >= 0 {
        if idx >= len {
            return Ok(String::new());
        }
        idx
    } else {
        let pos = len + idx;
        if pos < 0 {
            return Err(StageError::IndexOutOfRange { func, index: idx });
        }
        pos
    };
    Ok(parts[pos as usize].to_owned())
}

/// Group `grp` (number or name) of the first match, `""` if no match or the
/// group did not participate.
fn extract_group(func: &'static str, re: &Regex, s: &str, grp: &str) -> StageResult<String> {
    let Some(caps) = re.captures(s) else {
        return Ok(String::new());
    };
    let bad = || StageError::BadArgument {
        func,
        arg: grp.to_owned(),
    };
    let m = if let Ok(idx) = grp.parse::<usize>() {
        if idx >= caps.len() {
            return Err(bad());
        }
        caps.get(idx)
    } else {
        if !re.capture_names().any(|n| n == Some(grp)) {
            return Err(bad());
        }
        caps.name(grp)
    };
    Ok(m.map_or_else(String::new, |m| m.as_str().to_owned()))
}

fn pad(s: &str, width: usize, fill: char, left: bool) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.to_owned();
    }
    let padding: String = std::iter::repeat_n(fill, width - len).collect();
    if left {
        format!("{padding}{s}")
    } else {
        format!("{s}{padding}")
    }
}

/// Left-pad with zeros, keeping a leading sign in front.
fn zero_fill(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.to_owned();
    }
    let zeros = "0".repeat(width - len);
    match s.strip_prefix(['+', '-']) {
        Some(rest) => format!("{}{zeros}{rest}", &s[..1]),
        None => format!("{zeros}{s}"),
    }
}

// ── Number formatting ───────────────────────────────────────────────────────

/// Shortest round-trip float text: fixed notation for magnitudes in
/// `[1e-4, 1e16)`, scientific (`1e+16`, `1.5e-05`) outside it, and always a
/// fractional part in fixed notation (`3.0`).
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn float_repr(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_owned();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0.0" } else { "0.0" }.to_owned();
    }

    // `{:e}` yields the shortest digits that round-trip, e.g. "-1.25e-5".
    let sci = format!("{v:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return sci;
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(m) => ("-", m),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|&c| c != '.').collect();

    if (-4..16).contains(&exp) {
        if exp >= 0 {
            let int_len = exp as usize + 1;
            if digits.len() <= int_len {
                let zeros = "0".repeat(int_len - digits.len());
                format!("{sign}{digits}{zeros}.0")
            } else {
                let (int, frac) = digits.split_at(int_len);
                format!("{sign}{int}.{frac}")
            }
        } else {
            let zeros = "0".repeat((-exp - 1) as usize);
            format!("{sign}0.{zeros}{digits}")
        }
    } else {
        let (head, tail) = digits.split_at(1);
        let exp_sign = if exp < 0 { '-' } else { '+' };
        if tail.is_empty() {
            format!("{sign}{head}e{exp_sign}{:02}", exp.abs())
        } else {
            format!("{sign}{head}.{tail}e{exp_sign}{:02}", exp.abs())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(func: Func, word: &str, args: &[&str]) -> StageResult<String> {
        let args: Vec<String> = args.iter().map(|&a| a.to_owned()).collect();
        func.apply(word, &args, None, None)
    }

    fn ok(func: Func, word: &str, args: &[&str]) -> String {
        run(func, word, args).unwrap()
    }

    // ── Table ───────────────────────────────────────────────────────

    #[test]
    fn lookup_known_and_alias() {
        assert_eq!(Func::lookup("upper"), Some(Func::Upper));
        assert_eq!(Func::lookup("subst"), Some(Func::Slice));
        assert_eq!(Func::lookup("nope"), None);
        assert_eq!(Func::Slice.name(), "slice");
    }

    #[test]
    fn every_name_resolves() {
        for name in Func::names() {
            assert!(Func::lookup(name).is_some(), "{name}");
        }
    }

    #[test]
    fn arity_enforced() {
        assert!(matches!(
            run(Func::Upper, "x", &["1"]),
            Err(StageError::TooManyArguments { func: "upper", max: 0, got: 1 })
        ));
        assert!(matches!(
            run(Func::Tr, "x", &["a"]),
            Err(StageError::MissingArgument { func: "tr" })
        ));
        assert!(matches!(
            run(Func::Set, "x", &[]),
            Err(StageError::MissingArgument { func: "set" })
        ));
    }

    // ── Case ────────────────────────────────────────────────────────

    #[test]
    fn case_functions() {
        assert_eq!(ok(Func::Upper, "abc", &[]), "ABC");
        assert_eq!(ok(Func::Lower, "ÄBC", &[]), "äbc");
        assert_eq!(ok(Func::Title, "hello wORLD-foo", &[]), "Hello World-Foo");
        assert_eq!(ok(Func::SwapCase, "aBc1", &[]), "AbC1");
    }

    // ── Slicing ─────────────────────────────────────────────────────

    #[test]
    fn first_and_last() {
        assert_eq!(ok(Func::First, "abcdef", &[]), "a");
        assert_eq!(ok(Func::First, "abcdef", &["3"]), "abc");
        assert_eq!(ok(Func::First, "abcdef", &["-2"]), "abcd");
        assert_eq!(ok(Func::First, "ab", &["10"]), "ab");
        assert_eq!(ok(Func::Last, "abcdef", &["2"]), "ef");
        assert_eq!(ok(Func::Last, "abcdef", &["0"]), "abcdef");
        assert_eq!(ok(Func::Last, "", &["2"]), "");
    }

    #[test]
    fn slice_negative_indices() {
        assert_eq!(ok(Func::Slice, "abcdef", &["1", "3"]), "bc");
        assert_eq!(ok(Func::Slice, "abcdef", &["-3"]), "def");
        assert_eq!(ok(Func::Slice, "abcdef", &["", "-1"]), "abcde");
        assert_eq!(ok(Func::Slice, "abcdef", &["4", "2"]), "");
        assert_eq!(ok(Func::Slice, "äöü", &["1", "2"]), "ö");
    }

    #[test]
    fn slice_bad_argument() {
        assert!(matches!(
            run(Func::First, "abc", &["x"]),
            Err(StageError::BadArgument { func: "first", .. })
        ));
    }

    // ── Trimming ────────────────────────────────────────────────────

    #[test]
    fn strip_variants() {
        assert_eq!(ok(Func::Strip, "  a b  ", &[]), "a b");
        assert_eq!(ok(Func::LStrip, "  a  ", &[]), "a  ");
        assert_eq!(ok(Func::RStrip, "  a  ", &[]), "  a");
        assert_eq!(ok(Func::Strip, "--a-b--", &["-"]), "a-b");
        assert_eq!(ok(Func::Strip, "[x]", &["[]"]), "x");
        assert_eq!(ok(Func::CollapseWs, " a \t b\n c ", &[]), "a b c");
    }

    // ── Replacement ─────────────────────────────────────────────────

    #[test]
    fn replace_literal() {
        assert_eq!(ok(Func::ReplaceStr, "a.b.c", &[".", "/"]), "a/b/c");
    }

    #[test]
    fn replace_regex_with_backrefs() {
        assert_eq!(ok(Func::Replace, "a1b22", &[r"\d+", "#"]), "a#b#");
        assert_eq!(ok(Func::Replace, "k=v", &[r"(\w)=(\w)", r"\2=\1"]), "v=k");
        assert_eq!(ok(Func::Replace, "ABC", &["b", "x"]), "ABC");
        assert_eq!(ok(Func::Replace, "ABC", &["b", "x", "i"]), "AxC");
    }

    #[test]
    fn replace_bad_regex() {
        assert!(matches!(run(Func::Replace, "x", &["(", "y"]), Err(StageError::Regex(_))));
    }

    #[test]
    fn transliterate_pairs() {
        assert_eq!(ok(Func::Tr, "hello", &["el", "ip"]), "hippo");
        assert!(matches!(
            run(Func::Tr, "hello", &["ab", "c"]),
            Err(StageError::BadArgument { func: "tr", .. })
        ));
    }

    // ── Splitting ───────────────────────────────────────────────────

    #[test]
    fn split_forward() {
        assert_eq!(ok(Func::Split, "a.b.c", &["."]), "a");
        assert_eq!(ok(Func::Split, "a.b.c", &[".", "2"]), "c");
        assert_eq!(ok(Func::Split, "a.b.c", &[".", "3"]), "");
        assert_eq!(ok(Func::Split, "abc", &["."]), "");
        assert_eq!(ok(Func::Split, "a.b.c", &[".", "-1"]), "c");
    }

    #[test]
    fn split_reverse() {
        assert_eq!(ok(Func::RSplit, "a.b.c", &["."]), "c");
        assert_eq!(ok(Func::RSplit, "a.b.c", &[".", "1"]), "b");
        assert_eq!(ok(Func::RSplit, "a.b.c", &[".", "-1"]), "a");
    }

    #[test]
    fn split_errors() {
        assert!(matches!(
            run(Func::Split, "a.b", &[".", "-5"]),
            Err(StageError::IndexOutOfRange { func: "split", index: -5 })
        ));
        assert!(matches!(
            run(Func::Split, "a.b", &[""]),
            Err(StageError::BadArgument { func: "split", .. })
        ));
    }

    #[test]
    fn rextract_groups() {
        assert_eq!(ok(Func::RExtract, "id=42;", &[r"id=(\d+)"]), "42");
        assert_eq!(ok(Func::RExtract, "id=42;", &[r"id=\d+", "0"]), "id=42");
        assert_eq!(ok(Func::RExtract, "id=42;", &[r"id=(?P<n>\d+)", "n"]), "42");
        assert_eq!(ok(Func::RExtract, "nothing", &[r"id=(\d+)"]), "");
        assert_eq!(ok(Func::RExtract, "b", &[r"(a)?b"]), "");
    }

    #[test]
    fn rextract_missing_group() {
        assert!(matches!(
            run(Func::RExtract, "id=42", &[r"id=\d+"]),
            Err(StageError::BadArgument { func: "rextract", .. })
        ));
        assert!(matches!(
            run(Func::RExtract, "id=42", &[r"id=(\d+)", "zz"]),
            Err(StageError::BadArgument { .. })
        ));
    }

    // ── Padding ─────────────────────────────────────────────────────

    #[test]
    fn padding() {
        assert_eq!(ok(Func::PadLeft, "7", &["3"]), "  7");
        assert_eq!(ok(Func::PadLeft, "7", &["3", "0"]), "007");
        assert_eq!(ok(Func::PadRight, "ab", &["4", "._"]), "ab..");
        assert_eq!(ok(Func::PadRight, "abcdef", &["4"]), "abcdef");
        assert_eq!(ok(Func::PadLeft, "x", &["-3"]), "x");
    }

    #[test]
    fn zero_fill_keeps_sign() {
        assert_eq!(ok(Func::ZFill, "42", &["5"]), "00042");
        assert_eq!(ok(Func::ZFill, "-42", &["5"]), "-0042");
        assert_eq!(ok(Func::ZFill, "+1", &["3"]), "+01");
        assert_eq!(ok(Func::ZFill, "12345", &["3"]), "12345");
    }

    #[test]
    fn oversized_widths_rejected() {
        assert!(matches!(
            run(Func::ZFill, "7", &["999999999999"]),
            Err(StageError::TooWide { func: "zfill", max: MAX_WIDTH, .. })
        ));
        assert!(matches!(
            run(Func::PadLeft, "x", &["4097"]),
            Err(StageError::TooWide { func: "padleft", .. })
        ));
        assert!(matches!(
            run(Func::PadRight, "x", &["1000000"]),
            Err(StageError::TooWide { func: "padright", .. })
        ));
        assert_eq!(ok(Func::PadLeft, "x", &["4096"]).chars().count(), MAX_WIDTH);
    }

    #[test]
    fn ensure_affixes_idempotent() {
        assert_eq!(ok(Func::EnsurePrefix, "ab", &["a"]), "ab");
        assert_eq!(ok(Func::EnsurePrefix, "b", &["a"]), "ab");
        assert_eq!(ok(Func::EnsureSuffix, "file.log", &[".log"]), "file.log");
        assert_eq!(ok(Func::EnsureSuffix, "file", &[".log"]), "file.log");
    }

    // ── Numbers ─────────────────────────────────────────────────────

    #[test]
    fn int_truncates() {
        assert_eq!(ok(Func::Int, "3.9", &[]), "3");
        assert_eq!(ok(Func::Int, " -2.5 ", &[]), "-2");
        assert_eq!(ok(Func::Int, "-0.5", &[]), "0");
        assert_eq!(ok(Func::Int, "1e3", &[]), "1000");
        assert_eq!(ok(Func::Int, "  ", &[]), "  ");
    }

    #[test]
    fn int_errors() {
        assert!(matches!(
            run(Func::Int, "abc", &[]),
            Err(StageError::NotANumber { func: "int", .. })
        ));
        assert!(matches!(
            run(Func::Int, "inf", &[]),
            Err(StageError::Overflow { func: "int", .. })
        ));
    }

    #[test]
    fn float_formats() {
        assert_eq!(ok(Func::Float, "3", &[]), "3.0");
        assert_eq!(ok(Func::Float, "2.50", &[]), "2.5");
        assert_eq!(ok(Func::Float, "", &[]), "");
        assert!(matches!(run(Func::Float, "x1", &[]), Err(StageError::NotANumber { .. })));
    }

    #[test]
    fn round_decimals() {
        assert_eq!(ok(Func::Round, "3.14159", &["2"]), "3.14");
        assert_eq!(ok(Func::Round, "2.7", &[]), "3");
        assert_eq!(ok(Func::Round, "5", &["1"]), "5.0");
        assert!(matches!(
            run(Func::Round, "1.5", &["-1"]),
            Err(StageError::BadArgument { func: "round", .. })
        ));
        assert!(matches!(
            run(Func::Round, "1.5", &["100000"]),
            Err(StageError::TooWide { func: "round", .. })
        ));
    }

    #[test]
    fn float_repr_notation() {
        assert_eq!(float_repr(0.0), "0.0");
        assert_eq!(float_repr(123.456), "123.456");
        assert_eq!(float_repr(0.001), "0.001");
        assert_eq!(float_repr(0.000_01), "1e-05");
        assert_eq!(float_repr(1.5e-7), "1.5e-07");
        assert_eq!(float_repr(1e15), "1000000000000000.0");
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(-2.5e20), "-2.5e+20");
        assert_eq!(float_repr(f64::INFINITY), "inf");
    }

    // ── Composition ─────────────────────────────────────────────────

    #[test]
    fn composition_renders_templates() {
        let ctx = MatchContext::from_groups(vec![Some("x-1".into()), Some("x".into())]);
        let args = vec![r"[\1]".to_owned()];
        let apply = |f: Func| f.apply("w", &args, None, Some(&ctx)).unwrap();
        assert_eq!(apply(Func::Set), "[x]");
        assert_eq!(apply(Func::Append), "w[x]");
        assert_eq!(apply(Func::Concat), "w[x]");
        assert_eq!(apply(Func::Prepend), "[x]w");
    }

    #[test]
    fn composition_without_context() {
        assert_eq!(ok(Func::Append, "a", &[r"\tb"]), "a\tb");
        assert_eq!(ok(Func::Set, "a", &[r"\1"]), "");
        assert_eq!(ok(Func::Set, "a", &["x", "ignored"]), "x");
    }
}
