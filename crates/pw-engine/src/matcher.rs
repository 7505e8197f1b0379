//! Line matching and word extraction.
//!
//! A line belongs to a pattern when the pattern's line regex is found
//! anywhere in it. The word extracted from a matching line is chosen in
//! this order:
//!
//! 1. A word regex is configured but finds nothing: empty word, no context.
//! 2. A word regex matches and a template is configured: the rendered
//!    template.
//! 3. A word regex matches: its non-empty groups joined by the group
//!    separator, or the whole match when no group captured anything.
//! 4. No word regex: the last whitespace-separated token of the line.
//!
//! When the word regex matched, its captures travel with the word as a
//! [`MatchContext`] so the pipeline can resolve backreferences.

use std::collections::HashMap;

use regex::{Captures, Regex};

use crate::catalog::PatternSpec;
use crate::options::EngineOptions;
use crate::template::{self, Backrefs};

/// Owned capture groups of one word-regex match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchContext {
    /// Index 0 is the whole match; `None` marks a group that did not
    /// participate.
    groups: Vec<Option<String>>,
    names: HashMap<String, usize>,
}

impl MatchContext {
    /// Context from raw groups, group 0 first. No named groups.
    #[must_use]
    pub fn from_groups(groups: Vec<Option<String>>) -> Self {
        Self {
            groups,
            names: HashMap::new(),
        }
    }

    /// Snapshot `caps`, a match of `re`.
    #[must_use]
    pub fn from_captures(re: &Regex, caps: &Captures<'_>) -> Self {
        let groups = caps
            .iter()
            .map(|g| g.map(|m| m.as_str().to_owned()))
            .collect();
        let names = re
            .capture_names()
            .enumerate()
            .filter_map(|(i, n)| n.map(|n| (n.to_owned(), i)))
            .collect();
        Self { groups, names }
    }

    /// Search `text` with `re`, `None` if it does not match.
    #[must_use]
    pub fn capture(re: &Regex, text: &str) -> Option<Self> {
        re.captures(text).map(|caps| Self::from_captures(re, &caps))
    }

    /// All groups, whole match first.
    #[must_use]
    pub fn groups(&self) -> &[Option<String>] {
        &self.groups
    }

    /// Number of capture groups, not counting the whole match.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len().saturating_sub(1)
    }

    /// Value of group 1 if it took part in the match, possibly empty.
    #[must_use]
    pub fn first_group(&self) -> Option<&str> {
        self.group(1)
    }

    /// The whole match.
    #[must_use]
    pub fn whole(&self) -> &str {
        self.group(0).unwrap_or("")
    }
}

impl Backrefs for MatchContext {
    fn group(&self, idx: usize) -> Option<&str> {
        self.groups.get(idx).and_then(Option::as_deref)
    }

    fn named(&self, name: &str) -> Option<&str> {
        self.names.get(name).and_then(|&idx| self.group(idx))
    }
}

/// The result of a line matching a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Extracted (and, if enabled, punctuation-stripped) word. May be empty.
    pub word: String,

    /// Captures of the word regex, when it matched.
    pub context: Option<MatchContext>,
}

/// Match `line` against `spec`; `None` if the line regex is not found.
#[must_use]
pub fn extract(spec: &PatternSpec, line: &str, opts: &EngineOptions) -> Option<MatchResult> {
    if !spec.line_regex().is_match(line) {
        return None;
    }
    let (mut word, context) = extract_word(spec, line, &opts.group_sep);
    if opts.strip_punct && !word.is_empty() {
        word = strip_punct(&word).to_owned();
    }
    Some(MatchResult { word, context })
}

/// Word and match context for a line already known to match.
#[must_use]
pub fn extract_word(
    spec: &PatternSpec,
    line: &str,
    group_sep: &str,
) -> (String, Option<MatchContext>) {
    let Some(word_re) = spec.word_regex() else {
        return (last_token(line).to_owned(), None);
    };
    let Some(ctx) = MatchContext::capture(word_re, line) else {
        return (String::new(), None);
    };

    let word = if let Some(tmpl) = spec.template() {
        template::render(tmpl, Some(&ctx))
    } else {
        let parts: Vec<&str> = ctx.groups[1..]
            .iter()
            .filter_map(|g| g.as_deref())
            .filter(|g| !g.is_empty())
            .collect();
        if parts.is_empty() {
            ctx.whole().to_owned()
        } else {
            parts.join(group_sep)
        }
    };
    (word, Some(ctx))
}

/// Last whitespace-separated token, `""` for a blank line.
#[must_use]
pub fn last_token(line: &str) -> &str {
    line.split_whitespace().next_back().unwrap_or("")
}

/// Trim leading and trailing characters that are neither word characters
/// nor whitespace.
///
/// # Examples
///
/// ```
/// use pw_engine::matcher::strip_punct;
///
/// assert_eq!(strip_punct("(disk-full)."), "disk-full");
/// assert_eq!(strip_punct("--"), "");
/// ```
#[must_use]
pub fn strip_punct(word: &str) -> &str {
    let is_punct = |c: char| !(c.is_alphanumeric() || c == '_' || c.is_whitespace());
    word.trim_matches(is_punct)
}
