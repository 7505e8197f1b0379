//! Per-cycle accumulation.
//!
//! Each cycle starts from an empty [`Accumulator`] holding one
//! [`PatternState`] per catalog entry, in catalog order. Every input line is
//! tested against every pattern; each match bumps the pattern's count and
//! records the extracted word, its transformed alternate, and the color key.
//!
//! Invariants per pattern: `words` and `keys` have equal length (one entry
//! per non-empty extracted word), and `alts` has one entry per match, empty
//! words included.

use std::collections::BTreeSet;

use crate::catalog::Catalog;
use crate::matcher::{self, MatchResult};
use crate::options::EngineOptions;

/// What one pattern saw during one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternState {
    id: String,
    count: usize,
    words: Vec<String>,
    keys: Vec<String>,
    alts: Vec<String>,
    refs: BTreeSet<String>,
}

impl PatternState {
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            ..Self::default()
        }
    }

    /// Record one match. `alt` is the word after the pipeline (or the word
    /// itself when the pattern has none).
    pub fn record(&mut self, result: &MatchResult, alt: String) {
        self.count += 1;
        if let Some(first) = result.context.as_ref().and_then(|c| c.first_group()) {
            if !self.refs.contains(first) {
                self.refs.insert(first.to_owned());
            }
        }
        if !result.word.is_empty() {
            let key = if alt.is_empty() { &result.word } else { &alt };
            self.keys.push(key.clone());
            self.words.push(result.word.clone());
        }
        self.alts.push(alt);
    }

    /// Forget everything but the id.
    pub fn reset(&mut self) {
        self.count = 0;
        self.words.clear();
        self.keys.clear();
        self.alts.clear();
        self.refs.clear();
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Lines matched this cycle.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Non-empty extracted words, in input order.
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Color key per entry of [`words`](Self::words): the alternate word,
    /// or the word itself when the alternate is empty.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Alternate words, one per match.
    #[must_use]
    pub fn alts(&self) -> &[String] {
        &self.alts
    }

    /// Distinct first-group values, sorted. A group that matched the empty
    /// string is recorded as `""`; one that did not take part is not.
    #[must_use]
    pub const fn refs(&self) -> &BTreeSet<String> {
        &self.refs
    }
}

/// One cycle's worth of [`PatternState`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    states: Vec<PatternState>,
    lines: usize,
}

impl Accumulator {
    /// Empty states for every pattern in `catalog`.
    #[must_use]
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            states: catalog
                .patterns()
                .iter()
                .map(|p| PatternState::new(p.id()))
                .collect(),
            lines: 0,
        }
    }

    /// Match one line against every pattern.
    ///
    /// `catalog` must be the catalog this accumulator was created from.
    pub fn feed_line(&mut self, catalog: &Catalog, line: &str, opts: &EngineOptions) {
        self.lines += 1;
        for (spec, state) in catalog.patterns().iter().zip(&mut self.states) {
            let Some(result) = matcher::extract(spec, line, opts) else {
                continue;
            };
            let alt = match spec.pipeline() {
                Some(p) => p.apply(&result.word, result.context.as_ref()),
                None => result.word.clone(),
            };
            state.record(&result, alt);
        }
    }

    /// Feed every line of `text`.
    pub fn feed(&mut self, catalog: &Catalog, text: &str, opts: &EngineOptions) {
        for line in text.lines() {
            self.feed_line(catalog, line, opts);
        }
    }

    /// Build a complete accumulation from `lines`.
    #[must_use]
    pub fn from_lines<'l>(
        catalog: &Catalog,
        lines: impl IntoIterator<Item = &'l str>,
        opts: &EngineOptions,
    ) -> Self {
        let mut acc = Self::new(catalog);
        for line in lines {
            acc.feed_line(catalog, line, opts);
        }
        acc
    }

    /// Reset every pattern for a new cycle.
    pub fn reset(&mut self) {
        self.lines = 0;
        for s in &mut self.states {
            s.reset();
        }
    }

    #[must_use]
    pub fn states(&self) -> &[PatternState] {
        &self.states
    }

    /// Input lines seen, matched or not.
    #[must_use]
    pub const fn lines(&self) -> usize {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog(text: &str) -> Catalog {
        Catalog::parse(text, &EngineOptions::default())
    }

    fn run(cat: &str, input: &str) -> Accumulator {
        let c = catalog(cat);
        let mut acc = Accumulator::new(&c);
        acc.feed(&c, input, &EngineOptions::default());
        acc
    }

    #[test]
    fn scenario_a_last_token() {
        let acc = run("ERR\tERROR\n", "2024 ERROR disk-full\n");
        let s = &acc.states()[0];
        assert_eq!(s.id(), "ERR");
        assert_eq!(s.count(), 1);
        assert_eq!(s.words(), ["disk-full"]);
    }

    #[test]
    fn scenario_a_word_regex() {
        let acc = run("ERR\t^ERROR\t(\\w+)$\n", "ERROR disk-full\n2024 ERROR late\n");
        let s = &acc.states()[0];
        assert_eq!(s.count(), 1);
        assert_eq!(s.words(), ["full"]);
        assert!(s.refs().contains("full"));
    }

    #[test]
    fn every_pattern_sees_every_line() {
        let acc = run("A\terr\nB\tdisk\n", "err disk\nerr cpu\nok\n");
        let counts: Vec<usize> = acc.states().iter().map(PatternState::count).collect();
        assert_eq!(counts, vec![2, 1]);
        assert_eq!(acc.lines(), 3);
    }

    #[test]
    fn empty_words_count_but_are_not_listed() {
        let acc = run("A\terr\tcode=(\\d+)\n", "err code=7\nerr nothing\n");
        let s = &acc.states()[0];
        assert_eq!(s.count(), 2);
        assert_eq!(s.words(), ["7"]);
        assert_eq!(s.keys().len(), s.words().len());
        assert_eq!(s.alts(), ["7", ""]);
    }

    #[test]
    fn keys_prefer_alternate_word() {
        let acc = run("A\tlogin\tuser=(\\w+)\t\tupper\n", "login user=bob\n");
        let s = &acc.states()[0];
        assert_eq!(s.words(), ["bob"]);
        assert_eq!(s.keys(), ["BOB"]);
        assert_eq!(s.alts(), ["BOB"]);
    }

    #[test]
    fn key_falls_back_when_alternate_empty() {
        let acc = run("A\tid\tid=(\\w+)\t\tset('')\n", "id=abc\n");
        let s = &acc.states()[0];
        assert_eq!(s.alts(), [""]);
        assert_eq!(s.keys(), ["abc"]);
    }

    #[test]
    fn pipeline_sees_word_regex_context() {
        let acc = run("H\tGET\tGET (\\S+) (\\d+)\t\\1\tappend(':\\2')\n", "GET /a 404\n");
        let s = &acc.states()[0];
        assert_eq!(s.words(), ["/a"]);
        assert_eq!(s.alts(), ["/a:404"]);
    }

    #[test]
    fn refs_sorted_and_distinct() {
        let acc = run("A\tconn\t(\\w+)@\n", "conn b@x\nconn a@y\nconn b@z\n");
        let refs: Vec<&str> = acc.states()[0].refs().iter().map(String::as_str).collect();
        assert_eq!(refs, vec!["a", "b"]);
    }

    #[test]
    fn empty_first_group_is_a_value() {
        let acc = run("A\tconn\t(\\w*)@\n", "conn @x\nconn b@y\n");
        let refs: Vec<&str> = acc.states()[0].refs().iter().map(String::as_str).collect();
        assert_eq!(refs, vec!["", "b"]);

        let acc = run("A\tconn\t(a)?@\n", "conn @x\n");
        assert!(acc.states()[0].refs().is_empty());
    }

    #[test]
    fn input_order_preserved() {
        let acc = run("A\tn=\n", "n= 3\nn= 1\nn= 2\n");
        assert_eq!(acc.states()[0].words(), ["3", "1", "2"]);
    }

    #[test]
    fn reset_clears_everything_but_ids() {
        let mut acc = run("A\terr\n", "err x\n");
        acc.reset();
        let s = &acc.states()[0];
        assert_eq!(s.id(), "A");
        assert_eq!(s.count(), 0);
        assert!(s.words().is_empty() && s.alts().is_empty() && s.refs().is_empty());
        assert_eq!(acc.lines(), 0);
    }

    #[test]
    fn from_lines_matches_feed() {
        let c = catalog("A\terr\n");
        let opts = EngineOptions::default();
        let a = Accumulator::from_lines(&c, ["err one", "err two"], &opts);
        let mut b = Accumulator::new(&c);
        b.feed(&c, "err one\nerr two\n", &opts);
        assert_eq!(a, b);
    }
}
