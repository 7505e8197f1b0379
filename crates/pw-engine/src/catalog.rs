//! Pattern catalog.
//!
//! A catalog is a text file with one pattern per line and up to five
//! fields separated by the field separator (tab by default):
//!
//! ```text
//! ID  LINE_REGEX  [WORD_REGEX  [TEMPLATE  [PIPELINE]]]
//! ```
//!
//! Blank lines and lines whose first non-space character is `#` are
//! ignored. A bad line never aborts the load: it is skipped (or, for a bad
//! word regex, loaded without one) and reported as a [`Diagnostic`].
//!
//! Regexes may use the bracket classes `[[:alpha:]]`, `[[:digit:]]`,
//! `[[:alnum:]]`, `[[:space:]]`, `[[:lower:]]`, `[[:upper:]]`,
//! `[[:xdigit:]]`, `[[:word:]]` and `[[:punct:]]` as whole tokens; they are
//! rewritten to native classes before compiling.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use regex::{Regex, RegexBuilder};

use crate::error::CatalogError;
use crate::options::EngineOptions;
use crate::pipeline::Pipeline;

/// Bracket class → native regex class.
const POSIX_CLASSES: &[(&str, &str)] = &[
    ("[[:alpha:]]", "[A-Za-z]"),
    ("[[:digit:]]", r"\d"),
    ("[[:alnum:]]", "[0-9A-Za-z]"),
    ("[[:space:]]", r"\s"),
    ("[[:lower:]]", "[a-z]"),
    ("[[:upper:]]", "[A-Z]"),
    ("[[:xdigit:]]", "[0-9A-Fa-f]"),
    ("[[:word:]]", r"\w"),
    ("[[:punct:]]", r"[^\w\s]"),
];

/// Rewrite bracket-class tokens to native syntax.
///
/// # Examples
///
/// ```
/// use pw_engine::catalog::expand_posix_classes;
///
/// assert_eq!(expand_posix_classes("[[:digit:]]+"), "\\d+");
/// ```
#[must_use]
pub fn expand_posix_classes(rx: &str) -> String {
    if !rx.contains("[[:") {
        return rx.to_owned();
    }
    POSIX_CLASSES
        .iter()
        .fold(rx.to_owned(), |acc, (from, to)| acc.replace(from, to))
}

fn compile(rx: &str, ignore_case: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&expand_posix_classes(rx))
        .case_insensitive(ignore_case)
        .build()
}

// ---------------------------------------------------------------------------
// PatternSpec
// ---------------------------------------------------------------------------

/// One compiled catalog entry. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct PatternSpec {
    id: String,
    line_re: Regex,
    word_re: Option<Regex>,
    template: Option<String>,
    pipeline: Option<Pipeline>,
}

impl PatternSpec {
    /// Start building a pattern in code.
    #[must_use]
    pub fn builder(id: &str, line_regex: &str) -> PatternSpecBuilder {
        PatternSpecBuilder {
            id: id.to_owned(),
            line: line_regex.to_owned(),
            word: None,
            template: None,
            pipeline: None,
            ignore_case: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn line_regex(&self) -> &Regex {
        &self.line_re
    }

    #[must_use]
    pub const fn word_regex(&self) -> Option<&Regex> {
        self.word_re.as_ref()
    }

    /// Template, `None` when the field is absent or empty.
    #[must_use]
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Pipeline, `None` when the field is absent or has no stages.
    #[must_use]
    pub const fn pipeline(&self) -> Option<&Pipeline> {
        self.pipeline.as_ref()
    }
}

/// Builder for [`PatternSpec`]. Unlike catalog loading, an invalid word
/// regex here is an error.
#[derive(Debug, Clone)]
pub struct PatternSpecBuilder {
    id: String,
    line: String,
    word: Option<String>,
    template: Option<String>,
    pipeline: Option<String>,
    ignore_case: bool,
}

impl PatternSpecBuilder {
    #[must_use]
    pub fn word(mut self, rx: &str) -> Self {
        self.word = Some(rx.to_owned());
        self
    }

    #[must_use]
    pub fn template(mut self, tmpl: &str) -> Self {
        self.template = Some(tmpl.to_owned());
        self
    }

    #[must_use]
    pub fn pipeline(mut self, src: &str) -> Self {
        self.pipeline = Some(src.to_owned());
        self
    }

    #[must_use]
    pub const fn ignore_case(mut self, yes: bool) -> Self {
        self.ignore_case = yes;
        self
    }

    /// Compile the regexes.
    ///
    /// # Errors
    ///
    /// Returns the regex error of the line or word regex.
    pub fn build(self) -> Result<PatternSpec, regex::Error> {
        let line_re = compile(&self.line, self.ignore_case)?;
        let word_re = match self.word.as_deref() {
            Some(rx) if !rx.is_empty() => Some(compile(rx, self.ignore_case)?),
            _ => None,
        };
        Ok(PatternSpec {
            id: self.id,
            line_re,
            word_re,
            template: self.template.filter(|t| !t.is_empty()),
            pipeline: self
                .pipeline
                .map(|p| Pipeline::parse(&p))
                .filter(|p| !p.is_empty()),
        })
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Why a catalog line was skipped or degraded.
#[derive(Debug, Clone)]
pub enum Problem {
    /// Fewer than two fields.
    TooFewFields,
    /// Empty id or empty line regex.
    EmptyField,
    /// The line regex does not compile; the line was skipped.
    BadLineRegex(regex::Error),
    /// The word regex does not compile; the pattern loaded without one.
    BadWordRegex(regex::Error),
    /// The pipeline calls a function that does not exist; that stage is a
    /// no-op.
    UnknownFunction(String),
}

/// A problem found on one catalog line.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// 1-based line number.
    pub line: usize,
    pub problem: Problem,
}

impl Diagnostic {
    /// Whether the line was dropped entirely.
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(
            self.problem,
            Problem::TooFewFields | Problem::EmptyField | Problem::BadLineRegex(_)
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;
        match &self.problem {
            Problem::TooFewFields => {
                write!(f, "expected at least 2 fields (ID, LINE_REGEX); skipped")
            }
            Problem::EmptyField => write!(f, "empty ID or LINE_REGEX; skipped"),
            Problem::BadLineRegex(e) => write!(f, "invalid LINE_REGEX: {e}; skipped"),
            Problem::BadWordRegex(e) => write!(f, "invalid WORD_REGEX: {e}; WORD_REGEX ignored"),
            Problem::UnknownFunction(name) => {
                write!(f, "unknown pipeline function '{name}'; stage ignored")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Ordered, immutable list of patterns.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    patterns: Vec<PatternSpec>,
    diagnostics: Vec<Diagnostic>,
}

impl Catalog {
    /// Parse catalog text. Every problem is logged at warn level and kept
    /// in [`diagnostics`](Self::diagnostics).
    #[must_use]
    pub fn parse(text: &str, opts: &EngineOptions) -> Self {
        let fs = if opts.field_sep.is_empty() {
            "\t"
        } else {
            opts.field_sep.as_str()
        };
        let mut catalog = Self::default();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            catalog.parse_line(line_no, line, fs, opts.ignore_case);
        }

        for d in &catalog.diagnostics {
            log::warn!("{d}");
        }
        catalog
    }

    fn parse_line(&mut self, line_no: usize, line: &str, fs: &str, ignore_case: bool) {
        let fields: Vec<&str> = line.splitn(5, fs).collect();
        if fields.len() < 2 {
            self.report(line_no, Problem::TooFewFields);
            return;
        }

        let id = fields[0].trim();
        let line_rx = fields[1];
        if id.is_empty() || line_rx.is_empty() {
            self.report(line_no, Problem::EmptyField);
            return;
        }

        let line_re = match compile(line_rx, ignore_case) {
            Ok(re) => re,
            Err(e) => {
                self.report(line_no, Problem::BadLineRegex(e));
                return;
            }
        };

        let word_re = match fields.get(2).copied().filter(|rx| !rx.is_empty()) {
            None => None,
            Some(rx) => match compile(rx, ignore_case) {
                Ok(re) => Some(re),
                Err(e) => {
                    self.report(line_no, Problem::BadWordRegex(e));
                    None
                }
            },
        };

        let template = fields
            .get(3)
            .filter(|t| !t.is_empty())
            .map(|t| (*t).to_owned());
        let pipeline = fields
            .get(4)
            .map(|p| Pipeline::parse(p))
            .filter(|p| !p.is_empty());

        for name in pipeline.iter().flat_map(Pipeline::unknown_functions) {
            self.report(line_no, Problem::UnknownFunction(name.to_owned()));
        }

        self.patterns.push(PatternSpec {
            id: id.to_owned(),
            line_re,
            word_re,
            template,
            pipeline,
        });
    }

    fn report(&mut self, line: usize, problem: Problem) {
        self.diagnostics.push(Diagnostic { line, problem });
    }

    /// Read and parse the catalog at `path`.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Io`] if the file cannot be read,
    /// [`CatalogError::Encoding`] if it is not UTF-8, and
    /// [`CatalogError::Empty`] if no line produced a pattern.
    pub fn load(path: &Path, opts: &EngineOptions) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::InvalidData {
                CatalogError::Encoding {
                    path: path.to_path_buf(),
                }
            } else {
                CatalogError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let catalog = Self::parse(&text, opts);
        if catalog.is_empty() {
            return Err(CatalogError::Empty {
                path: path.to_path_buf(),
            });
        }
        log::debug!("loaded {} pattern(s) from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    #[must_use]
    pub fn patterns(&self) -> &[PatternSpec] {
        &self.patterns
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn parse(text: &str) -> Catalog {
        Catalog::parse(text, &EngineOptions::default())
    }

    fn ids(c: &Catalog) -> Vec<&str> {
        c.patterns().iter().map(PatternSpec::id).collect()
    }

    // ── Parsing ─────────────────────────────────────────────────────

    #[test]
    fn parses_all_fields() {
        let c = parse("HTTP\tGET\tGET (\\S+)\t[\\1]\tupper | first(4)\n");
        let p = &c.patterns()[0];
        assert_eq!(p.id(), "HTTP");
        assert!(p.word_regex().is_some());
        assert_eq!(p.template(), Some("[\\1]"));
        assert_eq!(p.pipeline().unwrap().stages().len(), 2);
        assert!(c.diagnostics().is_empty());
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let c = parse("# header\n\n   \n  # indented\nA\tx\n");
        assert_eq!(ids(&c), vec!["A"]);
        assert!(c.diagnostics().is_empty());
    }

    #[test]
    fn crlf_line_endings() {
        let c = parse("A\tfoo\tbar\r\nB\tbaz\r\n");
        assert_eq!(ids(&c), vec!["A", "B"]);
        assert_eq!(c.patterns()[0].word_regex().unwrap().as_str(), "bar");
    }

    #[test]
    fn id_is_trimmed() {
        assert_eq!(ids(&parse("  X  \tfoo\n")), vec!["X"]);
    }

    #[test]
    fn fifth_field_keeps_separators() {
        let c = parse("A\tx\t\t\tset('a\tb')\n");
        assert_eq!(c.patterns()[0].pipeline().unwrap().source(), "set('a\tb')");
    }

    #[test]
    fn empty_optional_fields_are_none() {
        let c = parse("A\tx\t\t\t\n");
        let p = &c.patterns()[0];
        assert!(p.word_regex().is_none());
        assert!(p.template().is_none());
        assert!(p.pipeline().is_none());
    }

    #[test]
    fn custom_field_separator() {
        let opts = EngineOptions {
            field_sep: ";".into(),
            ..EngineOptions::default()
        };
        let c = Catalog::parse("A;err;code=(\\d+)\n", &opts);
        assert_eq!(ids(&c), vec!["A"]);
        assert!(c.patterns()[0].word_regex().is_some());
    }

    #[test]
    fn ignore_case_applies_to_both_regexes() {
        let opts = EngineOptions {
            ignore_case: true,
            ..EngineOptions::default()
        };
        let c = Catalog::parse("A\terror\tdisk\n", &opts);
        let p = &c.patterns()[0];
        assert!(p.line_regex().is_match("ERROR"));
        assert!(p.word_regex().unwrap().is_match("DISK"));
    }

    // ── Diagnostics ─────────────────────────────────────────────────

    #[test]
    fn bad_lines_skipped_rest_loads() {
        let c = parse("only-one-field\n\tx\nB\t(\nC\tok\n");
        assert_eq!(ids(&c), vec!["C"]);
        let lines: Vec<usize> = c.diagnostics().iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert!(c.diagnostics().iter().all(Diagnostic::is_skip));
        assert!(matches!(c.diagnostics()[2].problem, Problem::BadLineRegex(_)));
    }

    #[test]
    fn bad_word_regex_keeps_pattern() {
        let c = parse("A\tx\t(\n");
        assert_eq!(ids(&c), vec!["A"]);
        assert!(c.patterns()[0].word_regex().is_none());
        assert!(matches!(c.diagnostics()[0].problem, Problem::BadWordRegex(_)));
        assert!(!c.diagnostics()[0].is_skip());
    }

    #[test]
    fn unknown_function_reported() {
        let c = parse("A\tx\t\t\tupper | wibble(2)\n");
        assert_eq!(c.len(), 1);
        let d = &c.diagnostics()[0];
        assert_eq!(d.to_string(), "line 1: unknown pipeline function 'wibble'; stage ignored");
    }

    // ── POSIX classes ───────────────────────────────────────────────

    #[test]
    fn posix_classes_expand() {
        assert_eq!(expand_posix_classes("[[:alpha:]][[:digit:]]+"), "[A-Za-z]\\d+");
        assert_eq!(expand_posix_classes("[[:punct:]]"), "[^\\w\\s]");
        assert_eq!(expand_posix_classes("plain"), "plain");
    }

    #[test]
    fn posix_classes_compile_in_catalog() {
        let c = parse("N\t[[:upper:]]{3}\t[[:xdigit:]]+$\n");
        let p = &c.patterns()[0];
        assert!(p.line_regex().is_match("xx ABC"));
        assert!(!p.line_regex().is_match("abc"));
        assert_eq!(p.word_regex().unwrap().find("ABC 0fa9").unwrap().as_str(), "0fa9");
    }

    // ── Builder ─────────────────────────────────────────────────────

    #[test]
    fn builder_rejects_bad_word_regex() {
        assert!(PatternSpec::builder("A", "x").word("(").build().is_err());
        assert!(PatternSpec::builder("A", "(").build().is_err());
    }

    #[test]
    fn builder_empty_pipeline_is_none() {
        let p = PatternSpec::builder("A", "x").pipeline(" | ").build().unwrap();
        assert!(p.pipeline().is_none());
    }

    // ── Loading from disk ───────────────────────────────────────────

    #[test]
    fn load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "# patterns").unwrap();
        writeln!(f, "ERR\tERROR").unwrap();
        writeln!(f, "WARN\tWARN\t\\w+$").unwrap();
        let c = Catalog::load(f.path(), &EngineOptions::default()).unwrap();
        assert_eq!(ids(&c), vec!["ERR", "WARN"]);
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.tsv");
        let err = Catalog::load(&path, &EngineOptions::default()).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn load_rejects_empty_catalog() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "# nothing here").unwrap();
        writeln!(f, "bad-line").unwrap();
        let err = Catalog::load(f.path(), &EngineOptions::default()).unwrap_err();
        assert!(matches!(err, CatalogError::Empty { .. }));
    }

    #[test]
    fn load_rejects_non_utf8() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"A\t\xff\xfe\n").unwrap();
        let err = Catalog::load(f.path(), &EngineOptions::default()).unwrap_err();
        assert!(matches!(err, CatalogError::Encoding { .. }));
    }
}
