//! Transform pipelines.
//!
//! A pipeline is a `|`-separated chain of stages applied to an extracted
//! word. Each stage is either a function call (`upper`, `first(3)`,
//! `replace('\d+', '#')`) or a bare template (`\1-\2`) that replaces the
//! word outright.
//!
//! Parsing happens once, when the catalog loads: function names resolve to
//! [`Func`] values and regex arguments are compiled. An unrecognized name
//! becomes a no-op stage. Applying a pipeline to a word cannot fail: if any
//! stage errors, the word keeps its pre-pipeline value and the failure is
//! logged.

pub mod func;
pub mod token;

use regex::Regex;

use crate::error::{StageError, StageResult};
use crate::matcher::MatchContext;
use crate::template;

pub use func::Func;

/// One resolved stage.
#[derive(Debug, Clone)]
pub enum Stage {
    /// A template that replaces the word.
    Template(String),

    /// A known function with its arguments.
    Call(Call),

    /// A call to a function that does not exist. Leaves the word unchanged.
    Unknown(String),
}

/// A resolved function call.
#[derive(Debug, Clone)]
pub struct Call {
    func: Func,
    args: Vec<String>,
    regex: Option<Result<Regex, regex::Error>>,
}

impl Call {
    fn new(func: Func, args: Vec<String>) -> Self {
        let regex = func.compile_regex(&args);
        Self { func, args, regex }
    }

    #[must_use]
    pub const fn func(&self) -> Func {
        self.func
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn apply(&self, word: &str, ctx: Option<&MatchContext>) -> StageResult<String> {
        let regex = match &self.regex {
            Some(Ok(re)) => Some(re),
            Some(Err(e)) => return Err(StageError::Regex(e.clone())),
            None => None,
        };
        self.func.apply(word, &self.args, regex, ctx)
    }
}

impl Stage {
    /// Resolve one stage token.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token::parse_call(token) {
            None => Self::Template(token.to_owned()),
            Some(call) => match Func::lookup(&call.name) {
                Some(func) => Self::Call(Call::new(func, call.args)),
                None => Self::Unknown(call.name),
            },
        }
    }

    fn apply(&self, word: String, ctx: Option<&MatchContext>) -> StageResult<String> {
        match self {
            Self::Template(tmpl) => Ok(template::render(tmpl, ctx)),
            Self::Call(call) => call.apply(&word, ctx),
            Self::Unknown(_) => Ok(word),
        }
    }
}

/// A parsed pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    source: String,
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Parse `src` into stages. Never fails; see [`Stage::Unknown`].
    ///
    /// # Examples
    ///
    /// ```
    /// use pw_engine::pipeline::Pipeline;
    ///
    /// let p = Pipeline::parse("lower | ensure_prefix('#')");
    /// assert_eq!(p.apply("TAG", None), "#tag");
    /// ```
    #[must_use]
    pub fn parse(src: &str) -> Self {
        let stages = token::split_stages(src).iter().map(|t| Stage::parse(t)).collect();
        Self {
            source: src.to_owned(),
            stages,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Names of stages that called an unrecognized function.
    pub fn unknown_functions(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().filter_map(|s| match s {
            Stage::Unknown(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Run every stage in order.
    ///
    /// # Errors
    ///
    /// The first stage error, with no partial result.
    pub fn try_apply(&self, word: &str, ctx: Option<&MatchContext>) -> StageResult<String> {
        self.stages
            .iter()
            .try_fold(word.to_owned(), |w, stage| stage.apply(w, ctx))
    }

    /// Run every stage; on any stage error, log it and return `word`
    /// unchanged.
    #[must_use]
    pub fn apply(&self, word: &str, ctx: Option<&MatchContext>) -> String {
        match self.try_apply(word, ctx) {
            Ok(out) => out,
            Err(e) => {
                log::warn!("pipeline '{}': {e}; word '{word}' left unchanged", self.source);
                word.to_owned()
            }
        }
    }
}

/// Parse and apply `src` in one step.
#[must_use]
pub fn apply_pipeline(word: &str, src: &str, ctx: Option<&MatchContext>) -> String {
    Pipeline::parse(src).apply(word, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn groups(gs: &[&str]) -> MatchContext {
        MatchContext::from_groups(gs.iter().map(|g| Some((*g).to_owned())).collect())
    }

    // ── Parsing ─────────────────────────────────────────────────────

    #[test]
    fn stages_resolve_at_parse_time() {
        let p = Pipeline::parse(r"upper | \1 | bogus(1) | first(2)");
        let kinds: Vec<&str> = p
            .stages()
            .iter()
            .map(|s| match s {
                Stage::Template(_) => "template",
                Stage::Call(_) => "call",
                Stage::Unknown(_) => "unknown",
            })
            .collect();
        assert_eq!(kinds, vec!["call", "template", "unknown", "call"]);
        assert_eq!(p.unknown_functions().collect::<Vec<_>>(), vec!["bogus"]);
    }

    #[test]
    fn call_keeps_args() {
        let p = Pipeline::parse("padleft(5, '0')");
        let Stage::Call(call) = &p.stages()[0] else {
            panic!("expected call");
        };
        assert_eq!(call.func(), Func::PadLeft);
        assert_eq!(call.args(), ["5", "0"]);
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let p = Pipeline::parse("  ");
        assert!(p.is_empty());
        assert_eq!(p.apply("word", None), "word");
    }

    // ── Application ─────────────────────────────────────────────────

    #[test]
    fn chain_applies_left_to_right() {
        assert_eq!(apply_pipeline("  Hello World ", "strip | lower | replace_str(' ', '_')", None), "hello_world");
    }

    #[test]
    fn scenario_c_upper_then_first() {
        assert_eq!(apply_pipeline("example", "upper|first(3)", None), "EXA");
    }

    #[test]
    fn template_stage_replaces_word() {
        let ctx = groups(&["u@h", "u", "h"]);
        assert_eq!(apply_pipeline("ignored", r"\2 | upper", Some(&ctx)), "H");
    }

    #[test]
    fn escaped_pipe_inside_argument() {
        assert_eq!(apply_pipeline("a/b", r"replace_str('/', '\|')", None), "a|b");
    }

    #[test]
    fn unknown_function_is_noop() {
        assert_eq!(apply_pipeline("abc", "frobnicate(1) | upper", None), "ABC");
    }

    #[test]
    fn error_reverts_to_original_word() {
        // `upper` ran before the failure; its effect is discarded too.
        assert_eq!(apply_pipeline("abc", "upper | int", None), "abc");
        assert_eq!(apply_pipeline("abc", "first(x)", None), "abc");
    }

    #[test]
    fn oversized_fill_reverts() {
        assert_eq!(apply_pipeline("42", "upper | zfill(999999999999)", None), "42");
        assert_eq!(apply_pipeline("42", "padleft(5000, '*')", None), "42");
    }

    #[test]
    fn bad_regex_reverts_every_time() {
        let p = Pipeline::parse("replace('(', 'x')");
        assert!(matches!(p.try_apply("a(b", None), Err(StageError::Regex(_))));
        assert_eq!(p.apply("a(b", None), "a(b");
        assert_eq!(p.apply("a(b", None), "a(b");
    }

    #[test]
    fn composition_uses_match_context() {
        let ctx = groups(&["web-01:443", "web-01", "443"]);
        assert_eq!(apply_pipeline("web-01", r"append(':\2')", Some(&ctx)), "web-01:443");
    }

    #[test]
    fn round_trip_numeric_chain() {
        assert_eq!(apply_pipeline("3.14159", "round(2) | ensure_suffix('s')", None), "3.14s");
    }

    proptest! {
        #[test]
        fn unknown_function_leaves_word(word in ".{0,20}", name in "zz[a-z]{1,8}") {
            prop_assert_eq!(apply_pipeline(&word, &name, None), word.clone());
            let with_args = format!("{name}(1, 'a')");
            prop_assert_eq!(apply_pipeline(&word, &with_args, None), word);
        }
    }
}
