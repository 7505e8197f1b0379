//! Backreference templates.
//!
//! A template is plain text with a handful of backslash forms:
//!
//! | Form         | Renders as                                         |
//! |--------------|----------------------------------------------------|
//! | `\N`         | capture group N (any number of digits; 0 = whole)  |
//! | `\g<name>`   | named group, or numbered group if `name` is digits |
//! | `\t \n \r`   | tab, newline, carriage return                      |
//! | `\\`         | a single backslash                                 |
//!
//! A group that does not exist, or exists but did not participate in the
//! match, renders as the empty string. Without a match context every
//! backreference renders empty while the character escapes still apply,
//! so pipeline functions can use templates for plain string building.
//!
//! Any other backslash sequence renders as the character after the
//! backslash (`\q` is `q`, `\|` is `|`). A `\g<` with no closing `>` is
//! literal text, and a trailing backslash is kept.

use regex::Captures;

use crate::matcher::MatchContext;

/// Access to capture groups by number and by name.
///
/// Implemented for the owned [`MatchContext`] a matcher hands to the
/// pipeline, and for live [`regex::Captures`] inside regex replacement.
pub trait Backrefs {
    /// Group `idx` (0 = whole match), `None` if absent or unmatched.
    fn group(&self, idx: usize) -> Option<&str>;

    /// Named group, `None` if absent or unmatched.
    fn named(&self, name: &str) -> Option<&str>;
}

impl Backrefs for Captures<'_> {
    fn group(&self, idx: usize) -> Option<&str> {
        self.get(idx).map(|m| m.as_str())
    }

    fn named(&self, name: &str) -> Option<&str> {
        self.name(name).map(|m| m.as_str())
    }
}

/// Render `tmpl` against an optional match.
///
/// # Examples
///
/// ```
/// use pw_engine::matcher::MatchContext;
/// use pw_engine::template::render;
///
/// let ctx = MatchContext::from_groups(vec![Some("a-b".into()), Some("a".into()), Some("b".into())]);
/// assert_eq!(render("\\1-\\2", Some(&ctx)), "a-b");
/// assert_eq!(render::<MatchContext>("\\1-\\2", None), "-");
/// ```
#[must_use]
pub fn render<B: Backrefs + ?Sized>(tmpl: &str, ctx: Option<&B>) -> String {
    let mut out = String::with_capacity(tmpl.len());
    let mut rest = tmpl;

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let Some(c) = after.chars().next() else {
            // Trailing backslash.
            out.push('\\');
            return out;
        };

        if c.is_ascii_digit() {
            let digits_len = after.bytes().take_while(u8::is_ascii_digit).count();
            let value = after[..digits_len]
                .parse::<usize>()
                .ok()
                .and_then(|idx| ctx.and_then(|m| m.group(idx)));
            out.push_str(value.unwrap_or(""));
            rest = &after[digits_len..];
            continue;
        }

        if let Some(body) = after.strip_prefix("g<") {
            match body.find('>') {
                Some(close) => {
                    out.push_str(lookup_name(ctx, &body[..close]).unwrap_or(""));
                    rest = &body[close + 1..];
                }
                None => {
                    out.push_str("\\g");
                    rest = &after[1..];
                }
            }
            continue;
        }

        match c {
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            other => out.push(other),
        }
        rest = &after[c.len_utf8()..];
    }

    out.push_str(rest);
    out
}

/// Render without any match context.
#[must_use]
pub fn render_plain(tmpl: &str) -> String {
    render::<MatchContext>(tmpl, None)
}

fn lookup_name<'a, B: Backrefs + ?Sized>(ctx: Option<&'a B>, name: &str) -> Option<&'a str> {
    let ctx = ctx?;
    if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
        ctx.group(name.parse().ok()?)
    } else {
        ctx.named(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use regex::Regex;

    fn ctx(groups: &[Option<&str>]) -> MatchContext {
        MatchContext::from_groups(groups.iter().map(|g| g.map(str::to_owned)).collect())
    }

    // -- Backreferences -----------------------------------------------------

    #[test]
    fn numbered_groups() {
        let m = ctx(&[Some("a-b"), Some("a"), Some("b")]);
        assert_eq!(render("\\1-\\2", Some(&m)), "a-b");
        assert_eq!(render("[\\0]", Some(&m)), "[a-b]");
    }

    #[test]
    fn no_context_renders_backrefs_empty() {
        assert_eq!(render_plain("\\1-\\2"), "-");
        assert_eq!(render_plain("x\\g<host>y"), "xy");
    }

    #[test]
    fn out_of_range_group_is_empty() {
        let m = ctx(&[Some("a"), Some("a")]);
        assert_eq!(render("<\\5>", Some(&m)), "<>");
        assert_eq!(render("<\\99999999999999999999999>", Some(&m)), "<>");
    }

    #[test]
    fn unmatched_group_is_empty() {
        let m = ctx(&[Some("a"), None, Some("a")]);
        assert_eq!(render("\\1|\\2", Some(&m)), "|a");
    }

    #[test]
    fn multi_digit_index() {
        let m = MatchContext::from_groups((0..=12).map(|i| Some(i.to_string())).collect());
        assert_eq!(render("\\12", Some(&m)), "12");
        assert_eq!(render("\\1\\2", Some(&m)), "12");
    }

    #[test]
    fn named_groups_via_captures() {
        let re = Regex::new(r"(?P<user>\w+)@(?P<host>\w+)").unwrap();
        let caps = re.captures("mail alice@example").unwrap();
        assert_eq!(render("\\g<host>/\\g<user>", Some(&caps)), "example/alice");
        assert_eq!(render("\\g<nope>", Some(&caps)), "");
        assert_eq!(render("\\g<2>", Some(&caps)), "example");
    }

    #[test]
    fn named_groups_via_context() {
        let re = Regex::new(r"(?P<k>\w+)=(?P<v>\w+)").unwrap();
        let m = MatchContext::capture(&re, "a=b").unwrap();
        assert_eq!(render("\\g<v>:\\g<k>", Some(&m)), "b:a");
    }

    #[test]
    fn unterminated_named_group_is_literal() {
        let m = ctx(&[Some("a")]);
        assert_eq!(render("\\g<abc", Some(&m)), "\\g<abc");
    }

    // -- Escapes ------------------------------------------------------------

    #[test]
    fn character_escapes() {
        assert_eq!(render_plain("a\\tb\\nc\\rd\\\\e"), "a\tb\nc\rd\\e");
    }

    #[test]
    fn escaped_backslash_before_digit() {
        let m = ctx(&[Some("x"), Some("one")]);
        assert_eq!(render("\\\\1", Some(&m)), "\\1");
    }

    #[test]
    fn unknown_escape_yields_bare_character() {
        assert_eq!(render_plain("a\\qb"), "aqb");
        assert_eq!(render_plain("\\ä"), "ä");
        let m = ctx(&[Some("x"), Some("one")]);
        assert_eq!(render("\\1\\|\\-", Some(&m)), "one|-");
    }

    #[test]
    fn trailing_backslash_kept() {
        assert_eq!(render_plain("ab\\"), "ab\\");
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(render_plain("hello world"), "hello world");
        assert_eq!(render_plain(""), "");
    }
}
