//! Pipeline tokenization: stage splitting, call recognition, argument lists.
//!
//! Three layers, each with its own escape rules:
//!
//! 1. **Stages** are separated by unescaped `|`. Only `\|` and `\\` are
//!    decoded here; every other backslash passes through untouched for the
//!    later layers (templates, regexes) to interpret.
//! 2. A stage is a **call** if it reads `name` or `name(...)`, where `name`
//!    starts with a letter or underscore. Anything else is a template.
//! 3. Call **arguments** are comma-separated. Single or double quotes
//!    protect commas and whitespace; inside or outside quotes, a backslash
//!    escapes a quote character or another backslash and is otherwise kept.

/// Split a pipeline source into trimmed, non-empty stage tokens.
///
/// # Examples
///
/// ```
/// use pw_engine::pipeline::token::split_stages;
///
/// assert_eq!(split_stages("upper | first(3)"), vec!["upper", "first(3)"]);
/// assert_eq!(split_stages(r"set('a\|b')"), vec!["set('a|b')"]);
/// ```
#[must_use]
pub fn split_stages(src: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut cur = String::new();
    let mut chars = src.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.peek().copied() {
                Some(next @ ('|' | '\\')) => {
                    cur.push(next);
                    chars.next();
                }
                _ => cur.push('\\'),
            },
            '|' => tokens.push(std::mem::take(&mut cur)),
            other => cur.push(other),
        }
    }
    tokens.push(cur);

    tokens
        .into_iter()
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .collect()
}

/// A stage token recognized as a function call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallToken {
    /// Function name, lowercased.
    pub name: String,
    /// Decoded arguments.
    pub args: Vec<String>,
}

/// Recognize `name` or `name(args)`; `None` means the token is a template.
///
/// The argument text runs from the first `(` after the name to a `)` that
/// must be the token's last character.
#[must_use]
pub fn parse_call(token: &str) -> Option<CallToken> {
    let first = token.chars().next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }

    let name_end = token
        .char_indices()
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
        .map_or(token.len(), |(i, _)| i);
    let name = token[..name_end].to_lowercase();

    let rest = token[name_end..].trim_start();
    if rest.is_empty() {
        return Some(CallToken {
            name,
            args: Vec::new(),
        });
    }

    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(CallToken {
        name,
        args: split_args(inner),
    })
}

/// Split a call's argument text.
///
/// Unquoted whitespace at either end of an argument is trimmed; quoted
/// whitespace is kept. A trailing comma does not produce an extra empty
/// argument, but an explicit `""` does.
///
/// # Examples
///
/// ```
/// use pw_engine::pipeline::token::split_args;
///
/// assert_eq!(split_args("5, '0'"), vec!["5", "0"]);
/// assert_eq!(split_args(r#"",", " x ""#), vec![",", " x "]);
/// ```
#[must_use]
pub fn split_args(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    // (char, protected): protected chars came from quotes or escapes and
    // survive edge trimming.
    let mut cur: Vec<(char, bool)> = Vec::new();
    let mut quoted = false;
    let mut quote: Option<char> = None;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.peek().copied() {
                Some(next @ ('\'' | '"' | '\\')) => {
                    cur.push((next, true));
                    chars.next();
                }
                _ => cur.push(('\\', true)),
            }
            continue;
        }

        if let Some(q) = quote {
            if ch == q {
                quote = None;
            } else {
                cur.push((ch, true));
            }
            continue;
        }

        match ch {
            '\'' | '"' => {
                quote = Some(ch);
                quoted = true;
            }
            ',' => {
                out.push(finish_arg(&cur));
                cur.clear();
                quoted = false;
            }
            other => cur.push((other, false)),
        }
    }

    // Nothing but whitespace after the last comma is not an argument.
    let last = finish_arg(&cur);
    if quoted || !last.is_empty() {
        out.push(last);
    }
    out
}

fn finish_arg(cur: &[(char, bool)]) -> String {
    let start = cur
        .iter()
        .position(|&(c, p)| p || !c.is_whitespace())
        .unwrap_or(cur.len());
    let end = cur
        .iter()
        .rposition(|&(c, p)| p || !c.is_whitespace())
        .map_or(start, |i| i + 1);
    cur[start..end].iter().map(|&(c, _)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call(name: &str, args: &[&str]) -> Option<CallToken> {
        Some(CallToken {
            name: name.to_owned(),
            args: args.iter().map(|&a| a.to_owned()).collect(),
        })
    }

    // -- Stage splitting ----------------------------------------------------

    #[test]
    fn split_simple() {
        assert_eq!(split_stages("upper|first(3)"), vec!["upper", "first(3)"]);
    }

    #[test]
    fn split_trims_and_drops_empty() {
        assert_eq!(split_stages(" upper || lower | "), vec!["upper", "lower"]);
        assert!(split_stages("").is_empty());
        assert!(split_stages(" | ").is_empty());
    }

    #[test]
    fn split_escaped_pipe() {
        assert_eq!(split_stages(r"replace_str('\|', '/')"), vec!["replace_str('|', '/')"]);
    }

    #[test]
    fn split_escaped_backslash_then_pipe() {
        // `\\|` is an escaped backslash followed by a real separator.
        assert_eq!(split_stages(r"a\\|b"), vec![r"a\", "b"]);
    }

    #[test]
    fn split_keeps_other_backslashes() {
        assert_eq!(split_stages(r"\1-\2|rextract('\d+')"), vec![r"\1-\2", r"rextract('\d+')"]);
        assert_eq!(split_stages("x\\"), vec!["x\\"]);
    }

    // -- Call recognition ---------------------------------------------------

    #[test]
    fn bare_name_is_call() {
        assert_eq!(parse_call("upper"), call("upper", &[]));
        assert_eq!(parse_call("collapse_ws"), call("collapse_ws", &[]));
    }

    #[test]
    fn name_is_lowercased() {
        assert_eq!(parse_call("UPPER"), call("upper", &[]));
    }

    #[test]
    fn call_with_args() {
        assert_eq!(parse_call("first(3)"), call("first", &["3"]));
        assert_eq!(parse_call("padleft (5, '0')"), call("padleft", &["5", "0"]));
        assert_eq!(parse_call("upper()"), call("upper", &[]));
    }

    #[test]
    fn backref_token_is_template() {
        assert_eq!(parse_call(r"\1"), None);
        assert_eq!(parse_call(r"\g<host>"), None);
    }

    #[test]
    fn trailing_junk_is_template() {
        assert_eq!(parse_call("first(3) x"), None);
        assert_eq!(parse_call("foo bar"), None);
        assert_eq!(parse_call("first(3"), None);
    }

    #[test]
    fn leading_digit_is_template() {
        assert_eq!(parse_call("3abc"), None);
    }

    #[test]
    fn args_run_to_last_paren() {
        assert_eq!(parse_call("set((\\1))"), call("set", &["(\\1)"]));
    }

    // -- Argument splitting -------------------------------------------------

    #[test]
    fn args_quoted_comma() {
        assert_eq!(split_args("',', 'x'"), vec![",", "x"]);
        assert_eq!(split_args("\",\""), vec![","]);
    }

    #[test]
    fn args_trim_unquoted_edges() {
        assert_eq!(split_args("  a ,  b  "), vec!["a", "b"]);
        assert_eq!(split_args("a b"), vec!["a b"]);
    }

    #[test]
    fn args_keep_quoted_whitespace() {
        assert_eq!(split_args("5, ' '"), vec!["5", " "]);
    }

    #[test]
    fn args_escaped_quote() {
        assert_eq!(split_args(r"'it\'s'"), vec!["it's"]);
        assert_eq!(split_args(r#""say \"hi\"""#), vec![r#"say "hi""#]);
    }

    #[test]
    fn args_keep_other_backslashes() {
        assert_eq!(split_args(r"'\1'"), vec![r"\1"]);
        assert_eq!(split_args(r"\d+, x"), vec![r"\d+", "x"]);
        assert_eq!(split_args(r"'a\\b'"), vec![r"a\b"]);
    }

    #[test]
    fn args_trailing_comma_ignored() {
        assert_eq!(split_args("a,"), vec!["a"]);
        assert_eq!(split_args("a, "), vec!["a"]);
    }

    #[test]
    fn args_explicit_empty_kept() {
        assert_eq!(split_args("''"), vec![""]);
        assert_eq!(split_args("x, \"\""), vec!["x", ""]);
        assert_eq!(split_args("'', x"), vec!["", "x"]);
    }

    #[test]
    fn args_empty_text() {
        assert!(split_args("").is_empty());
        assert!(split_args("   ").is_empty());
    }
}
