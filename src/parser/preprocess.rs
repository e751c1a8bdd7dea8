//! Text normalisation applied before parsing.
//!
//! `normalize` turns raw Dockerfile text into one logical directive per line:
//! continuations are joined, comment lines dropped, whitespace collapsed and
//! `ENV` references substituted. It never fails; anything it cannot resolve is
//! left in place for the parser. Applying it twice gives the same text as
//! applying it once.

use log::debug;
use regex::Regex;
use std::sync::LazyLock;

/// A backslash, optional trailing blanks, then one or more newlines together
/// with any blank lines that follow.
static CONTINUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\[ \t\r]*(?:\n[ \t\r]*)+").expect("valid continuation regex")
});

/// Two or more spaces.
static SPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("valid space regex"));

/// `ENV key value` (legacy single assignment, value runs to end of line).
static ENV_SIMPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?i:env) ([^\s=]+) (.+)$").expect("valid env regex")
});

/// `ENV k=v ...` (multi-assignment form).
static ENV_MULTI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?i:env) ([^\s=]+=.*)$").expect("valid env regex"));

/// Normalise raw Dockerfile text.
pub fn normalize(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n");
    let text = CONTINUATION.replace_all(&text, " ");
    let text = strip_comments(&text);
    let text = collapse_whitespace(&text);
    let vars = collect_env(&text);
    if vars.is_empty() {
        return text;
    }
    substitute(&text, &vars)
}

/// Drop every line whose first non-blank character is `#`.
fn strip_comments(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Trim each line, collapse runs of spaces and drop empty lines.
fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.trim_matches(|c| c == ' ' || c == '\t'))
        .filter(|line| !line.is_empty())
        .map(|line| SPACE_RUN.replace_all(line, " ").into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collect ENV definitions in first-seen order. A later definition of the
/// same key replaces the earlier value. Values that cannot be inserted as-is
/// are not recorded, leaving their references unresolved.
pub(crate) fn collect_env(text: &str) -> Vec<(String, String)> {
    let mut vars: Vec<(String, String)> = Vec::new();
    let mut define = |key: &str, value: String| {
        if !is_substitutable(&value) {
            debug!("ENV {} has value {:?}, leaving references unresolved", key, value);
            return;
        }
        match vars.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => vars.push((key.to_string(), value)),
        }
    };

    for caps in ENV_SIMPLE.captures_iter(text) {
        define(&caps[1], unquote(caps[2].trim()));
    }
    for caps in ENV_MULTI.captures_iter(text) {
        for token in split_assignments(&caps[1]) {
            if let Some((key, value)) = token.split_once('=') {
                if !key.is_empty() {
                    define(key, unquote(value));
                }
            }
        }
    }
    vars
}

/// A value can be substituted when it is non-empty, references nothing and
/// would survive another round of whitespace collapsing unchanged.
fn is_substitutable(value: &str) -> bool {
    !value.is_empty()
        && !value.contains(['$', '\\', '{', '}'])
        && !value.chars().any(char::is_control)
        && !value.starts_with(' ')
        && !value.ends_with(' ')
        && !value.contains("  ")
}

/// Whether a normalised line defines ENV variables.
fn is_env_definition(line: &str) -> bool {
    line.get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("env "))
}

/// Split `k=v k2="a b"` on blanks that are outside quotes and not escaped.
fn split_assignments(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '"' | '\'' if quote.is_none() => {
                quote = Some(c);
                current.push(c);
            }
            c if Some(c) == quote => {
                quote = None;
                current.push(c);
            }
            ' ' | '\t' if quote.is_none() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Remove quotes and unescape blanks from an ENV value.
fn unquote(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut quote: Option<char> = None;
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if quote != Some('\'') => match chars.next() {
                Some(next) => out.push(next),
                None => out.push(c),
            },
            '"' | '\'' if quote.is_none() => quote = Some(c),
            c if Some(c) == quote => quote = None,
            _ => out.push(c),
        }
    }
    out
}

/// Replace `$key`, `${key}`, `${key-default}` and `${key:-default}` with the
/// value of `key`, in a single left-to-right pass. ENV definition lines are
/// kept verbatim and inserted values are not scanned again.
fn substitute(text: &str, vars: &[(String, String)]) -> String {
    text.split('\n')
        .map(|line| {
            if is_env_definition(line) {
                line.to_string()
            } else {
                substitute_line(line, vars)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Substitute the references of one line. A reference in keyword position,
/// or one written directly after an unresolved reference, is left alone.
fn substitute_line(line: &str, vars: &[(String, String)]) -> String {
    let lookup = |name: &str| {
        if !is_identifier(name) {
            return None;
        }
        vars.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };

    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    let mut unresolved_end: Option<usize> = None;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let guarded = out.trim().is_empty() || unresolved_end == Some(out.len());

        if !guarded {
            if let Some(inner) = after.strip_prefix('{') {
                if let Some(close) = inner.find('}') {
                    let body = &inner[..close];
                    let name = body
                        .find(|c: char| c == ':' || c == '-')
                        .map(|i| &body[..i])
                        .unwrap_or(body);
                    let default_ok = body.len() == name.len()
                        || body[name.len()..].starts_with('-')
                        || body[name.len()..].starts_with(":-");
                    if default_ok {
                        if let Some(value) = lookup(name) {
                            debug!("Resolving env variable {} with value {}.", name, value);
                            out.push_str(value);
                            rest = &inner[close + 1..];
                            continue;
                        }
                    }
                }
            } else {
                let len = identifier_len(after);
                if len > 0 {
                    if let Some(value) = lookup(&after[..len]) {
                        debug!("Resolving env variable {} with value {}.", &after[..len], value);
                        out.push_str(value);
                        rest = &after[len..];
                        continue;
                    }
                }
            }
        }

        // Keep the reference, including its name, as written.
        out.push('$');
        let brace = usize::from(after.starts_with('{'));
        let len = brace + identifier_len(&after[brace..]);
        out.push_str(&after[..len]);
        rest = &after[len..];
        unresolved_end = Some(out.len());
    }
    out.push_str(rest);
    out
}

/// Length of the leading `[A-Za-z0-9_]` run.
fn identifier_len(text: &str) -> usize {
    text.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len())
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && identifier_len(name) == name.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattens_continuations() {
        let raw = "RUN apt-get update && \\\n    apt-get install -y curl\n";
        assert_eq!(normalize(raw), "RUN apt-get update && apt-get install -y curl");

        let trailing_blank = "RUN a \\  \n\n b";
        assert_eq!(normalize(trailing_blank), "RUN a b");
    }

    #[test]
    fn test_strips_comment_lines_only() {
        let raw = "# syntax=docker/dockerfile:1\nFROM ubuntu\n   # indented\nRUN echo '#not a comment'\n";
        assert_eq!(normalize(raw), "FROM ubuntu\nRUN echo '#not a comment'");
    }

    #[test]
    fn test_continuation_line_starting_with_hash_is_kept() {
        let raw = "RUN echo a \\\n# still part of run\nUSER app";
        assert_eq!(normalize(raw), "RUN echo a # still part of run\nUSER app");
    }

    #[test]
    fn test_collapses_whitespace() {
        let raw = "\n\n  FROM    ubuntu   \r\n\r\n\r\nUSER  app  \n";
        assert_eq!(normalize(raw), "FROM ubuntu\nUSER app");
    }

    #[test]
    fn test_resolves_simple_env() {
        let raw = "ENV PORT 80\nEXPOSE $PORT\nEXPOSE ${PORT}\nEXPOSE ${PORT:-9000}";
        assert_eq!(
            normalize(raw),
            "ENV PORT 80\nEXPOSE 80\nEXPOSE 80\nEXPOSE 80"
        );
    }

    #[test]
    fn test_resolves_multi_env_with_quotes() {
        let raw = "ENV A=1 GREETING=\"hello world\"\nRUN echo $A $GREETING";
        assert_eq!(
            normalize(raw),
            "ENV A=1 GREETING=\"hello world\"\nRUN echo 1 hello world"
        );
    }

    #[test]
    fn test_reference_respects_identifier_boundary() {
        let raw = "ENV PORT 80\nRUN echo $PORTS $PORT";
        assert_eq!(normalize(raw), "ENV PORT 80\nRUN echo $PORTS 80");
    }

    #[test]
    fn test_values_with_references_are_not_substituted() {
        let raw = "ENV A=$B\nENV B=2\nRUN echo $A $B";
        assert_eq!(normalize(raw), "ENV A=$B\nENV B=2\nRUN echo $A 2");

        let path = "ENV PATH=/opt/bin:$PATH\nRUN echo $PATH";
        let once = normalize(path);
        assert_eq!(once, path);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_env_definition_lines_are_kept() {
        let raw = "ENV A=1\nENV B=$A C=x\nRUN echo $A";
        assert_eq!(normalize(raw), "ENV A=1\nENV B=$A C=x\nRUN echo 1");
    }

    #[test]
    fn test_reference_in_keyword_position_or_after_dollar() {
        let raw = "ENV A=ENV\n$A B C\nRUN echo $$A ${$A}";
        assert_eq!(normalize(raw), "ENV A=ENV\n$A B C\nRUN echo $$A ${$A}");
    }

    #[test]
    fn test_values_that_would_change_layout_are_not_substituted() {
        let raw = "ENV A=x\\ \\ y B=\" z\" C=\"tab\\\\\" D=\"a\tb\"\nRUN echo $A $B $C $D";
        let out = normalize(raw);
        assert!(out.ends_with("RUN echo $A $B $C $D"), "{}", out);
    }

    #[test]
    fn test_continuation_over_blank_lines_is_stable() {
        let raw = "\\\\\n \n\\";
        let once = normalize(raw);
        assert_eq!(once, "\\ \\");
        assert_eq!(normalize(&once), once);

        let run = "RUN a \\\n\n  \n b";
        assert_eq!(normalize(run), "RUN a b");
    }

    #[test]
    fn test_later_definition_overwrites() {
        let raw = "ENV PORT 80\nENV PORT 8080\nEXPOSE $PORT";
        assert!(normalize(raw).ends_with("EXPOSE 8080"));
    }

    #[test]
    fn test_unknown_and_empty_variables_left_alone() {
        let raw = "ENV EMPTY=\"\"\nRUN echo $EMPTY $NOPE ${NOPE} $";
        assert_eq!(normalize(raw), "ENV EMPTY=\"\"\nRUN echo $EMPTY $NOPE ${NOPE} $");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = "FROM  python:3.9\n# c\nENV PORT 80\nEXPOSE ${PORT}\nRUN a \\\n  b\n\n";
        let once = normalize(raw);
        assert_eq!(normalize(&once), once);
    }
}
