//! Shell-word tokenizer for curl command lines.
//!
//! Splitting is quote-aware but deliberately two-phase: quote characters are
//! retained in the emitted tokens, and [`unquote`] is applied per token by the
//! flag interpreter once it knows how a token is used. An unterminated quote
//! or trailing escape is not an error; whatever accumulated is emitted as-is.

use std::borrow::Cow;

/// Quoting context of the tokenizer. A pending escape is tracked orthogonally
/// since it can occur in `Normal` and `DoubleQuoted` alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    AnsiQuoted,
}

/// Splits a command line into shell words.
///
/// Inside single quotes everything is literal. Inside double quotes a
/// backslash escapes the next character (the backslash itself is dropped).
/// `$'...'` opens ANSI-C quoting, whose escape sequences are only decoded
/// later by [`unquote`]. In all cases the quote characters stay part of the
/// token.
pub(crate) fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut state = State::Normal;
    let mut escape_pending = false;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if escape_pending {
            current.push(ch);
            escape_pending = false;
            continue;
        }
        match state {
            State::Normal => match ch {
                '\\' => escape_pending = true,
                '$' if chars.peek() == Some(&'\'') => {
                    chars.next();
                    current.push_str("$'");
                    state = State::AnsiQuoted;
                }
                '\'' => {
                    current.push(ch);
                    state = State::SingleQuoted;
                }
                '"' => {
                    current.push(ch);
                    state = State::DoubleQuoted;
                }
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                c => current.push(c),
            },
            State::SingleQuoted => {
                current.push(ch);
                if ch == '\'' {
                    state = State::Normal;
                }
            }
            State::DoubleQuoted => match ch {
                '\\' => escape_pending = true,
                '"' => {
                    current.push(ch);
                    state = State::Normal;
                }
                c => current.push(c),
            },
            State::AnsiQuoted => {
                current.push(ch);
                if ch == '\\' {
                    // keep the escaped character inside the quote; decoding
                    // happens in unquote
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                } else if ch == '\'' {
                    state = State::Normal;
                }
            }
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Removes one matching pair of surrounding quotes from a token.
///
/// `$'...'` tokens additionally get their `\n`, `\r`, `\t`, `\'`, `\"` and
/// `\\` sequences decoded. Tokens without a surrounding quote pair pass
/// through unchanged.
pub(crate) fn unquote(token: &str) -> Cow<'_, str> {
    if token.len() >= 3 && token.starts_with("$'") && token.ends_with('\'') {
        return Cow::Owned(decode_ansi_escapes(&token[2..token.len() - 1]));
    }
    Cow::Borrowed(strip_quote_pair(token))
}

/// Strips a single matching pair of `'` or `"` from both ends, if present.
/// Also used on `@`-prefixed form-field paths where inner quotes survive the
/// outer unquoting.
pub(crate) fn strip_quote_pair(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 && (bytes[0] == b'\'' || bytes[0] == b'"') && bytes[bytes.len() - 1] == bytes[0]
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Single linear scan over the content of a `$'...'` token. Unknown escape
/// sequences are kept verbatim, backslash included.
fn decode_ansi_escapes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
