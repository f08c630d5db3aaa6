/*!
Pattern source rewriting.

Without [`Flags::UCP`](crate::flags::Flags::UCP), Perl classes only cover
ASCII, as in Hyperscan's UTF-8 mode. The engine's syntax has no such switch,
so the classes are rewritten to ASCII ones before parsing:

```
use scanpat::syntax::ascii_perl_classes;

assert_eq!(ascii_perl_classes(r"\d+"), "[0-9]+");
assert_eq!(ascii_perl_classes(r"[\w-]"), "[[0-9A-Za-z_]-]");
assert_eq!(ascii_perl_classes(r"\bfoo\\d"), r"(?-u:\b)foo\\d");

// Explicit Unicode groups are kept
assert_eq!(ascii_perl_classes(r"(?u:\w)+\w"), r"(?u:\w)+[0-9A-Za-z_]");
```
*/
use std::borrow::Cow;

use logos::Logos;

#[derive(Logos, Clone, Copy, Debug, PartialEq)]
enum PerlClassToken {
    #[token(r"\d")]
    Digit,
    #[token(r"\D")]
    NotDigit,
    #[token(r"\w")]
    Word,
    #[token(r"\W")]
    NotWord,
    #[token(r"\s")]
    Space,
    #[token(r"\S")]
    NotSpace,
    #[token(r"\b")]
    WordBoundary,

    /// Any other escape, including `\\`.
    ///
    /// `\B` is kept as is: an ASCII `(?-u:\B)` can match inside a code point,
    /// which the parser rejects in UTF-8 mode.
    #[regex(r"\\[^dDwWsSb]")]
    Escape,

    /// `(?flags:`, including `(?:`.
    #[regex(r"\(\?[a-zA-Z-]*:")]
    FlagGroup,
    /// `(?flags)`, which applies until the end of the enclosing group.
    #[regex(r"\(\?[a-zA-Z-]+\)")]
    SetFlags,
    /// Any other group, e.g. `(` or `(?P<name>`.
    #[token("(")]
    GroupOpen,
    #[token(")")]
    GroupClose,

    /// `[`, `[^`, `[]` or `[^]`. A `]` right after the opening is a literal.
    #[regex(r"\[\^?\]?")]
    ClassOpen,
    #[token("]")]
    ClassClose,
    /// `[:alpha:]`, `[:^digit:]`
    #[regex(r"\[:\^?[a-z]+:\]")]
    PosixClass,

    /// Plain text.
    #[regex(r"[^\\()\[\]]+")]
    Text,
}

impl PerlClassToken {
    /// Nested classes are fine inside brackets, e.g. `[[0-9]a]`.
    fn ascii(self) -> Option<&'static str> {
        Some(match self {
            PerlClassToken::Digit => "[0-9]",
            PerlClassToken::NotDigit => "[^0-9]",
            PerlClassToken::Word => "[0-9A-Za-z_]",
            PerlClassToken::NotWord => "[^0-9A-Za-z_]",
            PerlClassToken::Space => r"[\t\n\x0B\f\r ]",
            PerlClassToken::NotSpace => r"[^\t\n\x0B\f\r ]",
            PerlClassToken::WordBoundary => r"(?-u:\b)",
            _ => return None,
        })
    }
}

/// Apply the `u` and `-u` of a flag group to `unicode`.
fn unicode_flag(group: &str, mut unicode: bool) -> bool {
    let mut negated = false;
    for c in group.chars() {
        match c {
            '-' => negated = true,
            'u' => unicode = !negated,
            _ => (),
        }
    }
    unicode
}

/// Rewrite `\d`, `\w`, `\s` (and their negations) and `\b` to their ASCII
/// meaning.
///
/// Classes inside `(?u:...)` groups, or after a `(?u)` in the same group, are
/// Unicode-aware by request and kept. `\b` inside brackets is not an assertion
/// and is kept for the parser to reject. Anything else is copied as is.
/// Returns the input unchanged if nothing was rewritten.
pub fn ascii_perl_classes(pattern: &str) -> Cow<'_, str> {
    if !pattern.contains('\\') {
        return Cow::Borrowed(pattern);
    }

    let mut lex = PerlClassToken::lexer(pattern);
    let mut rewritten = String::with_capacity(pattern.len() + 16);
    let mut changed = false;
    // Whether Unicode is on, saved per open group
    let mut unicode = false;
    let mut groups = Vec::new();
    let mut class_depth = 0usize;
    while let Some(token) = lex.next() {
        // A trailing `\` is an error token, kept for the parser to reject
        let Ok(token) = token else {
            rewritten.push_str(lex.slice());
            continue;
        };
        match token {
            PerlClassToken::ClassOpen => class_depth += 1,
            PerlClassToken::ClassClose => class_depth = class_depth.saturating_sub(1),
            // Parentheses in brackets are literals
            _ if class_depth > 0 => (),
            PerlClassToken::GroupOpen => groups.push(unicode),
            PerlClassToken::FlagGroup => {
                groups.push(unicode);
                unicode = unicode_flag(lex.slice(), unicode);
            }
            PerlClassToken::SetFlags => unicode = unicode_flag(lex.slice(), unicode),
            PerlClassToken::GroupClose => unicode = groups.pop().unwrap_or(unicode),
            _ => (),
        }

        let ascii = match token {
            _ if unicode => None,
            PerlClassToken::WordBoundary if class_depth > 0 => None,
            _ => token.ascii(),
        };
        match ascii {
            Some(ascii) => {
                rewritten.push_str(ascii);
                changed = true;
            }
            None => rewritten.push_str(lex.slice()),
        }
    }
    #[cfg(test)]
    dbg!(&rewritten);

    if changed {
        Cow::Owned(rewritten)
    } else {
        Cow::Borrowed(pattern)
    }
}
