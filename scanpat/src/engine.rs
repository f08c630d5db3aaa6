/*!
The scan engine.

An [`Engine`] is a compiled automaton. Scanning a haystack reports the span of
every match to a callback, in order of their start offsets, and the callback
decides whether the scan goes on:

```
use scanpat::{engine::{Config, Engine, Matching, ScanStatus}, flags::Flags};

let engine = Engine::compile(r"\d+", Flags::BASELINE, &Config::default())?;
let mut scratch = engine.create_scratch();

let mut spans = Vec::new();
let status = engine.scan(&mut scratch, "a1b22c", &mut |span| {
    spans.push(span.range());
    Matching::Continue
})?;
assert_eq!(status, ScanStatus::Completed);
assert_eq!(spans, vec![1..2, 3..5]);
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Prefix reports
With [`Config::report_prefixes`], the engine reports the way Hyperscan does
with leftmost start of match: every shorter match at a start offset is
reported before the full one, so the same start can be seen several times.

```
use scanpat::{engine::{Config, Engine, Matching}, flags::Flags};

let config = Config::builder().report_prefixes(true).build();
let engine = Engine::compile("a+", Flags::BASELINE, &config)?;
let mut scratch = engine.create_scratch();

let mut spans = Vec::new();
engine.scan(&mut scratch, "baaab", &mut |span| {
    spans.push(span.range());
    Matching::Continue
})?;
assert_eq!(spans, vec![1..2, 1..3, 1..4]);
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/
use std::borrow::Cow;

use bon::Builder;
use regex_automata::{
    hybrid::dfa::{self as hybrid, OverlappingState},
    meta,
    nfa::thompson,
    util::iter::Searcher,
    Anchored, Input, MatchError, MatchKind, Span,
};
use regex_syntax::{hir::Hir, ParserBuilder};

use crate::{flags::Flags, Error};

/// Engine options that are not part of the pattern's flags.
#[derive(Builder, Clone, Debug, Default)]
pub struct Config {
    /// Report every shorter match at a start offset before the full match.
    ///
    /// Without it, each match is reported once with its full span.
    ///
    /// Note that a single-match scan stops at the first report, which is then
    /// the shortest match at the leftmost start.
    #[builder(default)]
    pub report_prefixes: bool,
    /// The maximum memory, in bytes, a scratch may use when it is allocated.
    pub scratch_limit: Option<usize>,
}

/// The engine rejected a pattern.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CompileError {
    message: String,
}

impl CompileError {
    fn new(message: impl ToString) -> Self {
        Self { message: message.to_string() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Returned by a scan callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Matching {
    /// Continue scanning.
    Continue,
    /// Stop the scan.
    Terminate,
}

/// How a scan ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanStatus {
    /// The whole haystack was scanned.
    Completed,
    /// The callback returned [`Matching::Terminate`].
    Terminated,
}

/// A compiled pattern.
///
/// Cloning is cheap: the compiled automata are shared.
#[derive(Clone, Debug)]
pub struct Engine {
    re: meta::Regex,
    /// Lazy DFA for [`Config::report_prefixes`].
    ///
    /// `None` if prefix reports are off, or if the pattern needs something the
    /// lazy DFA cannot do (Unicode word boundaries). In the latter case only
    /// full matches are reported.
    prefixes: Option<hybrid::DFA>,
}

/// Mutable workspace of a scan.
///
/// A scratch can only be used by one scan at a time, which `&mut` enforces.
#[derive(Clone, Debug)]
pub struct Scratch {
    meta: meta::Cache,
    prefixes: Option<hybrid::Cache>,
}

impl Scratch {
    /// Heap memory used by this scratch, in bytes.
    pub fn memory_usage(&self) -> usize {
        self.meta.memory_usage()
            + self.prefixes.as_ref().map_or(0, |cache| cache.memory_usage())
    }
}

fn parse(pattern: &str, flags: Flags) -> Result<Hir, regex_syntax::Error> {
    ParserBuilder::new()
        .case_insensitive(flags.contains(Flags::CASELESS))
        .dot_matches_new_line(flags.contains(Flags::DOTALL))
        .multi_line(flags.contains(Flags::MULTILINE))
        .utf8(true)
        .build()
        .parse(pattern)
}

impl Engine {
    /// Compile a pattern with the given engine flags.
    ///
    /// [`Flags::UTF8`] and [`Flags::SOM_LEFTMOST`] are required. Without
    /// [`Flags::UCP`], Perl classes are ASCII-only (see
    /// [`ascii_perl_classes`](crate::syntax::ascii_perl_classes)). Without
    /// [`Flags::ALLOW_EMPTY`], patterns that can match the empty string are
    /// rejected.
    pub fn compile(
        pattern: &str,
        flags: Flags,
        config: &Config,
    ) -> Result<Self, CompileError> {
        if !flags.contains(Flags::UTF8 | Flags::SOM_LEFTMOST) {
            return Err(CompileError::new(
                "UTF-8 mode and leftmost start of match are required",
            ));
        }

        let rewritten = if flags.contains(Flags::UCP) {
            Cow::Borrowed(pattern)
        } else {
            crate::syntax::ascii_perl_classes(pattern)
        };
        let hir = match parse(&rewritten, flags) {
            Ok(hir) => hir,
            // Report errors against the pattern as written
            Err(e) if matches!(rewritten, Cow::Owned(_)) => {
                return Err(CompileError::new(parse(pattern, flags).err().unwrap_or(e)));
            }
            Err(e) => return Err(CompileError::new(e)),
        };
        #[cfg(test)]
        dbg!(&hir);

        if !flags.contains(Flags::ALLOW_EMPTY)
            && hir.properties().minimum_len() == Some(0)
        {
            return Err(CompileError::new(
                "Pattern matches empty buffer; use ALLOW_EMPTY to enable support",
            ));
        }

        let re = meta::Builder::new()
            .build_from_hir(&hir)
            .map_err(CompileError::new)?;

        // The lazy DFA cannot build Unicode word boundaries
        let prefixes = if config.report_prefixes
            && !hir.properties().look_set().contains_word_unicode()
        {
            let nfa = thompson::Compiler::new()
                .configure(
                    thompson::Config::new()
                        .which_captures(thompson::WhichCaptures::None),
                )
                .build_from_hir(&hir)
                .map_err(CompileError::new)?;
            let dfa = hybrid::DFA::builder()
                .configure(hybrid::DFA::config().match_kind(MatchKind::All))
                .build_from_nfa(nfa)
                .map_err(CompileError::new)?;
            Some(dfa)
        } else {
            None
        };

        Ok(Self { re, prefixes })
    }

    /// Whether prefixes are reported, see [`Config::report_prefixes`].
    pub fn reports_prefixes(&self) -> bool {
        self.prefixes.is_some()
    }

    pub fn create_scratch(&self) -> Scratch {
        Scratch {
            meta: self.re.create_cache(),
            prefixes: self.prefixes.as_ref().map(hybrid::DFA::create_cache),
        }
    }

    /// Like [`Engine::create_scratch`], but fails with
    /// [`Error::ScratchAllocation`] if the scratch uses more than `limit`
    /// bytes.
    pub fn alloc_scratch(&self, limit: Option<usize>) -> Result<Scratch, Error> {
        let scratch = self.create_scratch();
        match limit {
            Some(limit) if scratch.memory_usage() > limit => {
                Err(Error::ScratchAllocation {
                    required: scratch.memory_usage(),
                    limit,
                })
            }
            _ => Ok(scratch),
        }
    }

    /// Scan `haystack`, calling `on_span` for every reported span.
    ///
    /// Spans come in non-decreasing order of their start offsets. Without
    /// prefix reports, every span is a distinct leftmost-first match and
    /// matches never overlap.
    ///
    /// The only errors are internal engine failures.
    pub fn scan(
        &self,
        scratch: &mut Scratch,
        haystack: &str,
        on_span: &mut dyn FnMut(Span) -> Matching,
    ) -> Result<ScanStatus, MatchError> {
        let Scratch { meta: meta_cache, prefixes: prefix_cache } = scratch;
        let mut searcher = Searcher::new(Input::new(haystack));
        while let Some(m) =
            searcher.try_advance(|input| Ok(self.re.search_with(meta_cache, input)))?
        {
            if let (Some(dfa), Some(cache)) = (&self.prefixes, prefix_cache.as_mut())
            {
                let input = Input::new(haystack)
                    .range(m.range())
                    .anchored(Anchored::Yes);
                let mut state = OverlappingState::start();
                loop {
                    dfa.try_search_overlapping_fwd(cache, &input, &mut state)?;
                    let end = match state.get_match() {
                        Some(half) if half.offset() < m.end() => half.offset(),
                        _ => break,
                    };
                    let span = Span { start: m.start(), end };
                    if on_span(span) == Matching::Terminate {
                        return Ok(ScanStatus::Terminated);
                    }
                }
            }

            if on_span(m.span()) == Matching::Terminate {
                return Ok(ScanStatus::Terminated);
            }
        }
        Ok(ScanStatus::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pattern: &str, flags: Flags) -> Engine {
        Engine::compile(pattern, flags, &Config::default()).unwrap()
    }

    fn compile_prefixes(pattern: &str, flags: Flags) -> Engine {
        let config = Config::builder().report_prefixes(true).build();
        Engine::compile(pattern, flags, &config).unwrap()
    }

    fn spans(engine: &Engine, haystack: &str) -> Vec<(usize, usize)> {
        let mut scratch = engine.create_scratch();
        let mut spans = Vec::new();
        let status = engine
            .scan(&mut scratch, haystack, &mut |span| {
                spans.push((span.start, span.end));
                Matching::Continue
            })
            .unwrap();
        assert_eq!(status, ScanStatus::Completed);
        spans
    }

    #[test]
    fn full_matches() {
        let engine = compile("a+", Flags::BASELINE);
        assert!(!engine.reports_prefixes());
        assert_eq!(spans(&engine, "baaab aab"), vec![(1, 4), (6, 8)]);
        assert_eq!(spans(&engine, "bbb"), vec![]);
        assert_eq!(spans(&engine, ""), vec![]);
    }

    #[test]
    fn prefixes() {
        let engine = compile_prefixes("a+", Flags::BASELINE);
        assert!(engine.reports_prefixes());
        assert_eq!(
            spans(&engine, "baaab aab"),
            vec![(1, 2), (1, 3), (1, 4), (6, 7), (6, 8)]
        );

        // Leftmost-first: `a|ab` stops at `a`
        let engine = compile_prefixes("a|ab", Flags::BASELINE);
        assert_eq!(spans(&engine, "ab"), vec![(0, 1)]);

        let engine = compile_prefixes("a*", Flags::BASELINE);
        assert_eq!(spans(&engine, "aab"), vec![(0, 0), (0, 1), (0, 2), (3, 3)]);
    }

    #[test]
    fn prefixes_unicode_word_boundary() {
        let engine = compile_prefixes(r"\bab+", Flags::BASELINE | Flags::UCP);
        assert!(!engine.reports_prefixes());
        assert_eq!(spans(&engine, "abb cab"), vec![(0, 3)]);

        // ASCII word boundaries are fine
        let engine = compile_prefixes(r"\bab+", Flags::BASELINE);
        assert!(engine.reports_prefixes());
        assert_eq!(spans(&engine, "abb cab"), vec![(0, 2), (0, 3)]);
    }

    #[test]
    fn empty() {
        let engine = compile("", Flags::BASELINE);
        assert_eq!(spans(&engine, "abc"), vec![(0, 0), (1, 1), (2, 2), (3, 3)]);

        // Empty matches never split a code point
        assert_eq!(spans(&engine, "é"), vec![(0, 0), (2, 2)]);

        let engine = compile("(?:)", Flags::BASELINE);
        assert_eq!(spans(&engine, ""), vec![(0, 0)]);
    }

    #[test]
    fn terminate() {
        let engine = compile("a", Flags::BASELINE);
        let mut scratch = engine.create_scratch();
        let mut count = 0;
        let status = engine
            .scan(&mut scratch, "aaa", &mut |_| {
                count += 1;
                Matching::Terminate
            })
            .unwrap();
        assert_eq!(status, ScanStatus::Terminated);
        assert_eq!(count, 1);

        let engine = compile_prefixes("a+", Flags::BASELINE);
        let mut scratch = engine.create_scratch();
        let mut spans = Vec::new();
        let status = engine
            .scan(&mut scratch, "baa", &mut |span| {
                spans.push(span.range());
                Matching::Terminate
            })
            .unwrap();
        assert_eq!(status, ScanStatus::Terminated);
        assert_eq!(spans, vec![1..2]);
    }

    #[test]
    fn flags() {
        let engine = compile("abc", Flags::BASELINE | Flags::CASELESS);
        assert_eq!(spans(&engine, "xAbC"), vec![(1, 4)]);

        let engine = compile("a.b", Flags::BASELINE);
        assert_eq!(spans(&engine, "a\nb"), vec![]);
        let engine = compile("a.b", Flags::BASELINE | Flags::DOTALL);
        assert_eq!(spans(&engine, "a\nb"), vec![(0, 3)]);

        let engine = compile("^b", Flags::BASELINE);
        assert_eq!(spans(&engine, "a\nb"), vec![]);
        let engine = compile("^b", Flags::BASELINE | Flags::MULTILINE);
        assert_eq!(spans(&engine, "a\nb"), vec![(2, 3)]);
    }

    #[test]
    fn ucp() {
        // U+0663 ARABIC-INDIC DIGIT THREE
        let engine = compile(r"\d", Flags::BASELINE);
        assert_eq!(spans(&engine, "\u{663}1"), vec![(2, 3)]);
        let engine = compile(r"\d", Flags::BASELINE | Flags::UCP);
        assert_eq!(spans(&engine, "\u{663}1"), vec![(0, 2), (2, 3)]);

        let engine = compile(r"\w+", Flags::BASELINE);
        assert_eq!(spans(&engine, "café"), vec![(0, 3)]);
        let engine = compile(r"\w+", Flags::BASELINE | Flags::UCP);
        assert_eq!(spans(&engine, "café"), vec![(0, 5)]);

        // `.` is always a code point
        let engine = compile(".", Flags::BASELINE);
        assert_eq!(spans(&engine, "é"), vec![(0, 2)]);
    }

    #[test]
    fn unicode_group() {
        let engine = compile(r"(?u:\w)+", Flags::BASELINE);
        assert_eq!(spans(&engine, "éfoo"), vec![(0, 5)]);
        let engine = compile(r"(?u:\w)\w+", Flags::BASELINE);
        assert_eq!(spans(&engine, "éfoo"), vec![(0, 5)]);
        assert_eq!(spans(&engine, "fé"), vec![]);
    }

    #[test]
    fn compile_error() {
        let err = Engine::compile("a(", Flags::BASELINE, &Config::default())
            .unwrap_err();
        assert!(!err.message().is_empty());

        // Errors show the pattern as written
        for pattern in [r"\d(", r"[\w", r"\w{2,1}"] {
            let err = Engine::compile(pattern, Flags::BASELINE, &Config::default())
                .unwrap_err();
            assert!(err.message().contains(pattern), "{}", err.message());
            assert!(!err.message().contains("[0-9"), "{}", err.message());
        }
        let err = Engine::compile(r"[\b]", Flags::BASELINE, &Config::default())
            .unwrap_err();
        assert!(err.message().contains(r"[\b]"), "{}", err.message());
        assert!(!err.message().contains("(?-u:"), "{}", err.message());

        assert!(Engine::compile("a", Flags::empty(), &Config::default())
            .is_err());
        assert!(
            Engine::compile("a", Flags::UTF8, &Config::default()).is_err()
        );
    }

    #[test]
    fn allow_empty() {
        let flags = Flags::BASELINE - Flags::ALLOW_EMPTY;
        assert!(Engine::compile("a*", flags, &Config::default()).is_err());
        assert!(Engine::compile("", flags, &Config::default()).is_err());
        assert!(Engine::compile("a+", flags, &Config::default()).is_ok());
    }

    #[test]
    fn scratch_limit() {
        let engine = compile("a+b+c+", Flags::BASELINE);
        let scratch = engine.alloc_scratch(None).unwrap();
        assert!(scratch.memory_usage() > 0);
        assert!(engine.alloc_scratch(Some(usize::MAX)).is_ok());
        match engine.alloc_scratch(Some(0)) {
            Err(Error::ScratchAllocation { required, limit }) => {
                assert_eq!(limit, 0);
                assert_eq!(required, scratch.memory_usage());
            }
            other => panic!("{other:?}"),
        }
    }
}
