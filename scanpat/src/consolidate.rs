//! Turning raw engine spans into logical matches.
//!
//! The engine may report the same start offset several times (see
//! [`Config::report_prefixes`](crate::engine::Config::report_prefixes)). A
//! [`Consolidator`] keeps the latest span per start and finalizes it once a
//! span with another start arrives, or when the scan ends.
use regex_automata::{MatchError, Span};

use crate::{
    engine::{Matching, ScanStatus},
    replace::Replacer,
    Error,
};

/// Receives logical matches from a [`Consolidator`].
pub(crate) trait Accumulator {
    /// The first match starts at `start`.
    fn open(&mut self, start: usize) {
        _ = start;
    }

    /// `span` is a logical match. `next` is the start of the following one,
    /// or `None` if this is the last.
    fn finalize(&mut self, span: Span, next: Option<usize>) -> Result<(), Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Initial,
    Tracking(Span),
    Done,
}

pub(crate) struct Consolidator<A> {
    state: State,
    global: bool,
    acc: A,
    error: Option<Error>,
}

impl<A: Accumulator> Consolidator<A> {
    pub fn new(global: bool, acc: A) -> Self {
        Self { state: State::Initial, global, acc, error: None }
    }

    /// Handle one raw span from the engine.
    pub fn on_span(&mut self, span: Span) -> Matching {
        match self.state {
            State::Initial => {
                self.state = State::Tracking(span);
                self.acc.open(span.start);
            }
            State::Tracking(tracked) if tracked.start == span.start => {
                self.state = State::Tracking(span);
            }
            State::Tracking(tracked) => {
                debug_assert!(tracked.start < span.start);
                if let Err(e) = self.acc.finalize(tracked, Some(span.start)) {
                    self.state = State::Done;
                    self.error = Some(e);
                    return Matching::Terminate;
                }
                self.state = State::Tracking(span);
            }
            State::Done => return Matching::Terminate,
        }
        if self.global {
            Matching::Continue
        } else {
            Matching::Terminate
        }
    }

    /// End the scan and flush the tracked span.
    ///
    /// An accumulator error raised during the scan takes precedence over the
    /// scan's own result.
    pub fn finish(
        mut self,
        status: Result<ScanStatus, MatchError>,
    ) -> Result<A, Error> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        status?;
        if let State::Tracking(tracked) = self.state {
            self.state = State::Done;
            self.acc.finalize(tracked, None)?;
        }
        Ok(self.acc)
    }
}

/// Run `scan` through a [`Consolidator`] and return the accumulator.
pub(crate) fn consolidate<A, F>(global: bool, acc: A, scan: F) -> Result<A, Error>
where
    A: Accumulator,
    F: FnOnce(&mut dyn FnMut(Span) -> Matching) -> Result<ScanStatus, MatchError>,
{
    let mut consolidator = Consolidator::new(global, acc);
    let status = scan(&mut |span| consolidator.on_span(span));
    consolidator.finish(status)
}

/// Whether there is any match.
#[derive(Default)]
pub(crate) struct Existence {
    pub found: bool,
}

impl Accumulator for Existence {
    fn finalize(&mut self, _: Span, _: Option<usize>) -> Result<(), Error> {
        self.found = true;
        Ok(())
    }
}

/// Matched substrings.
pub(crate) struct Collector<'t> {
    text: &'t str,
    matches: Vec<&'t str>,
}

impl<'t> Collector<'t> {
    pub fn new(text: &'t str) -> Self {
        Self { text, matches: Vec::new() }
    }

    /// `None` if nothing matched.
    pub fn into_matches(self) -> Option<Vec<&'t str>> {
        if self.matches.is_empty() {
            None
        } else {
            Some(self.matches)
        }
    }
}

impl Accumulator for Collector<'_> {
    fn finalize(&mut self, span: Span, _: Option<usize>) -> Result<(), Error> {
        self.matches.push(&self.text[span.range()]);
        Ok(())
    }
}

/// Output of a replace: the text between matches, with every match
/// replaced.
pub(crate) struct Compositor<'t, R> {
    text: &'t str,
    replacer: R,
    out: String,
    last_end: Option<usize>,
}

impl<'t, R: Replacer> Compositor<'t, R> {
    pub fn new(text: &'t str, replacer: R) -> Self {
        Self { text, replacer, out: String::new(), last_end: None }
    }

    /// Append the text after the last match.
    pub fn into_string(self) -> String {
        match self.last_end {
            Some(end) => {
                let mut out = self.out;
                out.push_str(&self.text[end..]);
                out
            }
            None => self.text.to_owned(),
        }
    }
}

impl<R: Replacer> Accumulator for Compositor<'_, R> {
    fn open(&mut self, start: usize) {
        self.out.reserve(self.text.len());
        self.out.push_str(&self.text[..start]);
    }

    fn finalize(&mut self, span: Span, next: Option<usize>) -> Result<(), Error> {
        self.replacer
            .replace_append(&self.text[span.range()], span.start, &mut self.out)
            .map_err(Error::Replacement)?;
        self.last_end = Some(span.end);
        if let Some(next) = next.filter(|&next| next > span.end) {
            self.out.push_str(&self.text[span.end..next]);
            self.last_end = Some(next);
        }
        Ok(())
    }
}
