/*!
Compiled patterns with `test`, `match` and `replace`.

```
use scanpat::Pattern;

let re = Pattern::new(("a+", "g"))?;
assert!(re.test("baaab")?);
assert_eq!(re.matches("baaab aab")?, Some(vec!["aaa", "aa"]));
assert_eq!(re.replace("baaab aab", "-")?, "b-b -b");
assert_eq!(re.to_string(), "/a+/g");
# Ok::<(), scanpat::Error>(())
```
*/
use std::{
    fmt::{self, Write},
    sync::Arc,
};

use bon::bon;
use regex_automata::util::pool::Pool;

use crate::{
    consolidate::{consolidate, Accumulator, Collector, Compositor, Existence},
    engine::{Config, Engine, Scratch},
    flags::{self, Flags},
    replace::Replacer,
    Error, Result,
};

/// Something a [`Pattern`] can be created from: a source and, optionally,
/// flags.
///
/// ```
/// use scanpat::Pattern;
///
/// let re = Pattern::new(r"\d+")?;
/// assert_eq!(re.flags(), "");
///
/// let re = Pattern::new((r"\d+", "gi"))?;
/// assert_eq!(re.flags(), "gi");
///
/// // Copies source and flags
/// let copy = Pattern::new(&re)?;
/// assert_eq!(copy.source(), r"\d+");
/// assert_eq!(copy.flags(), "gi");
/// # Ok::<(), scanpat::Error>(())
/// ```
pub trait PatternSource {
    fn source(&self) -> &str;

    fn flags(&self) -> &str {
        ""
    }
}

impl PatternSource for str {
    fn source(&self) -> &str {
        self
    }
}

impl PatternSource for String {
    fn source(&self) -> &str {
        self
    }
}

impl<S: AsRef<str>, F: AsRef<str>> PatternSource for (S, F) {
    fn source(&self) -> &str {
        self.0.as_ref()
    }

    fn flags(&self) -> &str {
        self.1.as_ref()
    }
}

impl PatternSource for Pattern {
    fn source(&self) -> &str {
        &self.source
    }

    fn flags(&self) -> &str {
        &self.flags
    }
}

impl<T: PatternSource + ?Sized> PatternSource for &T {
    fn source(&self) -> &str {
        (**self).source()
    }

    fn flags(&self) -> &str {
        (**self).flags()
    }
}

type ScratchFn = Box<dyn Fn() -> Scratch + Send + Sync>;

fn scratch_pool(engine: &Arc<Engine>) -> Pool<Scratch, ScratchFn> {
    let engine = Arc::clone(engine);
    Pool::new(Box::new(move || engine.create_scratch()))
}

/// A compiled pattern.
///
/// A pattern is immutable once built. It can be used from many threads at the
/// same time, and by a replacer while the same pattern is replacing.
///
/// ## Flags
/// - `i`: case insensitive.
/// - `s`: `.` also matches `\n`.
/// - `m`: `^` and `$` also match at line boundaries.
/// - `u`: `\d`, `\w`, `\s` and `\b` are Unicode-aware. They are ASCII-only
///   otherwise.
/// - `g`: global. [`Pattern::matches`] and [`Pattern::replace`] work on every
///   match instead of the first one.
///
/// Each letter may be given at most once. See [`crate::flags`] for the engine
/// bits they map to.
pub struct Pattern {
    source: String,
    flags: String,
    bits: Flags,
    global: bool,
    engine: Arc<Engine>,
    /// A thread safe pool of scratches.
    ///
    /// Kept outside the `Arc` so that a cloned pattern gets its own pool.
    scratch: Pool<Scratch, ScratchFn>,
}

#[bon]
impl Pattern {
    /// Compile `source`. Flags are taken from `source` too, see
    /// [`PatternSource`].
    pub fn new(source: impl PatternSource) -> Result<Self> {
        Self::builder().build(source)
    }

    /// Return a builder for configuring the construction of a `Pattern`.
    ///
    /// ```
    /// use scanpat::Pattern;
    ///
    /// let re = Pattern::builder().flags("gi").build("ab")?;
    /// assert_eq!(re.matches("xAbab")?, Some(vec!["Ab", "ab"]));
    ///
    /// // Overrides the flags of the source
    /// let re = Pattern::builder().flags("").build(("ab", "gi"))?;
    /// assert_eq!(re.matches("xAbab")?, Some(vec!["ab"]));
    /// # Ok::<(), scanpat::Error>(())
    /// ```
    #[builder(builder_type = Builder, finish_fn(name = build_source, vis = ""))]
    pub fn builder(
        #[builder(field)] flags: Option<String>,
        #[builder(finish_fn)] source: String,
        /// Let the engine report every shorter match before a full one, the
        /// way Hyperscan does.
        ///
        /// Global results are the same either way. Without `g`, the first
        /// report wins, so [`Pattern::matches`] returns the shortest match at
        /// the leftmost start:
        ///
        /// ```
        /// use scanpat::Pattern;
        ///
        /// let re = Pattern::builder().report_prefixes(true).build("a+")?;
        /// assert_eq!(re.matches("baaab")?, Some(vec!["a"]));
        ///
        /// let re = Pattern::builder().report_prefixes(true).build(("a+", "g"))?;
        /// assert_eq!(re.matches("baaab aab")?, Some(vec!["aaa", "aa"]));
        /// # Ok::<(), scanpat::Error>(())
        /// ```
        #[builder(default)]
        report_prefixes: bool,
        /// Fail with [`Error::ScratchAllocation`] if the scan workspace needs
        /// more than this many bytes.
        scratch_limit: Option<usize>,
    ) -> Result<Self> {
        let parsed = flags::parse(flags.as_deref().unwrap_or_default())?;
        let config = Config { report_prefixes, scratch_limit };
        let engine = Engine::compile(&source, parsed.bits, &config)
            .map_err(|e| {
                let flags: String = parsed.flags.chars().filter(|&c| c != 'g').collect();
                Error::compile(&source, &flags, e)
            })?;
        #[cfg(test)]
        dbg!(&engine);

        engine.alloc_scratch(config.scratch_limit)?;
        let engine = Arc::new(engine);
        Ok(Self {
            source,
            flags: parsed.flags,
            bits: parsed.bits,
            global: parsed.global,
            scratch: scratch_pool(&engine),
            engine,
        })
    }
}

impl<S: builder::State> Builder<S> {
    /// The flag string. Defaults to the flags of the source given to
    /// [`Builder::build`].
    pub fn flags(mut self, flags: impl Into<String>) -> Self {
        self.flags = Some(flags.into());
        self
    }

    pub fn build(mut self, source: impl PatternSource) -> Result<Pattern>
    where
        S: builder::IsComplete,
    {
        if self.flags.is_none() {
            self.flags = Some(source.flags().to_owned());
        }
        self.build_source(source.source().to_owned())
    }
}

impl Pattern {
    /// Returns true if the pattern matches anywhere in `text`.
    ///
    /// The `g` flag is ignored.
    ///
    /// ```
    /// use scanpat::Pattern;
    ///
    /// let re = Pattern::new(("x", "g"))?;
    /// assert!(!re.test("no match here")?);
    /// assert!(Pattern::default().test("abc")?);
    /// # Ok::<(), scanpat::Error>(())
    /// ```
    pub fn test(&self, text: &str) -> Result<bool> {
        Ok(self.consolidate(false, text, Existence::default())?.found)
    }

    /// The first matched substring, or every matched substring with `g`.
    ///
    /// Returns `None` if nothing matched. Empty matches are empty strings.
    pub fn matches<'t>(&self, text: &'t str) -> Result<Option<Vec<&'t str>>> {
        Ok(self
            .consolidate(self.global, text, Collector::new(text))?
            .into_matches())
    }

    /// Replace the first match, or every match with `g`.
    ///
    /// If `text` has no match, it is returned unchanged. If the replacer
    /// fails, the whole call fails with [`Error::Replacement`] and the
    /// replacer is not called again.
    pub fn replace<R: Replacer>(&self, text: &str, replacer: R) -> Result<String> {
        Ok(self
            .consolidate(self.global, text, Compositor::new(text, replacer))?
            .into_string())
    }

    fn consolidate<A: Accumulator>(
        &self,
        global: bool,
        text: &str,
        acc: A,
    ) -> Result<A> {
        let mut scratch = self.scratch.get();
        consolidate(global, acc, |on_span| {
            self.engine.scan(&mut scratch, text, on_span)
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The flag letters in effect, in the order they were given.
    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// The engine bits, including [`Flags::BASELINE`].
    pub fn bits(&self) -> Flags {
        self.bits
    }

    pub fn is_global(&self) -> bool {
        self.global
    }
}

impl Default for Pattern {
    /// The empty pattern `(?:)`, which matches everywhere.
    fn default() -> Self {
        Pattern::new("(?:)").expect("the empty pattern always compiles")
    }
}

impl Clone for Pattern {
    fn clone(&self) -> Self {
        Pattern {
            source: self.source.clone(),
            flags: self.flags.clone(),
            bits: self.bits,
            global: self.global,
            scratch: scratch_pool(&self.engine),
            engine: self.engine.clone(),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("source", &self.source)
            .field("flags", &self.flags)
            .field("bits", &self.bits)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

/// `/source/g` followed by the other flags.
///
/// The `g` is always rendered, whether or not the pattern is global.
impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/g", self.source)?;
        for c in self.flags.chars().filter(|&c| c != 'g') {
            f.write_char(c)?;
        }
        Ok(())
    }
}
