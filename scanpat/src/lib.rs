/*!
Regex-style `test`, `match` and `replace` on top of a span-reporting scan
engine, with [Hyperscan](https://www.hyperscan.io/)'s flag semantics.

## Features
- Flag strings made of `i`, `s`, `m`, `u` and `g`, mapped to Hyperscan's
  compile flags (see [`flags`]).
- UTF-8 throughout. Perl classes (`\d`, `\w`, `\s`, `\b`) are ASCII-only unless
  `u` is given.
- The engine reports raw spans to a callback and may stop at any span. Repeated
  reports for the same start are merged into one logical match.
- Optional Hyperscan-style prefix reports (see
  [`Builder::report_prefixes`](pattern::Builder::report_prefixes)).
- Replacement with strings or fallible closures, which get the matched text
  and its byte offset.
- Patterns are `Send + Sync`; each scan takes its own scratch from a pool.

## Usage
```
use scanpat::{BoxError, Pattern};

let re = Pattern::new(("a+", "g"))?;
assert!(re.test("baaab aab")?);
assert_eq!(re.matches("baaab aab")?, Some(vec!["aaa", "aa"]));

let re = Pattern::new(("a+", ""))?;
assert_eq!(re.matches("baaab aab")?, Some(vec!["aaa"]));

let re = Pattern::new((r"\d+", "g"))?;
let replaced = re.replace("a1b22c", |m: &str, offset: usize| {
    Ok::<_, BoxError>(format!("<{m}:{offset}>"))
})?;
assert_eq!(replaced, "a<1:1>b<22:3>c");

assert_eq!(re.to_string(), r"/\d+/g");
# Ok::<(), scanpat::Error>(())
```

Errors never leave a pattern half-built, and an error from one call, such as
a failing replacer, does not affect later calls:
```
use scanpat::{Error, Pattern};

assert!(matches!(Pattern::new(("a", "gg")), Err(Error::InvalidFlags { .. })));
assert!(matches!(Pattern::new("a("), Err(Error::Compile { .. })));

let re = Pattern::new(("x", "g"))?;
let result = re.replace("x", |_: &str, _: usize| Err::<String, _>("nope"));
assert!(matches!(result, Err(Error::Replacement(_))));
assert_eq!(re.replace("x", "y")?, "y");
# Ok::<(), scanpat::Error>(())
```
*/
//! ## Performance
//! The following `Cargo.toml` settings are recommended if best performance is desired:
//! ```toml
//! [profile.release]
//! lto = "fat"
//! codegen-units = 1
//! ```
//!
//! ## Crate features
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(feature = "doc", doc = document_features::document_features!())]

mod consolidate;
pub mod engine;
mod error;
pub mod flags;
pub mod pattern;
mod replace;
pub mod syntax;

pub use error::{BoxError, Error, Result};
pub use flags::Flags;
pub use pattern::{Pattern, PatternSource};
pub use regex_automata::Span;
pub use replace::{ReplaceFn, Replacer};
