//! Flag string parsing.
//!
//! A flag string is made of the letters `i`, `s`, `u`, `m` and `g`, each at
//! most once:
//!
//! | Letter | Meaning | Engine bit |
//! |---|---|---|
//! | `i` | case insensitive | [`Flags::CASELESS`] |
//! | `s` | `.` matches `\n` | [`Flags::DOTALL`] |
//! | `u` | Unicode Perl classes | [`Flags::UCP`] |
//! | `m` | `^` and `$` match at line boundaries | [`Flags::MULTILINE`] |
//! | `g` | global, i.e. find all matches | none |
//!
//! [`Flags::BASELINE`] is always added on top.
//!
//! ```
//! use scanpat::flags::{self, Flags};
//!
//! let parsed = flags::parse("gi")?;
//! assert_eq!(parsed.flags, "gi");
//! assert!(parsed.global);
//! assert_eq!(parsed.bits, Flags::BASELINE | Flags::CASELESS);
//!
//! assert!(flags::parse("ii").is_err());
//! assert!(flags::parse("x").is_err());
//! # Ok::<(), scanpat::Error>(())
//! ```
use bitflags::bitflags;

use crate::Error;

bitflags! {
    /// Engine-native compile flags.
    ///
    /// The values are the ones used by Hyperscan's `HS_FLAG_*` constants.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// Case insensitive matching.
        const CASELESS = 1;
        /// `.` also matches `\n`.
        const DOTALL = 1 << 1;
        /// `^` and `$` also match at line boundaries.
        const MULTILINE = 1 << 2;
        /// Patterns that can match the empty string are accepted.
        const ALLOW_EMPTY = 1 << 4;
        /// Patterns and haystacks are UTF-8.
        const UTF8 = 1 << 5;
        /// Unicode properties for `\d`, `\w`, `\s` and `\b`.
        const UCP = 1 << 6;
        /// Report the leftmost start offset of each match.
        const SOM_LEFTMOST = 1 << 8;
    }
}

impl Flags {
    /// Bits enabled for every pattern regardless of the flag string.
    pub const BASELINE: Flags = Flags::UTF8
        .union(Flags::ALLOW_EMPTY)
        .union(Flags::SOM_LEFTMOST);
}

/// The result of [`parse`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedFlags {
    /// The flag letters in effect, in input order.
    pub flags: String,
    pub bits: Flags,
    /// Whether `g` was given.
    pub global: bool,
}

impl Default for ParsedFlags {
    fn default() -> Self {
        Self { flags: String::new(), bits: Flags::BASELINE, global: false }
    }
}

/// Parse a flag string.
///
/// Fails with [`Error::InvalidFlags`] on an unknown letter or a repeated one.
pub fn parse(input: &str) -> Result<ParsedFlags, Error> {
    let mut parsed = ParsedFlags::default();
    for c in input.chars() {
        let bit = match c {
            'i' => Flags::CASELESS,
            's' => Flags::DOTALL,
            'u' => Flags::UCP,
            'm' => Flags::MULTILINE,
            'g' => {
                if parsed.global {
                    return Err(Error::invalid_flags(input));
                }
                parsed.global = true;
                parsed.flags.push(c);
                continue;
            }
            _ => return Err(Error::invalid_flags(input)),
        };
        if parsed.bits.contains(bit) {
            return Err(Error::invalid_flags(input));
        }
        parsed.bits |= bit;
        parsed.flags.push(c);
    }
    Ok(parsed)
}
