use regex_automata::MatchError;

/// A boxed error returned by a [`Replacer`](crate::Replacer).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The standard [`Result`](core::result::Result) type used by scanpat.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors from building or running a [`Pattern`](crate::Pattern).
///
/// Construction errors ([`InvalidFlags`](Error::InvalidFlags),
/// [`Compile`](Error::Compile) and
/// [`ScratchAllocation`](Error::ScratchAllocation)) mean no pattern was
/// created. The others only abort the call that raised them; the pattern stays
/// usable.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A flag letter is unknown or repeated.
    #[error("Invalid flags supplied to pattern constructor '{flags}'")]
    InvalidFlags { flags: String },

    /// The engine rejected the pattern.
    #[error("Invalid regular expression: /{pattern}/{flags}: {message}")]
    Compile {
        pattern: String,
        /// The flags other than `g`.
        flags: String,
        message: String,
    },

    /// The scan workspace could not be set up for a compiled pattern.
    #[error("Failed to allocate scratch space for pattern ({required} bytes required, limit is {limit})")]
    ScratchAllocation { required: usize, limit: usize },

    /// The replacer failed, or its result could not be turned into a string.
    #[error("replacement failed: {0}")]
    Replacement(#[source] BoxError),

    /// The engine failed internally while scanning.
    #[error("scan failed: {0}")]
    Scan(#[from] MatchError),
}

impl Error {
    pub(crate) fn invalid_flags(flags: &str) -> Self {
        Error::InvalidFlags { flags: flags.to_owned() }
    }

    pub(crate) fn compile(
        pattern: &str,
        flags: &str,
        message: impl ToString,
    ) -> Self {
        Error::Compile {
            pattern: pattern.to_owned(),
            flags: flags.to_owned(),
            message: message.to_string(),
        }
    }
}
