//! Typed error types for pw-engine.
//!
//! Two concerns, two enums. [`CatalogError`] covers the one condition that
//! stops startup: the catalog source cannot be read at all. [`StageError`]
//! covers a single pipeline stage failing on a single word; it never leaves
//! the pipeline, which logs it and reverts the word.
//!
//! Bad catalog *lines* are not errors here. They are skipped with a
//! diagnostic while the rest of the catalog loads.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain any pattern catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be opened or read.
    #[error("cannot read pattern catalog '{}': {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog file is not valid UTF-8.
    #[error("pattern catalog '{}' is not valid UTF-8", path.display())]
    Encoding {
        /// Path that was being read.
        path: PathBuf,
    },

    /// The catalog was read but produced no usable pattern.
    #[error("pattern catalog '{}' contains no valid patterns", path.display())]
    Empty {
        /// Path that was being read.
        path: PathBuf,
    },
}

/// A pipeline stage that could not produce a value.
#[derive(Debug, Error)]
pub enum StageError {
    // -----------------------------------------------------------------------
    // Arguments
    // -----------------------------------------------------------------------
    /// An argument could not be interpreted (e.g. a non-integer width).
    #[error("{func}: invalid argument '{arg}'")]
    BadArgument {
        /// Function name as written.
        func: &'static str,
        /// The offending argument.
        arg: String,
    },

    /// A required argument is missing.
    #[error("{func}: missing argument")]
    MissingArgument {
        /// Function name.
        func: &'static str,
    },

    /// More arguments than the function accepts.
    #[error("{func}: takes at most {max} argument(s), got {got}")]
    TooManyArguments {
        /// Function name.
        func: &'static str,
        /// Accepted maximum.
        max: usize,
        /// Supplied count.
        got: usize,
    },

    /// A width or precision argument above [`MAX_WIDTH`](crate::pipeline::func::MAX_WIDTH).
    #[error("{func}: width {width} exceeds the limit of {max}")]
    TooWide {
        /// Function name.
        func: &'static str,
        /// The width as given.
        width: i64,
        /// Largest accepted width.
        max: usize,
    },

    /// A negative index reached past the start of the sequence.
    #[error("{func}: index {index} out of range")]
    IndexOutOfRange {
        /// Function name.
        func: &'static str,
        /// The index as given.
        index: i64,
    },

    // -----------------------------------------------------------------------
    // Regex
    // -----------------------------------------------------------------------
    /// A regex argument failed to compile.
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    // -----------------------------------------------------------------------
    // Numbers
    // -----------------------------------------------------------------------
    /// A numeric function received non-blank, non-numeric input.
    #[error("{func}: '{input}' is not a number")]
    NotANumber {
        /// Function name.
        func: &'static str,
        /// The word that failed to parse.
        input: String,
    },

    /// A numeric result cannot be represented (infinity, NaN, or out of
    /// range for an integer).
    #[error("{func}: '{input}' is out of range")]
    Overflow {
        /// Function name.
        func: &'static str,
        /// The word that produced the overflow.
        input: String,
    },
}

/// Result alias for pipeline stages.
pub type StageResult<T> = std::result::Result<T, StageError>;
