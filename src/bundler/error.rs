//! Error types for packaging operations.
//!
//! Every packaging error is fatal: the run aborts and the caller reports the
//! message. Variants carry the file, key or reference that caused them so the
//! console message is actionable on its own.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for packaging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading settings or building a package.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem operation failed on a known path.
    #[error("{context} '{}': {source}", path.display())]
    Fs {
        /// What was being attempted
        context: String,
        /// Path the operation targeted
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// IO error without path context.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration file could not be read.
    #[error("Failed to load configuration file '{}': {source}", path.display())]
    ConfigRead {
        /// Configuration file path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not well-formed XML.
    #[error("Failed to parse configuration file '{}': {reason}", path.display())]
    ConfigParse {
        /// Configuration file path
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// A required configuration key is absent.
    #[error("Missing value \"{key}\" in configuration file")]
    MissingConfigKey {
        /// Name of the missing key
        key: String,
    },

    /// An optional configuration key holds an unusable value.
    #[error("Invalid value \"{value}\" for \"{key}\" in configuration file: {reason}")]
    InvalidConfigValue {
        /// Key name
        key: String,
        /// Offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Version markers could not be found in an inspected file.
    #[error("Failed to determine {what} from '{}'", path.display())]
    VersionNotFound {
        /// Which version was being derived
        what: &'static str,
        /// File that was inspected
        path: PathBuf,
    },

    /// External tool is not installed or not in `PATH`.
    #[error("Required tool '{tool}' could not be found")]
    ToolNotFound {
        /// Tool name
        tool: String,
    },

    /// External tool exited with a non-zero status.
    #[error("Failed to invoke {tool} for '{}' (exit code {code:?}): {stderr}", target.display())]
    ToolFailed {
        /// Tool name
        tool: String,
        /// File the tool was run against
        target: PathBuf,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// External tool printed a line that could not be parsed.
    #[error("Failed to parse line from {tool} output: {line}")]
    ToolOutputParse {
        /// Tool name
        tool: String,
        /// Offending line
        line: String,
    },

    /// A dependency reference does not resolve to an existing file.
    #[error("Dependency {reference} of '{}' could not be found on disk", binary.display())]
    UnresolvedDependency {
        /// Reference as written in the binary, or as resolved
        reference: String,
        /// Binary that requires it
        binary: PathBuf,
    },

    /// HTTP download failed.
    #[error("Failed to download {url}: {reason}")]
    Download {
        /// URL that was fetched
        url: String,
        /// Failure description
        reason: String,
    },

    /// Zip archive creation failed.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Directory traversal failed.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Glob pattern was malformed.
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Path was not under the expected base directory.
    #[error("Path prefix error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

/// Attaches path context to IO results.
pub trait ErrorExt<T> {
    /// Wraps the IO error with a description of the operation and the path.
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| Error::Fs {
            context: context.to_string(),
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Converts options and foreign errors into [`Error::GenericError`].
pub trait Context<T> {
    /// Attaches a message, producing a generic error on failure.
    fn context<C: Display>(self, context: C) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }
}

impl<T, E: Display> Context<T> for std::result::Result<T, E> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{context}: {e}")))
    }
}

/// Returns early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}
