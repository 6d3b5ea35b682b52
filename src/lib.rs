//! Packager for the appleseed-maya plugin.
//!
//! Builds a self-contained, relocatable zip of the plugin, the appleseed
//! renderer and every non-system shared library they need, for Linux, macOS
//! and Windows. It can be used both as a CLI tool and as a library
//! dependency.

pub mod bundler;
pub mod cli;
pub mod error;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
