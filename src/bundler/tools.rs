//! External tool invocation.
//!
//! Dependency introspection and binary patching are delegated to platform
//! tools (`ldd`, `chrpath`, `otool`, `install_name_tool`). All calls go
//! through [`ToolRunner`] so the packaging logic can be exercised against
//! canned tool output.

use crate::bundler::{
    builder::locate_tool,
    error::{Error, Result},
};
use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::Command;

/// Captured result of a finished tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ToolOutput {
    /// Builds a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Returns true when the tool exited with status 0.
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external tools on behalf of the packagers.
pub trait ToolRunner {
    /// Fails with [`Error::ToolNotFound`] when `tool` cannot be located.
    fn ensure_available(&self, tool: &str) -> Result<()>;

    /// Runs `tool` with `args` to completion and captures its output.
    ///
    /// A non-zero exit is not an error at this level; see [`run_checked`].
    fn run(&self, tool: &str, args: &[&OsStr]) -> Result<ToolOutput>;
}

/// Runs tools found in `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTools;

impl ToolRunner for SystemTools {
    fn ensure_available(&self, tool: &str) -> Result<()> {
        locate_tool(tool).map(|_| ())
    }

    fn run(&self, tool: &str, args: &[&OsStr]) -> Result<ToolOutput> {
        log::debug!("Running command line: {}", format_command_line(tool, args));

        let output = Command::new(tool).args(args).output().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::ToolNotFound {
                    tool: tool.to_string(),
                }
            } else {
                Error::GenericError(format!("Failed to execute {}: {}", tool, e))
            }
        })?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs a tool against `target` and fails on a non-zero exit.
///
/// The returned error carries the captured standard error.
pub fn run_checked(
    runner: &dyn ToolRunner,
    tool: &str,
    args: &[&OsStr],
    target: &Path,
) -> Result<ToolOutput> {
    let output = runner.run(tool, args)?;
    if !output.is_success() {
        return Err(Error::ToolFailed {
            tool: tool.to_string(),
            target: target.to_path_buf(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output)
}

/// Renders a command line for log output.
pub fn format_command_line(tool: &str, args: &[&OsStr]) -> String {
    let mut line = tool.to_string();
    for arg in args {
        let arg = arg.to_string_lossy();
        line.push(' ');
        if arg.contains(' ') {
            line.push('"');
            line.push_str(&arg);
            line.push('"');
        } else {
            line.push_str(&arg);
        }
    }
    line
}
