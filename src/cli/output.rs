//! Console feedback for the packaging run.
//!
//! Progress detail goes through `log`; this is the small set of messages
//! the user always sees: the banner, the configuration summary and the
//! final verdict. Colors are dropped when the stream is not a terminal or
//! `NO_COLOR` is set.

use colored::Colorize;
use std::io::{self, Write};

/// Output manager for colored terminal output.
#[derive(Debug, Clone, Copy)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    /// Creates an output manager.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Prints a line to stdout unless quiet.
    pub fn println(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        writeln!(io::stdout().lock(), "{message}")
    }

    /// Prints a line only in verbose mode.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if self.verbose {
            self.println(&message.dimmed().to_string())
        } else {
            Ok(())
        }
    }

    /// Prints an indented line.
    pub fn indent(&self, message: &str) -> io::Result<()> {
        self.println(&format!("  {message}"))
    }

    /// Prints an aligned `label: value` table, one indented row per pair.
    pub fn table(&self, rows: &[(&str, String)]) -> io::Result<()> {
        self.println("")?;
        for line in table_lines(rows) {
            self.indent(&line)?;
        }
        self.println("")
    }

    /// Prints a success message.
    pub fn success(&self, message: &str) -> io::Result<()> {
        self.println(&message.green().bold().to_string())
    }

    /// Prints a warning to stderr.
    pub fn warn(&self, message: &str) -> io::Result<()> {
        writeln!(io::stderr().lock(), "{}", warning_line(message))
    }

    /// Prints a fatal error to stderr, whatever the quiet setting.
    pub fn fatal(&self, message: &str) -> io::Result<()> {
        writeln!(io::stderr().lock(), "{}", fatal_line(message))
    }
}

fn table_lines(rows: &[(&str, String)]) -> Vec<String> {
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 1;
    rows.iter()
        .map(|(label, value)| {
            let label = format!("{:<width$}", format!("{label}:"));
            format!("{} {}", label.bold(), value)
        })
        .collect()
}

fn warning_line(message: &str) -> String {
    format!("{} {}", "Warning:".yellow().bold(), message)
}

fn fatal_line(message: &str) -> String {
    format!("{} {}. Aborting.", "Fatal:".red().bold(), message)
}
