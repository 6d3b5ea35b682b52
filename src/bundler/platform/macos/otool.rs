//! Parsers for `otool` output.

use crate::bundler::error::{Error, Result};
use regex::Regex;

use super::OTOOL;

/// Pattern of one `otool -L` dependency line.
const LIBRARY_LINE: &str = r"^(.*) \(compatibility version .*, current version .*\)$";

/// Extracts the load commands listed by `otool -L`, as written in the binary.
///
/// The first line (the inspected file) and any other header line ending in
/// `:` are skipped, as are `@executable_path` references which only the host
/// application can resolve. Every remaining line must be a dependency entry.
/// Duplicate references are reported once.
pub fn parse_otool_libraries(output: &str) -> Result<Vec<String>> {
    let pattern = Regex::new(LIBRARY_LINE)
        .map_err(|e| Error::GenericError(format!("Invalid otool pattern: {e}")))?;

    let mut references: Vec<String> = Vec::new();
    for line in output.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() || line.ends_with(':') || line.starts_with("@executable_path") {
            continue;
        }

        let captures = pattern.captures(line).ok_or_else(|| Error::ToolOutputParse {
            tool: OTOOL.to_string(),
            line: line.to_string(),
        })?;
        let reference = captures[1].to_string();
        if !references.contains(&reference) {
            references.push(reference);
        }
    }
    Ok(references)
}

/// Extracts the `LC_RPATH` entries listed by `otool -l`.
pub fn parse_otool_rpaths(output: &str) -> Result<Vec<String>> {
    let mut rpaths = Vec::new();
    let mut in_rpath_command = false;

    for line in output.lines() {
        let line = line.trim();

        if in_rpath_command && line.starts_with("path") {
            let path = line
                .strip_prefix("path")
                .map(str::trim_start)
                .filter(|rest| !rest.is_empty())
                .ok_or_else(|| Error::ToolOutputParse {
                    tool: OTOOL.to_string(),
                    line: line.to_string(),
                })?;
            // Strip the trailing "(offset N)" annotation.
            let path = match path.rfind(" (offset ") {
                Some(index) => &path[..index],
                None => path,
            };
            rpaths.push(path.to_string());
            in_rpath_command = false;
        }

        if line == "cmd LC_RPATH" {
            in_rpath_command = true;
        }
    }
    Ok(rpaths)
}
