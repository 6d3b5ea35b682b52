//! External tool detection and availability checking.
//!
//! Missing introspection or patching tools abort the run before the output
//! directory is touched.

use crate::bundler::error::{Error, Result};
use std::path::PathBuf;

/// Locates `tool` in `PATH`.
pub fn locate_tool(tool: &str) -> Result<PathBuf> {
    match which::which(tool) {
        Ok(path) => {
            log::debug!("Found {} at: {}", tool, path.display());
            Ok(path)
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", tool, e);
            Err(Error::ToolNotFound {
                tool: tool.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tool_is_reported_by_name() {
        let err = locate_tool("definitely-not-a-real-tool-4f2a").unwrap_err();
        assert!(err.to_string().contains("definitely-not-a-real-tool-4f2a"));
    }
}
