//! XML configuration file access.
//!
//! The configuration is a flat document: one root element whose child
//! elements are the keys.
//!
//! ```xml
//! <settings>
//!     <platform>linux-x64-gcc48</platform>
//!     <build_path>$HOME/appleseed-maya/build</build_path>
//! </settings>
//! ```

use crate::bundler::error::{Error, Result};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Parsed configuration file.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    values: HashMap<String, String>,
}

impl ConfigFile {
    /// Reads and parses the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    /// Parses configuration text; `path` is only used in error messages.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(text).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut values = HashMap::new();
        for node in doc.root_element().children().filter(|n| n.is_element()) {
            let value = node.text().unwrap_or_default().trim().to_string();
            // First occurrence wins.
            values
                .entry(node.tag_name().name().to_string())
                .or_insert(value);
        }

        Ok(Self { values })
    }

    /// Returns the value of a key that must be present.
    pub fn required(&self, key: &str) -> Result<&str> {
        self.optional(key).ok_or_else(|| Error::MissingConfigKey {
            key: key.to_string(),
        })
    }

    /// Returns the value of a key, if present.
    pub fn optional(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns a required key as a path, with environment variables expanded.
    pub fn required_path(&self, key: &str) -> Result<PathBuf> {
        Ok(PathBuf::from(expand_vars(self.required(key)?)?))
    }

    /// Parses an optional key with `FromStr`.
    pub fn optional_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|e: T::Err| Error::InvalidConfigValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    reason: e.to_string(),
                }),
        }
    }
}

/// Expands `$VAR`, `${VAR}` and `%VAR%` references from the environment.
///
/// Undefined variables are left as written.
pub fn expand_vars(value: &str) -> Result<String> {
    let pattern = Regex::new(
        r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)|%([A-Za-z_][A-Za-z0-9_]*)%",
    )
    .map_err(|e| Error::GenericError(format!("invalid variable pattern: {}", e)))?;

    let expanded = pattern.replace_all(value, |caps: &Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
    });

    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<settings>
    <platform>linux-x64-gcc48</platform>
    <build_path>
        /home/user/build
    </build_path>
    <maketx_path></maketx_path>
    <platform>ignored-duplicate</platform>
</settings>
"#;

    #[test]
    fn reads_child_elements_as_keys() {
        let config = ConfigFile::parse(Path::new("test.xml"), SAMPLE).unwrap();
        assert_eq!(config.required("platform").unwrap(), "linux-x64-gcc48");
        assert_eq!(config.required("build_path").unwrap(), "/home/user/build");
        assert_eq!(config.required("maketx_path").unwrap(), "");
    }

    #[test]
    fn missing_key_names_the_key() {
        let config = ConfigFile::parse(Path::new("test.xml"), SAMPLE).unwrap();
        let err = config.required("package_output_path").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing value \"package_output_path\" in configuration file"
        );
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = ConfigFile::parse(Path::new("bad.xml"), "<settings><platform>").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn optional_numbers_are_validated() {
        let config = ConfigFile::parse(
            Path::new("test.xml"),
            "<s><delete_attempts>three</delete_attempts></s>",
        )
        .unwrap();
        let err = config.optional_parsed::<u32>("delete_attempts").unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
        assert_eq!(config.optional_parsed::<u64>("absent").unwrap(), None);
    }

    #[test]
    fn expands_known_variables_only() {
        // PATH is set in any test environment.
        let path = std::env::var("PATH").unwrap();
        assert_eq!(expand_vars("$PATH/x").unwrap(), format!("{path}/x"));
        assert_eq!(expand_vars("${PATH}x").unwrap(), format!("{path}x"));
        assert_eq!(expand_vars("%PATH%").unwrap(), path);
        assert_eq!(
            expand_vars("$NO_SUCH_VARIABLE_91X/lib").unwrap(),
            "$NO_SUCH_VARIABLE_91X/lib"
        );
    }
}
