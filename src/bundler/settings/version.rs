//! Version strings derived from build artifacts.
//!
//! The host version comes from the host SDK headers located through the
//! CMake cache; the plugin version comes from the plugin's own version
//! header.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::fmt;
use std::path::{Path, PathBuf};

const MAYA_INCLUDE_DIR_KEY: &str = "MAYA_INCLUDE_DIR:PATH=";
const PLUGIN_VERSION_PREFIX: &str = "#define APPLESEED_MAYA_VERSION_";

/// Plugin version as declared in `version.h`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Patch version
    pub patch: u32,
    /// Maturity tag, e.g. `alpha` or `beta`
    pub maturity: String,
}

impl PluginVersion {
    /// Creates a version from its parts.
    pub fn new(major: u32, minor: u32, patch: u32, maturity: impl Into<String>) -> Self {
        Self {
            major,
            minor,
            patch,
            maturity: maturity.into(),
        }
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}-{}",
            self.major, self.minor, self.patch, self.maturity
        )
    }
}

/// Extracts the host include directory from `CMakeCache.txt` contents.
pub fn parse_maya_include_dir(cmake_cache: &str) -> Option<PathBuf> {
    cmake_cache
        .lines()
        .find(|line| line.starts_with(MAYA_INCLUDE_DIR_KEY))
        .and_then(|line| line.split('=').nth(1))
        .map(|dir| PathBuf::from(dir.trim()))
}

/// Extracts the four-digit host version from `MTypes.h` contents.
pub fn parse_maya_api_version(mtypes_header: &str) -> Option<String> {
    mtypes_header
        .lines()
        .find(|line| line.contains("#define") && line.contains("MAYA_API_VERSION"))
        .and_then(|line| line.split_whitespace().last())
        .map(|token| token.chars().take(4).collect())
}

/// Extracts the plugin version from `version.h` contents.
///
/// All four of major, minor, patch and maturity must be defined.
pub fn parse_plugin_version(version_header: &str) -> Option<PluginVersion> {
    let mut major = None;
    let mut minor = None;
    let mut patch = None;
    let mut maturity = None;

    for line in version_header.lines() {
        if !line.starts_with(PLUGIN_VERSION_PREFIX) {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (Some(name), Some(value)) = (tokens.get(1), tokens.get(2)) else {
            continue;
        };
        match *name {
            "APPLESEED_MAYA_VERSION_MAJOR" => major = value.parse().ok(),
            "APPLESEED_MAYA_VERSION_MINOR" => minor = value.parse().ok(),
            "APPLESEED_MAYA_VERSION_PATCH" => patch = value.parse().ok(),
            "APPLESEED_MAYA_VERSION_MATURITY" => {
                maturity = Some(value.trim_matches('"').to_string())
            }
            _ => {}
        }
    }

    Some(PluginVersion {
        major: major?,
        minor: minor?,
        patch: patch?,
        maturity: maturity?,
    })
}

/// Determines the host version for the build at `build_path`.
pub fn host_version(build_path: &Path) -> Result<String> {
    let cache_path = build_path.join("CMakeCache.txt");
    let cache = read_text(&cache_path)?;
    let include_dir = parse_maya_include_dir(&cache).ok_or(Error::VersionNotFound {
        what: "Maya include directory",
        path: cache_path,
    })?;

    let header_path = include_dir.join("maya").join("MTypes.h");
    let header = read_text(&header_path)?;
    parse_maya_api_version(&header).ok_or(Error::VersionNotFound {
        what: "Maya version",
        path: header_path,
    })
}

/// Determines the plugin version from the repository at `root_dir`.
pub fn plugin_version(root_dir: &Path) -> Result<PluginVersion> {
    let header_path = root_dir.join("src").join("appleseedmaya").join("version.h");
    let header = read_text(&header_path)?;
    parse_plugin_version(&header).ok_or(Error::VersionNotFound {
        what: "appleseed-maya version",
        path: header_path,
    })
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).fs_context("failed to read", path)
}
