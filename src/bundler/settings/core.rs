//! Core Settings struct and implementations.

use super::PluginVersion;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Base URL the renderer settings files are downloaded from.
pub const DEFAULT_SETTINGS_URL: &str =
    "https://raw.githubusercontent.com/appleseedhq/appleseed/master/sandbox/settings/";

/// Location of the host application's embedded Python on macOS.
pub const DEFAULT_HOST_PYTHON_FRAMEWORK: &str =
    "@executable_path/../Frameworks/Python.framework/Versions/2.7/Python";

/// Input locations read from the configuration file.
///
/// Paths have already gone through environment-variable expansion.
#[derive(Debug, Clone, Default)]
pub struct SourcePaths {
    /// CMake build directory of the plugin (holds `CMakeCache.txt`).
    pub build_path: PathBuf,

    /// Directory containing the built plugin module.
    pub bin_path: PathBuf,

    /// Renderer executables (`appleseed.cli`, and the DLLs on Windows).
    pub appleseed_bin_path: PathBuf,

    /// Renderer shared libraries.
    pub appleseed_lib_path: PathBuf,

    /// Compiled shader tree (`maya/` and `appleseed/` subdirectories).
    pub appleseed_shaders_path: PathBuf,

    /// Renderer XML schemas.
    pub appleseed_schemas_path: PathBuf,

    /// Renderer settings files, used when running offline.
    pub appleseed_settings_path: PathBuf,

    /// Renderer Python bindings, merged into `scripts/`.
    pub appleseed_python_path: PathBuf,

    /// The `maketx` executable.
    pub maketx_path: PathBuf,
}

/// Where the renderer settings files come from.
#[derive(Debug, Clone)]
pub enum SettingsSource {
    /// Fetched over HTTP from this base URL.
    Download(Url),
    /// Copied from a local directory tree.
    Directory(PathBuf),
}

/// Retry policy for deleting the previous output directory.
///
/// Tolerates transient locks held by indexers or virus scanners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalPolicy {
    /// Total number of attempts, at least one.
    pub attempts: u32,
    /// Sleep between attempts.
    pub delay: Duration,
}

impl Default for RemovalPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_millis(500),
        }
    }
}

/// Immutable configuration for one packaging run.
///
/// Constructed by [`load_settings`](super::load_settings) or, in tests,
/// through [`SettingsBuilder`](super::SettingsBuilder).
#[derive(Clone, Debug)]
pub struct Settings {
    /// Platform identifier used in the archive name.
    platform: String,

    /// Input locations.
    paths: SourcePaths,

    /// Directory the package tree is assembled in.
    package_output_path: PathBuf,

    /// Root of the plugin repository (LICENSE, icons, scripts, version header).
    root_dir: PathBuf,

    /// Directory the final zip is written to.
    archive_dir: PathBuf,

    /// Host application version, e.g. `2018`.
    maya_version: String,

    /// Plugin version from the version header.
    plugin_version: PluginVersion,

    settings_source: SettingsSource,

    removal_policy: RemovalPolicy,

    /// Replacement install name for the embedded Python library (macOS).
    host_python_framework: String,
}

impl Settings {
    /// Returns the platform identifier.
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Returns the input locations.
    pub fn paths(&self) -> &SourcePaths {
        &self.paths
    }

    /// Returns the directory the package is assembled in.
    pub fn package_output_path(&self) -> &Path {
        &self.package_output_path
    }

    /// Returns the plugin repository root.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Returns the directory receiving the final archive.
    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Returns the host application version.
    pub fn maya_version(&self) -> &str {
        &self.maya_version
    }

    /// Returns the plugin version.
    pub fn plugin_version(&self) -> &PluginVersion {
        &self.plugin_version
    }

    /// Returns where settings files are fetched from.
    pub fn settings_source(&self) -> &SettingsSource {
        &self.settings_source
    }

    /// Returns the output-directory removal policy.
    pub fn removal_policy(&self) -> &RemovalPolicy {
        &self.removal_policy
    }

    /// Returns the install name embedded Python references are rewritten to.
    pub fn host_python_framework(&self) -> &str {
        &self.host_python_framework
    }

    /// File name of the final archive.
    pub fn archive_name(&self) -> String {
        format!(
            "appleseed-maya{}-{}-{}.zip",
            self.maya_version, self.plugin_version, self.platform
        )
    }

    /// Label/value pairs describing this configuration, in display order.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let p = &self.paths;
        vec![
            ("Platform", self.platform.clone()),
            ("Maya version", self.maya_version.clone()),
            ("appleseed-maya version", self.plugin_version.to_string()),
            ("Build path", p.build_path.display().to_string()),
            ("Path to appleseed-maya binaries", p.bin_path.display().to_string()),
            ("Path to appleseed binaries", p.appleseed_bin_path.display().to_string()),
            ("Path to appleseed libraries", p.appleseed_lib_path.display().to_string()),
            ("Path to appleseed shaders", p.appleseed_shaders_path.display().to_string()),
            ("Path to appleseed schemas", p.appleseed_schemas_path.display().to_string()),
            ("Path to appleseed settings", p.appleseed_settings_path.display().to_string()),
            ("Path to appleseed.python", p.appleseed_python_path.display().to_string()),
            ("Path to maketx", p.maketx_path.display().to_string()),
            ("Output directory", self.package_output_path.display().to_string()),
        ]
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        platform: String,
        paths: SourcePaths,
        package_output_path: PathBuf,
        root_dir: PathBuf,
        archive_dir: PathBuf,
        maya_version: String,
        plugin_version: PluginVersion,
        settings_source: SettingsSource,
        removal_policy: RemovalPolicy,
        host_python_framework: String,
    ) -> Self {
        Self {
            platform,
            paths,
            package_output_path,
            root_dir,
            archive_dir,
            maya_version,
            plugin_version,
            settings_source,
            removal_policy,
            host_python_framework,
        }
    }
}
