//! Builder for constructing Settings.

use super::{
    DEFAULT_HOST_PYTHON_FRAMEWORK, DEFAULT_SETTINGS_URL, PluginVersion, RemovalPolicy, Settings,
    SettingsSource, SourcePaths,
};
use crate::bundler::error::{Context, Result};
use std::path::{Path, PathBuf};
use url::Url;

/// Builder for constructing [`Settings`].
///
/// # Examples
///
/// ```no_run
/// use appleseed_maya_package::bundler::{PluginVersion, SettingsBuilder, SourcePaths};
///
/// # fn example() -> appleseed_maya_package::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .platform("linux")
///     .source_paths(SourcePaths {
///         build_path: "build".into(),
///         ..Default::default()
///     })
///     .package_output_path("package")
///     .maya_version("2018")
///     .plugin_version(PluginVersion::new(0, 5, 0, "beta"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    platform: Option<String>,
    paths: Option<SourcePaths>,
    package_output_path: Option<PathBuf>,
    root_dir: Option<PathBuf>,
    archive_dir: Option<PathBuf>,
    maya_version: Option<String>,
    plugin_version: Option<PluginVersion>,
    settings_source: Option<SettingsSource>,
    removal_policy: RemovalPolicy,
    host_python_framework: Option<String>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the platform identifier used in the archive name.
    ///
    /// # Required
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Sets the input locations.
    ///
    /// # Required
    pub fn source_paths(mut self, paths: SourcePaths) -> Self {
        self.paths = Some(paths);
        self
    }

    /// Sets the directory the package tree is assembled in.
    ///
    /// # Required
    pub fn package_output_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.package_output_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the plugin repository root.
    ///
    /// Default: current directory
    pub fn root_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.root_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the directory the final archive is written to.
    ///
    /// Default: current directory
    pub fn archive_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.archive_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the host application version.
    ///
    /// # Required
    pub fn maya_version(mut self, version: impl Into<String>) -> Self {
        self.maya_version = Some(version.into());
        self
    }

    /// Sets the plugin version.
    ///
    /// # Required
    pub fn plugin_version(mut self, version: PluginVersion) -> Self {
        self.plugin_version = Some(version);
        self
    }

    /// Sets where renderer settings files come from.
    ///
    /// Default: download from [`DEFAULT_SETTINGS_URL`]
    pub fn settings_source(mut self, source: SettingsSource) -> Self {
        self.settings_source = Some(source);
        self
    }

    /// Sets the output-directory removal policy.
    pub fn removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = policy;
        self
    }

    /// Sets the install name embedded Python references are rewritten to.
    ///
    /// Default: [`DEFAULT_HOST_PYTHON_FRAMEWORK`]
    pub fn host_python_framework(mut self, name: impl Into<String>) -> Self {
        self.host_python_framework = Some(name.into());
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing.
    pub fn build(self) -> Result<Settings> {
        let settings_source = match self.settings_source {
            Some(source) => source,
            None => SettingsSource::Download(
                Url::parse(DEFAULT_SETTINGS_URL).context("invalid default settings URL")?,
            ),
        };

        Ok(Settings::new(
            self.platform.context("platform is required")?,
            self.paths.context("source_paths is required")?,
            self.package_output_path
                .context("package_output_path is required")?,
            self.root_dir.unwrap_or_else(|| PathBuf::from(".")),
            self.archive_dir.unwrap_or_else(|| PathBuf::from(".")),
            self.maya_version.context("maya_version is required")?,
            self.plugin_version.context("plugin_version is required")?,
            settings_source,
            self.removal_policy,
            self.host_python_framework
                .unwrap_or_else(|| DEFAULT_HOST_PYTHON_FRAMEWORK.to_string()),
        ))
    }
}
