//! Loads [`Settings`] from the configuration file and build artifacts.

use super::{
    ConfigFile, RemovalPolicy, Settings, SettingsBuilder, SettingsSource, SourcePaths,
    DEFAULT_SETTINGS_URL, host_version, plugin_version,
};
use crate::bundler::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Inputs to [`load_settings`] that come from the command line.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Configuration file to read.
    pub config_path: PathBuf,
    /// Plugin repository root.
    pub root_dir: PathBuf,
    /// Directory the final archive is written to.
    pub archive_dir: PathBuf,
    /// Copy settings files from disk instead of downloading them.
    pub offline: bool,
}

/// Loads the packaging configuration.
///
/// Reads the XML configuration, checks every required key, then derives the
/// host and plugin versions. Nothing on disk is modified.
pub fn load_settings(options: &LoadOptions) -> Result<Settings> {
    log::info!(
        "Loading settings from {}...",
        options.config_path.display()
    );
    let config = ConfigFile::load(&options.config_path)?;

    let platform = config.required("platform")?.to_string();
    let paths = SourcePaths {
        build_path: config.required_path("build_path")?,
        bin_path: config.required_path("bin_path")?,
        appleseed_bin_path: config.required_path("appleseed_bin_path")?,
        appleseed_lib_path: config.required_path("appleseed_lib_path")?,
        appleseed_shaders_path: config.required_path("appleseed_shaders_path")?,
        appleseed_schemas_path: config.required_path("appleseed_schemas_path")?,
        appleseed_settings_path: config.required_path("appleseed_settings_path")?,
        appleseed_python_path: config.required_path("appleseed_python_path")?,
        maketx_path: config.required_path("maketx_path")?,
    };
    let package_output_path = config.required_path("package_output_path")?;

    let settings_source = if options.offline {
        SettingsSource::Directory(paths.appleseed_settings_path.clone())
    } else {
        let base = config.optional("settings_url").unwrap_or(DEFAULT_SETTINGS_URL);
        SettingsSource::Download(parse_base_url(base)?)
    };

    let defaults = RemovalPolicy::default();
    let removal_policy = RemovalPolicy {
        attempts: config
            .optional_parsed("delete_attempts")?
            .unwrap_or(defaults.attempts),
        delay: config
            .optional_parsed("delete_retry_delay_ms")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.delay),
    };

    let maya_version = host_version(&paths.build_path)?;
    let plugin_version = plugin_version(&options.root_dir)?;

    let mut builder = SettingsBuilder::new()
        .platform(platform)
        .source_paths(paths)
        .package_output_path(package_output_path)
        .root_dir(&options.root_dir)
        .archive_dir(&options.archive_dir)
        .maya_version(maya_version)
        .plugin_version(plugin_version)
        .settings_source(settings_source)
        .removal_policy(removal_policy);

    if let Some(framework) = config.optional("host_python_framework") {
        builder = builder.host_python_framework(framework);
    }

    builder.build()
}

/// Parses the settings base URL, making sure relative joins append to it.
fn parse_base_url(base: &str) -> Result<Url> {
    let normalized = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    Url::parse(&normalized).map_err(|e| Error::InvalidConfigValue {
        key: "settings_url".into(),
        value: base.to_string(),
        reason: e.to_string(),
    })
}
