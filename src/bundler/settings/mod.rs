//! Packaging configuration.
//!
//! Settings are loaded once at startup from the XML configuration file and
//! the version markers found in build artifacts, then handed to the
//! [`Bundler`](crate::bundler::Bundler) as an immutable record.

mod builder;
mod core;
mod loader;
mod version;
mod xml;

pub use builder::SettingsBuilder;
pub use core::{
    DEFAULT_HOST_PYTHON_FRAMEWORK, DEFAULT_SETTINGS_URL, RemovalPolicy, Settings, SettingsSource,
    SourcePaths,
};
pub use loader::{LoadOptions, load_settings};
pub use version::{
    PluginVersion, host_version, parse_maya_api_version, parse_maya_include_dir,
    parse_plugin_version, plugin_version,
};
pub use xml::{ConfigFile, expand_vars};
