//! Plugin packaging.
//!
//! Assembles a self-contained, relocatable appleseed-maya package: resources
//! and scripts from the repository, renderer binaries, shaders and settings,
//! the plugin module, and every non-system shared library those binaries
//! load, patched to be found relative to the package itself.

pub mod builder;
pub mod descriptor;
pub mod error;
pub mod layout;
pub mod platform;
pub mod resolver;
pub mod settings;
pub mod tools;
pub mod utils;

pub use builder::{Bundler, PackageArtifact};
pub use descriptor::{render_module_descriptor, write_module_descriptor};
pub use error::{Error, Result};
pub use layout::PackageLayout;
pub use platform::{PackageContext, PlatformPackager, TargetOs};
pub use resolver::{DependencyClosure, DependencyProbe, resolve_closure};
pub use settings::{
    LoadOptions, PluginVersion, RemovalPolicy, Settings, SettingsBuilder, SettingsSource,
    SourcePaths, load_settings,
};
pub use tools::{SystemTools, ToolOutput, ToolRunner};
