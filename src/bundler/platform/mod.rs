//! Platform-specific packaging steps.
//!
//! The orchestrator runs the same step sequence on every OS; only dependency
//! bundling and binary post-processing differ. Each OS provides one
//! [`PlatformPackager`], selected once from the [`TargetOs`].

pub mod linux;
pub mod macos;
pub mod windows;

use crate::bail;
use crate::bundler::{
    error::Result,
    layout::PackageLayout,
    resolver::DependencyClosure,
    settings::Settings,
    tools::ToolRunner,
    utils::fs as fs_utils,
};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub use linux::LinuxPackager;
pub use macos::MacOsPackager;
pub use windows::WindowsPackager;

/// Operating system a package is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetOs {
    /// Linux, using `ldd` and `chrpath`
    Linux,
    /// macOS, using `otool` and `install_name_tool`
    MacOs,
    /// Windows, no binary patching
    Windows,
}

impl TargetOs {
    /// Returns the OS this process runs on.
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            TargetOs::Windows
        } else if cfg!(target_os = "macos") {
            TargetOs::MacOs
        } else {
            TargetOs::Linux
        }
    }

    /// Platform identifier written into the module descriptor.
    pub fn module_platform_id(self) -> &'static str {
        match self {
            TargetOs::Linux => "linux",
            TargetOs::MacOs => "mac",
            TargetOs::Windows => "win64",
        }
    }

    /// File extension of the host plugin module.
    pub fn plugin_extension(self) -> &'static str {
        match self {
            TargetOs::Linux => ".so",
            TargetOs::MacOs => ".bundle",
            TargetOs::Windows => ".mll",
        }
    }

    /// Appends the platform executable suffix to `name`.
    pub fn executable_name(self, name: &str) -> String {
        match self {
            TargetOs::Windows => format!("{name}.exe"),
            _ => name.to_string(),
        }
    }

    /// Renderer core libraries, bundled explicitly rather than discovered.
    pub fn core_libraries(self) -> &'static [&'static str] {
        match self {
            TargetOs::Linux => &["libappleseed.so", "libappleseed.shared.so"],
            TargetOs::MacOs => &["libappleseed.dylib", "libappleseed.shared.dylib"],
            TargetOs::Windows => &["appleseed.dll", "appleseed.shared.dll"],
        }
    }

    /// External tools the packager for this OS invokes.
    pub fn required_tools(self) -> &'static [&'static str] {
        match self {
            TargetOs::Linux => &[linux::LDD, linux::CHRPATH],
            TargetOs::MacOs => &[macos::OTOOL, macos::INSTALL_NAME_TOOL],
            TargetOs::Windows => &[],
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TargetOs::Linux => "linux",
            TargetOs::MacOs => "macos",
            TargetOs::Windows => "windows",
        })
    }
}

impl FromStr for TargetOs {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(TargetOs::Linux),
            "macos" | "mac" | "darwin" => Ok(TargetOs::MacOs),
            "windows" | "win64" => Ok(TargetOs::Windows),
            other => Err(format!(
                "Invalid target OS: {other}. Valid values: linux, macos, windows"
            )),
        }
    }
}

/// State shared by the packaging steps of one run.
///
/// Created by the orchestrator at the start of a run and dropped at its end.
pub struct PackageContext<'a> {
    /// Run configuration
    pub settings: &'a Settings,
    /// Output tree
    pub layout: &'a PackageLayout,
    /// External tool access
    pub tools: &'a dyn ToolRunner,
    /// OS the package targets
    pub target: TargetOs,
}

impl PackageContext<'_> {
    /// Binaries whose dependencies seed the closure: object files in `bin/`
    /// plus the renderer's Python extension module, which must exist.
    pub fn seed_binaries(&self) -> Result<Vec<PathBuf>> {
        let mut seeds = self.bin_objects()?;

        let extension = self.layout.python_extension();
        if !extension.is_file() {
            bail!("Python extension module {} not found", extension.display());
        }
        seeds.push(extension);
        Ok(seeds)
    }

    /// Object files in `bin/`, skipping scripts and configuration files.
    pub fn bin_objects(&self) -> Result<Vec<PathBuf>> {
        let files = fs_utils::glob_files(&self.layout.bin_dir().join("*"))?;
        Ok(files
            .into_iter()
            .filter(|path| fs_utils::is_object_file(path))
            .collect())
    }

    /// Copies the renderer core libraries from `source_dir` into `dest_dir`.
    pub async fn copy_core_libraries(
        &self,
        source_dir: &std::path::Path,
        dest_dir: &std::path::Path,
    ) -> Result<()> {
        for name in self.target.core_libraries() {
            fs_utils::copy_file(&source_dir.join(name), &dest_dir.join(name)).await?;
        }
        Ok(())
    }
}

/// Dependency bundling and binary post-processing for one OS.
#[allow(async_fn_in_trait)]
pub trait PlatformPackager {
    /// Copies every shared library the package needs next to its binaries.
    ///
    /// Returns the discovered dependency closure (empty when the platform
    /// does not resolve dependencies).
    async fn copy_dependencies(&self, ctx: &PackageContext<'_>) -> Result<DependencyClosure>;

    /// Rewrites binary metadata so the package is relocatable.
    async fn post_process(&self, ctx: &PackageContext<'_>) -> Result<()>;
}
