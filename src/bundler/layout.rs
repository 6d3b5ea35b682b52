//! Output directory layout of a package.

use std::path::{Path, PathBuf};

/// File name of the module descriptor at the package root.
pub const MODULE_DESCRIPTOR_NAME: &str = "appleseed-maya.mod";

/// Paths inside the package being assembled.
///
/// Every location is derived from the output root and the host version, so
/// the packagers never build paths by hand.
#[derive(Debug, Clone)]
pub struct PackageLayout {
    root: PathBuf,
    maya_version: String,
}

impl PackageLayout {
    /// Creates the layout for a package rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, maya_version: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            maya_version: maya_version.into(),
        }
    }

    /// Package root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Executables.
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Bundled shared libraries.
    pub fn lib_dir(&self) -> PathBuf {
        self.root.join("lib")
    }

    /// Plugin modules for the packaged host version.
    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join("plug-ins").join(&self.maya_version)
    }

    /// Python scripts.
    pub fn scripts_dir(&self) -> PathBuf {
        self.root.join("scripts")
    }

    /// Renderer Python package, holding the native extension modules.
    pub fn python_module_dir(&self) -> PathBuf {
        self.scripts_dir().join("appleseed")
    }

    /// Main renderer Python extension module.
    pub fn python_extension(&self) -> PathBuf {
        self.python_module_dir().join("_appleseedpython.so")
    }

    /// Compiled shaders.
    pub fn shaders_dir(&self) -> PathBuf {
        self.root.join("shaders")
    }

    /// Renderer XML schemas.
    pub fn schemas_dir(&self) -> PathBuf {
        self.root.join("schemas")
    }

    /// Renderer settings files.
    pub fn settings_dir(&self) -> PathBuf {
        self.root.join("settings")
    }

    /// Module descriptor read by the host.
    pub fn module_descriptor(&self) -> PathBuf {
        self.root.join(MODULE_DESCRIPTOR_NAME)
    }

    /// Top-level directory named `name` (icons, presets, ...).
    pub fn dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugins_are_grouped_by_host_version() {
        let layout = PackageLayout::new("/out", "2018");
        assert_eq!(layout.plugins_dir(), PathBuf::from("/out/plug-ins/2018"));
        assert_eq!(
            layout.python_extension(),
            PathBuf::from("/out/scripts/appleseed/_appleseedpython.so")
        );
    }
}
