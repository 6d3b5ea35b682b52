//! macOS packaging: `otool` dependency discovery and `install_name_tool`
//! relocation.
//!
//! Dependencies are discovered by following every non-system load command,
//! resolving `@rpath` and `@loader_path` through the loader search paths.
//! After copying, each bundled Mach-O file gets its bare file name as install
//! name and `@loader_path`-relative references to the package `lib/`.

pub mod otool;
pub mod relocate;
pub mod search;

use super::{PackageContext, PlatformPackager};
use crate::bundler::{
    error::Result,
    resolver::{DependencyClosure, resolve_closure},
    utils::fs as fs_utils,
};
use relocate::{PYTHON_LIBRARY, Relocator};
use search::{MachOProbe, SearchEnvironment};
use std::path::{Path, PathBuf};

pub use relocate::relocation_target;
pub use search::resolve_reference;

/// Load command listing tool.
pub const OTOOL: &str = "otool";
/// Install name editor.
pub const INSTALL_NAME_TOOL: &str = "install_name_tool";

/// Libraries and frameworks every macOS host provides.
pub const SYSTEM_LIBRARY_PREFIXES: &[&str] = &[
    "/System/Library/",
    "/usr/lib/libcurl",
    "/usr/lib/libc++",
    "/usr/lib/libbz2",
    "/usr/lib/libiconv",
    "/usr/lib/libSystem",
    "/usr/lib/libxml",
    "/usr/lib/libexpat",
    "/usr/lib/libz",
    "/usr/lib/libncurses",
    "/usr/lib/libobjc.A.dylib",
];

/// Library extensions identified and relinked in `lib/` and the Python
/// package.
const LIBRARY_EXTENSIONS: &[&str] = &["dylib", "so"];

/// Returns true when `reference` names a library every host provides.
pub fn is_system_library(reference: &str) -> bool {
    SYSTEM_LIBRARY_PREFIXES
        .iter()
        .any(|prefix| reference.starts_with(prefix))
}

/// Returns true for Qt frameworks, which the host application ships.
pub fn is_qt_framework(reference: &str) -> bool {
    reference
        .split('/')
        .any(|component| component.starts_with("Qt") && component.ends_with(".framework"))
}

/// References never bundled nor rewritten.
pub(crate) fn is_ignored_reference(reference: &str) -> bool {
    is_system_library(reference) || is_qt_framework(reference)
}

/// Bundles dylibs into `lib/` and relinks every Mach-O file in the package.
#[derive(Debug, Default, Clone)]
pub struct MacOsPackager {
    environment: SearchEnvironment,
}

impl MacOsPackager {
    /// Creates a packager using the loader search paths of this process.
    pub fn new() -> Self {
        Self::with_environment(SearchEnvironment::from_env())
    }

    /// Creates a packager with explicit loader search paths.
    pub fn with_environment(environment: SearchEnvironment) -> Self {
        Self { environment }
    }

    /// Mach-O files that get their install name reset: bundled libraries,
    /// plugins and Python extension modules.
    fn identified_binaries(&self, ctx: &PackageContext<'_>) -> Result<Vec<PathBuf>> {
        let mut binaries = fs_utils::files_with_extensions(&ctx.layout.lib_dir(), LIBRARY_EXTENSIONS)?;
        binaries.extend(fs_utils::glob_files(
            &ctx.layout
                .plugins_dir()
                .join(format!("*{}", ctx.target.plugin_extension())),
        )?);
        binaries.extend(fs_utils::glob_files(
            &ctx.layout.python_module_dir().join("*.so"),
        )?);
        Ok(binaries)
    }

    async fn fix_permissions(&self, ctx: &PackageContext<'_>) -> Result<()> {
        let libraries = fs_utils::files_with_extensions(&ctx.layout.lib_dir(), LIBRARY_EXTENSIONS)?;
        for path in libraries.iter().chain(ctx.bin_objects()?.iter()) {
            fs_utils::make_executable(path).await?;
        }
        Ok(())
    }
}

fn is_python_library(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == PYTHON_LIBRARY)
}

impl PlatformPackager for MacOsPackager {
    async fn copy_dependencies(&self, ctx: &PackageContext<'_>) -> Result<DependencyClosure> {
        let lib_dir = ctx.layout.lib_dir();
        fs_utils::create_dir_all(&lib_dir).await?;

        ctx.copy_core_libraries(&ctx.settings.paths().appleseed_lib_path, &lib_dir)
            .await?;

        let probe = MachOProbe::new(ctx.tools, self.environment.clone());
        let closure = resolve_closure(&probe, &ctx.seed_binaries()?)?;

        log::info!("Dependencies:");
        for library in &closure {
            log::info!("  {}", library.display());
        }

        // Python is relinked to the host's interpreter instead of bundled.
        let copied = closure
            .copy_into(&lib_dir, |library| !is_python_library(library))
            .await?;
        log::info!("Bundled {} shared libraries", copied.len());
        Ok(closure)
    }

    async fn post_process(&self, ctx: &PackageContext<'_>) -> Result<()> {
        log::info!("Fixing up binaries");
        self.fix_permissions(ctx).await?;

        let probe = MachOProbe::new(ctx.tools, self.environment.clone());
        let relocator = Relocator::new(
            ctx.tools,
            &probe,
            ctx.layout.lib_dir(),
            ctx.settings.host_python_framework(),
        );

        let identified = self.identified_binaries(ctx)?;
        for binary in &identified {
            relocator.set_id(binary)?;
        }

        let mut changed = 0;
        for binary in identified.iter().chain(ctx.bin_objects()?.iter()) {
            changed += relocator.relink(binary)?;
        }
        log::info!("Rewrote {} library references", changed);
        Ok(())
    }
}
