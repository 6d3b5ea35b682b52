//! Linux packaging: `ldd` dependency discovery and `chrpath` relocation.

use super::{PackageContext, PlatformPackager};
use crate::bundler::{
    error::{Error, Result},
    resolver::{DependencyClosure, DependencyProbe, resolve_closure},
    tools::{ToolRunner, run_checked},
    utils::fs as fs_utils,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Dependency listing tool.
pub const LDD: &str = "ldd";
/// Runtime search path editor.
pub const CHRPATH: &str = "chrpath";

/// Libraries provided by every Linux host, matched against the start of each
/// trimmed `ldd` line.
pub const SYSTEM_LIBRARY_PREFIXES: &[&str] = &[
    "linux",
    "librt",
    "libpthread",
    "libGL",
    "libX",
    "libselinux",
    "libICE",
    "libSM",
    "libdl",
    "libm.so",
    "libgcc",
    "libc.so",
    "/lib64/ld-linux-",
    "libstdc++",
    "libxcb",
    "libdrm",
    "libnsl",
    "libuuid",
    "libgthread",
    "libglib",
    "libgobject",
    "libglapi",
    "libffi",
    "libfontconfig",
    "libutil",
    "libpython",
    "libxshmfence.so",
];

/// Renderer core libraries are bundled explicitly, never through `ldd`.
const CORE_LIBRARY_MARKER: &str = "libappleseed";

/// One library reference reported by `ldd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LddReference {
    /// Soname as requested by the binary
    pub name: String,
    /// Resolved location, `None` when the loader could not find it
    pub path: Option<PathBuf>,
}

/// Returns true when an `ldd` line names a library every host provides.
pub fn is_system_library(line: &str) -> bool {
    SYSTEM_LIBRARY_PREFIXES
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

/// Parses `ldd` output into the references worth bundling.
///
/// System libraries and renderer core libraries are dropped. Lines without a
/// `=>` mapping (the vDSO, the dynamic loader) carry nothing to bundle and
/// are skipped.
pub fn parse_ldd_output(output: &str) -> Vec<LddReference> {
    let mut references = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || is_system_library(line) || line.contains(CORE_LIBRARY_MARKER) {
            continue;
        }

        let Some((name, target)) = line.split_once("=>") else {
            continue;
        };
        let name = name.trim().to_string();
        let target = target.trim();

        let path = if target.starts_with("not found") {
            None
        } else {
            match target.split_whitespace().next() {
                Some(path) if !path.starts_with('(') => Some(PathBuf::from(path)),
                _ => continue,
            }
        };
        references.push(LddReference { name, path });
    }

    references
}

/// Lists direct dependencies by running `ldd`.
pub struct LddProbe<'a> {
    tools: &'a dyn ToolRunner,
}

impl<'a> LddProbe<'a> {
    /// Creates a probe running `ldd` through `tools`.
    pub fn new(tools: &'a dyn ToolRunner) -> Self {
        Self { tools }
    }
}

impl DependencyProbe for LddProbe<'_> {
    fn direct_dependencies(&self, binary: &Path) -> Result<Vec<PathBuf>> {
        let output = run_checked(self.tools, LDD, &[binary.as_os_str()], binary)?;

        let mut libraries = Vec::new();
        for reference in parse_ldd_output(&output.stdout) {
            match reference.path {
                Some(path) => libraries.push(path),
                None => {
                    return Err(Error::UnresolvedDependency {
                        reference: reference.name,
                        binary: binary.to_path_buf(),
                    });
                }
            }
        }
        Ok(libraries)
    }
}

/// Bundles dependencies next to the package and points every binary at them
/// through an `$ORIGIN`-relative runtime path.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxPackager;

impl LinuxPackager {
    async fn set_runtime_path(
        &self,
        ctx: &PackageContext<'_>,
        binaries: &[PathBuf],
        lib_dir: &Path,
    ) -> Result<()> {
        for binary in binaries {
            let Some(binary_dir) = binary.parent() else {
                continue;
            };
            let rel = fs_utils::relative_path(binary_dir, lib_dir)?;
            let rpath = origin_relative(&rel);

            log::info!("Setting runtime path of {} to {}", binary.display(), rpath);
            let args = [OsStr::new("-r"), OsStr::new(&rpath), binary.as_os_str()];
            run_checked(ctx.tools, CHRPATH, &args, binary)?;
        }
        Ok(())
    }
}

/// Builds the `$ORIGIN`-relative search path for a library directory
/// located at `rel` from the binary.
fn origin_relative(rel: &Path) -> String {
    let rel = fs_utils::to_slash(rel);
    if rel == "." {
        "$ORIGIN".to_string()
    } else {
        format!("$ORIGIN/{rel}")
    }
}

impl PlatformPackager for LinuxPackager {
    async fn copy_dependencies(&self, ctx: &PackageContext<'_>) -> Result<DependencyClosure> {
        let lib_dir = ctx.layout.lib_dir();
        fs_utils::create_dir_all(&lib_dir).await?;

        ctx.copy_core_libraries(&ctx.settings.paths().appleseed_lib_path, &lib_dir)
            .await?;

        // The core libraries are filtered out of every listing, so their own
        // dependencies are only reached by seeding them directly.
        let mut seeds = ctx.seed_binaries()?;
        seeds.extend(
            ctx.target
                .core_libraries()
                .iter()
                .map(|name| lib_dir.join(name)),
        );

        let closure = resolve_closure(&LddProbe::new(ctx.tools), &seeds)?;
        for library in &closure {
            log::debug!("  {}", library.display());
        }

        let copied = closure.copy_into(&lib_dir, |_| true).await?;
        log::info!("Bundled {} shared libraries", copied.len());
        Ok(closure)
    }

    async fn post_process(&self, ctx: &PackageContext<'_>) -> Result<()> {
        let lib_dir = ctx.layout.lib_dir();

        let executables = ctx.bin_objects()?;
        self.set_runtime_path(ctx, &executables, &lib_dir).await?;

        let plugins = fs_utils::glob_files(
            &ctx.layout
                .plugins_dir()
                .join(format!("*{}", ctx.target.plugin_extension())),
        )?;
        self.set_runtime_path(ctx, &plugins, &lib_dir).await?;

        let python_modules = fs_utils::glob_files(&ctx.layout.python_module_dir().join("*.so"))?;
        self.set_runtime_path(ctx, &python_modules, &lib_dir).await?;

        Ok(())
    }
}
