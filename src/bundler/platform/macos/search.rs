//! Library search paths and `@rpath`/`@loader_path` resolution.

use super::{OTOOL, is_ignored_reference};
use super::otool::{parse_otool_libraries, parse_otool_rpaths};
use crate::bundler::{
    error::{Error, Result},
    resolver::DependencyProbe,
    tools::{ToolRunner, run_checked},
};
use path_absolutize::Absolutize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

const LOADER_PATH: &str = "@loader_path";
const EXECUTABLE_PATH: &str = "@executable_path";
const RPATH: &str = "@rpath";

/// Dynamic loader search directories taken from the environment.
#[derive(Debug, Clone, Default)]
pub struct SearchEnvironment {
    /// Entries of `DYLD_LIBRARY_PATH`, searched before a binary's rpaths
    pub library_path: Vec<PathBuf>,
    /// Entries of `DYLD_FALLBACK_LIBRARY_PATH`, searched last
    pub fallback_library_path: Vec<PathBuf>,
}

impl SearchEnvironment {
    /// Reads the search directories of the current process.
    pub fn from_env() -> Self {
        Self {
            library_path: split_path_var("DYLD_LIBRARY_PATH"),
            fallback_library_path: split_path_var("DYLD_FALLBACK_LIBRARY_PATH"),
        }
    }

    /// Builds the ordered search list for a binary located in `loader_dir`.
    ///
    /// Only existing directories are kept.
    pub fn search_paths(&self, rpaths: &[String], loader_dir: &Path) -> Vec<PathBuf> {
        let loader = loader_dir.to_string_lossy();
        let rpaths = rpaths.iter().map(|rpath| {
            PathBuf::from(
                rpath
                    .replace(LOADER_PATH, &loader)
                    .replace(EXECUTABLE_PATH, &loader),
            )
        });

        self.library_path
            .iter()
            .cloned()
            .chain(rpaths)
            .chain(self.fallback_library_path.iter().cloned())
            .filter(|path| path.exists())
            .collect()
    }
}

fn split_path_var(name: &str) -> Vec<PathBuf> {
    std::env::var_os(name)
        .map(|value| {
            std::env::split_paths(&value)
                .filter(|path| !path.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Resolves a library reference to an existing file.
///
/// With no search paths, `@loader_path` is replaced by `loader_dir` and a
/// path that still does not exist is tried relative to `loader_dir`.
/// Otherwise each search path is tried in order: `@loader_path` becomes
/// `loader_dir` and `@rpath` becomes the search path; a relative result is
/// tried under `loader_dir`, then under the search path itself. Returns
/// `None` when no candidate exists.
pub fn resolve_reference(
    reference: &str,
    loader_dir: &Path,
    search_paths: &[PathBuf],
) -> Option<PathBuf> {
    let loader = loader_dir.to_string_lossy();
    let with_loader = reference.replace(LOADER_PATH, &loader);

    if search_paths.is_empty() {
        let fixed = PathBuf::from(&with_loader);
        if fixed.exists() {
            return Some(absolute(fixed));
        }
        let candidate = loader_dir.join(&fixed);
        return candidate.exists().then(|| absolute(candidate));
    }

    for search_path in search_paths {
        let fixed = PathBuf::from(with_loader.replace(RPATH, &search_path.to_string_lossy()));
        if fixed.exists() {
            return Some(absolute(fixed));
        }
        if !fixed.is_absolute() {
            let mut candidate = loader_dir.join(&fixed);
            if !candidate.exists() {
                candidate = search_path.join(&fixed);
            }
            if candidate.exists() {
                log::debug!(
                    "Resolved relative dependency {} as {}",
                    fixed.display(),
                    candidate.display()
                );
                return Some(absolute(candidate));
            }
        }
    }
    None
}

fn absolute(path: PathBuf) -> PathBuf {
    match path.absolutize() {
        Ok(abs) => abs.into_owned(),
        Err(_) => path,
    }
}

/// Lists and resolves Mach-O dependencies with `otool`.
pub struct MachOProbe<'a> {
    tools: &'a dyn ToolRunner,
    environment: SearchEnvironment,
}

impl<'a> MachOProbe<'a> {
    /// Creates a probe running `otool` through `tools`.
    pub fn new(tools: &'a dyn ToolRunner, environment: SearchEnvironment) -> Self {
        Self { tools, environment }
    }

    /// Returns the bundling candidates of `binary` exactly as written in its
    /// load commands, without resolving them.
    ///
    /// System libraries, Qt frameworks and self-references are dropped.
    pub fn raw_dependencies(&self, binary: &Path) -> Result<Vec<String>> {
        let output = run_checked(
            self.tools,
            OTOOL,
            &[OsStr::new("-L"), binary.as_os_str()],
            binary,
        )?;
        let own_name = binary.file_name();

        Ok(parse_otool_libraries(&output.stdout)?
            .into_iter()
            .filter(|reference| !is_ignored_reference(reference))
            .filter(|reference| Path::new(reference).file_name() != own_name)
            .collect())
    }

    /// Returns the search paths that apply to `binary`.
    pub fn search_paths(&self, binary: &Path) -> Result<Vec<PathBuf>> {
        let output = run_checked(
            self.tools,
            OTOOL,
            &[OsStr::new("-l"), binary.as_os_str()],
            binary,
        )?;
        let rpaths = parse_otool_rpaths(&output.stdout)?;
        Ok(self
            .environment
            .search_paths(&rpaths, loader_dir(binary)))
    }
}

/// Directory `@loader_path` stands for when loading `binary`.
pub fn loader_dir(binary: &Path) -> &Path {
    binary.parent().unwrap_or_else(|| Path::new("."))
}

impl DependencyProbe for MachOProbe<'_> {
    fn direct_dependencies(&self, binary: &Path) -> Result<Vec<PathBuf>> {
        let search_paths = self.search_paths(binary)?;
        let loader_dir = loader_dir(binary);

        log::debug!(
            "Gathering dependencies of {} with @loader_path {}",
            binary.display(),
            loader_dir.display()
        );
        for path in &search_paths {
            log::debug!("  @rpath candidate {}", path.display());
        }

        self.raw_dependencies(binary)?
            .into_iter()
            .map(|reference| {
                resolve_reference(&reference, loader_dir, &search_paths).ok_or_else(|| {
                    Error::UnresolvedDependency {
                        reference,
                        binary: binary.to_path_buf(),
                    }
                })
            })
            .collect()
    }
}
