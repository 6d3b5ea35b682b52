//! Transitive shared-library dependency resolution.
//!
//! A [`DependencyProbe`] answers "which non-system libraries does this binary
//! load directly?" for one platform. [`resolve_closure`] expands a set of seed
//! binaries into the full set of libraries they need with a worklist over a
//! visited set, so the result does not depend on the order seeds or
//! references are visited in.

use crate::bundler::{
    error::{Error, Result},
    utils::fs as fs_utils,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Platform-specific dependency introspection.
pub trait DependencyProbe {
    /// Returns the resolved direct dependencies of `binary`.
    ///
    /// Implementations drop system libraries, the renderer core and
    /// self-references before returning.
    fn direct_dependencies(&self, binary: &Path) -> Result<Vec<PathBuf>>;
}

/// Transitive set of libraries required by a group of binaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyClosure {
    libraries: BTreeSet<PathBuf>,
}

impl DependencyClosure {
    /// Returns true when no library is required.
    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Number of libraries in the closure.
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    /// Returns true when `library` is part of the closure.
    pub fn contains(&self, library: &Path) -> bool {
        self.libraries.contains(library)
    }

    /// Iterates over the libraries.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.libraries.iter().map(PathBuf::as_path)
    }

    /// Copies every library into `dest_dir`, each at most once.
    ///
    /// Libraries rejected by `include` are skipped, as are libraries whose
    /// file name already exists in `dest_dir` (the same library reached
    /// through two different directories). Returns the copied destinations.
    pub async fn copy_into(
        &self,
        dest_dir: &Path,
        include: impl Fn(&Path) -> bool,
    ) -> Result<Vec<PathBuf>> {
        let mut copied = Vec::new();
        for library in self.iter() {
            if !include(library) {
                log::debug!("Not copying {}", library.display());
                continue;
            }
            let Some(name) = library.file_name() else {
                continue;
            };
            let dest = dest_dir.join(name);
            if dest.exists() {
                log::debug!(
                    "{} already present in {}",
                    name.to_string_lossy(),
                    dest_dir.display()
                );
                continue;
            }
            log::info!("Copying {} to {}...", library.display(), dest_dir.display());
            fs_utils::copy_file(library, &dest).await?;
            copied.push(dest);
        }
        Ok(copied)
    }
}

impl<'a> IntoIterator for &'a DependencyClosure {
    type Item = &'a PathBuf;
    type IntoIter = std::collections::btree_set::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.libraries.iter()
    }
}

/// Computes the transitive closure of the dependencies of `seeds`.
///
/// Seeds themselves are only part of the result when another binary
/// depends on them. Every member is verified to be an existing regular file;
/// the first reference that is not fails the whole resolution.
pub fn resolve_closure<P>(probe: &P, seeds: &[PathBuf]) -> Result<DependencyClosure>
where
    P: DependencyProbe + ?Sized,
{
    let mut closure = DependencyClosure::default();
    let mut worklist: Vec<PathBuf> = Vec::new();

    for seed in seeds {
        expand(probe, seed, &mut closure, &mut worklist)?;
    }

    while let Some(library) = worklist.pop() {
        expand(probe, &library, &mut closure, &mut worklist)?;
    }

    log::debug!("Resolved {} dependencies", closure.len());
    Ok(closure)
}

fn expand<P>(
    probe: &P,
    binary: &Path,
    closure: &mut DependencyClosure,
    worklist: &mut Vec<PathBuf>,
) -> Result<()>
where
    P: DependencyProbe + ?Sized,
{
    for library in probe.direct_dependencies(binary)? {
        if !library.is_file() {
            return Err(Error::UnresolvedDependency {
                reference: library.display().to_string(),
                binary: binary.to_path_buf(),
            });
        }
        if closure.libraries.insert(library.clone()) {
            worklist.push(library);
        }
    }
    Ok(())
}
