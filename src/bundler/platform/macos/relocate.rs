//! Install name and load command rewriting with `install_name_tool`.

use super::INSTALL_NAME_TOOL;
use super::search::MachOProbe;
use crate::bundler::{
    error::{Error, Result},
    tools::{ToolRunner, run_checked},
    utils::fs as fs_utils,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// File name of the interpreter library, relinked to the host's own copy.
pub const PYTHON_LIBRARY: &str = "Python";

/// Computes the new load path for `reference` in a binary living in
/// `binary_dir`, once every bundled library sits in `lib_dir`.
pub fn relocation_target(
    reference: &str,
    binary_dir: &Path,
    lib_dir: &Path,
    host_python: &str,
) -> Result<String> {
    let name = Path::new(reference)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::GenericError(format!("Invalid library reference: {reference}")))?;

    if name == PYTHON_LIBRARY {
        return Ok(host_python.to_string());
    }

    let rel = fs_utils::to_slash(&fs_utils::relative_path(binary_dir, lib_dir)?);
    Ok(if rel == "." {
        format!("@loader_path/{name}")
    } else {
        format!("@loader_path/{rel}/{name}")
    })
}

/// Rewrites bundled binaries so they load their dependencies from the
/// package library directory.
pub struct Relocator<'a> {
    tools: &'a dyn ToolRunner,
    probe: &'a MachOProbe<'a>,
    lib_dir: PathBuf,
    host_python: &'a str,
}

impl<'a> Relocator<'a> {
    /// Creates a relocator targeting `lib_dir`.
    pub fn new(
        tools: &'a dyn ToolRunner,
        probe: &'a MachOProbe<'a>,
        lib_dir: impl Into<PathBuf>,
        host_python: &'a str,
    ) -> Self {
        Self {
            tools,
            probe,
            lib_dir: lib_dir.into(),
            host_python,
        }
    }

    /// Sets the install name of `binary` to its bare file name.
    pub fn set_id(&self, binary: &Path) -> Result<()> {
        let Some(name) = binary.file_name() else {
            return Ok(());
        };
        log::debug!("Setting id of {} to {}", binary.display(), name.to_string_lossy());
        run_checked(
            self.tools,
            INSTALL_NAME_TOOL,
            &[OsStr::new("-id"), name, binary.as_os_str()],
            binary,
        )?;
        Ok(())
    }

    /// Rewrites every bundled dependency of `binary`.
    ///
    /// References already pointing at their target are left alone. Returns
    /// the number of rewritten references.
    pub fn relink(&self, binary: &Path) -> Result<usize> {
        log::info!("Patching {}", binary.display());
        let binary_dir = super::search::loader_dir(binary);

        let mut changed = 0;
        for reference in self.probe.raw_dependencies(binary)? {
            let target =
                relocation_target(&reference, binary_dir, &self.lib_dir, self.host_python)?;
            if target == reference {
                continue;
            }
            log::debug!("  {} -> {}", reference, target);
            run_checked(
                self.tools,
                INSTALL_NAME_TOOL,
                &[
                    OsStr::new("-change"),
                    OsStr::new(&reference),
                    OsStr::new(&target),
                    binary.as_os_str(),
                ],
                binary,
            )?;
            changed += 1;
        }
        Ok(changed)
    }
}
