//! File system utilities for packaging.
//!
//! Provides copy helpers with automatic directory creation, symlink
//! preservation, retried directory removal and small path helpers shared by
//! the platform packagers.

use crate::{
    bail,
    bundler::{
        error::{Error, ErrorExt, Result},
        settings::RemovalPolicy,
    },
};
use path_absolutize::Absolutize;
use std::{
    future::Future,
    io::{self, Read},
    path::{Component, Path, PathBuf},
};
use tokio::fs;

/// Creates all of the directories of the specified path.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .fs_context("failed to create directory", path)
}

/// Removes the directory and its contents, retrying on failure.
///
/// Read-only entries are made writable between attempts. A missing
/// directory is not an error.
pub async fn remove_dir_all(path: &Path, policy: &RemovalPolicy) -> Result<()> {
    remove_with_retries(path, policy, || fs::remove_dir_all(path)).await
}

async fn remove_with_retries<F, Fut>(
    path: &Path,
    policy: &RemovalPolicy,
    mut remove: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    let attempts = policy.attempts.max(1);
    for attempt in 1..=attempts {
        match remove().await {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) if attempt < attempts => {
                log::debug!(
                    "Failed to delete {} (attempt {}/{}): {}",
                    path.display(),
                    attempt,
                    attempts,
                    e
                );
                clear_readonly(path);
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => {
                return Err(Error::Fs {
                    context: "Failed to delete directory".into(),
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        }
    }
    Ok(())
}

fn clear_readonly(root: &Path) {
    for entry in walkdir::WalkDir::new(root).into_iter().flatten() {
        if let Ok(metadata) = entry.metadata() {
            let mut permissions = metadata.permissions();
            if permissions.readonly() {
                #[allow(clippy::permissions_set_readonly_false)]
                permissions.set_readonly(false);
                let _ = std::fs::set_permissions(entry.path(), permissions);
            }
        }
    }
}

/// Deletes a file if it exists.
pub async fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Fs {
            context: "Failed to delete file".into(),
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Deletes every file under `root` whose extension is `extension`.
///
/// Returns the number of deleted files.
pub async fn remove_files_with_extension(root: &Path, extension: &str) -> Result<usize> {
    let mut removed = 0;
    for entry in walkdir::WalkDir::new(root) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(extension)
        {
            remove_file_if_exists(entry.path()).await?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Makes a symbolic link to a directory.
#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a directory.
#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        bail!("{from:?} does not exist");
    }
    if !from.is_file() {
        bail!("{from:?} is not a file");
    }
    if let Some(dest_dir) = to.parent() {
        create_dir_all(dest_dir).await?;
    }
    fs::copy(from, to)
        .await
        .fs_context("failed to copy file", from)?;
    Ok(())
}

/// Copies a file into `dir`, keeping its file name. Returns the destination.
pub async fn copy_file_to_dir(from: &Path, dir: &Path) -> Result<PathBuf> {
    let name = from
        .file_name()
        .ok_or_else(|| Error::GenericError(format!("{from:?} has no file name")))?;
    let dest = dir.join(name);
    copy_file(from, &dest).await?;
    Ok(dest)
}

/// Recursively copies a directory into another, merging with whatever the
/// destination already contains.
///
/// Preserves symlinks on platforms that support them. Fails if the source
/// path is not a directory or doesn't exist.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        bail!("{from:?} does not exist");
    }
    if !from.is_dir() {
        bail!("{from:?} is not a directory");
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        std::fs::create_dir_all(&to).fs_context("failed to create directory", &to)?;

        for entry in walkdir::WalkDir::new(&from) {
            let entry = entry?;
            let rel_path = entry.path().strip_prefix(&from)?;
            let dest_path = to.join(rel_path);

            if entry.file_type().is_symlink() {
                let target = std::fs::read_link(entry.path())
                    .fs_context("failed to read symlink", entry.path())?;
                if dest_path.symlink_metadata().is_ok() {
                    std::fs::remove_file(&dest_path)
                        .fs_context("failed to replace symlink", &dest_path)?;
                }
                if entry.path().is_dir() {
                    symlink_dir(&target, &dest_path)
                } else {
                    symlink_file(&target, &dest_path)
                }
                .fs_context("failed to create symlink", &dest_path)?;
            } else if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest_path)
                    .fs_context("failed to create directory", &dest_path)?;
            } else {
                std::fs::copy(entry.path(), &dest_path)
                    .fs_context("failed to copy file", entry.path())?;
            }
        }

        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("Directory copy task panicked: {}", e)))?
}

/// Returns the regular files matching a glob pattern, sorted.
pub fn glob_files(pattern: &Path) -> Result<Vec<PathBuf>> {
    let pattern = pattern.to_string_lossy();
    let mut files: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Skipping unreadable glob match: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Returns the regular files under `root` with one of `extensions`, sorted.
pub fn files_with_extensions(root: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in walkdir::WalkDir::new(root) {
        let entry = entry?;
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.contains(&e));
        if entry.file_type().is_file() && matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Sets `rwxr-xr-x` so binaries can be patched and executed.
#[cfg(unix)]
pub async fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .fs_context("failed to set permissions on", path)
}

/// Permissions are left alone on platforms without mode bits.
#[cfg(not(unix))]
pub async fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Returns true when the file starts with an ELF, Mach-O or PE header.
///
/// Scripts and configuration files that sit next to executables are not
/// object files and are never inspected or patched.
pub fn is_object_file(path: &Path) -> bool {
    let mut header = [0u8; 16];
    let read = std::fs::File::open(path).and_then(|mut f| f.read_exact(&mut header));
    if read.is_err() {
        return false;
    }
    matches!(
        goblin::peek_bytes(&header),
        Ok(goblin::Hint::Elf(_))
            | Ok(goblin::Hint::Mach(_))
            | Ok(goblin::Hint::MachFat(_))
            | Ok(goblin::Hint::PE)
    )
}

/// Computes the path of `to` relative to `from`, both taken as directories.
///
/// Returns `.` when both name the same directory.
pub fn relative_path(from: &Path, to: &Path) -> Result<PathBuf> {
    let from = from.absolutize().fs_context("failed to absolutize", from)?;
    let to = to.absolutize().fs_context("failed to absolutize", to)?;

    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &to[common..] {
        relative.push(component.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    Ok(relative)
}

/// Renders a relative path with forward slashes, as loaders expect.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(attempts: u32) -> RemovalPolicy {
        RemovalPolicy {
            attempts,
            delay: std::time::Duration::ZERO,
        }
    }

    fn locked() -> io::Error {
        io::Error::from(io::ErrorKind::PermissionDenied)
    }

    #[tokio::test]
    async fn removal_retries_until_it_succeeds() {
        let mut calls = 0;
        let result = remove_with_retries(Path::new("/pkg"), &policy(5), || {
            calls += 1;
            let call = calls;
            async move { if call < 3 { Err(locked()) } else { Ok(()) } }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn removal_gives_up_after_last_attempt() {
        let mut calls = 0;
        let err = remove_with_retries(Path::new("/pkg/out"), &policy(3), || {
            calls += 1;
            async { Err(locked()) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls, 3);
        match err {
            Error::Fs { context, path, .. } => {
                assert_eq!(context, "Failed to delete directory");
                assert_eq!(path, Path::new("/pkg/out"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let mut calls = 0;
        let result = remove_with_retries(Path::new("/pkg"), &policy(0), || {
            calls += 1;
            async { Err(locked()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn missing_directory_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        remove_dir_all(&dir.path().join("absent"), &policy(1)).await.unwrap();
    }

    #[test]
    fn readonly_entries_become_writable() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("locked").join("lib.so");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, b"").unwrap();
        let mut permissions = std::fs::metadata(&file).unwrap().permissions();
        permissions.set_readonly(true);
        std::fs::set_permissions(&file, permissions).unwrap();

        clear_readonly(dir.path());

        assert!(!std::fs::metadata(&file).unwrap().permissions().readonly());
    }

    #[test]
    fn relative_path_between_siblings() {
        let rel = relative_path(Path::new("/pkg/bin"), Path::new("/pkg/lib")).unwrap();
        assert_eq!(to_slash(&rel), "../lib");
    }

    #[test]
    fn relative_path_from_nested_plugin_dir() {
        let rel = relative_path(Path::new("/pkg/plug-ins/2018"), Path::new("/pkg/lib")).unwrap();
        assert_eq!(to_slash(&rel), "../../lib");
    }

    #[test]
    fn relative_path_to_self_is_dot() {
        let rel = relative_path(Path::new("/pkg/lib"), Path::new("/pkg/lib/")).unwrap();
        assert_eq!(to_slash(&rel), ".");
    }

    #[test]
    fn object_file_detection_reads_magic() {
        let dir = tempfile::tempdir().unwrap();

        let elf = dir.path().join("app");
        let mut header = vec![0x7f, b'E', b'L', b'F', 2, 1, 1];
        header.resize(64, 0);
        std::fs::write(&elf, &header).unwrap();

        let script = dir.path().join("run.py");
        std::fs::write(&script, "#!/usr/bin/env python\nprint('hello world')\n").unwrap();

        let tiny = dir.path().join("tiny");
        std::fs::write(&tiny, b"\x7fELF").unwrap();

        assert!(is_object_file(&elf));
        assert!(!is_object_file(&script));
        assert!(!is_object_file(&tiny));
    }
}
