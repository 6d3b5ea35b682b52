//! Zip archive creation.

use crate::bundler::{
    error::{Error, ErrorExt, Result},
    utils::fs as fs_utils,
};
use std::fs::File;
use std::io;
use std::path::Path;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// Zips the contents of `source_dir` into `archive_path`.
///
/// Entry names are relative to `source_dir` and use forward slashes. File
/// modes are preserved on Unix. An existing archive is overwritten.
pub async fn create_zip(source_dir: &Path, archive_path: &Path) -> Result<()> {
    if let Some(parent) = archive_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs_utils::create_dir_all(parent).await?;
        }
    }

    let source_dir = source_dir.to_path_buf();
    let archive_path = archive_path.to_path_buf();

    tokio::task::spawn_blocking(move || write_zip(&source_dir, &archive_path))
        .await
        .map_err(|e| Error::GenericError(format!("Archive task panicked: {}", e)))?
}

fn write_zip(source_dir: &Path, archive_path: &Path) -> Result<()> {
    let file = File::create(archive_path).fs_context("failed to create archive", archive_path)?;
    let mut zip = ZipWriter::new(file);
    let base = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0usize;
    for entry in walkdir::WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry?;
        let rel_path = entry.path().strip_prefix(source_dir)?;
        if rel_path.as_os_str().is_empty() {
            continue;
        }
        let name = fs_utils::to_slash(rel_path);
        let options = base.unix_permissions(unix_mode(entry.path()));

        if entry.file_type().is_symlink() {
            let target = std::fs::read_link(entry.path())
                .fs_context("failed to read symlink", entry.path())?;
            zip.add_symlink(name, fs_utils::to_slash(&target), options)?;
        } else if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            let mut input =
                File::open(entry.path()).fs_context("failed to open file", entry.path())?;
            io::copy(&mut input, &mut zip).fs_context("failed to archive file", entry.path())?;
        }
        entries += 1;
    }

    zip.finish()?;
    log::debug!(
        "Wrote {} entries to {}",
        entries,
        archive_path.display()
    );
    Ok(())
}

#[cfg(unix)]
fn unix_mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::symlink_metadata(path)
        .map(|m| m.permissions().mode() & 0o7777)
        .unwrap_or(0o644)
}

#[cfg(not(unix))]
fn unix_mode(path: &Path) -> u32 {
    if path.is_dir() { 0o755 } else { 0o644 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[tokio::test]
    async fn entries_are_relative_to_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("package");
        std::fs::create_dir_all(source.join("bin")).unwrap();
        std::fs::write(source.join("appleseed-maya.mod"), "+ MAYAVERSION").unwrap();
        std::fs::write(source.join("bin").join("tool"), "binary").unwrap();

        let archive = dir.path().join("out").join("package.zip");
        create_zip(&source, &archive).await.unwrap();

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["appleseed-maya.mod", "bin/", "bin/tool"]);

        let mut contents = String::new();
        zip.by_name("bin/tool")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "binary");
    }
}
