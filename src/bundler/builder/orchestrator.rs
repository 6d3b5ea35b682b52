//! Main packaging orchestration.
//!
//! This module provides the [`Bundler`] orchestrator that assembles the
//! package tree step by step, delegates dependency bundling and binary
//! patching to the platform packager, and zips the result.

use crate::bail;
use crate::bundler::{
    Result, Settings,
    descriptor::write_module_descriptor,
    error::ErrorExt,
    layout::PackageLayout,
    platform::{
        LinuxPackager, MacOsPackager, PackageContext, PlatformPackager, TargetOs,
        WindowsPackager,
    },
    resolver::DependencyClosure,
    settings::SettingsSource,
    tools::ToolRunner,
    utils::{fs as fs_utils, http},
};
use path_absolutize::Absolutize;
use std::path::PathBuf;

use super::{archive::create_zip, checksum::calculate_sha256};

/// Repository directories every package ships.
const REQUIRED_RESOURCE_DIRS: &[&str] = &["icons", "presets", "scripts"];

/// Repository directories shipped when the checkout has them.
const OPTIONAL_RESOURCE_DIRS: &[&str] = &["renderDesc", "resources"];

/// Renderer settings files placed in `settings/`.
const SETTINGS_FILES: &[&str] = &["appleseed.cli.xml"];

/// Renderer command-line executable, without platform suffix.
const RENDERER_CLI: &str = "appleseed.cli";

/// Base name of the host plugin module.
const PLUGIN_BASE_NAME: &str = "appleseedMaya";

/// Result of a successful packaging run.
#[derive(Debug, Clone)]
pub struct PackageArtifact {
    /// Path of the zip archive
    pub path: PathBuf,
    /// Archive size in bytes
    pub size: u64,
    /// Hex-encoded SHA-256 of the archive
    pub checksum: String,
    /// Shared libraries discovered and bundled
    pub dependencies: Vec<PathBuf>,
}

/// Main packaging orchestrator.
///
/// Runs every step strictly in order; the first failure aborts the run and
/// leaves the output directory as it is. The next run starts by deleting it.
///
/// # Examples
///
/// ```no_run
/// use appleseed_maya_package::bundler::{
///     Bundler, LoadOptions, SystemTools, TargetOs, load_settings,
/// };
///
/// # async fn example() -> appleseed_maya_package::bundler::Result<()> {
/// let settings = load_settings(&LoadOptions {
///     config_path: "appleseed-maya.package.configuration.xml".into(),
///     root_dir: ".".into(),
///     archive_dir: ".".into(),
///     offline: false,
/// })?;
///
/// let artifact = Bundler::new(&settings, TargetOs::detect(), &SystemTools)
///     .bundle()
///     .await?;
/// println!("Created {} ({} bytes)", artifact.path.display(), artifact.size);
/// # Ok(())
/// # }
/// ```
pub struct Bundler<'a> {
    settings: &'a Settings,
    target: TargetOs,
    tools: &'a dyn ToolRunner,
    macos: MacOsPackager,
}

impl std::fmt::Debug for Bundler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundler")
            .field("settings", &self.settings)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl<'a> Bundler<'a> {
    /// Creates a bundler packaging for `target` with external tools from
    /// `tools`.
    pub fn new(settings: &'a Settings, target: TargetOs, tools: &'a dyn ToolRunner) -> Self {
        let macos = match target {
            TargetOs::MacOs => MacOsPackager::new(),
            _ => MacOsPackager::default(),
        };
        Self {
            settings,
            target,
            tools,
            macos,
        }
    }

    /// Replaces the macOS packager, e.g. to pin loader search paths.
    pub fn with_macos_packager(mut self, packager: MacOsPackager) -> Self {
        self.macos = packager;
        self
    }

    /// Returns the run configuration.
    pub fn settings(&self) -> &Settings {
        self.settings
    }

    /// Builds the package and its zip archive.
    pub async fn bundle(&self) -> Result<PackageArtifact> {
        let settings = self.settings;
        let layout = PackageLayout::new(settings.package_output_path(), settings.maya_version());
        let ctx = PackageContext {
            settings,
            layout: &layout,
            tools: self.tools,
            target: self.target,
        };

        self.check_archive_dir()?;

        progress("Checking required tools");
        for tool in self.target.required_tools() {
            self.tools.ensure_available(tool)?;
        }

        progress("Removing leftovers from previous invocations");
        fs_utils::remove_dir_all(layout.root(), settings.removal_policy()).await?;

        progress("Creating deployment directory");
        fs_utils::create_dir_all(layout.root()).await?;

        progress("Copying license");
        fs_utils::copy_file_to_dir(&settings.root_dir().join("LICENSE.txt"), layout.root())
            .await?;

        self.copy_resources(&layout).await?;

        progress("Copying appleseed.python");
        fs_utils::copy_dir(&settings.paths().appleseed_python_path, &layout.scripts_dir())
            .await?;

        progress("Removing pyc files");
        let removed = fs_utils::remove_files_with_extension(&layout.scripts_dir(), "pyc").await?;
        log::debug!("Removed {} pyc files", removed);

        progress("Generating module file");
        write_module_descriptor(
            &layout,
            settings.maya_version(),
            self.target.module_platform_id(),
            settings.plugin_version(),
        )
        .await?;

        self.copy_binaries(&layout).await?;

        progress("Copying schemas");
        fs_utils::copy_dir(&settings.paths().appleseed_schemas_path, &layout.schemas_dir())
            .await?;
        fs_utils::remove_file_if_exists(&layout.schemas_dir().join(".gitignore")).await?;

        self.fetch_settings(&layout).await?;
        self.copy_shaders(&layout).await?;
        self.copy_plugins(&layout).await?;

        let dependencies = match self.target {
            TargetOs::Linux => self.run_platform(&LinuxPackager, &ctx).await?,
            TargetOs::MacOs => self.run_platform(&self.macos, &ctx).await?,
            TargetOs::Windows => self.run_platform(&WindowsPackager, &ctx).await?,
        };

        progress("Building final zip file");
        let archive = settings.archive_dir().join(settings.archive_name());
        create_zip(layout.root(), &archive).await?;

        let size = tokio::fs::metadata(&archive)
            .await
            .fs_context("reading artifact metadata", &archive)?
            .len();
        let checksum = calculate_sha256(&archive).await?;

        Ok(PackageArtifact {
            path: archive,
            size,
            checksum,
            dependencies: dependencies.iter().map(PathBuf::from).collect(),
        })
    }

    /// The archive must not be written into the tree it archives.
    fn check_archive_dir(&self) -> Result<()> {
        let output = self.settings.package_output_path();
        let archive_dir = self.settings.archive_dir();
        let output = output
            .absolutize()
            .fs_context("failed to resolve output directory", output)?;
        let archive_dir = archive_dir
            .absolutize()
            .fs_context("failed to resolve archive directory", archive_dir)?;
        if archive_dir.starts_with(&output) {
            bail!(
                "Archive directory {} lies inside the package output directory {}",
                archive_dir.display(),
                output.display()
            );
        }
        Ok(())
    }

    async fn run_platform<P: PlatformPackager>(
        &self,
        packager: &P,
        ctx: &PackageContext<'_>,
    ) -> Result<DependencyClosure> {
        progress("Copying dependencies");
        let dependencies = packager.copy_dependencies(ctx).await?;

        progress("Post-processing package");
        packager.post_process(ctx).await?;

        Ok(dependencies)
    }

    async fn copy_resources(&self, layout: &PackageLayout) -> Result<()> {
        let root_dir = self.settings.root_dir();

        for name in REQUIRED_RESOURCE_DIRS {
            progress(&format!("Copying {name}"));
            fs_utils::copy_dir(&root_dir.join(name), &layout.dir(name)).await?;
        }

        for name in OPTIONAL_RESOURCE_DIRS {
            let source = root_dir.join(name);
            if source.is_dir() {
                progress(&format!("Copying {name}"));
                fs_utils::copy_dir(&source, &layout.dir(name)).await?;
            } else {
                log::debug!("No {} directory in {}", name, root_dir.display());
            }
        }
        Ok(())
    }

    async fn copy_binaries(&self, layout: &PackageLayout) -> Result<()> {
        progress("Copying binaries");
        let paths = self.settings.paths();
        let bin_dir = layout.bin_dir();
        fs_utils::create_dir_all(&bin_dir).await?;

        let cli = self.target.executable_name(RENDERER_CLI);
        fs_utils::copy_file(&paths.appleseed_bin_path.join(&cli), &bin_dir.join(&cli)).await?;
        fs_utils::copy_file_to_dir(&paths.maketx_path, &bin_dir).await?;
        Ok(())
    }

    async fn fetch_settings(&self, layout: &PackageLayout) -> Result<()> {
        let settings_dir = layout.settings_dir();
        fs_utils::create_dir_all(&settings_dir).await?;

        match self.settings.settings_source() {
            SettingsSource::Download(base) => {
                progress("Downloading settings files");
                for file in SETTINGS_FILES {
                    http::download_to(base, file, &settings_dir.join(file)).await?;
                }
            }
            SettingsSource::Directory(dir) => {
                progress("Copying settings files");
                fs_utils::copy_dir(dir, &settings_dir).await?;
            }
        }
        Ok(())
    }

    async fn copy_shaders(&self, layout: &PackageLayout) -> Result<()> {
        progress("Copying shaders");
        let shaders_path = &self.settings.paths().appleseed_shaders_path;
        let shaders_dir = layout.shaders_dir();
        fs_utils::create_dir_all(&shaders_dir).await?;

        let mut shaders = fs_utils::glob_files(&shaders_path.join("maya").join("*.oso"))?;
        shaders.extend(fs_utils::files_with_extensions(
            &shaders_path.join("appleseed"),
            &["oso"],
        )?);

        for shader in &shaders {
            fs_utils::copy_file_to_dir(shader, &shaders_dir).await?;
        }
        log::debug!("Copied {} shaders", shaders.len());
        Ok(())
    }

    async fn copy_plugins(&self, layout: &PackageLayout) -> Result<()> {
        progress("Copying plugins");
        let plugins_dir = layout.plugins_dir();
        fs_utils::create_dir_all(&plugins_dir).await?;

        let plugin = format!("{}{}", PLUGIN_BASE_NAME, self.target.plugin_extension());
        fs_utils::copy_file(
            &self.settings.paths().bin_path.join(&plugin),
            &plugins_dir.join(&plugin),
        )
        .await
    }
}

fn progress(message: &str) {
    log::info!("{}...", message);
}
