//! Command line argument parsing.

use crate::bundler::{LoadOptions, TargetOs};
use crate::error::CliError;
use clap::Parser;
use std::path::PathBuf;

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "appleseed-maya.package.configuration.xml";

/// appleseed-maya plugin packager
#[derive(Parser, Debug)]
#[command(
    name = "appleseed-maya-package",
    version,
    about = "Builds a relocatable appleseed-maya package",
    long_about = "Assembles the appleseed-maya plugin, the appleseed renderer and every non-system \
shared library they load into one directory, patches the binaries so the package can be moved \
anywhere, and zips it.

Usage:
  appleseed-maya-package
  appleseed-maya-package --config linux.xml --offline
  appleseed-maya-package --root ~/dev/appleseed-maya --archive-dir /tmp/packages

Exit code 0 = archive written to the archive directory."
)]
pub struct Args {
    /// Configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Root of the appleseed-maya repository
    #[arg(short, long, value_name = "DIR", default_value = "..")]
    pub root: PathBuf,

    /// Directory the final zip file is written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub archive_dir: PathBuf,

    /// Copy renderer settings from appleseed_settings_path instead of downloading them
    #[arg(long)]
    pub offline: bool,

    /// Package for this OS instead of the running one: linux, macos, windows
    #[arg(short, long, value_name = "OS", env = "APPLESEED_MAYA_PACKAGE_TARGET")]
    pub target_os: Option<TargetOs>,

    /// Log every command line and dependency
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Checks the paths given on the command line.
    pub fn validate(&self) -> Result<(), CliError> {
        if !self.root.is_dir() {
            return Err(CliError::InvalidArguments {
                reason: format!("repository root {} is not a directory", self.root.display()),
            });
        }
        if self.archive_dir.exists() && !self.archive_dir.is_dir() {
            return Err(CliError::InvalidArguments {
                reason: format!(
                    "archive directory {} is not a directory",
                    self.archive_dir.display()
                ),
            });
        }
        Ok(())
    }

    /// OS the package is built for.
    pub fn target(&self) -> TargetOs {
        self.target_os.unwrap_or_else(TargetOs::detect)
    }

    /// Settings loader inputs.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            root_dir: self.root.clone(),
            archive_dir: self.archive_dir.clone(),
            offline: self.offline,
        }
    }
}
