//! Command line interface for the appleseed-maya packager.
//!
//! Loads the settings, prints the configuration summary, runs the
//! [`Bundler`] and reports the outcome.

mod args;
mod output;

pub use args::{Args, DEFAULT_CONFIG_FILE};
pub use output::OutputManager;

use crate::bundler::{Bundler, PackageArtifact, SystemTools, TargetOs, load_settings};
use crate::error::{BundlerError, Result};

/// Main CLI entry point.
///
/// Packaging failures are reported on the console and turned into exit
/// code 1; only console I/O failures are returned as errors.
pub async fn run(args: &Args) -> Result<i32> {
    let output = OutputManager::new(args.verbose, false);
    output.println(&format!(
        "appleseed-maya.package version {}",
        env!("CARGO_PKG_VERSION")
    ))?;
    output.println("")?;

    match execute(args, &output).await {
        Ok(artifact) => {
            output.println("")?;
            output.success("The package was successfully built.")?;
            output.indent(&format!(
                "{} ({} bytes)",
                artifact.path.display(),
                artifact.size
            ))?;
            output.indent(&format!("SHA256: {}", artifact.checksum))?;
            Ok(0)
        }
        Err(BundlerError::Io(e)) => Err(BundlerError::Io(e)),
        Err(e) => {
            output.fatal(&e.to_string())?;
            Ok(1)
        }
    }
}

async fn execute(args: &Args, output: &OutputManager) -> Result<PackageArtifact> {
    args.validate()?;

    let target = args.target();
    if target != TargetOs::detect() {
        output.warn(&format!(
            "packaging for {} on a {} host",
            target,
            TargetOs::detect()
        ))?;
    }

    let settings = load_settings(&args.load_options())?;
    output.table(&settings.summary())?;

    output.println("Building package:")?;
    output.println("")?;
    let artifact = Bundler::new(&settings, target, &SystemTools).bundle().await?;

    output.verbose(&format!("Bundled {} libraries:", artifact.dependencies.len()))?;
    for library in &artifact.dependencies {
        output.verbose(&format!("  {}", library.display()))?;
    }
    Ok(artifact)
}
