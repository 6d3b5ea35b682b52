//! Windows packaging.
//!
//! DLLs are found through `PATH`, so the renderer core libraries are copied
//! next to the executables and nothing is patched.

use super::{PackageContext, PlatformPackager};
use crate::bundler::{error::Result, resolver::DependencyClosure};

/// Copies the renderer DLLs into `bin/`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsPackager;

impl PlatformPackager for WindowsPackager {
    async fn copy_dependencies(&self, ctx: &PackageContext<'_>) -> Result<DependencyClosure> {
        ctx.copy_core_libraries(&ctx.settings.paths().appleseed_bin_path, &ctx.layout.bin_dir())
            .await?;
        Ok(DependencyClosure::default())
    }

    async fn post_process(&self, _ctx: &PackageContext<'_>) -> Result<()> {
        Ok(())
    }
}
