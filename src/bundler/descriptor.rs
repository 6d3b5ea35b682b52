//! Module descriptor generation.
//!
//! The host reads `appleseed-maya.mod` to find the plugin's binaries,
//! scripts and resource search paths. Its line format is fixed.

use crate::bundler::{
    error::{ErrorExt, Result},
    layout::PackageLayout,
    settings::PluginVersion,
};

/// Renders the module descriptor text.
pub fn render_module_descriptor(
    maya_version: &str,
    platform_id: &str,
    plugin_version: &PluginVersion,
) -> String {
    let mut text = String::new();
    text.push_str(&format!(
        "+ MAYAVERSION:{maya_version} PLATFORM:{platform_id} appleseed-maya {plugin_version} .\n"
    ));
    text.push_str(&format!("plug-ins: plug-ins/{maya_version}\n"));
    text.push_str("PATH +:= bin\n");
    text.push_str("PYTHONPATH +:= scripts\n");
    text.push_str("APPLESEED_SEARCHPATH +:= shaders\n");
    text.push_str("MAYA_PRESET_PATH +:= presets\n");
    text.push_str("MAYA_CUSTOM_TEMPLATE_PATH +:= scripts/appleseedMaya/AETemplates\n");
    text.push_str("MAYA_RENDER_DESC_PATH +:= renderDesc\n");
    text.push_str("XBMLANGPATH +:= icons/%B\n");
    text
}

/// Writes the module descriptor into the package root.
pub async fn write_module_descriptor(
    layout: &PackageLayout,
    maya_version: &str,
    platform_id: &str,
    plugin_version: &PluginVersion,
) -> Result<()> {
    let path = layout.module_descriptor();
    let text = render_module_descriptor(maya_version, platform_id, plugin_version);
    tokio::fs::write(&path, text)
        .await
        .fs_context("failed to write module file", &path)
}
