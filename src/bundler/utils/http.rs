//! HTTP utilities for fetching packaged files.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::path::Path;
use url::Url;

/// Downloads a file from a URL.
///
/// Returns the file contents as a byte vector. Any non-success HTTP status
/// is an error.
pub async fn download(url: &Url) -> Result<Vec<u8>> {
    log::info!("Downloading {}", url);

    let response = reqwest::get(url.clone()).await.map_err(|e| Error::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let response = response.error_for_status().map_err(|e| Error::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let bytes = response.bytes().await.map_err(|e| Error::Download {
        url: url.to_string(),
        reason: format!("failed to read response: {}", e),
    })?;

    Ok(bytes.to_vec())
}

/// Downloads `file_name` relative to `base` and writes it to `dest`.
pub async fn download_to(base: &Url, file_name: &str, dest: &Path) -> Result<()> {
    let url = base.join(file_name).map_err(|e| Error::Download {
        url: format!("{}{}", base, file_name),
        reason: e.to_string(),
    })?;
    let data = download(&url).await?;
    tokio::fs::write(dest, data)
        .await
        .fs_context("failed to write downloaded file", dest)
}
