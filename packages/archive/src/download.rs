//! Streaming archive download.
//!
//! Fetches the zipped geodatabase with a single GET and writes the body to
//! disk chunk by chunk. No retry: a failed download aborts the run.

use std::path::Path;

use futures::StreamExt as _;
use tokio::io::AsyncWriteExt as _;

/// User agent sent with every download request.
pub const USER_AGENT: &str = concat!("gdb-coverage/", env!("CARGO_PKG_VERSION"));

/// Bytes between two progress log lines.
const LOG_EVERY_BYTES: u64 = 10 * 1_048_576;

/// Builds the HTTP client used for archive downloads.
///
/// # Errors
///
/// Returns [`DownloadError::Http`] if the client cannot be built.
pub fn build_client() -> Result<reqwest::Client, DownloadError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(DownloadError::Http)
}

/// Downloads `url` to `dest`, byte for byte.
///
/// The parent directory of `dest` is created if needed and an existing
/// file is overwritten. Returns the number of bytes written.
///
/// # Errors
///
/// Returns an error if the request fails, the server answers with a
/// non-success status, or the file cannot be written.
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<u64, DownloadError> {
    log::info!("Downloading {url}");
    log::info!("  -> {}", dest.display());

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::Io {
                path: parent.display().to_string(),
                source: e,
            })?;
    }

    let response = client.get(url).send().await.map_err(DownloadError::Http)?;

    if !response.status().is_success() {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let total_size = response.content_length();
    if let Some(size) = total_size {
        #[allow(clippy::cast_precision_loss)]
        let mb = size as f64 / 1_048_576.0;
        log::info!("  archive size: {mb:.1} MB");
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| DownloadError::Io {
            path: dest.display().to_string(),
            source: e,
        })?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let mut last_logged: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(DownloadError::Http)?;
        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::Io {
                path: dest.display().to_string(),
                source: e,
            })?;
        downloaded += chunk.len() as u64;

        if downloaded / LOG_EVERY_BYTES > last_logged {
            last_logged = downloaded / LOG_EVERY_BYTES;
            #[allow(clippy::cast_precision_loss)]
            let mb = downloaded as f64 / 1_048_576.0;
            match total_size {
                Some(total) if total > 0 => {
                    #[allow(clippy::cast_precision_loss)]
                    let pct = (downloaded as f64 / total as f64) * 100.0;
                    log::info!("  downloaded {mb:.0} MB ({pct:.0}%)");
                }
                _ => log::info!("  downloaded {mb:.0} MB"),
            }
        }
    }

    file.flush().await.map_err(|e| DownloadError::Io {
        path: dest.display().to_string(),
        source: e,
    })?;

    log::info!("zip file downloaded to: {} ({downloaded} bytes)", dest.display());

    Ok(downloaded)
}

/// Errors from download operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// I/O error writing to disk.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
