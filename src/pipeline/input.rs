//! Input resolution: turn a user-supplied path or URL into a [`RawDocument`].
//!
//! The library itself only needs bytes and a declared MIME type; this module
//! is the ingestion path used by the CLI and by
//! [`crate::orchestrator::run_from_input`]. It does not judge whether the
//! bytes are a valid PDF; that is the extractor's job, so that every
//! unreadable document fails the same way.

use crate::error::PipelineError;
use crate::output::{RawDocument, PDF_MIME};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const OCTET_STREAM: &str = "application/octet-stream";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to document bytes.
///
/// If the input is a URL, download it. If the input is a local file, read it.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<RawDocument, PipelineError> {
    if input.trim().is_empty() {
        return Err(PipelineError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

async fn read_local(path_str: &str) -> Result<RawDocument, PipelineError> {
    let path = PathBuf::from(path_str);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PipelineError::FileNotFound { path: path.clone() },
        _ => PipelineError::InvalidInput {
            input: format!("{}: {}", path.display(), e),
        },
    })?;

    let mime = mime_for(&path, &bytes, None);
    debug!("Read local document {} ({} bytes, {})", path.display(), bytes.len(), mime);
    Ok(RawDocument::new(bytes, mime).with_name(path.display().to_string()))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<RawDocument, PipelineError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PipelineError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        let reason = if e.is_timeout() {
            format!("timed out after {timeout_secs}s")
        } else {
            e.to_string()
        };
        PipelineError::DownloadFailed {
            url: url.to_string(),
            reason,
        }
    })?;

    if !response.status().is_success() {
        return Err(PipelineError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| PipelineError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let path = url_path(url);
    let mime = mime_for(&path, &bytes, content_type.as_deref());
    info!("Downloaded {} bytes ({})", bytes.len(), mime);

    Ok(RawDocument::new(bytes.to_vec(), mime).with_name(url))
}

/// The path component of a URL, for extension sniffing.
fn url_path(url: &str) -> PathBuf {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(PathBuf::from))
        })
        .unwrap_or_default()
}

/// Declared MIME type: server header first, then extension, then magic bytes.
fn mime_for(path: &Path, bytes: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        let essence = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        if !essence.is_empty() && essence != OCTET_STREAM {
            return essence;
        }
    }
    let is_pdf_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if is_pdf_ext || bytes.starts_with(b"%PDF-") {
        PDF_MIME.to_string()
    } else {
        OCTET_STREAM.to_string()
    }
}
