//! Stream URL resolution
//!
//! Tracks carry a URL. `http(s)` URLs are downloaded, `file://` URLs and
//! bare paths are read from disk.

use crate::error::{AudioError, Result};
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Where a stream's bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamLocation {
    /// Downloaded over HTTP(S)
    Remote(Url),
    /// Read from the local filesystem
    Local(PathBuf),
}

impl StreamLocation {
    /// Classify a track's stream URL
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AudioError::Unreachable("Empty stream URL".into()));
        }

        match Url::parse(raw) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Self::Remote(url)),
                "file" => url
                    .to_file_path()
                    .map(Self::Local)
                    .map_err(|()| AudioError::Unreachable(format!("Invalid file URL: {}", raw))),
                // Windows drive letter, e.g. `C:\Music\a.flac`
                scheme if scheme.len() == 1 => Ok(Self::Local(PathBuf::from(raw))),
                scheme => Err(AudioError::UnsupportedFormat(format!(
                    "Unsupported URL scheme: {}",
                    scheme
                ))),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Self::Local(PathBuf::from(raw))),
            Err(e) => Err(AudioError::Unreachable(format!("Invalid stream URL {}: {}", raw, e))),
        }
    }

    /// File extension used as a container hint for the prober
    pub fn extension(&self) -> Option<String> {
        match self {
            Self::Remote(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .and_then(|name| name.rsplit_once('.'))
                .map(|(_, ext)| ext.to_ascii_lowercase())
                .filter(|ext| !ext.is_empty()),
            Self::Local(path) => path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_ascii_lowercase()),
        }
    }

    /// Read the whole stream into memory (blocking)
    pub fn fetch(&self) -> Result<Vec<u8>> {
        match self {
            Self::Local(path) => std::fs::read(path).map_err(|e| {
                AudioError::Unreachable(format!("Failed to open {}: {}", path.display(), e))
            }),
            Self::Remote(url) => fetch_remote(url),
        }
    }
}

impl fmt::Display for StreamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{}", url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

fn fetch_remote(url: &Url) -> Result<Vec<u8>> {
    // Runtime lives for this one fetch
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AudioError::ThreadError(format!("Failed to create runtime: {}", e)))?;

    runtime.block_on(async {
        let response = reqwest::Client::new()
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AudioError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AudioError::Unreachable(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AudioError::Unreachable(e.to_string()))?;
        Ok(body.to_vec())
    })
}
