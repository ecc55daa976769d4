//! Destinations for encoded clips: a local directory or an HTTP endpoint.
//!
//! Upload endpoints accept the clip as the raw POST body with its MIME type
//! as `Content-Type` and answer `2xx` with the stored clip's URL as plain
//! text.  Any other status is a failure; nothing is retried.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::config::{Destination, ExportConfig};

use super::{EncodedClip, ExportError};

/// Where a clip ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavedClip {
    Local(PathBuf),
    Uploaded(String),
}

impl std::fmt::Display for SavedClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SavedClip::Local(path) => write!(f, "saved to {}", path.display()),
            SavedClip::Uploaded(url) => write!(f, "uploaded to {url}"),
        }
    }
}

/// Async destination for an encoded clip.
#[async_trait]
pub trait ClipSink: Send + Sync {
    async fn save(&self, clip: &EncodedClip) -> Result<SavedClip, ExportError>;
}

/// Build the sink selected by `config.destination`.
pub fn sink_for(config: &ExportConfig) -> Result<Box<dyn ClipSink>, ExportError> {
    match config.destination {
        Destination::Download => Ok(Box::new(LocalDirSink::new(config.resolved_output_dir()))),
        Destination::Upload => Ok(Box::new(HttpSink::from_config(config)?)),
    }
}

/// File extension for a MIME type: the subtype before any parameters.
///
/// ```
/// use auo::export::extension_for;
///
/// assert_eq!(extension_for("audio/wav; codecs=3"), "wav");
/// assert_eq!(extension_for("audio/webm;codecs=opus"), "webm");
/// assert_eq!(extension_for("garbage"), "bin");
/// ```
pub fn extension_for(mime: &str) -> &str {
    mime.split(';')
        .next()
        .and_then(|t| t.split_once('/'))
        .map(|(_, sub)| sub.trim())
        .filter(|sub| !sub.is_empty())
        .unwrap_or("bin")
}

// ---------------------------------------------------------------------------
// LocalDirSink
// ---------------------------------------------------------------------------

/// Writes `clip-<unix-seconds>.<ext>` into a directory.
pub struct LocalDirSink {
    dir: PathBuf,
}

impl LocalDirSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// First free `clip-<stamp>[-n].<ext>` path in the directory.
    fn target(&self, stamp: u64, ext: &str) -> PathBuf {
        let first = self.dir.join(format!("clip-{stamp}.{ext}"));
        if !first.exists() {
            return first;
        }
        (1..)
            .map(|n| self.dir.join(format!("clip-{stamp}-{n}.{ext}")))
            .find(|p| !p.exists())
            .unwrap_or(first)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ClipSink for LocalDirSink {
    async fn save(&self, clip: &EncodedClip) -> Result<SavedClip, ExportError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let path = self.target(stamp, extension_for(&clip.mime));
        tokio::fs::write(&path, &clip.bytes).await?;
        log::info!("export: wrote {} bytes to {}", clip.bytes.len(), path.display());
        Ok(SavedClip::Local(path))
    }
}

// ---------------------------------------------------------------------------
// HttpSink
// ---------------------------------------------------------------------------

/// POSTs the clip to a configured endpoint.
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
}

impl HttpSink {
    /// Build from config; the client carries `timeout_secs`.
    pub fn from_config(config: &ExportConfig) -> Result<Self, ExportError> {
        let url = config
            .upload_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or(ExportError::NoUploadUrl)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Ok(Self { client, url })
    }
}

/// Interpret an upload response: `2xx` with a non-empty body is the URL.
pub fn interpret_response(status: u16, body: &str) -> Result<SavedClip, ExportError> {
    if !(200..300).contains(&status) {
        return Err(ExportError::Rejected { status });
    }
    let url = body.trim();
    if url.is_empty() {
        return Err(ExportError::EmptyUrl);
    }
    Ok(SavedClip::Uploaded(url.to_string()))
}

#[async_trait]
impl ClipSink for HttpSink {
    async fn save(&self, clip: &EncodedClip) -> Result<SavedClip, ExportError> {
        log::info!("export: uploading {} bytes to {}", clip.bytes.len(), self.url);
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, clip.mime.as_str())
            .body(clip.bytes.clone())
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        interpret_response(status, &body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn clip() -> EncodedClip {
        EncodedClip {
            bytes: b"RIFF....WAVE".to_vec(),
            mime: "audio/wav; codecs=3".into(),
            duration_secs: 0.0,
        }
    }

    // ---- responses ---------------------------------------------------------

    #[test]
    fn success_body_is_trimmed_url() {
        assert_eq!(
            interpret_response(201, "  https://host/clips/a.wav\n").expect("ok"),
            SavedClip::Uploaded("https://host/clips/a.wav".into())
        );
    }

    #[test]
    fn non_2xx_is_rejected() {
        assert!(matches!(
            interpret_response(500, "https://host/x"),
            Err(ExportError::Rejected { status: 500 })
        ));
        assert!(matches!(
            interpret_response(302, ""),
            Err(ExportError::Rejected { status: 302 })
        ));
    }

    #[test]
    fn empty_body_is_an_error() {
        assert!(matches!(interpret_response(200, " \n"), Err(ExportError::EmptyUrl)));
    }

    // ---- config ------------------------------------------------------------

    #[test]
    fn upload_requires_url() {
        let config = ExportConfig {
            destination: Destination::Upload,
            ..ExportConfig::default()
        };
        assert!(matches!(sink_for(&config), Err(ExportError::NoUploadUrl)));

        let config = ExportConfig {
            destination: Destination::Upload,
            upload_url: Some("http://localhost:9/upload".into()),
            ..ExportConfig::default()
        };
        assert!(sink_for(&config).is_ok());
    }

    // ---- local -------------------------------------------------------------

    #[tokio::test]
    async fn local_sink_writes_unique_files() {
        let dir = tempdir().expect("temp dir");
        let sink = LocalDirSink::new(dir.path().join("clips"));

        let first = sink.save(&clip()).await.expect("save");
        let second = sink.save(&clip()).await.expect("save");
        let (SavedClip::Local(a), SavedClip::Local(b)) = (first, second) else {
            panic!("expected local paths");
        };
        assert_ne!(a, b);
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("wav"));
        assert!(a
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("clip-")));
        assert_eq!(std::fs::read(&b).expect("read"), b"RIFF....WAVE");
    }
}
