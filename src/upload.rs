//! Image uploads into slots.
//!
//! An upload is accepted only when its media type is in the `image/`
//! category.  Accepted files are read on a background thread, encoded as a
//! self-contained `data:<type>;base64,<bytes>` URI and handed back to the
//! board as a [`Command::UploadComplete`], or reported as a
//! [`Command::UploadFailed`].  Until then the slot keeps its previous
//! content.
//!
//! Each accepted upload gets a fresh generation number from the
//! [`UploadTracker`]; only the completion carrying a slot's latest
//! generation is applied, so a slow first read can never overwrite a newer
//! second one.

use crate::command::Command;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, error};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;

/// Errors produced while accepting or reading an upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("not an image: {0}")]
    InvalidFileType(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The declared media type, or one guessed from the file extension.
pub fn resolve_media_type(path: &Path, declared: Option<&str>) -> String {
    match declared.map(str::trim).filter(|t| !t.is_empty()) {
        Some(declared) => declared.to_string(),
        None => mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string(),
    }
}

/// Whether `media_type` is in the image category.
pub fn is_image(media_type: &str) -> bool {
    media_type.trim().to_ascii_lowercase().starts_with("image/")
}

/// Reject anything that is not an image.
pub fn check_image(media_type: &str) -> Result<(), UploadError> {
    if is_image(media_type) {
        Ok(())
    } else {
        Err(UploadError::InvalidFileType(media_type.to_string()))
    }
}

pub fn encode_data_uri(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
}

/// Read `path` and encode it as a `data:` URI.
pub fn read_data_uri(path: &Path, media_type: &str) -> Result<String, UploadError> {
    let bytes = std::fs::read(path).map_err(|source| UploadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(encode_data_uri(media_type, &bytes))
}

/// Per-slot generation counters for in-flight uploads.
///
/// Generations come from one monotonic counter, so a generation handed
/// out before a [`reset`](UploadTracker::reset) can never match one handed
/// out after it.
#[derive(Debug, Default)]
pub struct UploadTracker {
    latest: HashMap<usize, u64>,
    next: u64,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new upload into `index` and return its generation.  Any
    /// earlier upload into the same slot becomes stale.
    pub fn begin(&mut self, index: usize) -> u64 {
        self.next += 1;
        self.latest.insert(index, self.next);
        self.next
    }

    /// Whether `generation` is the newest upload started for `index`.
    pub fn is_current(&self, index: usize, generation: u64) -> bool {
        self.latest.get(&index) == Some(&generation)
    }

    /// Consume a completion.  Returns `true` if it should be applied.
    pub fn finish(&mut self, index: usize, generation: u64) -> bool {
        if self.is_current(index, generation) {
            self.latest.remove(&index);
            true
        } else {
            false
        }
    }

    /// Forget every in-flight upload.
    pub fn reset(&mut self) {
        self.latest.clear();
    }

    /// Number of slots with an upload in flight.
    pub fn in_flight(&self) -> usize {
        self.latest.len()
    }
}

/// An accepted upload waiting to be read.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpload {
    pub index: usize,
    pub generation: u64,
    pub path: PathBuf,
    pub media_type: String,
}

impl PendingUpload {
    /// Read the file on a dedicated thread and send the outcome into
    /// `sink`: a completion on success, a failure carrying the reason
    /// otherwise.  The slot keeps its content on failure.
    pub fn spawn(self, sink: mpsc::Sender<Command>) -> JoinHandle<()> {
        std::thread::spawn(move || {
            let outcome = match read_data_uri(&self.path, &self.media_type) {
                Ok(payload) => {
                    debug!(
                        "read {} for slot {} (generation {})",
                        self.path.display(),
                        self.index,
                        self.generation
                    );
                    Command::UploadComplete {
                        index: self.index,
                        generation: self.generation,
                        payload,
                    }
                }
                Err(e) => {
                    error!("upload into slot {}: {}", self.index, e);
                    Command::UploadFailed {
                        index: self.index,
                        generation: self.generation,
                        reason: e.to_string(),
                    }
                }
            };
            if sink.send(outcome).is_err() {
                debug!("command channel closed, dropping upload for slot {}", self.index);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn media_type_prefers_declaration() {
        let p = Path::new("/tmp/photo.txt");
        assert_eq!(resolve_media_type(p, Some("image/jpeg")), "image/jpeg");
        assert_eq!(resolve_media_type(p, Some("  ")), "text/plain");
        assert_eq!(resolve_media_type(Path::new("a.png"), None), "image/png");
        assert_eq!(
            resolve_media_type(Path::new("noext"), None),
            "application/octet-stream"
        );
    }

    #[test]
    fn only_images_pass() {
        assert!(check_image("image/png").is_ok());
        assert!(check_image("IMAGE/svg+xml").is_ok());
        assert!(matches!(
            check_image("application/pdf"),
            Err(UploadError::InvalidFileType(t)) if t == "application/pdf"
        ));
        assert!(check_image("imagex/png").is_err());
    }

    #[test]
    fn data_uri_is_self_contained() {
        assert_eq!(encode_data_uri("image/png", b"abc"), "data:image/png;base64,YWJj");
    }

    #[test]
    fn tracker_discards_stale_generations() {
        let mut t = UploadTracker::new();
        let first = t.begin(0);
        let second = t.begin(0);
        let other = t.begin(1);
        assert!(!t.finish(0, first), "older read must not win");
        assert!(t.finish(0, second));
        assert!(!t.finish(0, second), "a completion applies once");
        assert!(t.is_current(1, other));
        t.reset();
        assert!(!t.finish(1, other));
        assert_eq!(t.in_flight(), 0);
        assert!(t.begin(1) > other, "generations never repeat");
    }

    #[test]
    fn spawned_read_sends_completion() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dot.png");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&[0x89, b'P', b'N', b'G'])
            .unwrap();

        let (tx, rx) = mpsc::channel();
        let pending = PendingUpload {
            index: 3,
            generation: 7,
            path,
            media_type: "image/png".into(),
        };
        pending.spawn(tx).join().unwrap();
        let cmd = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(
            cmd,
            Command::UploadComplete {
                index: 3,
                generation: 7,
                payload: "data:image/png;base64,iVBORw==".into(),
            }
        );
    }

    #[test]
    fn failed_read_reports_failure() {
        let dir = tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let pending = PendingUpload {
            index: 0,
            generation: 1,
            path: dir.path().join("missing.png"),
            media_type: "image/png".into(),
        };
        pending.spawn(tx).join().unwrap();
        let cmd = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(
            matches!(&cmd, Command::UploadFailed { index: 0, generation: 1, reason }
                if reason.contains("missing.png")),
            "got: {cmd:?}"
        );
    }
}
