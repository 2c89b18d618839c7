//! Background loading of images and project files.
//!
//! Reading and decoding run on a worker thread. The finished Document comes
//! back over a oneshot channel and the host swaps it in when it polls, so
//! the current Document stays authoritative until then. Only one load can
//! be in flight; starting another is refused with `LoadInProgress`.

use futures::channel::oneshot;
use std::path::{Path, PathBuf};
use std::thread;

use crate::document::{BaseImage, Document};
use crate::error::{AnnotateError, Result};
use crate::project;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadKind {
    /// A photograph; the result is a fresh Document with no markers.
    Image,
    /// A project file; the result replaces the Document wholesale.
    Project,
}

#[derive(Debug)]
pub struct Loaded {
    pub kind: LoadKind,
    pub source: PathBuf,
    pub document: Document,
}

struct PendingLoad {
    kind: LoadKind,
    source: PathBuf,
    receiver: oneshot::Receiver<Result<Document>>,
}

#[derive(Default)]
pub struct Loader {
    pending: Option<PendingLoad>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Short description of the load in flight, for a status line.
    pub fn describe(&self) -> Option<String> {
        let pending = self.pending.as_ref()?;
        let name = pending
            .source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        Some(format!("Loading {name}..."))
    }

    pub fn start(&mut self, kind: LoadKind, source: PathBuf) -> Result<()> {
        if self.is_busy() {
            tracing::warn!(path = ?source, "load already in progress");
            return Err(AnnotateError::LoadInProgress);
        }

        let (sender, receiver) = oneshot::channel();
        let path = source.clone();
        thread::Builder::new()
            .name("jonnybox-loader".to_string())
            .spawn(move || {
                let result = read_document(kind, &path);
                // The receiver is gone only if the host shut down.
                let _ = sender.send(result);
            })?;

        tracing::debug!(?kind, path = ?source, "load started");
        self.pending = Some(PendingLoad {
            kind,
            source,
            receiver,
        });
        Ok(())
    }

    /// Non-blocking check for a finished load. Call once per frame.
    pub fn poll(&mut self) -> Option<Result<Loaded>> {
        let pending = self.pending.as_mut()?;
        let outcome = match pending.receiver.try_recv() {
            Ok(None) => return None,
            Ok(Some(result)) => result,
            Err(oneshot::Canceled) => Err(AnnotateError::LoadAborted),
        };
        let pending = self.pending.take()?;
        Some(finish(pending.kind, pending.source, outcome))
    }

    /// Wait for the load in flight, if any.
    pub async fn wait(&mut self) -> Option<Result<Loaded>> {
        let pending = self.pending.take()?;
        let outcome = match pending.receiver.await {
            Ok(result) => result,
            Err(oneshot::Canceled) => Err(AnnotateError::LoadAborted),
        };
        Some(finish(pending.kind, pending.source, outcome))
    }
}

fn finish(kind: LoadKind, source: PathBuf, outcome: Result<Document>) -> Result<Loaded> {
    match outcome {
        Ok(document) => {
            tracing::info!(
                ?kind,
                path = ?source,
                markers = document.store().len(),
                "load finished"
            );
            Ok(Loaded {
                kind,
                source,
                document,
            })
        }
        Err(e) => {
            tracing::error!(?kind, path = ?source, "load failed: {}", e);
            Err(e)
        }
    }
}

/// Read and decode synchronously. Runs on the worker thread.
pub fn read_document(kind: LoadKind, path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path)?;
    match kind {
        LoadKind::Image => Ok(Document::with_image(BaseImage::from_encoded(&bytes)?)),
        LoadKind::Project => project::deserialize(&bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use image::{ImageFormat, RgbaImage};
    use std::io::Write;

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(6, 4, image::Rgba([1, 2, 3, 255]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn test_image_load_completes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "board.png");

        let mut loader = Loader::new();
        loader.start(LoadKind::Image, path.clone()).unwrap();
        assert!(loader.is_busy());
        assert_eq!(loader.describe().as_deref(), Some("Loading board.png..."));

        let loaded = block_on(loader.wait()).unwrap().unwrap();
        assert_eq!(loaded.kind, LoadKind::Image);
        assert_eq!(loaded.source, path);
        assert!(loaded.document.has_image());
        assert!(loaded.document.store().is_empty());
        assert!(!loader.is_busy());
    }

    #[test]
    fn test_second_load_is_refused_while_pending() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png");

        let mut loader = Loader::new();
        loader.start(LoadKind::Image, path.clone()).unwrap();
        assert!(matches!(
            loader.start(LoadKind::Image, path),
            Err(AnnotateError::LoadInProgress)
        ));
        assert!(block_on(loader.wait()).unwrap().is_ok());
    }

    #[test]
    fn test_poll_eventually_delivers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "b.png");

        let mut loader = Loader::new();
        loader.start(LoadKind::Image, path).unwrap();
        let result = loop {
            if let Some(result) = loader.poll() {
                break result;
            }
            thread::sleep(std::time::Duration::from_millis(5));
        };
        assert!(result.is_ok());
        assert!(loader.poll().is_none());
    }

    #[test]
    fn test_failures_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = Loader::new();

        loader
            .start(LoadKind::Image, dir.path().join("missing.png"))
            .unwrap();
        assert!(matches!(
            block_on(loader.wait()),
            Some(Err(AnnotateError::Io(_)))
        ));

        let bad = dir.path().join("bad.json");
        std::fs::File::create(&bad)
            .unwrap()
            .write_all(br#"{"imageSrc": "data:image/png;base64,AAAA"}"#)
            .unwrap();
        loader.start(LoadKind::Project, bad).unwrap();
        assert!(matches!(
            block_on(loader.wait()),
            Some(Err(AnnotateError::MalformedDocument(_)))
        ));
    }

    #[test]
    fn test_wait_without_pending_load() {
        let mut loader = Loader::new();
        assert!(block_on(loader.wait()).is_none());
        assert!(loader.poll().is_none());
    }
}
