use image::DynamicImage;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

use crate::error::{Result, VisionError};

/// Receiver for intermediate images.
///
/// Logging is fire-and-forget: a sink must never influence detection results,
/// so failures stay inside the sink.
pub trait DiagnosticSink: Send + Sync {
    fn log(&self, image: &DynamicImage, channel: &str);

    /// Whether anything is listening; annotation work is skipped otherwise.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn log(&self, _image: &DynamicImage, _channel: &str) {}

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Writes `<root>/<channel>/<seq>.png`, one numbered file per logged image.
pub struct DirectorySink {
    root: PathBuf,
    counter: AtomicUsize,
}

impl DirectorySink {
    /// The directory must be empty or non-existent.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.exists() {
            let entries = std::fs::read_dir(&root)?;
            if entries.count() > 0 {
                return Err(VisionError::config(format!(
                    "debug directory is not empty: {}",
                    root.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&root)?;
        }

        Ok(Self {
            root,
            counter: AtomicUsize::new(0),
        })
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn write(&self, image: &DynamicImage, channel: &str) -> Result<PathBuf> {
        let channel_dir = self.root.join(channel_dir_name(channel));
        std::fs::create_dir_all(&channel_dir)?;

        let seq = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let path = channel_dir.join(format!("{:04}.png", seq));
        image.save(&path)?;
        Ok(path)
    }
}

impl DiagnosticSink for DirectorySink {
    fn log(&self, image: &DynamicImage, channel: &str) {
        match self.write(image, channel) {
            Ok(path) => debug!("saved diagnostic image {}", path.display()),
            Err(e) => warn!("failed to save diagnostic image on channel '{}': {}", channel, e),
        }
    }
}

fn channel_dir_name(channel: &str) -> String {
    let name: String = channel
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if name.is_empty() { "default".to_string() } else { name }
}
