use anyhow::{Context, Result};
use image::{ImageFormat, ImageReader, RgbImage};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Ordered supply of frames with a nominal frame rate
pub trait FrameSource {
    /// Block until the next frame is available. `Ok(None)` marks end of stream.
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Nominal frames per second, if known
    fn fps(&self) -> Option<f64>;

    /// Release underlying resources. Called once when the loop stops.
    fn release(&mut self) {}
}

/// Frames read from still images: a directory (sorted by file name) or a
/// single image file.
pub struct ImageSequence {
    pending: VecDeque<PathBuf>,
    fps: Option<f64>,
}

fn is_image(path: &Path) -> bool {
    path.is_file() && ImageFormat::from_path(path).is_ok()
}

impl ImageSequence {
    pub fn open(path: &Path, fps: Option<f64>) -> Result<Self> {
        let mut files: Vec<PathBuf> = if path.is_dir() {
            std::fs::read_dir(path)
                .with_context(|| format!("Failed to open frame directory {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| is_image(p))
                .collect()
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            anyhow::bail!("Video source not found: {}", path.display());
        };

        if files.is_empty() {
            anyhow::bail!("No frames found in {}", path.display());
        }
        files.sort();

        Ok(Self {
            pending: files.into(),
            fps,
        })
    }

    /// Number of frames not yet delivered
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        while let Some(path) = self.pending.pop_front() {
            let decoded = ImageReader::open(&path)
                .map_err(anyhow::Error::from)
                .and_then(|reader| {
                    reader
                        .with_guessed_format()?
                        .decode()
                        .map_err(|e| anyhow::anyhow!("Failed to decode frame: {}", e))
                });
            match decoded {
                Ok(img) => return Ok(Some(img.to_rgb8())),
                Err(e) => warn!(path = %path.display(), "Skipping unreadable frame: {}", e),
            }
        }
        Ok(None)
    }

    fn fps(&self) -> Option<f64> {
        self.fps
    }

    fn release(&mut self) {
        self.pending.clear();
    }
}
