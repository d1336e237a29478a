use anyhow::Result;
use image::DynamicImage;
use std::path::PathBuf;
use tracing::debug;

/// Named output surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Annotated full frame
    Processed,
    /// Resized mask preview
    Mask,
}

impl Surface {
    pub fn name(&self) -> &'static str {
        match self {
            Surface::Processed => "Processed",
            Surface::Mask => "Mask",
        }
    }
}

/// Where rendered views go
pub trait DisplaySink {
    fn show(&mut self, surface: Surface, image: &DynamicImage) -> Result<()>;

    /// Close all surfaces. Called once when the loop stops.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Discards every view
#[derive(Debug, Default)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn show(&mut self, _surface: Surface, _image: &DynamicImage) -> Result<()> {
        Ok(())
    }
}

/// Writes each surface as a numbered PNG sequence under its own subdirectory,
/// e.g. `out/processed/00001.png` and `out/mask/00001.png`.
pub struct DirectorySink {
    output_dir: PathBuf,
    processed_count: usize,
    mask_count: usize,
}

impl DirectorySink {
    /// The directory must be empty or non-existent
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Output directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        for surface in [Surface::Processed, Surface::Mask] {
            std::fs::create_dir_all(output_dir.join(surface.name().to_lowercase()))?;
        }

        Ok(Self {
            output_dir,
            processed_count: 0,
            mask_count: 0,
        })
    }

    pub fn surface_dir(&self, surface: Surface) -> PathBuf {
        self.output_dir.join(surface.name().to_lowercase())
    }
}

impl DisplaySink for DirectorySink {
    fn show(&mut self, surface: Surface, image: &DynamicImage) -> Result<()> {
        let counter = match surface {
            Surface::Processed => &mut self.processed_count,
            Surface::Mask => &mut self.mask_count,
        };
        *counter += 1;
        let filename = format!("{:05}.png", counter);

        let output_path = self.surface_dir(surface).join(&filename);
        image
            .save(&output_path)
            .map_err(|e| anyhow::anyhow!("Failed to save {} view: {}", surface.name(), e))?;

        debug!(surface = surface.name(), "Saved {}", output_path.display());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        debug!(
            frames = self.processed_count,
            "Closed display directory {}",
            self.output_dir.display()
        );
        Ok(())
    }
}
