pub mod preprocessing;
pub mod contours;
pub mod shapes;
pub mod colors;
pub mod annotate;

use ab_glyph::FontVec;
use image::{GrayImage, RgbImage};
use tracing::{debug, trace};

use crate::config::{Calibration, ColorRange, DetectorConfig};
use crate::models::{Contour, DetectionResult};
use preprocessing::HsvImage;

/// Everything the pipeline produced for one frame
#[derive(Debug, Clone)]
pub struct FrameDetections {
    /// Regions that passed the area filter, in extraction order
    pub results: Vec<DetectionResult>,
    /// Cleaned (inverted, smoothed) mask the contours were traced on
    pub mask: GrayImage,
}

/// Per-frame shape and color detector
pub struct DetectionPipeline {
    pub kernel_size: u32,
    pub min_area: f64,
    pub epsilon_factor: f64,
    pub color_ranges: Vec<ColorRange>,
    font: Option<FontVec>,
}

impl DetectionPipeline {
    pub fn new() -> Self {
        Self::from_config(&DetectorConfig::default())
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            kernel_size: config.kernel_size,
            min_area: config.min_area,
            epsilon_factor: config.epsilon_factor,
            color_ranges: config.color_ranges.clone(),
            font: None,
        }
    }

    /// Render labels with this font when annotating
    pub fn with_font(mut self, font: FontVec) -> Self {
        self.font = Some(font);
        self
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Segment, clean and trace a frame that is already in HSV
    pub fn extract(&self, hsv: &HsvImage, calibration: &Calibration) -> (GrayImage, Vec<Contour>) {
        let raw = preprocessing::segment(hsv, calibration);
        let mask = preprocessing::clean_mask(&raw, self.kernel_size);
        let contours = contours::find_external_contours(&mask);
        (mask, contours)
    }

    /// Classify one contour, or `None` when it falls under the area threshold
    pub fn classify_contour(&self, hsv: &HsvImage, contour: &Contour) -> Option<DetectionResult> {
        let area = contour.area();
        if area < self.min_area {
            return None;
        }
        let bbox = contour.bounding_box()?;

        let shape = shapes::classify_shape(contour, self.epsilon_factor);
        let color = colors::classify_color(hsv, contour, &self.color_ranges);
        let centroid = colors::sample_point(contour, hsv.width(), hsv.height());

        Some(DetectionResult {
            shape,
            color,
            bbox,
            centroid,
            area,
        })
    }

    /// Classify every contour that passes the area filter
    pub fn classify_contours(&self, hsv: &HsvImage, contours: &[Contour]) -> Vec<DetectionResult> {
        contours
            .iter()
            .filter_map(|c| self.classify_contour(hsv, c))
            .collect()
    }

    /// Run the full detection on one frame without touching it
    pub fn detect(&self, frame: &RgbImage, calibration: &Calibration) -> FrameDetections {
        let hsv = preprocessing::to_hsv(frame);
        let (mask, contours) = self.extract(&hsv, calibration);
        let results = self.classify_contours(&hsv, &contours);

        debug!(
            contours = contours.len(),
            detections = results.len(),
            "Frame {}x{} processed",
            frame.width(),
            frame.height()
        );
        for result in &results {
            trace!(
                x = result.bbox.x,
                y = result.bbox.y,
                w = result.bbox.width,
                h = result.bbox.height,
                area = result.area,
                "{}",
                result.label()
            );
        }

        FrameDetections { results, mask }
    }

    /// Draw every detection onto the frame
    pub fn annotate(&self, frame: &mut RgbImage, results: &[DetectionResult]) {
        for result in results {
            annotate::annotate(frame, result, self.font.as_ref());
        }
    }

    /// Get all external contours for a frame, before area filtering
    pub fn get_contours(&self, frame: &RgbImage, calibration: &Calibration) -> Vec<Contour> {
        let hsv = preprocessing::to_hsv(frame);
        self.extract(&hsv, calibration).1
    }
}

impl Default for DetectionPipeline {
    fn default() -> Self {
        Self::new()
    }
}
