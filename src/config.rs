//! Detector configuration: calibration bounds, the named color table and the
//! tunable constants of the per-frame pipeline.
//!
//! Everything here can be loaded from a JSON file. Missing fields fall back to
//! the built-in defaults, so a config file only needs the values it changes:
//!
//! ```json
//! { "calibration": { "h_min": 0, "h_max": 60 }, "min_area": 900.0 }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Largest hue value in the 8-bit HSV representation
pub const HUE_MAX: u8 = 179;

/// One of the six calibration sliders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    HMin,
    HMax,
    SMin,
    SMax,
    VMin,
    VMax,
}

impl Control {
    pub const ALL: [Control; 6] = [
        Control::HMin,
        Control::HMax,
        Control::SMin,
        Control::SMax,
        Control::VMin,
        Control::VMax,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Control::HMin => "Hmin",
            Control::HMax => "Hmax",
            Control::SMin => "Smin",
            Control::SMax => "Smax",
            Control::VMin => "Vmin",
            Control::VMax => "Vmax",
        }
    }

    /// Upper end of the slider range (the lower end is always 0)
    pub fn max(&self) -> u8 {
        match self {
            Control::HMin | Control::HMax => HUE_MAX,
            _ => u8::MAX,
        }
    }
}

impl FromStr for Control {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Control::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("Unknown calibration control: {}", s))
    }
}

/// HSV lower/upper bounds used by the segmenter.
///
/// Bounds are not required to be ordered; `lower > upper` on any channel simply
/// segments nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub h_min: u8,
    pub h_max: u8,
    pub s_min: u8,
    pub s_max: u8,
    pub v_min: u8,
    pub v_max: u8,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            h_min: 0,
            h_max: 140,
            s_min: 0,
            s_max: 255,
            v_min: 0,
            v_max: 255,
        }
    }
}

impl Calibration {
    pub fn lower(&self) -> [u8; 3] {
        [self.h_min, self.s_min, self.v_min]
    }

    pub fn upper(&self) -> [u8; 3] {
        [self.h_max, self.s_max, self.v_max]
    }

    pub fn get(&self, control: Control) -> u8 {
        match control {
            Control::HMin => self.h_min,
            Control::HMax => self.h_max,
            Control::SMin => self.s_min,
            Control::SMax => self.s_max,
            Control::VMin => self.v_min,
            Control::VMax => self.v_max,
        }
    }

    /// Move a slider, clamping to its range. Returns the value actually stored.
    pub fn set(&mut self, control: Control, value: i64) -> u8 {
        let clamped = value.clamp(0, control.max() as i64) as u8;
        let slot = match control {
            Control::HMin => &mut self.h_min,
            Control::HMax => &mut self.h_max,
            Control::SMin => &mut self.s_min,
            Control::SMax => &mut self.s_max,
            Control::VMin => &mut self.v_min,
            Control::VMax => &mut self.v_max,
        };
        *slot = clamped;
        clamped
    }
}

impl fmt::Display for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "H {}..{} S {}..{} V {}..{}",
            self.h_min, self.h_max, self.s_min, self.s_max, self.v_min, self.v_max
        )
    }
}

/// A named, inclusive HSV range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    pub name: String,
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    pub fn new(name: impl Into<String>, lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
        }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }
}

/// Built-in color table. Order matters: the first matching range wins, so the
/// overlaps (laranja under vermelho, marrom under vermelho2) resolve to the
/// earlier entry.
pub fn default_color_ranges() -> Vec<ColorRange> {
    vec![
        ColorRange::new("vermelho", [0, 120, 70], [10, 255, 255]),
        ColorRange::new("vermelho2", [170, 100, 50], [179, 255, 255]),
        ColorRange::new("azul", [90, 80, 50], [130, 255, 255]),
        ColorRange::new("laranja", [5, 100, 100], [20, 255, 255]),
        ColorRange::new("magenta", [140, 100, 100], [170, 255, 255]),
        ColorRange::new("marrom", [0, 50, 0], [179, 255, 60]),
        ColorRange::new("verde", [40, 50, 50], [80, 255, 255]),
    ]
}

/// Size of the mask preview surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSize {
    pub width: u32,
    pub height: u32,
}

impl Default for PreviewSize {
    fn default() -> Self {
        Self {
            width: 400,
            height: 360,
        }
    }
}

/// Complete detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Initial segmentation bounds
    pub calibration: Calibration,

    /// Ordered color table, first match wins
    pub color_ranges: Vec<ColorRange>,

    /// Side of the square structuring element used for opening/closing
    pub kernel_size: u32,

    /// Contours enclosing less than this area are treated as noise
    pub min_area: f64,

    /// Polygon simplification tolerance as a fraction of the perimeter
    pub epsilon_factor: f64,

    /// Mask preview dimensions
    pub mask_preview: PreviewSize,

    /// Frame rate used when the source does not report one
    pub default_fps: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            calibration: Calibration::default(),
            color_ranges: default_color_ranges(),
            kernel_size: 5,
            min_area: 600.0,
            epsilon_factor: 0.03,
            mask_preview: PreviewSize::default(),
            default_fps: 30.0,
        }
    }
}

impl DetectorConfig {
    /// Load a configuration from a JSON file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: DetectorConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.kernel_size == 0 || self.kernel_size > 511 {
            anyhow::bail!("kernel_size must be between 1 and 511, got {}", self.kernel_size);
        }
        if !(self.epsilon_factor > 0.0) {
            anyhow::bail!("epsilon_factor must be positive, got {}", self.epsilon_factor);
        }
        if !(self.default_fps > 0.0) {
            anyhow::bail!("default_fps must be positive, got {}", self.default_fps);
        }
        if self.mask_preview.width == 0 || self.mask_preview.height == 0 {
            anyhow::bail!(
                "mask_preview must be non-empty, got {}x{}",
                self.mask_preview.width,
                self.mask_preview.height
            );
        }
        if self.calibration.h_min > HUE_MAX || self.calibration.h_max > HUE_MAX {
            anyhow::bail!("hue bounds must be at most {}: {}", HUE_MAX, self.calibration);
        }
        Ok(())
    }
}
