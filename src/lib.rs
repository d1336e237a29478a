pub mod config;
pub mod detection;
pub mod io;
pub mod models;
pub mod pipeline;

pub use config::{Calibration, ColorRange, Control, DetectorConfig};
pub use detection::{DetectionPipeline, FrameDetections};
pub use models::{BoundingBox, ColorLabel, Contour, DetectionResult, ShapeLabel};
pub use pipeline::{FrameLoop, LoopState, RunSummary, StopReason};
