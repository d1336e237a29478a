use anyhow::Result;
use image::imageops::{self, FilterType};
use image::DynamicImage;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::PreviewSize;
use crate::detection::{DetectionPipeline, FrameDetections};
use crate::io::{DisplaySink, FrameSource, KeyPoll, ParameterSource, Surface, ESC_KEY};

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    Cancelled,
}

/// Loop state machine. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped(StopReason),
}

/// Totals for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: usize,
    pub detections: usize,
    pub stop_reason: StopReason,
}

/// Milliseconds to wait per frame, `1000 / fps`, never zero
pub fn frame_delay(fps: f64) -> Duration {
    let millis = (1000.0 / fps).floor();
    if millis.is_finite() && millis >= 1.0 {
        Duration::from_millis(millis as u64)
    } else {
        Duration::from_millis(1)
    }
}

/// Frame-at-a-time driver: acquire, detect, annotate, render, poll for ESC
pub struct FrameLoop {
    pipeline: DetectionPipeline,
    preview: PreviewSize,
    default_fps: f64,
}

impl FrameLoop {
    pub fn new(pipeline: DetectionPipeline) -> Self {
        Self {
            pipeline,
            preview: PreviewSize::default(),
            default_fps: 30.0,
        }
    }

    pub fn with_preview(mut self, preview: PreviewSize) -> Self {
        self.preview = preview;
        self
    }

    /// Frame rate to assume when the source has none
    pub fn with_default_fps(mut self, fps: f64) -> Self {
        self.default_fps = fps;
        self
    }

    /// Run one iteration. Returns the state to continue with and the number of
    /// detections drawn.
    pub fn step(
        &self,
        source: &mut dyn FrameSource,
        params: &dyn ParameterSource,
        display: &mut dyn DisplaySink,
        keys: &mut dyn KeyPoll,
        delay: Duration,
    ) -> Result<(LoopState, usize)> {
        let mut frame = match source.next_frame()? {
            Some(frame) => frame,
            None => return Ok((LoopState::Stopped(StopReason::EndOfStream), 0)),
        };

        let calibration = params.snapshot();
        debug!(bounds = %calibration, "Calibration snapshot");
        let FrameDetections { results, mask } = self.pipeline.detect(&frame, &calibration);
        self.pipeline.annotate(&mut frame, &results);

        display.show(Surface::Processed, &DynamicImage::ImageRgb8(frame))?;
        let preview = imageops::resize(&mask, self.preview.width, self.preview.height, FilterType::Triangle);
        display.show(Surface::Mask, &DynamicImage::ImageLuma8(preview))?;

        let state = match keys.wait_key(delay) {
            Some(ESC_KEY) => LoopState::Stopped(StopReason::Cancelled),
            _ => LoopState::Running,
        };
        Ok((state, results.len()))
    }

    /// Drive the loop until end of stream or ESC, then release the source and
    /// close the display.
    pub fn run(
        &self,
        source: &mut dyn FrameSource,
        params: &dyn ParameterSource,
        display: &mut dyn DisplaySink,
        keys: &mut dyn KeyPoll,
    ) -> Result<RunSummary> {
        let fps = source.fps().filter(|f| *f > 0.0).unwrap_or(self.default_fps);
        let delay = frame_delay(fps);
        info!(fps, delay_ms = delay.as_millis() as u64, "Video source opened");

        let mut frames = 0;
        let mut detections = 0;
        let mut state = LoopState::Running;

        let outcome = loop {
            if let LoopState::Stopped(reason) = state {
                break Ok(reason);
            }
            match self.step(source, params, display, keys, delay) {
                Ok((next, found)) => {
                    if next != LoopState::Stopped(StopReason::EndOfStream) {
                        frames += 1;
                        detections += found;
                    }
                    state = next;
                }
                Err(e) => break Err(e),
            }
        };

        source.release();
        let closed = display.close();
        let stop_reason = outcome?;
        closed?;

        match stop_reason {
            StopReason::EndOfStream => info!(frames, detections, "End of stream"),
            StopReason::Cancelled => info!(frames, detections, "Cancelled"),
        }

        Ok(RunSummary {
            frames,
            detections,
            stop_reason,
        })
    }
}
