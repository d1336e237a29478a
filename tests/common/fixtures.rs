use ab_glyph::FontVec;
use anyhow::Result;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use shapescan::Calibration;
use shapescan::detection::annotate::load_font;
use shapescan::io::{DisplaySink, FrameSource, KeyPoll, Surface};
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const GREEN: Rgb<u8> = Rgb([0, 200, 0]);

/// Bounds that segment a white/gray background but not saturated shapes
/// with hue above 60 (blue, green, ...).
pub fn background_bounds() -> Calibration {
    Calibration {
        h_min: 0,
        h_max: 60,
        s_min: 0,
        s_max: 40,
        v_min: 0,
        v_max: 255,
    }
}

pub fn blank_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, WHITE)
}

/// White frame with one filled disc
pub fn frame_with_disc(center: (i32, i32), radius: i32, color: Rgb<u8>) -> RgbImage {
    let mut frame = blank_frame(120, 120);
    draw_filled_circle_mut(&mut frame, center, radius, color);
    frame
}

/// White frame with one filled axis-aligned rectangle
pub fn frame_with_rect(x: i32, y: i32, width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
    let mut frame = blank_frame(200, 160);
    draw_filled_rect_mut(&mut frame, Rect::at(x, y).of_size(width, height), color);
    frame
}

/// A TrueType font installed on the host, if any
pub fn system_font() -> Option<FontVec> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .iter()
    .map(Path::new)
    .filter(|p| p.exists())
    .find_map(|p| load_font(p).ok())
}

/// Every integer point along the closed polygon through `vertices`, in order,
/// the way a traced boundary would list them.
pub fn densify(vertices: &[(i32, i32)]) -> Vec<Point<i32>> {
    let mut points = Vec::new();
    for i in 0..vertices.len() {
        let (x0, y0) = vertices[i];
        let (x1, y1) = vertices[(i + 1) % vertices.len()];
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).max(1);
        for s in 0..steps {
            let t = s as f64 / steps as f64;
            let x = x0 as f64 + t * (x1 - x0) as f64;
            let y = y0 as f64 + t * (y1 - y0) as f64;
            points.push(Point::new(x.round() as i32, y.round() as i32));
        }
    }
    points
}

/// In-memory frame source
pub struct VecSource {
    frames: VecDeque<RgbImage>,
    fps: Option<f64>,
    pub released: bool,
}

impl VecSource {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self {
            frames: frames.into(),
            fps: Some(1000.0),
            released: false,
        }
    }

    pub fn with_fps(mut self, fps: Option<f64>) -> Self {
        self.fps = fps;
        self
    }
}

impl FrameSource for VecSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.pop_front())
    }

    fn fps(&self) -> Option<f64> {
        self.fps
    }

    fn release(&mut self) {
        self.released = true;
    }
}

/// Keeps every rendered view
#[derive(Default)]
pub struct RecordingSink {
    pub shown: Vec<(Surface, DynamicImage)>,
    pub closed: bool,
}

impl RecordingSink {
    pub fn count(&self, surface: Surface) -> usize {
        self.shown.iter().filter(|(s, _)| *s == surface).count()
    }
}

impl DisplaySink for RecordingSink {
    fn show(&mut self, surface: Surface, image: &DynamicImage) -> Result<()> {
        self.shown.push((surface, image.clone()));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Replays a fixed key script, one entry per wait, then reports nothing
pub struct ScriptedKeys {
    script: VecDeque<Option<u8>>,
    pub waits: Vec<Duration>,
}

impl ScriptedKeys {
    pub fn new(script: Vec<Option<u8>>) -> Self {
        Self {
            script: script.into(),
            waits: Vec::new(),
        }
    }

    pub fn silent() -> Self {
        Self::new(Vec::new())
    }
}

impl KeyPoll for ScriptedKeys {
    fn wait_key(&mut self, delay: Duration) -> Option<u8> {
        self.waits.push(delay);
        self.script.pop_front().flatten()
    }
}
