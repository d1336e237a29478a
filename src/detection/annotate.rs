use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::models::DetectionResult;

pub const ANNOTATION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const LABEL_SCALE: f32 = 20.0;
/// Gap between the label baseline and the top of the box
pub const LABEL_OFFSET: i32 = 10;

/// Load a TrueType/OpenType font for label rendering
pub fn load_font(path: &std::path::Path) -> anyhow::Result<FontVec> {
    let bytes = std::fs::read(path)
        .map_err(|e| anyhow::anyhow!("Failed to read font {}: {}", path.display(), e))?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| anyhow::anyhow!("Failed to parse font {}: {}", path.display(), e))
}

/// Draw a 2px box around the detection and, when a font is available, the
/// "{shape} - {color}" label just above it. Labels of boxes near the top edge
/// are clipped, not moved.
pub fn annotate(frame: &mut RgbImage, detection: &DetectionResult, font: Option<&FontVec>) {
    let bbox = detection.bbox;
    let (x, y) = (bbox.x as i32, bbox.y as i32);

    draw_hollow_rect_mut(frame, Rect::at(x, y).of_size(bbox.width, bbox.height), ANNOTATION_COLOR);
    if bbox.width > 2 && bbox.height > 2 {
        draw_hollow_rect_mut(
            frame,
            Rect::at(x + 1, y + 1).of_size(bbox.width - 2, bbox.height - 2),
            ANNOTATION_COLOR,
        );
    }

    if let Some(font) = font {
        draw_text_mut(
            frame,
            ANNOTATION_COLOR,
            x,
            y - LABEL_OFFSET - LABEL_SCALE as i32,
            PxScale::from(LABEL_SCALE),
            font,
            &detection.label(),
        );
    }
}
