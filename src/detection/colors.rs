use crate::config::ColorRange;
use crate::detection::preprocessing::HsvImage;
use crate::models::{ColorLabel, Contour};

/// Uppercase the first character and lowercase the rest ("vermelho2" -> "Vermelho2")
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Name of the first range containing `hsv`, or `Unknown`
pub fn classify_hsv(hsv: [u8; 3], ranges: &[ColorRange]) -> ColorLabel {
    ranges
        .iter()
        .find(|range| range.contains(hsv))
        .map(|range| ColorLabel::Named(capitalize(&range.name)))
        .unwrap_or(ColorLabel::Unknown)
}

/// Centroid of a contour clamped into the frame, or `None` for a zero-area contour
pub fn sample_point(contour: &Contour, width: u32, height: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    let (cx, cy) = contour.moments().centroid()?;
    Some((
        cx.clamp(0, width as i64 - 1) as u32,
        cy.clamp(0, height as i64 - 1) as u32,
    ))
}

/// Classify the color of a region by sampling the HSV frame at its centroid
pub fn classify_color(hsv: &HsvImage, contour: &Contour, ranges: &[ColorRange]) -> ColorLabel {
    match sample_point(contour, hsv.width(), hsv.height()) {
        Some((x, y)) => classify_hsv(hsv.get_pixel(x, y).0, ranges),
        None => ColorLabel::Unresolved,
    }
}
