use image::{imageops, GrayImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use crate::models::Contour;

/// Width of the empty frame put around the mask before tracing
const TRACE_PADDING: u32 = 1;

/// Find the outer boundary of every top-level connected region.
///
/// Any nonzero pixel counts as foreground, so a smoothed, near-binary mask is
/// traced the same way as a strictly binary one. Hole borders and regions
/// nested inside holes are dropped. No size filtering happens here.
///
/// The tracer only starts an outer border on a background-to-foreground
/// transition, so regions touching the image edge are traced on a copy with
/// an empty border and shifted back.
pub fn find_external_contours(mask: &GrayImage) -> Vec<Contour> {
    let mut padded = GrayImage::new(mask.width() + 2 * TRACE_PADDING, mask.height() + 2 * TRACE_PADDING);
    imageops::replace(&mut padded, mask, TRACE_PADDING as i64, TRACE_PADDING as i64);

    let offset = TRACE_PADDING as i32;
    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| {
            let points = c
                .points
                .into_iter()
                .map(|p| Point::new(p.x - offset, p.y - offset))
                .collect();
            Contour::new(points)
        })
        .collect()
}
