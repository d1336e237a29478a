use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::separable_filter_equal;
use imageproc::map::map_colors;
use imageproc::morphology;

use crate::config::{Calibration, HUE_MAX};

/// Three-channel image whose channels hold hue (0..=179), saturation and value
pub type HsvImage = RgbImage;

/// Foreground value of a binary mask
pub const MASK_ON: u8 = 255;

/// Taps of the 5x5 smoothing applied after cleaning (separable, sums to 1)
const SMOOTHING_KERNEL: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];

/// Convert one RGB pixel to 8-bit HSV (hue halved to fit 0..=179)
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(|c| c as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max == 0.0 { 0.0 } else { delta * 255.0 / max };

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };
    let mut h_byte = (h / 2.0).round() as u16;
    if h_byte > HUE_MAX as u16 {
        h_byte -= HUE_MAX as u16 + 1;
    }

    [h_byte as u8, s.round() as u8, max as u8]
}

/// Convert a frame to HSV
pub fn to_hsv(frame: &RgbImage) -> HsvImage {
    map_colors(frame, |p: Rgb<u8>| Rgb(rgb_to_hsv(p.0)))
}

/// Binary mask of pixels whose three channels all lie within the inclusive bounds
pub fn in_range(hsv: &HsvImage, lower: [u8; 3], upper: [u8; 3]) -> GrayImage {
    map_colors(hsv, |p: Rgb<u8>| {
        let inside = (0..3).all(|i| lower[i] <= p[i] && p[i] <= upper[i]);
        Luma([if inside { MASK_ON } else { 0 }])
    })
}

/// Segment a frame with the current calibration bounds
pub fn segment(hsv: &HsvImage, calibration: &Calibration) -> GrayImage {
    in_range(hsv, calibration.lower(), calibration.upper())
}

/// Radius of the square structuring element for a K x K kernel. Even sizes
/// widen to the next odd size.
fn kernel_radius(kernel_size: u32) -> u8 {
    (kernel_size / 2).min(u8::MAX as u32) as u8
}

/// Opening then closing with a square K x K element. Output stays binary.
pub fn open_close(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    let k = kernel_radius(kernel_size);
    if k == 0 {
        return mask.clone();
    }
    let opened = morphology::open(mask, Norm::LInf, k);
    morphology::close(&opened, Norm::LInf, k)
}

/// Swap foreground and background
pub fn invert(mask: &GrayImage) -> GrayImage {
    let mut inverted = mask.clone();
    image::imageops::invert(&mut inverted);
    inverted
}

/// 5x5 smoothing. The result is near-binary and is not re-thresholded.
pub fn smooth(mask: &GrayImage) -> GrayImage {
    separable_filter_equal(mask, &SMOOTHING_KERNEL[..])
}

/// Full mask cleaning: opening, closing, polarity inversion, then smoothing
pub fn clean_mask(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    let cleaned = open_close(mask, kernel_size);
    smooth(&invert(&cleaned))
}
