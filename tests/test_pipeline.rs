//! Integration tests for whole-frame detection.
//!
//! Tests cover:
//! - The minimum area noise filter
//! - A synthetic frame with a single blue disc
//! - Several shapes in one frame
//! - Regions touching the frame edge
//! - Annotation of the frame, with and without a label font

mod common;

use image::{GrayImage, Luma, Rgb};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use shapescan::detection::annotate::ANNOTATION_COLOR;
use shapescan::detection::contours::find_external_contours;
use shapescan::detection::preprocessing::to_hsv;
use shapescan::{BoundingBox, ColorLabel, Contour, DetectionPipeline, DetectionResult, ShapeLabel};

use common::*;

fn azul() -> ColorLabel {
    ColorLabel::Named("Azul".to_string())
}

#[test]
fn test_area_threshold() {
    let pipeline = DetectionPipeline::new();
    let hsv = to_hsv(&blank_frame(700, 100));

    let just_under = Contour::new(vec![
        Point::new(0, 0),
        Point::new(599, 0),
        Point::new(599, 1),
        Point::new(0, 1),
    ]);
    assert_eq!(just_under.area(), 599.0);
    assert!(pipeline.classify_contour(&hsv, &just_under).is_none());

    let at_threshold = Contour::new(vec![
        Point::new(10, 10),
        Point::new(40, 10),
        Point::new(40, 30),
        Point::new(10, 30),
    ]);
    assert_eq!(at_threshold.area(), 600.0);
    let result = pipeline.classify_contour(&hsv, &at_threshold);
    assert!(result.is_some());

    let contours = vec![just_under, at_threshold];
    assert_eq!(pipeline.classify_contours(&hsv, &contours).len(), 1);
}

#[test]
fn test_single_blue_disc() -> anyhow::Result<()> {
    let pipeline = DetectionPipeline::new();
    let frame = frame_with_disc((60, 60), 25, BLUE);

    let detections = pipeline.detect(&frame, &background_bounds());
    assert_eq!(detections.results.len(), 1);

    let result = &detections.results[0];
    assert_eq!(result.color, azul());
    assert!(result.area >= 600.0);
    assert!(!matches!(
        result.shape,
        ShapeLabel::Triangle | ShapeLabel::Square | ShapeLabel::Rectangle
    ));

    let (cx, cy) = result.centroid.ok_or_else(|| anyhow::anyhow!("missing centroid"))?;
    assert!((cx as i32 - 60).abs() <= 1 && (cy as i32 - 60).abs() <= 1);
    assert!(result.bbox.x <= 35 && result.bbox.x + result.bbox.width >= 85);

    assert_eq!(detections.mask.dimensions(), frame.dimensions());
    Ok(())
}

#[test]
fn test_empty_frame_has_no_detections() {
    let pipeline = DetectionPipeline::new();
    let detections = pipeline.detect(&blank_frame(80, 80), &background_bounds());
    assert!(detections.results.is_empty());
    assert!(detections.mask.pixels().all(|p| p[0] == 0));
}

#[test]
fn test_small_blob_is_filtered_as_noise() {
    let pipeline = DetectionPipeline::new();
    let frame = frame_with_disc((60, 60), 8, BLUE);

    assert_eq!(pipeline.get_contours(&frame, &background_bounds()).len(), 1);
    assert!(pipeline.detect(&frame, &background_bounds()).results.is_empty());
}

#[test]
fn test_multiple_shapes() {
    let pipeline = DetectionPipeline::new();
    let mut frame = blank_frame(200, 160);
    draw_filled_circle_mut(&mut frame, (50, 80), 25, BLUE);
    draw_filled_rect_mut(&mut frame, Rect::at(120, 40).of_size(50, 50), GREEN);

    let detections = pipeline.detect(&frame, &background_bounds());
    assert_eq!(detections.results.len(), 2);

    let green = detections
        .results
        .iter()
        .find(|r| r.color == ColorLabel::Named("Verde".to_string()))
        .expect("green square detected");
    assert_eq!(green.shape, ShapeLabel::Square);
    assert_eq!(green.label(), "Square - Verde");

    assert!(detections.results.iter().any(|r| r.color == azul()));
}

#[test]
fn test_annotate_draws_box() {
    let pipeline = DetectionPipeline::new();
    let mut frame = blank_frame(100, 100);
    let result = DetectionResult {
        shape: ShapeLabel::Square,
        color: azul(),
        bbox: BoundingBox {
            x: 20,
            y: 30,
            width: 40,
            height: 40,
        },
        centroid: Some((40, 50)),
        area: 1600.0,
    };

    pipeline.annotate(&mut frame, &[result]);

    assert_eq!(*frame.get_pixel(20, 30), ANNOTATION_COLOR);
    assert_eq!(*frame.get_pixel(21, 31), ANNOTATION_COLOR);
    assert_eq!(*frame.get_pixel(59, 69), ANNOTATION_COLOR);
    assert_eq!(*frame.get_pixel(40, 50), Rgb([255, 255, 255]));
}

#[test]
fn test_region_in_corner_is_traced() {
    let mut mask = GrayImage::new(20, 20);
    for y in 0..5 {
        for x in 0..5 {
            mask.put_pixel(x, y, Luma([255]));
        }
    }

    let contours = find_external_contours(&mask);
    assert_eq!(contours.len(), 1);

    let bbox = contours[0].bounding_box().expect("non-empty contour");
    assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (0, 0, 5, 5));
}

#[test]
fn test_shape_touching_left_edge() {
    let pipeline = DetectionPipeline::new();

    for x in [0, 1] {
        let frame = frame_with_rect(x, 40, 80, 80, BLUE);
        let detections = pipeline.detect(&frame, &background_bounds());

        assert_eq!(detections.results.len(), 1, "rectangle at x={}", x);
        let result = &detections.results[0];
        assert_eq!(result.bbox.x, 0);
        assert_eq!(result.shape, ShapeLabel::Square);
        assert_eq!(result.color, azul());
    }
}

fn green_pixels_in_rows(frame: &image::RgbImage, rows: std::ops::Range<u32>) -> usize {
    frame
        .enumerate_pixels()
        .filter(|(_, y, p)| rows.contains(y) && **p == ANNOTATION_COLOR)
        .count()
}

fn square_at(x: u32, y: u32) -> DetectionResult {
    DetectionResult {
        shape: ShapeLabel::Square,
        color: azul(),
        bbox: BoundingBox {
            x,
            y,
            width: 40,
            height: 40,
        },
        centroid: Some((x + 20, y + 20)),
        area: 1600.0,
    }
}

#[test]
fn test_annotate_draws_label_above_box() {
    let Some(font) = system_font() else {
        eprintln!("no system font found, skipping");
        return;
    };
    let pipeline = DetectionPipeline::new().with_font(font);
    assert!(pipeline.has_font());

    let mut frame = blank_frame(200, 120);
    pipeline.annotate(&mut frame, &[square_at(20, 60)]);

    assert!(green_pixels_in_rows(&frame, 30..50) > 0);
    assert_eq!(*frame.get_pixel(20, 60), ANNOTATION_COLOR);
}

#[test]
fn test_annotate_clips_label_at_top_edge() {
    let Some(font) = system_font() else {
        eprintln!("no system font found, skipping");
        return;
    };
    let pipeline = DetectionPipeline::new().with_font(font);

    let mut frame = blank_frame(200, 120);
    pipeline.annotate(&mut frame, &[square_at(20, 5)]);

    // The label would sit above row 0, so nothing is drawn over the box top
    assert_eq!(green_pixels_in_rows(&frame, 0..5), 0);
    assert_eq!(*frame.get_pixel(20, 5), ANNOTATION_COLOR);
}
