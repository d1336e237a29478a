use imageproc::geometry::arc_length;
use imageproc::point::Point;

use crate::models::{BoundingBox, Contour, ShapeLabel};

/// Aspect ratio window (inclusive) inside which a quadrilateral counts as a square
pub const SQUARE_ASPECT_MIN: f64 = 0.9;
pub const SQUARE_ASPECT_MAX: f64 = 1.1;

/// Closed perimeter length of a contour
pub fn perimeter(contour: &Contour) -> f64 {
    if contour.len() < 2 {
        return 0.0;
    }
    arc_length(&contour.points, true)
}

/// Distance from `p` to the line through `a` and `b` (or to `a` when they coincide)
fn line_distance(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let (px, py) = ((p.x - a.x) as f64, (p.y - a.y) as f64);
    let len = dx.hypot(dy);
    if len == 0.0 {
        return px.hypot(py);
    }
    (dx * py - dy * px).abs() / len
}

/// Douglas-Peucker over an open chain; marks the points that survive
fn mark_kept(chain: &[Point<i32>], epsilon: f64, keep: &mut [bool]) {
    if chain.is_empty() {
        return;
    }
    let mut stack = vec![(0, chain.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        keep[start] = true;
        keep[end] = true;
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut split = start;
        for i in start + 1..end {
            let d = line_distance(chain[i], chain[start], chain[end]);
            if d > max_dist {
                max_dist = d;
                split = i;
            }
        }

        if max_dist > epsilon {
            stack.push((split, end));
            stack.push((start, split));
        }
    }
}

fn farthest_from(points: &[Point<i32>], origin: Point<i32>) -> usize {
    let mut best = 0;
    let mut best_dist = -1i64;
    for (i, p) in points.iter().enumerate() {
        let (dx, dy) = ((p.x - origin.x) as i64, (p.y - origin.y) as i64);
        let d = dx * dx + dy * dy;
        if d > best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Simplify a closed curve to a polygon whose edges stay within `epsilon` of
/// the original points.
///
/// The loop is cut at two mutually distant points and each half is reduced
/// with Douglas-Peucker.
pub fn simplify_closed(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let n = points.len();
    if n <= 3 {
        return points.to_vec();
    }

    let a = farthest_from(points, points[0]);
    let b = farthest_from(points, points[a]);
    if points[a] == points[b] {
        return vec![points[a]];
    }

    let walk = |from: usize, to: usize| -> Vec<Point<i32>> {
        let len = (to + n - from) % n + 1;
        (0..len).map(|i| points[(from + i) % n]).collect()
    };
    let first = walk(a, b);
    let second = walk(b, a);

    let mut keep_first = vec![false; first.len()];
    let mut keep_second = vec![false; second.len()];
    mark_kept(&first, epsilon, &mut keep_first);
    mark_kept(&second, epsilon, &mut keep_second);

    let mut polygon: Vec<Point<i32>> = first
        .iter()
        .zip(&keep_first)
        .filter(|(_, k)| **k)
        .map(|(p, _)| *p)
        .collect();
    // Both halves share their endpoints
    let inner = 1..second.len().saturating_sub(1);
    polygon.extend(
        second[inner.clone()]
            .iter()
            .zip(&keep_second[inner])
            .filter(|(_, k)| **k)
            .map(|(p, _)| *p),
    );
    polygon
}

/// Map a vertex count to a shape label. `aspect_ratio` (width / height of the
/// polygon's bounding box) only matters for quadrilaterals.
pub fn shape_from_vertices(sides: usize, aspect_ratio: f64) -> ShapeLabel {
    match sides {
        3 => ShapeLabel::Triangle,
        4 if (SQUARE_ASPECT_MIN..=SQUARE_ASPECT_MAX).contains(&aspect_ratio) => ShapeLabel::Square,
        4 => ShapeLabel::Rectangle,
        5 => ShapeLabel::Pentagon,
        6 => ShapeLabel::Hexagon,
        10 => ShapeLabel::Star,
        12 => ShapeLabel::Cross,
        n if n > 12 => ShapeLabel::Circle,
        n => ShapeLabel::Polygon(n),
    }
}

/// Simplify a contour with tolerance `epsilon_factor * perimeter` and classify it
pub fn classify_shape(contour: &Contour, epsilon_factor: f64) -> ShapeLabel {
    let epsilon = epsilon_factor * perimeter(contour);
    let polygon = simplify_closed(&contour.points, epsilon);
    let aspect = BoundingBox::of_points(&polygon)
        .map(|b| b.aspect_ratio())
        .unwrap_or(0.0);
    shape_from_vertices(polygon.len(), aspect)
}
