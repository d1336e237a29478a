use imageproc::point::Point;
use std::fmt;

/// Axis-aligned bounding box in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Smallest box covering every point, counting pixels inclusively
    pub fn of_points(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }
}

/// Zeroth and first order area moments of a closed polygon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Moments {
    /// Centroid `(M10/M00, M01/M00)` truncated to pixel coordinates, or `None`
    /// for a zero-area polygon.
    pub fn centroid(&self) -> Option<(i64, i64)> {
        if self.m00.abs() < f64::EPSILON {
            return None;
        }
        Some((
            (self.m10 / self.m00).floor() as i64,
            (self.m01 / self.m00).floor() as i64,
        ))
    }
}

/// Outer boundary of one connected region, as an ordered closed loop
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Polygon moments via Green's theorem, normalized so that `m00 >= 0`
    /// regardless of traversal direction.
    pub fn moments(&self) -> Moments {
        let n = self.points.len();
        let (mut a, mut mx, mut my) = (0.0f64, 0.0f64, 0.0f64);
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            let (x0, y0, x1, y1) = (p.x as f64, p.y as f64, q.x as f64, q.y as f64);
            let cross = x0 * y1 - x1 * y0;
            a += cross;
            mx += (x0 + x1) * cross;
            my += (y0 + y1) * cross;
        }
        let sign = if a < 0.0 { -1.0 } else { 1.0 };
        Moments {
            m00: sign * a / 2.0,
            m10: sign * mx / 6.0,
            m01: sign * my / 6.0,
        }
    }

    /// Enclosed area (shoelace formula)
    pub fn area(&self) -> f64 {
        self.moments().m00
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of_points(&self.points)
    }
}

/// Shape label derived from the simplified polygon's vertex count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeLabel {
    Triangle,
    Square,
    Rectangle,
    Pentagon,
    Hexagon,
    Star,
    Cross,
    Circle,
    Polygon(usize),
}

impl fmt::Display for ShapeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeLabel::Triangle => write!(f, "Triangle"),
            ShapeLabel::Square => write!(f, "Square"),
            ShapeLabel::Rectangle => write!(f, "Rectangle"),
            ShapeLabel::Pentagon => write!(f, "Pentagon"),
            ShapeLabel::Hexagon => write!(f, "Hexagon"),
            ShapeLabel::Star => write!(f, "Star"),
            ShapeLabel::Cross => write!(f, "Cross"),
            ShapeLabel::Circle => write!(f, "Circle"),
            ShapeLabel::Polygon(sides) => write!(f, "Polygon({})", sides),
        }
    }
}

/// Color name from the color table, or why none was assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorLabel {
    Named(String),
    /// The sampled HSV value fell outside every configured range
    Unknown,
    /// The region has no centroid (zero area moment), so nothing was sampled
    Unresolved,
}

impl fmt::Display for ColorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorLabel::Named(name) => write!(f, "{}", name),
            ColorLabel::Unknown => write!(f, "Unknown"),
            ColorLabel::Unresolved => write!(f, "?"),
        }
    }
}

/// One classified region in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub shape: ShapeLabel,
    pub color: ColorLabel,
    pub bbox: BoundingBox,
    pub centroid: Option<(u32, u32)>,
    pub area: f64,
}

impl DetectionResult {
    /// Annotation text, e.g. `Square - Azul`
    pub fn label(&self) -> String {
        format!("{} - {}", self.shape, self.color)
    }
}
