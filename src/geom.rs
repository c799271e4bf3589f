use cgmath::*;

use crate::util::clamp;

// All shapes live in map pixel space: +x to the right, +y down, origin at the map's top-left.

/// Axis-aligned rectangle described by its top-left origin and its extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub origin: Point2<f32>,
    pub extent: Vector2<f32>,
}

impl Default for Rect {
    fn default() -> Self {
        Self {
            origin: point2(0.0, 0.0),
            extent: vec2(0.0, 0.0),
        }
    }
}

impl Rect {
    pub fn new(origin: Point2<f32>, extent: Vector2<f32>) -> Self {
        Self { origin, extent }
    }

    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(point2(x, y), vec2(width, height))
    }

    pub fn left(&self) -> f32 {
        self.origin.x
    }
    pub fn right(&self) -> f32 {
        self.origin.x + self.extent.x
    }
    pub fn top(&self) -> f32 {
        self.origin.y
    }
    pub fn bottom(&self) -> f32 {
        self.origin.y + self.extent.y
    }
    pub fn width(&self) -> f32 {
        self.extent.x
    }
    pub fn height(&self) -> f32 {
        self.extent.y
    }

    pub fn center(&self) -> Point2<f32> {
        self.origin + self.extent * 0.5
    }

    pub fn is_empty(&self) -> bool {
        self.extent.x <= 0.0 || self.extent.y <= 0.0
    }

    pub fn offset(&self, by: Vector2<f32>) -> Rect {
        Rect::new(self.origin + by, self.extent)
    }

    /// Edges count as inside.
    pub fn contains(&self, point: &Point2<f32>) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// True if `other` lies entirely within this rect, edges inclusive.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }

    /// Overlap on both axes. Rects which merely share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Like `intersects`, but rects sharing an edge or corner count as overlapping.
    pub fn touches(&self, other: &Rect) -> bool {
        self.left() <= other.right()
            && self.right() >= other.left()
            && self.top() <= other.bottom()
            && self.bottom() >= other.top()
    }

    /// Returns the overlapping region of the two rects, or None if they don't overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        let r = Rect::from_xywh(left, top, right - left, bottom - top);
        if r.is_empty() {
            None
        } else {
            Some(r)
        }
    }

    /// Clamps `point` into this rect's extents.
    pub fn closest_point_to(&self, point: &Point2<f32>) -> Point2<f32> {
        point2(
            clamp(point.x, self.left(), self.right()),
            clamp(point.y, self.top(), self.bottom()),
        )
    }

    /// Splits this rect into four equal quadrants: top-left, top-right, bottom-left, bottom-right.
    pub fn quadrants(&self) -> [Rect; 4] {
        let half = self.extent * 0.5;
        let mid = self.origin + half;
        [
            Rect::new(self.origin, half),
            Rect::new(point2(mid.x, self.origin.y), half),
            Rect::new(point2(self.origin.x, mid.y), half),
            Rect::new(mid, half),
        ]
    }
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Point2<f32>,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Point2<f32>, radius: f32) -> Self {
        Self { center, radius }
    }

    /// The smallest axis-aligned rect enclosing this circle
    pub fn bounding_rect(&self) -> Rect {
        Rect::new(
            point2(self.center.x - self.radius, self.center.y - self.radius),
            vec2(self.radius * 2.0, self.radius * 2.0),
        )
    }

    pub fn contains(&self, point: &Point2<f32>) -> bool {
        self.center.distance2(*point) <= self.radius * self.radius
    }

    pub fn intersects_circle(&self, other: &Circle) -> bool {
        let r = self.radius + other.radius;
        self.center.distance2(other.center) <= r * r
    }

    /// A circle whose center lies inside the rect is considered intersecting.
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        self.contains(&rect.closest_point_to(&self.center))
    }
}

// ---------------------------------------------------------------------------------------------------------------------

/// The bounding shape of anything taking part in collision: actors, static map objects, queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundsShape {
    Circle(Circle),
    Rect(Rect),
}

impl From<Circle> for BoundsShape {
    fn from(c: Circle) -> Self {
        BoundsShape::Circle(c)
    }
}

impl From<Rect> for BoundsShape {
    fn from(r: Rect) -> Self {
        BoundsShape::Rect(r)
    }
}

impl BoundsShape {
    pub fn bounding_rect(&self) -> Rect {
        match self {
            BoundsShape::Circle(c) => c.bounding_rect(),
            BoundsShape::Rect(r) => *r,
        }
    }

    pub fn center(&self) -> Point2<f32> {
        match self {
            BoundsShape::Circle(c) => c.center,
            BoundsShape::Rect(r) => r.center(),
        }
    }

    pub fn intersects(&self, other: &BoundsShape) -> bool {
        match (self, other) {
            (BoundsShape::Rect(a), BoundsShape::Rect(b)) => a.intersects(b),
            (BoundsShape::Circle(a), BoundsShape::Circle(b)) => a.intersects_circle(b),
            (BoundsShape::Circle(c), BoundsShape::Rect(r))
            | (BoundsShape::Rect(r), BoundsShape::Circle(c)) => c.intersects_rect(r),
        }
    }

    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        match self {
            BoundsShape::Rect(r) => r.intersects(rect),
            BoundsShape::Circle(c) => c.intersects_rect(rect),
        }
    }
}

// ---------------------------------------------------------------------------------------------------------------------

/// Rotates `point` by `angle` radians about `pivot`.
fn rotate_about(point: Point2<f32>, pivot: Point2<f32>, angle: f32) -> Point2<f32> {
    pivot + Matrix2::from_angle(Rad(angle)) * (point - pivot)
}

/// Rectangle rotated by `rotation` radians about its center. `origin` is the top-left corner
/// before rotation is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotatedRect {
    pub origin: Point2<f32>,
    pub extent: Vector2<f32>,
    pub rotation: f32,
}

impl RotatedRect {
    pub fn new(origin: Point2<f32>, extent: Vector2<f32>, rotation: f32) -> Self {
        Self {
            origin,
            extent,
            rotation,
        }
    }

    pub fn center(&self) -> Point2<f32> {
        self.origin + self.extent * 0.5
    }

    /// Moves the rect so its center lands on `center`, keeping extent and rotation.
    pub fn set_center(&mut self, center: Point2<f32>) {
        self.origin = center - self.extent * 0.5;
    }

    fn rotated(&self, local: Point2<f32>) -> Point2<f32> {
        if self.rotation == 0.0 {
            local
        } else {
            rotate_about(local, self.center(), self.rotation)
        }
    }

    pub fn top_left(&self) -> Point2<f32> {
        self.rotated(self.origin)
    }
    pub fn top_right(&self) -> Point2<f32> {
        self.rotated(point2(self.origin.x + self.extent.x, self.origin.y))
    }
    pub fn bottom_left(&self) -> Point2<f32> {
        self.rotated(point2(self.origin.x, self.origin.y + self.extent.y))
    }
    pub fn bottom_right(&self) -> Point2<f32> {
        self.rotated(self.origin + self.extent)
    }

    /// Containment test done by inverse-rotating `point` into the rect's local frame.
    pub fn contains(&self, point: &Point2<f32>) -> bool {
        let local = if self.rotation == 0.0 {
            *point
        } else {
            rotate_about(*point, self.center(), -self.rotation)
        };
        Rect::new(self.origin, self.extent).contains(&local)
    }

    /// The ellipse inscribed in this rect, sharing its rotation.
    pub fn containing_ellipse(&self) -> Ellipse {
        Ellipse::new(
            self.center(),
            self.extent.x * 0.5,
            self.extent.y * 0.5,
            self.rotation,
        )
    }
}

// ---------------------------------------------------------------------------------------------------------------------

/// Ellipse with radii `rx`, `ry`, rotated by `rotation` radians about its center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipse {
    pub center: Point2<f32>,
    pub rx: f32,
    pub ry: f32,
    pub rotation: f32,
}

impl Ellipse {
    pub fn new(center: Point2<f32>, rx: f32, ry: f32, rotation: f32) -> Self {
        Self {
            center,
            rx,
            ry,
            rotation,
        }
    }

    pub fn contains(&self, point: &Point2<f32>) -> bool {
        if self.rx == self.ry {
            return self.center.distance2(*point) <= self.rx * self.rx;
        }

        let p = if self.rotation == 0.0 {
            *point
        } else {
            rotate_about(*point, self.center, -self.rotation)
        };
        let d = p - self.center;
        (d.x * d.x) / (self.rx * self.rx) + (d.y * d.y) / (self.ry * self.ry) <= 1.0
    }
}

#[cfg(test)]
mod geom_tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn rect_intersection_works() {
        let a = Rect::from_xywh(0.0, 0.0, 10.0, 10.0);
        let b = Rect::from_xywh(5.0, 8.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert_eq!(a.intersection(&b), Some(Rect::from_xywh(5.0, 8.0, 5.0, 2.0)));

        // sharing an edge is not an overlap
        let c = Rect::from_xywh(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&c));
        assert_eq!(a.intersection(&c), None);

        let far = Rect::from_xywh(100.0, 100.0, 1.0, 1.0);
        assert!(!a.intersects(&far));
        assert_eq!(a.intersection(&far), None);
    }

    #[test]
    fn touching_rects_share_edges() {
        let a = Rect::from_xywh(0.0, 0.0, 10.0, 10.0);
        let right = Rect::from_xywh(10.0, 2.0, 5.0, 5.0);
        let corner = Rect::from_xywh(10.0, 10.0, 5.0, 5.0);
        assert!(!a.intersects(&right));
        assert!(a.touches(&right));
        assert!(a.touches(&corner));
        assert!(!a.touches(&Rect::from_xywh(10.5, 0.0, 5.0, 5.0)));
    }

    #[test]
    fn closest_point_to_clamps() {
        let r = Rect::from_xywh(10.0, 10.0, 20.0, 10.0);
        assert_eq!(r.closest_point_to(&point2(0.0, 0.0)), point2(10.0, 10.0));
        assert_eq!(r.closest_point_to(&point2(15.0, 40.0)), point2(15.0, 20.0));
        assert_eq!(r.closest_point_to(&point2(50.0, 15.0)), point2(30.0, 15.0));
        // inside points are returned unchanged
        assert_eq!(r.closest_point_to(&point2(12.0, 12.0)), point2(12.0, 12.0));
    }

    #[test]
    fn circle_intersections_work() {
        let a = Circle::new(point2(0.0, 0.0), 5.0);
        assert!(a.intersects_circle(&Circle::new(point2(9.0, 0.0), 5.0)));
        assert!(a.intersects_circle(&Circle::new(point2(10.0, 0.0), 5.0)));
        assert!(!a.intersects_circle(&Circle::new(point2(10.1, 0.0), 5.0)));

        let r = Rect::from_xywh(4.0, -1.0, 10.0, 2.0);
        assert!(a.intersects_rect(&r));
        let r = Rect::from_xywh(4.0, 4.0, 10.0, 2.0);
        assert!(!a.intersects_rect(&r));

        // containment counts as intersecting
        let big = Rect::from_xywh(-100.0, -100.0, 200.0, 200.0);
        assert!(a.intersects_rect(&big));
        assert!(BoundsShape::from(big).intersects(&BoundsShape::from(a)));
        assert!(BoundsShape::from(a).intersects(&BoundsShape::from(big)));
    }

    #[test]
    fn quadrants_quadrisect() {
        let r = Rect::from_xywh(0.0, 0.0, 100.0, 50.0);
        let q = r.quadrants();
        assert_eq!(q[0], Rect::from_xywh(0.0, 0.0, 50.0, 25.0));
        assert_eq!(q[1], Rect::from_xywh(50.0, 0.0, 50.0, 25.0));
        assert_eq!(q[2], Rect::from_xywh(0.0, 25.0, 50.0, 25.0));
        assert_eq!(q[3], Rect::from_xywh(50.0, 25.0, 50.0, 25.0));
        for c in q.iter() {
            assert!(r.contains_rect(c));
        }
    }

    #[test]
    fn unrotated_shapes_match_axis_aligned_containment() {
        let aabb = Rect::from_xywh(2.0, 3.0, 8.0, 4.0);
        let rotated = RotatedRect::new(aabb.origin, aabb.extent, 0.0);
        let ellipse = rotated.containing_ellipse();
        for &(x, y) in [
            (2.0, 3.0),
            (6.0, 5.0),
            (10.0, 7.0),
            (1.9, 5.0),
            (6.0, 7.1),
            (11.0, 11.0),
        ]
        .iter()
        {
            let p = point2(x, y);
            assert_eq!(rotated.contains(&p), aabb.contains(&p));
        }

        assert!(ellipse.contains(&point2(6.0, 5.0)));
        assert!(ellipse.contains(&point2(10.0, 5.0)));
        assert!(!ellipse.contains(&point2(10.0, 7.0)));
        assert!(ellipse.contains(&point2(6.0, 3.0)));
    }

    #[test]
    fn rotation_is_about_center() {
        // a 10x2 bar centered on (5,1), rotated a quarter turn, becomes a 2x10 bar centered on (5,1)
        let r = RotatedRect::new(point2(0.0, 0.0), vec2(10.0, 2.0), FRAC_PI_2);
        assert!(r.contains(&point2(5.0, -3.0)));
        assert!(r.contains(&point2(5.0, 5.0)));
        assert!(!r.contains(&point2(9.0, 1.0)));
        assert!(!r.contains(&point2(1.0, 1.0)));

        let e = r.containing_ellipse();
        assert!(e.contains(&point2(5.0, -3.5)));
        assert!(!e.contains(&point2(9.0, 1.0)));

        let tl = r.top_left();
        assert!((tl.x - 6.0).abs() < 1e-4 && (tl.y - -4.0).abs() < 1e-4);
    }

    #[test]
    fn set_center_moves_origin() {
        let mut r = RotatedRect::new(point2(0.0, 0.0), vec2(4.0, 2.0), 0.3);
        r.set_center(point2(10.0, 10.0));
        assert_eq!(r.origin, point2(8.0, 9.0));
        assert_eq!(r.center(), point2(10.0, 10.0));
    }
}
