//! Minimum-translation vectors for overlapping shapes.
//!
//! Every function here returns the penetration of the first shape into the second: the vector
//! points from the first shape into the second, and subtracting it from the first shape's
//! position separates the two.

use cgmath::*;

use crate::geom::{BoundsShape, Circle, Rect};

/// Dispatches to the solver for the given pairing.
pub fn penetration_vector(a: &BoundsShape, b: &BoundsShape) -> Vector2<f32> {
    match (a, b) {
        (BoundsShape::Rect(a), BoundsShape::Rect(b)) => rect_rect(a, b),
        (BoundsShape::Circle(a), BoundsShape::Circle(b)) => circle_circle(a, b),
        (BoundsShape::Circle(a), BoundsShape::Rect(b)) => circle_rect(a, b),
        (BoundsShape::Rect(a), BoundsShape::Circle(b)) => rect_circle(a, b),
    }
}

/// Resolves along whichever axis has the thinner overlap; never returns a diagonal vector.
///
/// # Panics
/// If the two rects don't overlap. Callers must check intersection first.
pub fn rect_rect(rect1: &Rect, rect2: &Rect) -> Vector2<f32> {
    let intersection = match rect1.intersection(rect2) {
        Some(r) => r,
        None => panic!(
            "Rects must intersect to calculate a penetration vector: {:?} vs {:?}",
            rect1, rect2
        ),
    };

    let c1 = rect1.center();
    let c2 = rect2.center();
    if intersection.width() < intersection.height() {
        let d = if c1.x < c2.x {
            intersection.width()
        } else {
            -intersection.width()
        };
        vec2(d, 0.0)
    } else {
        let d = if c1.y < c2.y {
            intersection.height()
        } else {
            -intersection.height()
        };
        vec2(0.0, d)
    }
}

/// Returns zero for circles which don't touch. Coincident centers resolve straight up.
pub fn circle_circle(circ1: &Circle, circ2: &Circle) -> Vector2<f32> {
    if !circ1.intersects_circle(circ2) {
        return Vector2::zero();
    }

    let displacement = circ1.center - circ2.center;
    let radii = circ1.radius + circ2.radius;
    let desired_displacement = if displacement.is_zero() {
        vec2(0.0, -radii)
    } else {
        displacement.normalize() * radii
    };

    displacement - desired_displacement
}

pub fn circle_rect(circ: &Circle, rect: &Rect) -> Vector2<f32> {
    let collision_point = rect.closest_point_to(&circ.center);
    let to_collision_point = collision_point - circ.center;

    if rect.contains(&circ.center) || to_collision_point.is_zero() {
        // center is inside the rect; push out along whichever single axis is shorter
        let mut displacement = circ.center - rect.center();
        let desired_displacement = if displacement.is_zero() {
            vec2(0.0, -(circ.radius + rect.height() / 2.0))
        } else {
            let disp_x = vec2(displacement.x.signum() * (circ.radius + rect.width() / 2.0), 0.0);
            let disp_y = vec2(0.0, displacement.y.signum() * (circ.radius + rect.height() / 2.0));

            // an axis with no displacement can't be pushed along
            let resolve_on_x = if displacement.x == 0.0 {
                false
            } else if displacement.y == 0.0 {
                true
            } else {
                disp_x.magnitude2() < disp_y.magnitude2()
            };

            if resolve_on_x {
                displacement.y = 0.0;
                disp_x
            } else {
                displacement.x = 0.0;
                disp_y
            }
        };
        displacement - desired_displacement
    } else {
        to_collision_point.normalize() * circ.radius - to_collision_point
    }
}

/// Exact negation of `circle_rect` with the arguments swapped.
pub fn rect_circle(rect: &Rect, circ: &Circle) -> Vector2<f32> {
    -circle_rect(circ, rect)
}
