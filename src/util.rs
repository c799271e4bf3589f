use cgmath::*;

/// Looser comparison for values produced by a chain of float ops (normalize, sqrt, etc)
pub fn approx_eq(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() <= tolerance
}

pub fn vec2_approx_eq(a: Vector2<f32>, b: Vector2<f32>, tolerance: f32) -> bool {
    approx_eq(a.x, b.x, tolerance) && approx_eq(a.y, b.y, tolerance)
}

pub fn clamp(v: f32, min: f32, max: f32) -> f32 {
    if v < min {
        min
    } else if v > max {
        max
    } else {
        v
    }
}

/// Returns a unit vector in the direction of `v`, or zero if `v` is zero.
/// cgmath's normalize() yields NaN for the zero vector.
pub fn normalized_or_zero(v: Vector2<f32>) -> Vector2<f32> {
    if v.x == 0.0 && v.y == 0.0 {
        v
    } else {
        v.normalize()
    }
}
