//! Vector and angle primitives shared by every planner stage.

use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

pub const EPSILON: f32 = 1e-6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product.
    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Unit vector, or zero when the length is degenerate.
    pub fn normalized(self) -> Vec2 {
        let len = self.length();
        if len <= EPSILON || !len.is_finite() {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / len, self.y / len)
        }
    }

    /// Counter-clockwise perpendicular.
    pub fn perp(self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn rotated(self, angle: f32) -> Vec2 {
        let (s, c) = angle.sin_cos();
        Vec2::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    pub fn lerp(self, other: Vec2, t: f32) -> Vec2 {
        self + (other - self) * t
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Rescales down to `max_len` when longer; never scales up.
    pub fn clamp_length(self, max_len: f32) -> Vec2 {
        let len = self.length();
        if len > max_len && len > EPSILON {
            self * (max_len / len)
        } else {
            self
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

// ── Lines and segments ──────────────────────────────────────────────

/// Distance from `point` to the infinite line through `a` and `b`.
pub fn distance_to_line(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let dir = b - a;
    let len = dir.length();
    if len <= EPSILON {
        return point.distance(a);
    }
    (dir.cross(point - a) / len).abs()
}

pub fn closest_point_on_segment(point: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let dir = b - a;
    let len_sq = dir.length_sq();
    if len_sq <= EPSILON {
        return a;
    }
    let t = ((point - a).dot(dir) / len_sq).clamp(0.0, 1.0);
    a + dir * t
}

pub fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    point.distance(closest_point_on_segment(point, a, b))
}

/// Intersection point of segments `p1-p2` and `q1-q2`, if they cross.
/// Collinear overlaps report no single point and return `None`.
pub fn segment_intersection(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> Option<Vec2> {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = r.cross(s);
    if denom.abs() <= EPSILON {
        return None;
    }
    let qp = q1 - p1;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(p1 + r * t)
    } else {
        None
    }
}

// ── Angles ──────────────────────────────────────────────────────────

/// Wraps into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

/// Absolute angle between two non-zero vectors, in `[0, PI]`.
pub fn angle_between(a: Vec2, b: Vec2) -> f32 {
    let na = a.normalized();
    let nb = b.normalized();
    if na == Vec2::ZERO || nb == Vec2::ZERO {
        return 0.0;
    }
    na.cross(nb).atan2(na.dot(nb)).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_zero_vector_stays_zero() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
        assert_eq!(Vec2::new(1e-9, 0.0).normalized(), Vec2::ZERO);
    }

    #[test]
    fn line_distance_ignores_segment_ends() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        let p = Vec2::new(50.0, 3.0);
        assert!((distance_to_line(p, a, b) - 3.0).abs() < 1e-5);
        assert!((distance_to_segment(p, a, b) - p.distance(b)).abs() < 1e-4);
    }

    #[test]
    fn crossing_segments_intersect_at_midpoint() {
        let hit = segment_intersection(
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, -1.0),
            Vec2::new(0.0, 1.0),
        )
        .expect("segments cross");
        assert!(hit.length() < 1e-5);

        assert!(segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
        )
        .is_none());
    }

    #[test]
    fn wrap_angle_stays_in_half_open_range() {
        for raw in [-7.0f32, -PI, 0.0, PI, 4.0, 13.0] {
            let w = wrap_angle(raw);
            assert!(w > -PI - 1e-5 && w <= PI + 1e-5, "raw={raw} wrapped={w}");
        }
        assert_eq!(wrap_angle(f32::NAN), 0.0);
    }

    #[test]
    fn clamp_length_only_shrinks() {
        let v = Vec2::new(30.0, 40.0).clamp_length(5.0);
        assert!((v.length() - 5.0).abs() < 1e-4);
        let short = Vec2::new(1.0, 1.0);
        assert_eq!(short.clamp_length(5.0), short);
    }
}
