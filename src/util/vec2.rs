use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

/// cos(30°), truncated the way the isometric art was laid out
pub const ISO_COS: f32 = 0.8660;
/// sin(30°)
pub const ISO_SIN: f32 = 0.5;

/// 2D vector in world-plane coordinates (screen space, y grows downward)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn length_sq(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    #[inline]
    pub fn distance_to(&self, other: Vec2) -> f32 {
        self.distance_sq_to(other).sqrt()
    }

    #[inline]
    pub fn distance_sq_to(&self, other: Vec2) -> f32 {
        (*self - other).length_sq()
    }

    /// Rotate into the isometric plane (a fixed -30° rotation).
    ///
    /// The four movement axes of the battlefield line up with the axes of
    /// the returned vector, which is what facing selection compares.
    #[inline]
    pub fn to_iso(&self) -> Self {
        Self {
            x: ISO_COS * self.x - ISO_SIN * self.y,
            y: ISO_SIN * self.x + ISO_COS * self.y,
        }
    }

    /// Unit offset along whichever world axis dominates, keeping its sign.
    ///
    /// Ties go to the x axis. A zero vector maps to +x so callers always get
    /// a usable direction.
    pub fn dominant_axis(&self) -> Self {
        if self.x.abs() >= self.y.abs() {
            Self::new(if self.x < 0.0 { -1.0 } else { 1.0 }, 0.0)
        } else {
            Self::new(0.0, if self.y < 0.0 { -1.0 } else { 1.0 })
        }
    }

    /// Check if vector is approximately equal to another
    pub fn approx_eq(&self, other: Vec2, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}
