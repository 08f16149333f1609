//! 2D Vector
//!
//! Continuous-space positions and velocities, measured in tile units.

use std::fmt;
use std::ops::{Add, Sub, Neg, Mul};
use serde::{Serialize, Deserialize};

/// 2D vector with `f64` components (tile units).
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component (columns, grows right)
    pub x: f64,
    /// Y component (rows, grows down)
    pub y: f64,
}

impl Vec2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Center of the tile at integer coordinates.
    #[inline]
    pub fn tile_center(x: i32, y: i32) -> Self {
        Self {
            x: x as f64 + 0.5,
            y: y as f64 + 0.5,
        }
    }

    /// Scale by a scalar.
    #[inline]
    pub fn scale(self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    /// Squared length (prefer this for comparisons).
    #[inline]
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Length (magnitude).
    #[inline]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Squared distance to another point.
    #[inline]
    pub fn distance_squared(self, other: Self) -> f64 {
        (self - other).length_squared()
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Normalize to unit length.
    /// Returns ZERO if length is zero (or not finite).
    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 || !len.is_finite() {
            return Self::ZERO;
        }
        self.scale(1.0 / len)
    }

    /// True when both components are exactly zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// True when both components are finite numbers.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Integer tile coordinates containing this point (floored).
    #[inline]
    pub fn tile(self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }
}

impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        self.scale(rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl fmt::Debug for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec2({:.3}, {:.3})", self.x, self.y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_length() {
        // 3-4-5 triangle
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.length_squared(), 25.0);
        assert!((v.length() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_vec2_normalize() {
        let norm = Vec2::new(3.0, 4.0).normalize();
        assert!((norm.length() - 1.0).abs() < 1e-12);

        // Zero vector normalizes to zero
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
        assert_eq!(Vec2::new(f64::NAN, 1.0).normalize(), Vec2::ZERO);
    }

    #[test]
    fn test_vec2_tile_floors_negative() {
        assert_eq!(Vec2::new(1.99, 0.0).tile(), (1, 0));
        assert_eq!(Vec2::new(-0.01, 2.5).tile(), (-1, 2));
        assert_eq!(Vec2::tile_center(3, 4), Vec2::new(3.5, 4.5));
    }

    #[test]
    fn test_vec2_operators() {
        let a = Vec2::new(5.0, 7.0);
        let b = Vec2::new(2.0, 3.0);
        assert_eq!(a - b, Vec2::new(3.0, 4.0));
        assert_eq!(a + b, Vec2::new(7.0, 10.0));
        assert_eq!(b * 2.0, Vec2::new(4.0, 6.0));
        assert_eq!(-b, Vec2::new(-2.0, -3.0));
        assert!((a.distance(b) - 5.0).abs() < 1e-12);
    }
}
