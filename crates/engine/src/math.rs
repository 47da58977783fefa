use std::ops::{AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// 2D point or offset in surface pixels.
///
/// The in-place arithmetic methods (`add`, `multiply`, `divide`, `subtract`) mutate the receiver
/// and return it for chaining. They accept anything convertible into a `Vector2`, so both
/// `v.add((1.0, 2.0))` and `v.add(other)` work. Equality is exact field comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Vector2) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn add(&mut self, offset: impl Into<Vector2>) -> &mut Self {
        let offset = offset.into();
        self.x += offset.x;
        self.y += offset.y;
        self
    }

    pub fn subtract(&mut self, offset: impl Into<Vector2>) -> &mut Self {
        let offset = offset.into();
        self.x -= offset.x;
        self.y -= offset.y;
        self
    }

    pub fn multiply(&mut self, factor: impl Into<Vector2>) -> &mut Self {
        let factor = factor.into();
        self.x *= factor.x;
        self.y *= factor.y;
        self
    }

    pub fn divide(&mut self, divisor: impl Into<Vector2>) -> &mut Self {
        let divisor = divisor.into();
        self.x /= divisor.x;
        self.y /= divisor.y;
        self
    }

    /// Returns a copy offset by `(dx, dy)`, leaving `self` untouched.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl From<(f64, f64)> for Vector2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Vector2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: f64) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vector2 {
    type Output = Vector2;

    fn neg(self) -> Vector2 {
        Vector2::new(-self.x, -self.y)
    }
}
