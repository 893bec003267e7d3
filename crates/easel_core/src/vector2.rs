//! Plain 2D vector used for world and surface coordinates.
//!
//! `Vector2` is `Copy`, so every operation hands back a new value. The only
//! in-place mutator is [`Vector2::offset_by`], used where an offset is folded
//! into an existing position.

use serde::Deserialize;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `radians` (0 = +x, counter-clockwise in a y-up frame).
    pub fn from_angle(radians: f32) -> Self {
        glam::Vec2::from_angle(radians).into()
    }

    pub fn add(self, other: Self) -> Self {
        self + other
    }

    pub fn subtract(self, other: Self) -> Self {
        self - other
    }

    pub fn length(self) -> f32 {
        glam::Vec2::from(self).length()
    }

    pub fn distance_to(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Angle of the direction from `self` towards `other`, in radians.
    pub fn angle_to(self, other: Self) -> f32 {
        let d = other - self;
        d.y.atan2(d.x)
    }

    /// Round each axis to the nearest multiple of `grid_size`.
    pub fn snap(self, grid_size: f32) -> Self {
        Self {
            x: (self.x / grid_size).round() * grid_size,
            y: (self.y / grid_size).round() * grid_size,
        }
    }

    /// Explicit independent copy. `Vector2` is `Copy`; this exists so call
    /// sites that want to stress "this is a new value" can say so.
    pub fn copy(&self) -> Self {
        *self
    }

    pub fn offset_by(&mut self, delta: Self) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

impl std::fmt::Display for Vector2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

impl From<glam::Vec2> for Vector2 {
    fn from(v: glam::Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Vector2> for glam::Vec2 {
    fn from(v: Vector2) -> Self {
        glam::Vec2::new(v.x, v.y)
    }
}

impl From<(f32, f32)> for Vector2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl Add for Vector2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Self) {
        self.offset_by(rhs);
    }
}

impl Sub for Vector2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vector2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vector2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vector2 {
    type Output = Self;
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}
