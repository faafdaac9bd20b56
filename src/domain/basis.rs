//! Basic building blocks: positions, angles and the body/world frame transform.

use std::{
    f64::consts::PI,
    ops::{Add, Sub},
};

use nalgebra::{Matrix2, Vector2};

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Position {
    x: f64,
    y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn distance(&self, position: Self) -> f64 {
        ((self.x - position.x).powi(2) + (self.y - position.y).powi(2)).sqrt()
    }

    pub fn norm(&self) -> f64 {
        self.distance(Position::default())
    }

    pub fn dot(&self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z-component of the 3D cross product of the two vectors.
    pub fn cross(&self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn scale(&self, factor: f64) -> Position {
        Position::new(self.x * factor, self.y * factor)
    }
}

impl From<Position> for Vector2<f64> {
    fn from(value: Position) -> Self {
        Vector2::new(value.x, value.y)
    }
}

impl From<Vector2<f64>> for Position {
    fn from(value: Vector2<f64>) -> Self {
        Position::new(value[0], value[1])
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Angle(f64);

impl Angle {
    pub fn new(radians: f64) -> Self {
        Self(radians)
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    /// The same direction expressed in `(-π, π]`.
    pub fn wrapped(self) -> Self {
        Self(wrap_to_pi(self.0))
    }
}

/// Normalizes an angle to `(-π, π]`.
///
/// Angles already inside the interval are returned untouched, which makes the function exactly
/// idempotent. Non-finite input is passed through.
pub fn wrap_to_pi(radians: f64) -> f64 {
    if !radians.is_finite() || (radians > -PI && radians <= PI) {
        return radians;
    }
    let wrapped = PI - (PI - radians).rem_euclid(2.0 * PI);
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

/// Rigid 2D transform from the body frame of a robot to the world frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    rotation: Matrix2<f64>,
    translation: Vector2<f64>,
}

impl Transform {
    pub fn rotation(&self) -> &Matrix2<f64> {
        &self.rotation
    }

    pub fn translation(&self) -> Position {
        self.translation.into()
    }

    pub fn to_world(&self, point: Position) -> Position {
        (self.rotation * Vector2::from(point) + self.translation).into()
    }

    pub fn to_body(&self, point: Position) -> Position {
        // The inverse of a rotation matrix is its transpose.
        (self.rotation.transpose() * (Vector2::from(point) - self.translation)).into()
    }
}

/// Builds the transform of a frame located at `position` and rotated by `orientation`.
pub fn get_transform(position: Position, orientation: Angle) -> Transform {
    let (sin, cos) = orientation.0.sin_cos();
    Transform {
        rotation: Matrix2::new(cos, -sin, sin, cos),
        translation: position.into(),
    }
}

/// Distance and bearing from `from` to `to`. The bearing is normalized to `(-π, π]` if `wrap`
/// is set.
pub fn relative_position(from: Position, to: Position, wrap: bool) -> (f64, Angle) {
    let diff = to - from;
    let bearing = Angle::new(diff.y().atan2(diff.x()));
    (
        diff.norm(),
        if wrap { bearing.wrapped() } else { bearing },
    )
}
