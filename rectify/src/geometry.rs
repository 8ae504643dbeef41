//! Plain geometric value types shared by the estimator and the solvers.
//!
//! Points are stored as `f64` pairs/triples. With the `serde` feature they
//! serialize as bare arrays (`[x, y]`, `[x, y, z]`) so scene files stay terse.

use std::ops::Sub;

use crate::error::RectifyError;

/// A 2D point in pixel space or in normalized uv space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "[f64; 2]", into = "[f64; 2]"))]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Lift to homogeneous coordinates `(x, y, 1)`.
    pub fn homogeneous(self) -> Vec3 {
        Vec3::new(self.x, self.y, 1.0)
    }

    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Z-component of the 2D cross product.
    pub fn cross(self, other: Point2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Sub for Point2 {
    type Output = Point2;

    fn sub(self, rhs: Point2) -> Point2 {
        Point2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<[f64; 2]> for Point2 {
    fn from(p: [f64; 2]) -> Self {
        Point2::new(p[0], p[1])
    }
}

impl From<Point2> for [f64; 2] {
    fn from(p: Point2) -> Self {
        [p.x, p.y]
    }
}

/// A 3-vector: a homogeneous 2D point or a scene-space ray.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "[f64; 3]", into = "[f64; 3]"))]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn scale(self, s: f64) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }

    /// Multiply only the z component (depth) by `s`.
    pub fn scale_z(self, s: f64) -> Vec3 {
        Vec3::new(self.x, self.y, self.z * s)
    }

    /// Divide through by `z`, returning the dehomogenized 2D point.
    ///
    /// Fails with [`RectifyError::PointAtInfinity`] when `|z| <= eps`.
    pub fn dehomogenize(self, eps: f64) -> Result<Point2, RectifyError> {
        if self.z.abs() <= eps {
            return Err(RectifyError::PointAtInfinity {
                x: self.x,
                y: self.y,
                w: self.z,
            });
        }
        Ok(Point2::new(self.x / self.z, self.y / self.z))
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Vec3::new(v[0], v[1], v[2])
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

/// The canonical uv targets, in the order (0,0), (1,0), (0,1), (1,1):
/// origin, u axis, v axis, diagonal.
pub const UNIT_SQUARE: [Point2; 4] = [
    Point2::new(0.0, 0.0),
    Point2::new(1.0, 0.0),
    Point2::new(0.0, 1.0),
    Point2::new(1.0, 1.0),
];

/// A pixel-space point paired with its uv-space target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    pub source: Point2,
    pub target: Point2,
}

impl Correspondence {
    pub fn new(source: Point2, target: Point2) -> Self {
        Self { source, target }
    }

    /// Pair four source points with [`UNIT_SQUARE`] in order.
    pub fn unit_square(sources: [Point2; 4]) -> [Correspondence; 4] {
        std::array::from_fn(|i| Correspondence::new(sources[i], UNIT_SQUARE[i]))
    }
}

/// Three points `(A, O, B)` asserting that angle A-O-B is a right angle in
/// the physical scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointTriple {
    pub a: Point2,
    pub o: Point2,
    pub b: Point2,
}

impl PointTriple {
    pub fn new(a: Point2, o: Point2, b: Point2) -> Self {
        Self { a, o, b }
    }

    /// Arm vectors `A - O` and `B - O`.
    pub fn arms(&self) -> (Point2, Point2) {
        (self.a - self.o, self.b - self.o)
    }

    /// Apply a fallible point map to all three points.
    pub fn try_map<F>(&self, mut f: F) -> Result<PointTriple, RectifyError>
    where
        F: FnMut(Point2) -> Result<Point2, RectifyError>,
    {
        Ok(PointTriple {
            a: f(self.a)?,
            o: f(self.o)?,
            b: f(self.b)?,
        })
    }
}
