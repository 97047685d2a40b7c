// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Unit quaternions for pose rotations.

use serde::{Deserialize, Serialize};

use super::{Vec3, EPSILON};
use std::ops::Mul;

/// A rotation stored as `(x, y, z, w)` with `w` the scalar part.
///
/// The tracking service reports orientations in this exact layout, so poses can be
/// copied in without reordering. Rotations should be unit quaternions; the
/// constructors that build rotations normalize their output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Quaternion {
    /// The x component of the vector part.
    pub x: f32,
    /// The y component of the vector part.
    pub y: f32,
    /// The z component of the vector part.
    pub z: f32,
    /// The scalar (real) part.
    pub w: f32,
}

impl Quaternion {
    /// No rotation.
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Creates a quaternion from raw components without normalizing.
    #[inline]
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle_radians` around `axis` (normalized internally).
    #[inline]
    pub fn from_axis_angle(axis: Vec3, angle_radians: f32) -> Self {
        let axis = axis.normalize();
        let (s, c) = (angle_radians * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Squared magnitude.
    #[inline]
    pub fn magnitude_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    /// Returns a unit copy, or [`Quaternion::IDENTITY`] when the input is degenerate.
    #[inline]
    pub fn normalize(&self) -> Self {
        let mag_sq = self.magnitude_squared();
        if mag_sq > EPSILON * EPSILON {
            let inv = 1.0 / mag_sq.sqrt();
            Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
        } else {
            Self::IDENTITY
        }
    }

    /// The conjugate, which is the inverse rotation for unit quaternions.
    #[inline]
    pub fn conjugate(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotates a vector by this quaternion (assumed unit length).
    #[inline]
    pub fn rotate_vec3(&self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let s = self.w;
        2.0 * u.dot(v) * u + (s * s - u.dot(u)) * v + 2.0 * s * u.cross(v)
    }

    /// Angular distance-like measure between two rotations, `1 - |dot|`.
    ///
    /// Zero for identical rotations (including `q` vs `-q`).
    #[inline]
    pub fn angular_difference(&self, other: Self) -> f32 {
        let dot = self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w;
        1.0 - dot.abs()
    }
}

impl Default for Quaternion {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Quaternion> for Quaternion {
    type Output = Self;
    /// Hamilton product: applies `rhs` first, then `self`.
    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq, FRAC_PI_2};

    fn vec3_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    #[test]
    fn test_rotate_quarter_turn_around_y() {
        let q = Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_2);
        let rotated = q.rotate_vec3(Vec3::X);
        assert!(vec3_approx_eq(rotated, -Vec3::Z));
    }

    #[test]
    fn test_conjugate_undoes_rotation() {
        let q = Quaternion::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 0.7);
        let v = Vec3::new(0.3, -2.0, 5.0);
        let back = q.conjugate().rotate_vec3(q.rotate_vec3(v));
        assert!(vec3_approx_eq(back, v));
    }

    #[test]
    fn test_degenerate_normalizes_to_identity() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(q.normalize(), Quaternion::IDENTITY);
    }

    #[test]
    fn test_angular_difference_ignores_sign() {
        let q = Quaternion::from_axis_angle(Vec3::Z, 1.0);
        let neg = Quaternion::new(-q.x, -q.y, -q.z, -q.w);
        assert!(approx_eq(q.angular_difference(neg), 0.0));
    }

    #[test]
    fn test_product_composes_rotations() {
        let a = Quaternion::from_axis_angle(Vec3::Z, FRAC_PI_2);
        let ab = a * a;
        let rotated = ab.rotate_vec3(Vec3::X);
        assert!(vec3_approx_eq(rotated, -Vec3::X));
    }
}
