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

//! Rigid poses as reported by the tracking service.

use crate::math::{Mat4, Quaternion, Vec3};
use serde::{Deserialize, Serialize};

/// A rigid transform from a local frame into world space.
///
/// Rotation is applied first, then translation. Camera poses, trackable center
/// poses and anchor poses all use this type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Orientation of the local frame.
    pub rotation: Quaternion,
    /// Origin of the local frame in world space, in metres.
    pub translation: Vec3,
}

impl Pose {
    /// The identity pose at the world origin.
    pub const IDENTITY: Self = Self {
        rotation: Quaternion::IDENTITY,
        translation: Vec3::ZERO,
    };

    /// Creates a pose from its rotation and translation.
    #[inline]
    pub fn new(rotation: Quaternion, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// A pure translation.
    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(Quaternion::IDENTITY, translation)
    }

    /// Builds a pose from the service's raw `[qx, qy, qz, qw, tx, ty, tz]` layout.
    #[inline]
    pub fn from_raw(raw: [f32; 7]) -> Self {
        Self::new(
            Quaternion::new(raw[0], raw[1], raw[2], raw[3]),
            Vec3::new(raw[4], raw[5], raw[6]),
        )
    }

    /// Model matrix of this pose.
    #[inline]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }

    /// The inverse transform (world to local).
    #[inline]
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.normalize().conjugate();
        Self::new(rotation, -rotation.rotate_vec3(self.translation))
    }

    /// `self ∘ other`: applies `other` first, then `self`.
    #[inline]
    pub fn compose(&self, other: &Pose) -> Self {
        let rotation = self.rotation.normalize();
        Self::new(
            rotation * other.rotation,
            rotation.rotate_vec3(other.translation) + self.translation,
        )
    }

    /// Maps a point from the local frame into world space.
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.normalize().rotate_vec3(point) + self.translation
    }

    /// Approximate equality, treating `q` and `-q` as the same orientation.
    pub fn approx_eq(&self, other: &Pose, epsilon: f32) -> bool {
        self.translation.distance(other.translation) <= epsilon
            && self
                .rotation
                .normalize()
                .angular_difference(other.rotation.normalize())
                <= epsilon
    }
}

impl approx::AbsDiffEq for Pose {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        crate::math::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.approx_eq(other, epsilon)
    }
}
