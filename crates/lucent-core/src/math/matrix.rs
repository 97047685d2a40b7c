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

//! Defines the `Mat4` type used for poses, view and projection matrices.

use super::{Quaternion, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Depth range of clip space produced by projection matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClipDepth {
    /// OpenGL convention, depth in `[-1, 1]`.
    #[default]
    NegativeOneToOne,
    /// Vulkan / Metal / D3D / wgpu convention, depth in `[0, 1]`.
    ZeroToOne,
}

/// A 4x4 column-major matrix.
///
/// The memory layout matches what GL-style renderers expect for `uniformMatrix4fv`
/// with `transpose = false`, so [`Mat4::to_cols_array`] can be uploaded as-is.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix. `cols[0]` is the first column, and so on.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The 4x4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W],
    };

    /// Creates a new matrix from four column vectors.
    #[inline]
    pub fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Creates a translation matrix.
    #[inline]
    pub fn from_translation(v: Vec3) -> Self {
        Self::from_cols(Vec4::X, Vec4::Y, Vec4::Z, Vec4::from_vec3(v, 1.0))
    }

    /// Creates a rotation matrix from a quaternion (normalized first).
    #[inline]
    pub fn from_quat(q: Quaternion) -> Self {
        let q = q.normalize();
        let (x2, y2, z2) = (q.x + q.x, q.y + q.y, q.z + q.z);
        let (xx, xy, xz) = (q.x * x2, q.x * y2, q.x * z2);
        let (yy, yz, zz) = (q.y * y2, q.y * z2, q.z * z2);
        let (wx, wy, wz) = (q.w * x2, q.w * y2, q.w * z2);

        Self::from_cols(
            Vec4::new(1.0 - (yy + zz), xy + wz, xz - wy, 0.0),
            Vec4::new(xy - wz, 1.0 - (xx + zz), yz + wx, 0.0),
            Vec4::new(xz + wy, yz - wx, 1.0 - (xx + yy), 0.0),
            Vec4::W,
        )
    }

    /// Rigid transform: rotate by `rotation`, then translate by `translation`.
    #[inline]
    pub fn from_rotation_translation(rotation: Quaternion, translation: Vec3) -> Self {
        let mut m = Self::from_quat(rotation);
        m.cols[3] = Vec4::from_vec3(translation, 1.0);
        m
    }

    /// Off-center right-handed perspective frustum.
    ///
    /// `left`, `right`, `bottom` and `top` are the extents of the near plane in view
    /// space. Panics in debug builds when the planes are degenerate.
    pub fn frustum_rh(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        z_near: f32,
        z_far: f32,
        depth: ClipDepth,
    ) -> Self {
        debug_assert!(z_near > 0.0 && z_far > z_near);
        debug_assert!(right > left && top > bottom);
        let width = right - left;
        let height = top - bottom;
        let (cc, dd) = match depth {
            ClipDepth::NegativeOneToOne => (
                -(z_far + z_near) / (z_far - z_near),
                -(2.0 * z_far * z_near) / (z_far - z_near),
            ),
            ClipDepth::ZeroToOne => (
                z_far / (z_near - z_far),
                (z_near * z_far) / (z_near - z_far),
            ),
        };

        Self::from_cols(
            Vec4::new(2.0 * z_near / width, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 * z_near / height, 0.0, 0.0),
            Vec4::new(
                (right + left) / width,
                (top + bottom) / height,
                cc,
                -1.0,
            ),
            Vec4::new(0.0, 0.0, dd, 0.0),
        )
    }

    /// Translation part of an affine matrix.
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.cols[3].truncate()
    }

    /// Transforms a point (w = 1) and drops the homogeneous coordinate.
    #[inline]
    pub fn transform_point3(&self, p: Vec3) -> Vec3 {
        (*self * Vec4::from_vec3(p, 1.0)).truncate()
    }

    /// Column-major array of the 16 elements.
    #[inline]
    pub fn to_cols_array(&self) -> [f32; 16] {
        bytemuck::cast(self.cols)
    }

    /// Column-major nested array, the layout shader uniform structs use.
    #[inline]
    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        [
            self.cols[0].to_array(),
            self.cols[1].to_array(),
            self.cols[2].to_array(),
            self.cols[3].to_array(),
        ]
    }

    /// Element-wise approximate comparison.
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.to_cols_array()
            .iter()
            .zip(other.to_cols_array().iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Default for Mat4 {
    /// Returns the 4x4 identity matrix.
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Self;
    /// Matrix product; `a * b` applies `b` first.
    #[inline]
    fn mul(self, rhs: Mat4) -> Self::Output {
        Self::from_cols(
            self * rhs.cols[0],
            self * rhs.cols[1],
            self * rhs.cols[2],
            self * rhs.cols[3],
        )
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    #[inline]
    fn mul(self, rhs: Vec4) -> Self::Output {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z + self.cols[3] * rhs.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;

    fn vec3_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    #[test]
    fn test_identity_default() {
        assert_eq!(Mat4::default(), Mat4::IDENTITY);
        assert_eq!(Mat4::IDENTITY * Mat4::IDENTITY, Mat4::IDENTITY);
    }

    #[test]
    fn test_translation_moves_points() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m.translation(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_from_quat_matches_quaternion_rotation() {
        let q = Quaternion::from_axis_angle(Vec3::new(0.2, 1.0, -0.4), 1.1);
        let v = Vec3::new(0.5, -1.0, 2.0);
        assert!(vec3_approx_eq(
            Mat4::from_quat(q).transform_point3(v),
            q.rotate_vec3(v)
        ));
    }

    #[test]
    fn test_frustum_maps_near_and_far_planes() {
        let near = 0.1;
        let far = 100.0;
        let gl = Mat4::frustum_rh(-0.1, 0.1, -0.1, 0.1, near, far, ClipDepth::NegativeOneToOne);
        let p_near = gl * Vec4::new(0.0, 0.0, -near, 1.0);
        let p_far = gl * Vec4::new(0.0, 0.0, -far, 1.0);
        assert!(approx_eq(p_near.z / p_near.w, -1.0));
        assert!((p_far.z / p_far.w - 1.0).abs() < 1e-3);

        let zo = Mat4::frustum_rh(-0.1, 0.1, -0.1, 0.1, near, far, ClipDepth::ZeroToOne);
        let p_near = zo * Vec4::new(0.0, 0.0, -near, 1.0);
        assert!(approx_eq(p_near.z / p_near.w, 0.0));
    }

    #[test]
    fn test_to_cols_array_is_column_major() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let a = m.to_cols_array();
        assert_eq!(&a[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!(m.to_cols_array_2d()[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
