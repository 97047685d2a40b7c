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

//! Display geometry and camera intrinsics.
//!
//! The projection handed to the renderer depends on both: the intrinsics describe
//! the camera image, the display geometry describes how that image is shown.

use serde::{Deserialize, Serialize};

/// Rotation of the display relative to the device's natural orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DisplayRotation {
    /// Natural orientation.
    #[default]
    Rotation0,
    /// Rotated 90 degrees counter-clockwise.
    Rotation90,
    /// Upside down.
    Rotation180,
    /// Rotated 90 degrees clockwise.
    Rotation270,
}

impl DisplayRotation {
    /// Maps the host's surface rotation index (0..=3) onto a rotation.
    ///
    /// Out-of-range values wrap, so a host reporting `4` means `Rotation0`.
    pub fn from_index(index: i32) -> Self {
        match index.rem_euclid(4) {
            0 => Self::Rotation0,
            1 => Self::Rotation90,
            2 => Self::Rotation180,
            _ => Self::Rotation270,
        }
    }

    /// Rotation in degrees: 0, 90, 180 or 270.
    pub fn degrees(&self) -> u32 {
        match self {
            Self::Rotation0 => 0,
            Self::Rotation90 => 90,
            Self::Rotation180 => 180,
            Self::Rotation270 => 270,
        }
    }

}

/// The viewport the renderer draws into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayGeometry {
    /// Current display rotation.
    pub rotation: DisplayRotation,
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
}

impl DisplayGeometry {
    /// Creates a geometry; zero dimensions are clamped to one pixel.
    pub fn new(rotation: DisplayRotation, width: u32, height: u32) -> Self {
        Self {
            rotation,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Width over height of the viewport.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl Default for DisplayGeometry {
    /// A 1x1 viewport in natural orientation, the value used before the surface exists.
    fn default() -> Self {
        Self::new(DisplayRotation::Rotation0, 1, 1)
    }
}

/// Pinhole intrinsics of the camera image, in pixels of that image.
///
/// Intrinsics are expressed for the device's natural orientation; see
/// [`CameraIntrinsics::for_display`] for the rotated variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal lengths `(fx, fy)`.
    pub focal_length: (f32, f32),
    /// Principal point `(cx, cy)`, origin at the top-left of the image.
    pub principal_point: (f32, f32),
    /// Image dimensions `(width, height)`.
    pub image_size: (u32, u32),
}

impl CameraIntrinsics {
    /// Creates intrinsics from raw values.
    pub fn new(fx: f32, fy: f32, cx: f32, cy: f32, width: u32, height: u32) -> Self {
        Self {
            focal_length: (fx, fy),
            principal_point: (cx, cy),
            image_size: (width.max(1), height.max(1)),
        }
    }

    /// Intrinsics of the same image as seen on a display with the given rotation.
    ///
    /// A quarter turn swaps the axes; the principal point is mirrored so it stays
    /// measured from the new top-left corner.
    pub fn for_display(&self, rotation: DisplayRotation) -> Self {
        let (fx, fy) = self.focal_length;
        let (cx, cy) = self.principal_point;
        let (w, h) = self.image_size;
        let (wf, hf) = (w as f32, h as f32);
        match rotation {
            DisplayRotation::Rotation0 => *self,
            DisplayRotation::Rotation90 => Self::new(fy, fx, cy, wf - cx, h, w),
            DisplayRotation::Rotation180 => Self::new(fx, fy, wf - cx, hf - cy, w, h),
            DisplayRotation::Rotation270 => Self::new(fy, fx, hf - cy, cx, h, w),
        }
    }

    /// Width over height of the image.
    pub fn aspect_ratio(&self) -> f32 {
        self.image_size.0 as f32 / self.image_size.1 as f32
    }
}
