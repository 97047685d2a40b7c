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

//! Packages one tick's tracking state into what a renderer draws against.
//!
//! Nothing here issues draw calls. [`build_frame_for_render`] is a pure
//! function of the frame, the anchor snapshot and the registry: the same
//! inputs always give the same [`RenderOutcome`].

use lucent_core::math::{ClipDepth, LinearRgba, Mat4};
use lucent_core::{
    CameraIntrinsics, DisplayGeometry, Frame, FrameSequence, ImageExtent, Pose, TextureHandle,
    TrackableId,
};
use lucent_tracking::{AnchorSnapshot, TrackableRegistry};
use serde::{Deserialize, Serialize};

/// Tint colors as `0xRRGGBBAA`, picked by `image_index % 16`.
pub const TINT_PALETTE: [u32; 16] = [
    0x000000FF, 0xF44336FF, 0xE91E63FF, 0x9C27B0FF, 0x673AB7FF, 0x3F51B5FF, 0x2196F3FF,
    0x03A9F4FF, 0x00BCD4FF, 0x009688FF, 0x4CAF50FF, 0x8BC34AFF, 0xCDDC39FF, 0xFFEB3BFF,
    0xFFC107FF, 0xFF9800FF,
];

/// Projection and tint parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Near clip plane, metres.
    pub near: f32,
    /// Far clip plane, metres.
    pub far: f32,
    /// Depth range of the renderer's clip space.
    pub clip_depth: ClipDepth,
    /// Scale applied to the palette color channels.
    pub tint_intensity: f32,
    /// Alpha of the tint.
    pub tint_alpha: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            near: 0.1,
            far: 100.0,
            clip_depth: ClipDepth::NegativeOneToOne,
            tint_intensity: 0.1,
            tint_alpha: 1.0,
        }
    }
}

impl RenderSettings {
    /// Checks that the clip planes form a frustum and the tint is finite.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.near.is_finite() && self.near > 0.0) {
            return Err(format!("near plane must be positive, got {}", self.near));
        }
        if !(self.far.is_finite() && self.far > self.near) {
            return Err(format!(
                "far plane must lie beyond the near plane ({}), got {}",
                self.near, self.far
            ));
        }
        if !(self.tint_intensity.is_finite() && self.tint_alpha.is_finite()) {
            return Err("tint intensity and alpha must be finite".to_string());
        }
        Ok(())
    }

    /// Tint for a reference image index. Negative indices wrap like positive ones.
    pub fn tint_for(&self, image_index: i32) -> LinearRgba {
        let slot = image_index.rem_euclid(TINT_PALETTE.len() as i32) as usize;
        LinearRgba::from_rgba_u32(TINT_PALETTE[slot])
            .scale_rgb(self.tint_intensity)
            .with_alpha(self.tint_alpha)
    }
}

/// One tracked image, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedImageDraw {
    /// Trackable the anchor follows.
    pub trackable: TrackableId,
    /// Index of the matched reference image.
    pub image_index: i32,
    /// Reference image name, if known.
    pub name: Option<String>,
    /// Pose of the anchor.
    pub anchor_pose: Pose,
    /// Model matrix of the anchor (image center).
    pub model: Mat4,
    /// Physical extent of the image.
    pub extent: ImageExtent,
    /// Per-image tint.
    pub tint: LinearRgba,
    /// Model matrices of the frame corners: upper-left, upper-right,
    /// lower-right, lower-left.
    pub corners: [Mat4; 4],
}

impl AugmentedImageDraw {
    /// Uniform block for one corner piece.
    pub fn corner_uniforms(&self, corner: usize) -> ImageUniforms {
        ImageUniforms {
            model: self.corners[corner % 4].to_cols_array_2d(),
            tint: self.tint.to_array(),
        }
    }
}

/// Everything the renderer needs for a tick with augmented content.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    /// Frame this was built from.
    pub sequence: FrameSequence,
    /// World to camera.
    pub view: Mat4,
    /// Camera to clip.
    pub projection: Mat4,
    /// Texture holding the camera image for the background pass.
    pub camera_texture: TextureHandle,
    /// Light estimate color correction, white when unknown.
    pub color_correction: LinearRgba,
    /// Geometry the projection was built for.
    pub geometry: DisplayGeometry,
    /// Images to draw, ordered by trackable identifier.
    pub images: Vec<AugmentedImageDraw>,
}

impl RenderFrame {
    /// Uniform block shared by every draw of the tick.
    pub fn uniforms(&self) -> FrameUniforms {
        FrameUniforms {
            view: self.view.to_cols_array_2d(),
            projection: self.projection.to_cols_array_2d(),
            color_correction: self.color_correction.to_array(),
        }
    }
}

/// What to draw this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// Camera is tracking: background plus augmented images.
    Augmented(RenderFrame),
    /// Camera is not tracking: draw only the camera background.
    NothingToRender {
        /// Texture holding the camera image.
        camera_texture: TextureHandle,
    },
}

impl RenderOutcome {
    /// True when at least one image is drawn, so the shell can hide its scan hint.
    pub fn images_in_view(&self) -> bool {
        match self {
            Self::Augmented(frame) => !frame.images.is_empty(),
            Self::NothingToRender { .. } => false,
        }
    }

    /// Camera texture for the background pass.
    pub fn camera_texture(&self) -> TextureHandle {
        match self {
            Self::Augmented(frame) => frame.camera_texture,
            Self::NothingToRender { camera_texture } => *camera_texture,
        }
    }
}

/// Per-tick uniform block, laid out for direct upload.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    /// View matrix, column-major.
    pub view: [[f32; 4]; 4],
    /// Projection matrix, column-major.
    pub projection: [[f32; 4]; 4],
    /// Color correction.
    pub color_correction: [f32; 4],
}

impl FrameUniforms {
    /// Raw bytes for a uniform buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Per-draw uniform block for one corner piece of an image frame.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ImageUniforms {
    /// Model matrix, column-major.
    pub model: [[f32; 4]; 4],
    /// Tint color.
    pub tint: [f32; 4],
}

impl ImageUniforms {
    /// Raw bytes for a uniform buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Projection for a camera image shown on a viewport.
///
/// The image is rotated to the display orientation, then cropped to the
/// viewport's aspect ratio so it fills the screen without stretching.
///
/// Returns `None` for a non-positive focal length or clip planes that
/// [`RenderSettings::validate`] rejects.
pub fn projection_for(
    intrinsics: &CameraIntrinsics,
    geometry: &DisplayGeometry,
    settings: &RenderSettings,
) -> Option<Mat4> {
    settings.validate().ok()?;
    let k = intrinsics.for_display(geometry.rotation);
    let (fx, fy) = k.focal_length;
    if !(fx.is_finite() && fx > 0.0 && fy.is_finite() && fy > 0.0) {
        return None;
    }
    let (cx, cy) = k.principal_point;
    let (w, h) = (k.image_size.0 as f32, k.image_size.1 as f32);
    let near = settings.near;

    let mut left = -cx / fx * near;
    let mut right = (w - cx) / fx * near;
    let mut top = cy / fy * near;
    let mut bottom = -(h - cy) / fy * near;

    let image_aspect = k.aspect_ratio();
    let view_aspect = geometry.aspect_ratio();
    if image_aspect > view_aspect {
        let s = view_aspect / image_aspect;
        left *= s;
        right *= s;
    } else {
        let s = image_aspect / view_aspect;
        top *= s;
        bottom *= s;
    }

    Some(Mat4::frustum_rh(
        left,
        right,
        bottom,
        top,
        near,
        settings.far,
        settings.clip_depth,
    ))
}

/// Builds this tick's render data.
///
/// Returns [`RenderOutcome::NothingToRender`] unless the camera is tracking.
/// Only anchors whose trackable is currently `TRACKING` are drawn.
pub fn build_frame_for_render(
    frame: &Frame,
    anchors: &AnchorSnapshot,
    trackables: &TrackableRegistry,
    settings: &RenderSettings,
) -> RenderOutcome {
    if !frame.tracking_state().is_tracking() {
        return RenderOutcome::NothingToRender {
            camera_texture: frame.camera_texture(),
        };
    }

    let geometry = frame.geometry();
    let Some(projection) = projection_for(frame.intrinsics(), &geometry, settings) else {
        log::warn!(
            "No projection for frame {} (focal length {:?}).",
            frame.sequence(),
            frame.intrinsics().focal_length
        );
        return RenderOutcome::NothingToRender {
            camera_texture: frame.camera_texture(),
        };
    };
    let images = anchors
        .iter()
        .filter_map(|(id, anchor)| {
            let record = trackables.get(id).filter(|_| trackables.is_tracking(id))?;
            let model = anchor.pose.to_mat4();
            let corners = record
                .extent
                .corner_offsets()
                .map(|offset| model * Mat4::from_translation(offset));
            Some(AugmentedImageDraw {
                trackable: id.clone(),
                image_index: record.image_index,
                name: record.name.clone(),
                anchor_pose: anchor.pose,
                model,
                extent: record.extent,
                tint: settings.tint_for(record.image_index),
                corners,
            })
        })
        .collect();

    RenderOutcome::Augmented(RenderFrame {
        sequence: frame.sequence(),
        view: frame.camera_pose().inverse().to_mat4(),
        projection,
        camera_texture: frame.camera_texture(),
        color_correction: frame.light_estimate().color_correction(),
        geometry,
        images,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use lucent_core::math::{Vec3, Vec4};
    use lucent_core::{
        AnchorFactory, AnchorHandle, CameraTrackingState, DisplayRotation, LightEstimate,
        ProviderError, TrackableUpdate, TrackingFailureReason, TrackingState,
    };
    use lucent_tracking::AnchorPool;

    struct Handles(u64);

    impl AnchorFactory for Handles {
        fn create_anchor(
            &mut self,
            _trackable: &TrackableId,
            _pose: Pose,
        ) -> Result<AnchorHandle, ProviderError> {
            self.0 += 1;
            Ok(AnchorHandle(self.0))
        }

        fn release_anchor(&mut self, _handle: AnchorHandle) {}
    }

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0, 640, 480)
    }

    fn frame(state: CameraTrackingState, geometry: DisplayGeometry) -> Frame {
        Frame::new(
            FrameSequence(1),
            0,
            Pose::from_translation(Vec3::new(0.0, 0.0, 1.0)),
            state,
            intrinsics(),
            geometry,
            TextureHandle(3),
        )
    }

    fn tracked(updates: &[TrackableUpdate]) -> (TrackableRegistry, AnchorSnapshot) {
        let mut registry = TrackableRegistry::new();
        let mut pool = AnchorPool::new();
        let mut factory = Handles(0);
        let delta = registry.apply_updates(updates);
        for (id, pose) in &delta.started {
            pool.on_trackable_started(&mut factory, id, *pose);
        }
        (registry, pool.snapshot())
    }

    #[test]
    fn test_not_tracking_draws_only_background() {
        let (registry, anchors) = tracked(&[]);
        let f = frame(
            CameraTrackingState::Paused(TrackingFailureReason::ExcessiveMotion),
            DisplayGeometry::default(),
        );
        let outcome = build_frame_for_render(&f, &anchors, &registry, &RenderSettings::default());
        assert_eq!(
            outcome,
            RenderOutcome::NothingToRender {
                camera_texture: TextureHandle(3)
            }
        );
        assert!(!outcome.images_in_view());
    }

    #[test]
    fn test_tracked_image_gets_tint_and_corners() {
        let center = Pose::from_translation(Vec3::new(0.5, 0.0, -1.0));
        let update = TrackableUpdate::new(
            "img-1",
            17,
            TrackingState::Tracking,
            ImageExtent::new(0.4, 0.2),
            center,
        );
        let (registry, anchors) = tracked(&[update]);
        let f = frame(
            CameraTrackingState::Tracking,
            DisplayGeometry::new(DisplayRotation::Rotation0, 640, 480),
        );
        let outcome = build_frame_for_render(&f, &anchors, &registry, &RenderSettings::default());

        let RenderOutcome::Augmented(render) = outcome else {
            panic!("expected augmented output");
        };
        assert_eq!(render.images.len(), 1);
        let image = &render.images[0];
        // 17 % 16 == 1 -> 0xF44336.
        assert_abs_diff_eq!(image.tint.r, 0xF4 as f32 / 255.0 * 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(image.tint.b, 0x36 as f32 / 255.0 * 0.1, epsilon = 1e-6);
        assert_eq!(image.tint.a, 1.0);
        assert_abs_diff_eq!(
            image.corners[0].translation(),
            Vec3::new(0.3, 0.0, -1.1),
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            image.corners[2].translation(),
            Vec3::new(0.7, 0.0, -0.9),
            epsilon = 1e-6
        );
        assert_eq!(render.color_correction, LinearRgba::WHITE);
        assert_abs_diff_eq!(render.view.translation(), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_paused_image_is_not_drawn() {
        let update = TrackableUpdate::new(
            "img-1",
            0,
            TrackingState::Tracking,
            ImageExtent::new(0.2, 0.2),
            Pose::IDENTITY,
        );
        let (mut registry, anchors) = tracked(&[update.clone()]);
        registry.apply_updates(&[TrackableUpdate {
            state: TrackingState::Paused,
            ..update
        }]);
        let f = frame(CameraTrackingState::Tracking, DisplayGeometry::default())
            .with_light_estimate(LightEstimate::Valid(LinearRgba::new(0.8, 0.9, 1.0, 0.5)));
        let outcome = build_frame_for_render(&f, &anchors, &registry, &RenderSettings::default());
        assert!(!outcome.images_in_view());
        let RenderOutcome::Augmented(render) = outcome else {
            panic!("camera is tracking");
        };
        assert_eq!(render.color_correction.a, 0.5);
    }

    #[test]
    fn test_projection_crops_to_viewport_aspect() {
        let settings = RenderSettings::default();
        let same = projection_for(
            &intrinsics(),
            &DisplayGeometry::new(DisplayRotation::Rotation0, 640, 480),
            &settings,
        )
        .expect("valid projection");
        // fx / (w / 2) for a centered principal point.
        assert_abs_diff_eq!(same.cols[0].x, 500.0 / 320.0, epsilon = 1e-5);
        assert_abs_diff_eq!(same.cols[1].y, 500.0 / 240.0, epsilon = 1e-5);

        let square = projection_for(
            &intrinsics(),
            &DisplayGeometry::new(DisplayRotation::Rotation0, 480, 480),
            &settings,
        )
        .expect("valid projection");
        // Horizontal crop to 4:4 zooms x and leaves y alone.
        assert_abs_diff_eq!(square.cols[0].x, 500.0 / 240.0, epsilon = 1e-5);
        assert_abs_diff_eq!(square.cols[1].y, 500.0 / 240.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rotation_changes_projection() {
        let settings = RenderSettings::default();
        let portrait = projection_for(
            &intrinsics(),
            &DisplayGeometry::new(DisplayRotation::Rotation90, 480, 640),
            &settings,
        )
        .expect("valid projection");
        let landscape = projection_for(
            &intrinsics(),
            &DisplayGeometry::new(DisplayRotation::Rotation0, 640, 480),
            &settings,
        )
        .expect("valid projection");
        assert_abs_diff_eq!(portrait.cols[0].x, 500.0 / 240.0, epsilon = 1e-5);
        assert!(!portrait.abs_diff_eq(&landscape, 1e-3));
    }

    #[test]
    fn test_projection_depth_range() {
        let settings = RenderSettings {
            clip_depth: ClipDepth::ZeroToOne,
            ..Default::default()
        };
        let p = projection_for(&intrinsics(), &DisplayGeometry::default(), &settings)
            .expect("valid projection");
        let near = p * Vec4::new(0.0, 0.0, -settings.near, 1.0);
        assert_abs_diff_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_degenerate_intrinsics_have_no_projection() {
        let settings = RenderSettings::default();
        let geometry = DisplayGeometry::default();
        let flat = CameraIntrinsics::new(0.0, 500.0, 320.0, 240.0, 640, 480);
        assert!(projection_for(&flat, &geometry, &settings).is_none());
        let nan = CameraIntrinsics::new(500.0, f32::NAN, 320.0, 240.0, 640, 480);
        assert!(projection_for(&nan, &geometry, &settings).is_none());
    }

    #[test]
    fn test_invalid_clip_planes_have_no_projection() {
        let geometry = DisplayGeometry::default();
        for (near, far) in [(0.0, 100.0), (-1.0, 100.0), (5.0, 1.0), (1.0, 1.0)] {
            let settings = RenderSettings {
                near,
                far,
                ..Default::default()
            };
            assert!(settings.validate().is_err());
            assert!(projection_for(&intrinsics(), &geometry, &settings).is_none());
        }
    }

    #[test]
    fn test_zero_focal_length_draws_only_background() {
        let (registry, anchors) = tracked(&[]);
        let f = Frame::new(
            FrameSequence(2),
            0,
            Pose::IDENTITY,
            CameraTrackingState::Tracking,
            CameraIntrinsics::new(0.0, 0.0, 320.0, 240.0, 640, 480),
            DisplayGeometry::default(),
            TextureHandle(3),
        );
        let outcome = build_frame_for_render(&f, &anchors, &registry, &RenderSettings::default());
        assert_eq!(
            outcome,
            RenderOutcome::NothingToRender {
                camera_texture: TextureHandle(3)
            }
        );
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 144);
        assert_eq!(std::mem::size_of::<ImageUniforms>(), 80);
        let u = FrameUniforms {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            color_correction: [1.0; 4],
        };
        assert_eq!(u.as_bytes().len(), 144);
    }

    #[test]
    fn test_negative_index_wraps() {
        let settings = RenderSettings::default();
        assert_eq!(settings.tint_for(-1), settings.tint_for(15));
        assert_eq!(settings.tint_for(0).r, 0.0);
    }
}
