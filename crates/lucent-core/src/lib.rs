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

//! # Lucent Core
//!
//! Foundational crate containing the math primitives, tracking vocabulary,
//! provider contracts and error taxonomy shared by every other Lucent crate.
//!
//! Nothing in here talks to a real tracking service: the service is described by
//! the [`provider`] traits and implemented elsewhere (see `lucent-infra`).

#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod frame;
pub mod geometry;
pub mod math;
pub mod pose;
pub mod provider;
pub mod tracking;

pub use error::{LucentError, LucentResult, ProviderError, SessionUnavailableReason};
pub use frame::{Frame, FrameSequence, LightEstimate, TextureHandle};
pub use geometry::{CameraIntrinsics, DisplayGeometry, DisplayRotation};
pub use pose::Pose;
pub use provider::{
    AnchorFactory, AnchorHandle, ArSession, Availability, ImageDatabase, ReferenceImage,
    SessionConfig, TrackingProvider,
};
pub use tracking::{
    CameraTrackingState, ImageExtent, TrackableId, TrackableUpdate, TrackingFailureReason,
    TrackingState,
};
