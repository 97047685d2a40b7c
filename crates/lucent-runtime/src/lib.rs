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

//! Session lifecycle, per-tick frame synchronization and render packaging.
//!
//! The UI thread owns a [`LifecycleController`]; the render thread owns a
//! [`FrameLoop`] built from the controller's [`FrameSynchronizer`]. The two
//! share only the session cell, and the render side never blocks on it.

#![warn(missing_docs)]

pub mod app;
pub mod config;
pub mod frame_loop;
pub mod lifecycle;
pub mod render_bridge;
mod session_cell;
pub mod synchronizer;

pub use app::AugmentedImageApp;
pub use config::{ConfigError, ImageDatabaseSource, LucentConfig, RawImageEntry, SessionSettings};
pub use frame_loop::{FrameLoop, TickOutcome};
pub use lifecycle::{GeometryNotifier, LifecycleController};
pub use render_bridge::{
    build_frame_for_render, projection_for, AugmentedImageDraw, FrameUniforms, ImageUniforms,
    RenderFrame, RenderOutcome, RenderSettings, TINT_PALETTE,
};
pub use session_cell::LifecycleState;
pub use synchronizer::{FrameAcquisition, FrameSynchronizer, NoFrameReason};
