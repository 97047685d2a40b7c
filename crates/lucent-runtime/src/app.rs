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

//! A single owned value tying the lifecycle controller to the frame loop.

use crate::config::{ConfigError, LucentConfig};
use crate::frame_loop::{FrameLoop, TickOutcome};
use crate::lifecycle::{GeometryNotifier, LifecycleController};
use crate::render_bridge::RenderSettings;
use crate::session_cell::LifecycleState;
use lucent_core::{DisplayRotation, LucentResult, SessionConfig, TrackingProvider};
use lucent_telemetry::{MetricsRegistry, SessionTelemetry};
use std::path::Path;
use std::sync::Arc;

/// An augmented-image application as seen by a host shell.
///
/// The shell forwards its lifecycle callbacks and draws once per display
/// refresh. Shells that render on a dedicated thread should use
/// [`AugmentedImageApp::into_parts`] and move the [`FrameLoop`] there.
pub struct AugmentedImageApp {
    controller: LifecycleController,
    frame_loop: FrameLoop,
    images_in_view: bool,
}

impl AugmentedImageApp {
    /// Creates an app over `provider`. No provider call is made yet.
    pub fn new(
        provider: Arc<dyn TrackingProvider>,
        session_config: SessionConfig,
        settings: RenderSettings,
        telemetry: SessionTelemetry,
    ) -> Self {
        let controller = LifecycleController::new(provider, session_config);
        let frame_loop = FrameLoop::new(controller.frame_synchronizer(), settings, telemetry);
        Self {
            controller,
            frame_loop,
            images_in_view: false,
        }
    }

    /// Creates an app from a loaded configuration.
    ///
    /// Relative image paths in the configuration are resolved against `base_dir`.
    pub fn from_config(
        provider: Arc<dyn TrackingProvider>,
        config: &LucentConfig,
        base_dir: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let session_config = config.session_config(base_dir)?;
        let telemetry = SessionTelemetry::new(
            Arc::new(MetricsRegistry::new()),
            config.telemetry.summary_interval_ticks,
        );
        Ok(Self::new(provider, session_config, config.render, telemetry))
    }

    /// Foreground callback: starts the session the first time, resumes it after.
    pub fn on_resume(&mut self) -> LucentResult<()> {
        match self.controller.state() {
            LifecycleState::Uninitialized => self.controller.start(),
            _ => self.controller.resume(),
        }
    }

    /// Background callback.
    pub fn on_pause(&mut self) -> LucentResult<()> {
        self.controller.pause()
    }

    /// Releases every anchor, then destroys the session.
    pub fn on_destroy(&mut self) -> LucentResult<()> {
        self.frame_loop.release_anchors();
        self.images_in_view = false;
        self.controller.destroy()
    }

    /// Viewport change callback. Safe to call at any time.
    pub fn on_display_geometry_changed(&self, rotation: DisplayRotation, width: u32, height: u32) {
        self.controller
            .on_display_geometry_changed(rotation, width, height);
    }

    /// Runs one render tick.
    pub fn on_draw_frame(&mut self) -> LucentResult<TickOutcome> {
        let outcome = self.frame_loop.tick()?;
        if let TickOutcome::Rendered(rendered) = &outcome {
            let in_view = rendered.images_in_view();
            if in_view != self.images_in_view {
                log::debug!("Images in view: {in_view}.");
            }
            self.images_in_view = in_view;
        }
        Ok(outcome)
    }

    /// Whether the "fit an image in the frame" hint should be shown.
    ///
    /// Skipped ticks keep the previous answer.
    pub fn show_fit_hint(&self) -> bool {
        !self.images_in_view
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.controller.state()
    }

    /// Handle for reporting geometry changes from another thread.
    pub fn geometry_notifier(&self) -> GeometryNotifier {
        self.controller.geometry_notifier()
    }

    /// The lifecycle controller.
    pub fn controller(&self) -> &LifecycleController {
        &self.controller
    }

    /// The frame loop.
    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    /// Splits the app for shells that render on their own thread.
    pub fn into_parts(self) -> (LifecycleController, FrameLoop) {
        (self.controller, self.frame_loop)
    }
}
