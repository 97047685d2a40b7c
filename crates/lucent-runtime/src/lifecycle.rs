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

//! Session start, pause, resume and teardown.

use crate::session_cell::{LifecycleState, SessionCell, SessionSlot};
use crate::synchronizer::FrameSynchronizer;
use lucent_core::{
    Availability, DisplayGeometry, DisplayRotation, LucentError, LucentResult, ProviderError,
    SessionConfig, SessionUnavailableReason, TrackingProvider,
};
use std::sync::Arc;

const CAMERA_HINT: &str = "the camera is in use by another app; close it and resume";

/// Owns the tracking session and enforces the lifecycle state machine.
///
/// `UNINITIALIZED → RUNNING ⇄ PAUSED → DESTROYED`. Every call after `DESTROYED`
/// fails with [`LucentError::InvalidState`].
pub struct LifecycleController {
    provider: Arc<dyn TrackingProvider>,
    session_config: SessionConfig,
    cell: Arc<SessionCell>,
    install_requested: bool,
}

impl LifecycleController {
    /// Creates a controller in `UNINITIALIZED`. No provider call is made yet.
    pub fn new(provider: Arc<dyn TrackingProvider>, session_config: SessionConfig) -> Self {
        let cell = Arc::new(SessionCell::new(
            session_config.camera_texture,
            session_config.display_geometry,
        ));
        Self {
            provider,
            session_config,
            cell,
            install_requested: false,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.cell.lock().state
    }

    /// A synchronizer bound to this controller's session, for the render thread.
    pub fn frame_synchronizer(&self) -> FrameSynchronizer {
        FrameSynchronizer::new(Arc::clone(&self.cell))
    }

    /// Creates, configures and resumes the session.
    ///
    /// From `PAUSED` or `RUNNING` this is a no-op. If the provider starts an install
    /// flow the controller stays `UNINITIALIZED` and `start` can be called again.
    /// If the session is created but the camera is busy, the controller ends up
    /// `PAUSED` and the error is [`LucentError::CameraUnavailable`].
    pub fn start(&mut self) -> LucentResult<()> {
        let mut slot = self.cell.lock();
        match slot.state {
            LifecycleState::Uninitialized => {}
            LifecycleState::Running | LifecycleState::Paused => {
                log::debug!("start() ignored, session already {}.", slot.state);
                return Ok(());
            }
            LifecycleState::Destroyed => return Err(invalid("start", slot.state)),
        }

        match self.provider.check_availability(!self.install_requested) {
            Availability::Supported => {}
            Availability::InstallRequested => {
                self.install_requested = true;
                log::info!("Tracking service install requested, start deferred.");
                return Err(LucentError::SessionUnavailable {
                    reason: SessionUnavailableReason::InstallPending,
                });
            }
            Availability::Unsupported => {
                log::error!("Tracking is not supported on this device.");
                return Err(LucentError::SessionUnavailable {
                    reason: SessionUnavailableReason::Unsupported(
                        "provider reported the device as unsupported".to_string(),
                    ),
                });
            }
        }

        let mut config = self.session_config.clone();
        config.display_geometry = self.cell.settle_geometry();

        let mut session = self.provider.create_session(&config).map_err(|e| {
            log::error!("Session creation failed: {e}");
            LucentError::from_session_creation(e)
        })?;
        let resumed = session.resume();
        slot.session = Some(session);

        match resumed {
            Ok(()) => {
                slot.state = LifecycleState::Running;
                log::info!("Session started.");
                Ok(())
            }
            Err(e) => {
                slot.state = LifecycleState::Paused;
                log::warn!("Session created but not resumed: {e}");
                Err(resume_error(e))
            }
        }
    }

    /// Suspends the session and releases the camera. Idempotent.
    pub fn pause(&mut self) -> LucentResult<()> {
        let mut slot = self.cell.lock();
        match slot.state {
            LifecycleState::Running => {
                if let Some(session) = slot.session.as_mut() {
                    session.pause();
                }
                slot.state = LifecycleState::Paused;
                log::info!("Session paused.");
                Ok(())
            }
            LifecycleState::Paused => Ok(()),
            LifecycleState::Uninitialized => {
                log::debug!("pause() before start(), nothing to do.");
                Ok(())
            }
            LifecycleState::Destroyed => Err(invalid("pause", slot.state)),
        }
    }

    /// Restarts camera capture.
    ///
    /// A busy camera is reported as [`LucentError::CameraUnavailable`] and the
    /// controller stays `PAUSED`; it is never retried here.
    pub fn resume(&mut self) -> LucentResult<()> {
        let mut guard = self.cell.lock();
        let slot = &mut *guard;
        match slot.state {
            LifecycleState::Paused => {}
            LifecycleState::Running => return Ok(()),
            state => return Err(invalid("resume", state)),
        }

        let Some(session) = slot.session.as_mut() else {
            return Err(invalid("resume", LifecycleState::Paused));
        };
        match session.resume() {
            Ok(()) => {
                slot.state = LifecycleState::Running;
                log::info!("Session resumed.");
                Ok(())
            }
            Err(e) => {
                log::warn!("Session resume failed: {e}");
                Err(resume_error(e))
            }
        }
    }

    /// Pauses if needed and drops the session. Terminal.
    pub fn destroy(&mut self) -> LucentResult<()> {
        let mut slot = self.cell.lock();
        if slot.state == LifecycleState::Destroyed {
            return Err(invalid("destroy", slot.state));
        }
        teardown(&mut slot);
        self.cell.mark_destroyed();
        log::info!("Session destroyed.");
        Ok(())
    }

    /// Queues a viewport change for the next session update.
    ///
    /// Never blocks and can be called from any thread, including during a tick;
    /// the frame being processed keeps the geometry it was produced with.
    pub fn on_display_geometry_changed(&self, rotation: DisplayRotation, width: u32, height: u32) {
        queue_geometry(&self.cell, rotation, width, height);
    }

    /// Handle that can report geometry changes from another thread.
    pub fn geometry_notifier(&self) -> GeometryNotifier {
        GeometryNotifier {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        let mut slot = self.cell.lock();
        if slot.state != LifecycleState::Destroyed {
            teardown(&mut slot);
            self.cell.mark_destroyed();
        }
    }
}

/// Cloneable, thread-safe sender of display geometry changes.
#[derive(Clone)]
pub struct GeometryNotifier {
    cell: Arc<SessionCell>,
}

impl GeometryNotifier {
    /// Same as [`LifecycleController::on_display_geometry_changed`].
    pub fn notify(&self, rotation: DisplayRotation, width: u32, height: u32) {
        queue_geometry(&self.cell, rotation, width, height);
    }
}

fn queue_geometry(cell: &SessionCell, rotation: DisplayRotation, width: u32, height: u32) {
    if cell.is_destroyed() {
        log::error!(
            "{}",
            invalid("change display geometry", LifecycleState::Destroyed)
        );
        return;
    }
    let geometry = DisplayGeometry::new(rotation, width, height);
    log::debug!(
        "Display geometry changed: {}x{} at {} degrees.",
        geometry.width,
        geometry.height,
        rotation.degrees()
    );
    cell.push_geometry(geometry);
}

fn teardown(slot: &mut SessionSlot) {
    if let Some(mut session) = slot.session.take() {
        if slot.state == LifecycleState::Running {
            session.pause();
        }
    }
    slot.state = LifecycleState::Destroyed;
}

fn invalid(operation: &'static str, state: LifecycleState) -> LucentError {
    LucentError::InvalidState {
        operation,
        state: state.to_string(),
    }
}

fn resume_error(error: ProviderError) -> LucentError {
    match error {
        ProviderError::CameraUnavailable => LucentError::CameraUnavailable {
            hint: CAMERA_HINT.to_string(),
        },
        other => LucentError::from_session_creation(other),
    }
}
