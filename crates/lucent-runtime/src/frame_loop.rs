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

//! The render-tick entry point.

use crate::render_bridge::{build_frame_for_render, RenderOutcome, RenderSettings};
use crate::synchronizer::{FrameAcquisition, FrameSynchronizer, NoFrameReason};
use lucent_core::{LucentResult, Pose, TrackableId, TrackableUpdate};
use lucent_telemetry::SessionTelemetry;
use lucent_tracking::{AnchorOutcome, AnchorPool, RegistryDelta, TrackableRegistry};

/// Result of one [`FrameLoop::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No new frame; redraw the previous output or skip.
    NoFrame(NoFrameReason),
    /// A frame was consumed.
    Rendered(RenderOutcome),
}

/// Drives `acquire → registry → anchors → render bridge` once per tick.
///
/// Owns the registry and the anchor pool; it lives on the render thread and
/// nothing else touches them.
pub struct FrameLoop {
    synchronizer: FrameSynchronizer,
    registry: TrackableRegistry,
    pool: AnchorPool,
    settings: RenderSettings,
    telemetry: SessionTelemetry,
    pending: RegistryDelta,
}

impl FrameLoop {
    /// Creates a loop over `synchronizer`.
    pub fn new(
        synchronizer: FrameSynchronizer,
        settings: RenderSettings,
        telemetry: SessionTelemetry,
    ) -> Self {
        Self {
            synchronizer,
            registry: TrackableRegistry::new(),
            pool: AnchorPool::new(),
            settings,
            telemetry,
            pending: RegistryDelta::default(),
        }
    }

    /// Runs one tick. Never blocks.
    pub fn tick(&mut self) -> LucentResult<TickOutcome> {
        self.telemetry.record_tick();

        let mut frame = match self.synchronizer.acquire_frame() {
            Ok(FrameAcquisition::Frame(frame)) => frame,
            Ok(FrameAcquisition::NoFrame(reason)) => {
                self.telemetry.record_no_frame();
                return Ok(TickOutcome::NoFrame(reason));
            }
            Err(e) => {
                self.telemetry.record_frame_unavailable();
                return Err(e);
            }
        };
        self.telemetry.record_frame();

        let updates = frame.take_trackables();
        self.queue_transitions(&updates);
        self.apply_anchor_changes();

        let outcome = build_frame_for_render(
            &frame,
            &self.pool.snapshot(),
            &self.registry,
            &self.settings,
        );
        if outcome.images_in_view() {
            self.telemetry.record_augmented();
        }
        Ok(TickOutcome::Rendered(outcome))
    }

    fn queue_transitions(&mut self, updates: &[TrackableUpdate]) {
        let delta = self.registry.apply_updates(updates);
        self.pending.started.extend(delta.started);
        self.pending.stopped.extend(delta.stopped);
    }

    /// Creates and releases anchors for this tick's transitions.
    ///
    /// If the session is momentarily held by a lifecycle transition the
    /// transitions stay queued for the next tick.
    fn apply_anchor_changes(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let started: Vec<(TrackableId, Pose)> = std::mem::take(&mut self.pending.started);
        let stopped: Vec<TrackableId> = std::mem::take(&mut self.pending.stopped);
        let pool = &mut self.pool;
        let registry = &self.registry;

        let applied = self.synchronizer.with_anchor_factory(|factory| {
            let (mut created, mut rejected, mut released) = (0, 0, 0);
            for (id, pose) in &started {
                // A start queued behind a lifecycle transition may be outdated.
                if !registry.is_tracking(id) {
                    continue;
                }
                match pool.on_trackable_started(factory, id, *pose) {
                    AnchorOutcome::Created(_) => created += 1,
                    AnchorOutcome::AlreadyAnchored(_) => {}
                    AnchorOutcome::Rejected(_) => rejected += 1,
                }
            }
            for id in &stopped {
                if pool.on_trackable_stopped(factory, id).is_some() {
                    released += 1;
                }
            }
            (created, rejected, released)
        });

        match applied {
            Some((created, rejected, released)) => {
                self.telemetry.record_anchors_created(created);
                self.telemetry.record_anchors_rejected(rejected);
                self.telemetry.record_anchors_released(released);
            }
            None => {
                log::debug!("Session busy, deferring anchor changes.");
                self.pending.started = started;
                self.pending.stopped = stopped;
            }
        }
    }

    /// Releases every anchor, for teardown before the session is destroyed.
    pub fn release_anchors(&mut self) -> usize {
        let pool = &mut self.pool;
        let Some(released) = self
            .synchronizer
            .with_anchor_factory(|factory| pool.release_all(factory))
        else {
            log::warn!("No session available to release {} anchors.", self.pool.len());
            return 0;
        };
        self.telemetry.record_anchors_released(released as u64);
        self.registry.clear();
        self.pending = RegistryDelta::default();
        released
    }

    /// The trackable registry.
    pub fn registry(&self) -> &TrackableRegistry {
        &self.registry
    }

    /// The anchor pool.
    pub fn anchors(&self) -> &AnchorPool {
        &self.pool
    }

    /// Session counters.
    pub fn telemetry(&self) -> &SessionTelemetry {
        &self.telemetry
    }

    /// The frame synchronizer.
    pub fn synchronizer(&self) -> &FrameSynchronizer {
        &self.synchronizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleController;
    use lucent_core::{ImageExtent, SessionConfig, TrackingState};
    use lucent_infra::{FrameSpec, ScriptedProvider};
    use std::sync::Arc;

    fn running_loop() -> (LifecycleController, FrameLoop, ScriptedProvider) {
        let provider = ScriptedProvider::new();
        let mut controller =
            LifecycleController::new(Arc::new(provider.clone()), SessionConfig::default());
        controller.start().expect("scripted provider starts");
        let frame_loop = FrameLoop::new(
            controller.frame_synchronizer(),
            RenderSettings::default(),
            SessionTelemetry::default(),
        );
        (controller, frame_loop, provider)
    }

    fn image(state: TrackingState) -> TrackableUpdate {
        TrackableUpdate::new(
            "img-1",
            0,
            state,
            ImageExtent::new(0.2, 0.3),
            Pose::IDENTITY,
        )
    }

    #[test]
    fn test_busy_session_defers_anchor_creation_to_the_next_tick() {
        let (_controller, mut frame_loop, provider) = running_loop();
        let script = provider.handle();
        let cell = frame_loop.synchronizer.session_cell();

        {
            let _held = cell.lock();
            frame_loop.queue_transitions(&[image(TrackingState::Tracking)]);
            frame_loop.apply_anchor_changes();
        }
        assert!(frame_loop.anchors().is_empty());
        assert_eq!(frame_loop.pending.started.len(), 1);
        assert!(script.live_anchors().is_empty());

        script.push_frame(FrameSpec::tracking(Pose::IDENTITY));
        assert!(matches!(frame_loop.tick(), Ok(TickOutcome::Rendered(_))));

        assert!(frame_loop.pending.is_empty());
        assert_eq!(frame_loop.anchors().len(), 1);
        assert_eq!(script.live_anchors().len(), 1);
        assert_eq!(frame_loop.telemetry().snapshot().anchors_created, 1);
    }

    #[test]
    fn test_start_then_stop_while_busy_leaves_no_anchor() {
        let (_controller, mut frame_loop, provider) = running_loop();
        let script = provider.handle();
        let cell = frame_loop.synchronizer.session_cell();

        {
            let _held = cell.lock();
            frame_loop.queue_transitions(&[image(TrackingState::Tracking)]);
            frame_loop.apply_anchor_changes();
            frame_loop.queue_transitions(&[image(TrackingState::Stopped)]);
            frame_loop.apply_anchor_changes();
        }
        assert_eq!(frame_loop.pending.started.len(), 1);
        assert_eq!(frame_loop.pending.stopped.len(), 1);

        script.push_frame(FrameSpec::tracking(Pose::IDENTITY));
        assert!(matches!(frame_loop.tick(), Ok(TickOutcome::Rendered(_))));

        assert!(frame_loop.pending.is_empty());
        assert!(frame_loop.anchors().is_empty());
        assert!(script.live_anchors().is_empty());
        assert_eq!(script.stats().anchors_created, 0);
    }

    #[test]
    fn test_start_outdated_by_pause_is_skipped() {
        let (_controller, mut frame_loop, provider) = running_loop();
        let script = provider.handle();
        let cell = frame_loop.synchronizer.session_cell();

        {
            let _held = cell.lock();
            frame_loop.queue_transitions(&[image(TrackingState::Tracking)]);
            frame_loop.queue_transitions(&[image(TrackingState::Paused)]);
            frame_loop.apply_anchor_changes();
        }

        script.push_frame(FrameSpec::tracking(Pose::IDENTITY));
        assert!(matches!(frame_loop.tick(), Ok(TickOutcome::Rendered(_))));
        assert!(frame_loop.pending.is_empty());
        assert!(frame_loop.anchors().is_empty());
        assert_eq!(script.stats().anchors_created, 0);
    }
}
