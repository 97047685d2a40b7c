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

//! Per-session counters for the frame loop.

use crate::metrics::{CounterHandle, MetricsRegistry};
use std::sync::Arc;

/// Counter values at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    /// Render ticks run.
    pub ticks: u64,
    /// Frames acquired from the session.
    pub frames: u64,
    /// Ticks that got no new frame.
    pub no_frames: u64,
    /// Ticks where the provider failed to produce a frame.
    pub frame_unavailable: u64,
    /// Ticks drawn with augmented images.
    pub augmented: u64,
    /// Anchors created.
    pub anchors_created: u64,
    /// Anchors released.
    pub anchors_released: u64,
    /// Anchor creations the provider refused.
    pub anchors_rejected: u64,
}

/// The counters a frame loop updates each tick.
#[derive(Debug, Clone)]
pub struct SessionTelemetry {
    registry: Arc<MetricsRegistry>,
    ticks: CounterHandle,
    frames: CounterHandle,
    no_frames: CounterHandle,
    frame_unavailable: CounterHandle,
    augmented: CounterHandle,
    anchors_created: CounterHandle,
    anchors_released: CounterHandle,
    anchors_rejected: CounterHandle,
    summary_interval_ticks: u64,
}

impl SessionTelemetry {
    /// Registers the session counters in `registry`.
    pub fn new(registry: Arc<MetricsRegistry>, summary_interval_ticks: u64) -> Self {
        Self {
            ticks: registry.register_counter("frames", "ticks"),
            frames: registry.register_counter("frames", "acquired"),
            no_frames: registry.register_counter("frames", "no_frame"),
            frame_unavailable: registry.register_counter("frames", "unavailable"),
            augmented: registry.register_counter("render", "augmented"),
            anchors_created: registry.register_counter("anchors", "created"),
            anchors_released: registry.register_counter("anchors", "released"),
            anchors_rejected: registry.register_counter("anchors", "rejected"),
            registry,
            summary_interval_ticks,
        }
    }

    /// Counts a tick, and logs a summary on every `summary_interval_ticks`-th one.
    pub fn record_tick(&self) {
        self.ticks.increment();
        let ticks = self.ticks.get();
        if self.summary_interval_ticks > 0 && ticks % self.summary_interval_ticks == 0 {
            self.log_summary();
        }
    }

    /// Counts an acquired frame.
    pub fn record_frame(&self) {
        self.frames.increment();
    }

    /// Counts a tick without a new frame.
    pub fn record_no_frame(&self) {
        self.no_frames.increment();
    }

    /// Counts a provider failure.
    pub fn record_frame_unavailable(&self) {
        self.frame_unavailable.increment();
    }

    /// Counts a tick that produced augmented images.
    pub fn record_augmented(&self) {
        self.augmented.increment();
    }

    /// Counts created anchors.
    pub fn record_anchors_created(&self, n: u64) {
        self.anchors_created.add(n);
    }

    /// Counts released anchors.
    pub fn record_anchors_released(&self, n: u64) {
        self.anchors_released.add(n);
    }

    /// Counts refused anchor creations.
    pub fn record_anchors_rejected(&self, n: u64) {
        self.anchors_rejected.add(n);
    }

    /// Current counter values.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            ticks: self.ticks.get(),
            frames: self.frames.get(),
            no_frames: self.no_frames.get(),
            frame_unavailable: self.frame_unavailable.get(),
            augmented: self.augmented.get(),
            anchors_created: self.anchors_created.get(),
            anchors_released: self.anchors_released.get(),
            anchors_rejected: self.anchors_rejected.get(),
        }
    }

    /// The backing registry.
    pub fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.registry
    }

    /// Logs every counter at info level.
    pub fn log_summary(&self) {
        let s = self.snapshot();
        log::info!(
            "ticks={} frames={} no_frame={} unavailable={} augmented={} anchors(+{} -{} !{})",
            s.ticks,
            s.frames,
            s.no_frames,
            s.frame_unavailable,
            s.augmented,
            s.anchors_created,
            s.anchors_released,
            s.anchors_rejected
        );
    }
}

impl Default for SessionTelemetry {
    fn default() -> Self {
        Self::new(Arc::new(MetricsRegistry::new()), 0)
    }
}
