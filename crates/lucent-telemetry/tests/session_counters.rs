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

use lucent_telemetry::{MetricId, MetricsRegistry, SessionTelemetry, TelemetrySnapshot};
use std::sync::Arc;

#[test]
fn test_session_counters_land_in_registry() {
    let registry = Arc::new(MetricsRegistry::new());
    let telemetry = SessionTelemetry::new(registry.clone(), 2);

    telemetry.record_tick();
    telemetry.record_frame();
    telemetry.record_tick();
    telemetry.record_no_frame();
    telemetry.record_anchors_created(2);
    telemetry.record_anchors_released(1);

    assert_eq!(
        telemetry.snapshot(),
        TelemetrySnapshot {
            ticks: 2,
            frames: 1,
            no_frames: 1,
            anchors_created: 2,
            anchors_released: 1,
            ..Default::default()
        }
    );
    assert_eq!(
        registry.counter_value(&MetricId::new("anchors", "created")),
        Some(2)
    );
    assert_eq!(registry.metric_count(), 8);
}

#[test]
fn test_clones_share_counters() {
    let telemetry = SessionTelemetry::default();
    let render_side = telemetry.clone();
    render_side.record_frame_unavailable();
    assert_eq!(telemetry.snapshot().frame_unavailable, 1);
}
