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

use approx::assert_abs_diff_eq;
use lucent_core::math::{Quaternion, Vec3};
use lucent_core::{
    AnchorFactory, AnchorHandle, ImageExtent, Pose, ProviderError, TrackableId, TrackableUpdate,
    TrackingState,
};
use lucent_tracking::{AnchorPool, TrackableRegistry};
use std::collections::BTreeMap;

/// Factory that tracks which handles are live, like a real provider would.
#[derive(Default)]
struct LiveSet {
    next: u64,
    live: BTreeMap<AnchorHandle, TrackableId>,
    created: usize,
}

impl AnchorFactory for LiveSet {
    fn create_anchor(
        &mut self,
        trackable: &TrackableId,
        _pose: Pose,
    ) -> Result<AnchorHandle, ProviderError> {
        self.next += 1;
        self.created += 1;
        let handle = AnchorHandle(self.next);
        self.live.insert(handle, trackable.clone());
        Ok(handle)
    }

    fn release_anchor(&mut self, handle: AnchorHandle) {
        self.live.remove(&handle);
    }
}

fn update(id: &str, state: TrackingState, pose: Pose) -> TrackableUpdate {
    TrackableUpdate::new(id, 0, state, ImageExtent::new(0.3, 0.2), pose)
}

fn drive(
    registry: &mut TrackableRegistry,
    pool: &mut AnchorPool,
    factory: &mut LiveSet,
    updates: &[TrackableUpdate],
) {
    let delta = registry.apply_updates(updates);
    for (id, pose) in &delta.started {
        pool.on_trackable_started(factory, id, *pose);
    }
    for id in &delta.stopped {
        pool.on_trackable_stopped(factory, id);
    }
}

#[test]
fn test_single_image_anchor_then_release() {
    let mut registry = TrackableRegistry::new();
    let mut pool = AnchorPool::new();
    let mut factory = LiveSet::default();
    let p1 = Pose::new(
        Quaternion::from_axis_angle(Vec3::Y, 0.4),
        Vec3::new(0.1, -0.2, -0.8),
    );

    drive(
        &mut registry,
        &mut pool,
        &mut factory,
        &[update("img-1", TrackingState::Tracking, p1)],
    );
    let snapshot = pool.snapshot();
    assert_eq!(snapshot.len(), 1);
    let anchor = snapshot.get(&TrackableId::new("img-1")).expect("anchored");
    assert_abs_diff_eq!(anchor.pose, p1);

    drive(
        &mut registry,
        &mut pool,
        &mut factory,
        &[update("img-1", TrackingState::Stopped, p1)],
    );
    assert!(pool.snapshot().is_empty());
    assert!(factory.live.is_empty());
    // The earlier snapshot still shows what was drawn that tick.
    assert_eq!(snapshot.len(), 1);
}

#[test]
fn test_never_two_anchors_per_trackable() {
    let mut registry = TrackableRegistry::new();
    let mut pool = AnchorPool::new();
    let mut factory = LiveSet::default();
    let states = [
        TrackingState::Tracking,
        TrackingState::Paused,
        TrackingState::Tracking,
        TrackingState::Tracking,
        TrackingState::Paused,
        TrackingState::Tracking,
    ];

    for (tick, state) in states.iter().enumerate() {
        let pose = Pose::from_translation(Vec3::new(tick as f32, 0.0, 0.0));
        drive(
            &mut registry,
            &mut pool,
            &mut factory,
            &[update("a", *state, pose), update("b", *state, pose)],
        );
        assert!(pool.len() <= 2);
        let per_trackable = factory.live.values().filter(|id| id.as_str() == "a").count();
        assert!(per_trackable <= 1);
    }
    assert_eq!(factory.created, 2);
}

#[test]
fn test_stopped_trackable_never_returns() {
    let mut registry = TrackableRegistry::new();
    let mut pool = AnchorPool::new();
    let mut factory = LiveSet::default();
    let mut starts = 0;
    let mut stops = 0;

    for state in [
        TrackingState::Tracking,
        TrackingState::Stopped,
        TrackingState::Tracking,
        TrackingState::Paused,
        TrackingState::Stopped,
    ] {
        let delta = registry.apply_updates(&[update("img-1", state, Pose::IDENTITY)]);
        starts += delta.started.len();
        stops += delta.stopped.len();
        for (id, pose) in &delta.started {
            pool.on_trackable_started(&mut factory, id, *pose);
        }
        for id in &delta.stopped {
            pool.on_trackable_stopped(&mut factory, id);
        }
    }

    assert_eq!((starts, stops), (1, 1));
    assert_eq!(factory.created, 1);
    assert!(pool.is_empty());
}
