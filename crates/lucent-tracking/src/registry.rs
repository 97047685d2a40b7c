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

//! Bookkeeping of detected image trackables and their state transitions.

use lucent_core::{ImageExtent, Pose, TrackableId, TrackableUpdate, TrackingState};
use std::collections::BTreeMap;

/// Last known state of a registered trackable.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackableRecord {
    /// Stable identifier.
    pub id: TrackableId,
    /// Index of the matched reference image.
    pub image_index: i32,
    /// Reference image name, if known.
    pub name: Option<String>,
    /// Current state.
    pub state: TrackingState,
    /// Estimated extent.
    pub extent: ImageExtent,
    /// Latest center pose.
    pub center_pose: Pose,
}

impl TrackableRecord {
    fn from_update(update: &TrackableUpdate) -> Self {
        Self {
            id: update.id.clone(),
            image_index: update.image_index,
            name: update.name.clone(),
            state: update.state,
            extent: update.extent,
            center_pose: update.center_pose,
        }
    }
}

/// Identifiers that changed state during one [`TrackableRegistry::apply_updates`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryDelta {
    /// Trackables that entered `TRACKING`, with the pose to anchor at.
    pub started: Vec<(TrackableId, Pose)>,
    /// Trackables that reached `STOPPED`.
    pub stopped: Vec<TrackableId>,
}

impl RegistryDelta {
    /// True when nothing started or stopped.
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.stopped.is_empty()
    }
}

/// Folds per-frame trackable updates into a keyed record set.
///
/// Stopped trackables keep a tombstone so that late reports for them are
/// ignored instead of re-registering the image.
#[derive(Debug, Default)]
pub struct TrackableRegistry {
    records: BTreeMap<TrackableId, TrackableRecord>,
}

impl TrackableRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one frame's updates and reports the transitions they caused.
    ///
    /// Updates are applied in order, so a trackable that appears twice in the
    /// same batch ends in the state of its last update.
    pub fn apply_updates(&mut self, updates: &[TrackableUpdate]) -> RegistryDelta {
        let mut delta = RegistryDelta::default();

        for update in updates {
            match self.records.get_mut(&update.id) {
                None => match update.state {
                    TrackingState::Tracking => {
                        log::debug!(
                            "Trackable {} (image {}) started tracking.",
                            update.id,
                            update.image_index
                        );
                        self.records
                            .insert(update.id.clone(), TrackableRecord::from_update(update));
                        delta.started.push((update.id.clone(), update.center_pose));
                    }
                    TrackingState::Paused => {
                        log::info!(
                            "Detected image {} ({}).",
                            update.image_index,
                            update.name.as_deref().unwrap_or("unnamed")
                        );
                    }
                    TrackingState::Stopped => {
                        log::trace!("Ignoring stop for unknown trackable {}.", update.id);
                    }
                },
                Some(record) if record.state == TrackingState::Stopped => {
                    log::trace!("Ignoring update for stopped trackable {}.", update.id);
                }
                Some(record) => {
                    let previous = record.state;
                    record.state = update.state;
                    record.extent = update.extent;
                    record.center_pose = update.center_pose;
                    if update.name.is_some() {
                        record.name = update.name.clone();
                    }

                    match (previous, update.state) {
                        (_, TrackingState::Stopped) => {
                            log::debug!("Trackable {} stopped.", update.id);
                            delta.stopped.push(update.id.clone());
                        }
                        (TrackingState::Paused, TrackingState::Tracking) => {
                            log::debug!("Trackable {} resumed tracking.", update.id);
                            delta.started.push((update.id.clone(), update.center_pose));
                        }
                        _ => {}
                    }
                }
            }
        }

        delta
    }

    /// Looks up a trackable, including stopped ones.
    pub fn get(&self, id: &TrackableId) -> Option<&TrackableRecord> {
        self.records.get(id)
    }

    /// Whether `id` is currently `TRACKING`.
    pub fn is_tracking(&self, id: &TrackableId) -> bool {
        self.records
            .get(id)
            .is_some_and(|r| r.state == TrackingState::Tracking)
    }

    /// Trackables currently `TRACKING`, ordered by identifier.
    pub fn tracking(&self) -> impl Iterator<Item = &TrackableRecord> {
        self.records
            .values()
            .filter(|r| r.state == TrackingState::Tracking)
    }

    /// Number of registered trackables that have not stopped.
    pub fn len(&self) -> usize {
        self.records
            .values()
            .filter(|r| r.state != TrackingState::Stopped)
            .count()
    }

    /// True when no live trackable is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets everything, including stopped tombstones.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
