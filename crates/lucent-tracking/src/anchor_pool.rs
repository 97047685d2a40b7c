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

//! World-fixed anchors bound one-to-one to tracked images.

use lucent_core::{AnchorFactory, AnchorHandle, Pose, ProviderError, TrackableId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A live anchor owned by the pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorRecord {
    /// Provider handle, released when the trackable stops.
    pub handle: AnchorHandle,
    /// Pose the anchor was created at.
    pub pose: Pose,
}

/// What [`AnchorPool::on_trackable_started`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum AnchorOutcome {
    /// A new anchor was created.
    Created(AnchorHandle),
    /// The trackable already had an anchor; nothing changed.
    AlreadyAnchored(AnchorHandle),
    /// The provider refused to create the anchor.
    Rejected(ProviderError),
}

/// A frozen view of the pool, cheap to clone and safe to hand to the renderer.
///
/// Later pool mutations never show up in a snapshot taken earlier.
#[derive(Debug, Clone, Default)]
pub struct AnchorSnapshot {
    anchors: Arc<BTreeMap<TrackableId, AnchorRecord>>,
}

impl AnchorSnapshot {
    /// Anchor bound to `id`.
    pub fn get(&self, id: &TrackableId) -> Option<&AnchorRecord> {
        self.anchors.get(id)
    }

    /// Anchors ordered by trackable identifier.
    pub fn iter(&self) -> impl Iterator<Item = (&TrackableId, &AnchorRecord)> {
        self.anchors.iter()
    }

    /// Number of anchors.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// True when there are no anchors.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

/// Anchors keyed by the trackable they follow.
///
/// At most one anchor exists per identifier. Storage is copy-on-write so
/// [`AnchorPool::snapshot`] is an `Arc` clone and mutation only copies when a
/// snapshot is still alive.
#[derive(Debug, Default)]
pub struct AnchorPool {
    anchors: Arc<BTreeMap<TrackableId, AnchorRecord>>,
}

impl AnchorPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an anchor for `id` at `pose` unless it already has one.
    ///
    /// A provider refusal is logged and returned; it is not retried.
    pub fn on_trackable_started(
        &mut self,
        factory: &mut dyn AnchorFactory,
        id: &TrackableId,
        pose: Pose,
    ) -> AnchorOutcome {
        if let Some(existing) = self.anchors.get(id) {
            return AnchorOutcome::AlreadyAnchored(existing.handle);
        }

        match factory.create_anchor(id, pose) {
            Ok(handle) => {
                log::debug!("Created {handle} for trackable {id}.");
                Arc::make_mut(&mut self.anchors).insert(id.clone(), AnchorRecord { handle, pose });
                AnchorOutcome::Created(handle)
            }
            Err(e) => {
                log::warn!("Anchor creation for trackable {id} was refused: {e}");
                AnchorOutcome::Rejected(e)
            }
        }
    }

    /// Detaches and releases the anchor bound to `id`. Returns the released handle.
    pub fn on_trackable_stopped(
        &mut self,
        factory: &mut dyn AnchorFactory,
        id: &TrackableId,
    ) -> Option<AnchorHandle> {
        if !self.anchors.contains_key(id) {
            return None;
        }
        let record = Arc::make_mut(&mut self.anchors).remove(id)?;
        factory.release_anchor(record.handle);
        log::debug!("Released {} for trackable {id}.", record.handle);
        Some(record.handle)
    }

    /// Releases every anchor, for session teardown. Returns how many were released.
    pub fn release_all(&mut self, factory: &mut dyn AnchorFactory) -> usize {
        let anchors = std::mem::take(&mut self.anchors);
        let count = anchors.len();
        for record in anchors.values() {
            factory.release_anchor(record.handle);
        }
        if count > 0 {
            log::info!("Released {count} anchors.");
        }
        count
    }

    /// Frozen view of identifier to anchor.
    pub fn snapshot(&self) -> AnchorSnapshot {
        AnchorSnapshot {
            anchors: Arc::clone(&self.anchors),
        }
    }

    /// Anchor bound to `id`.
    pub fn get(&self, id: &TrackableId) -> Option<&AnchorRecord> {
        self.anchors.get(id)
    }

    /// Number of live anchors.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// True when the pool holds no anchor.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}
