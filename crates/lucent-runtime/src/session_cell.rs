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

//! The session slot shared between the control thread and the render thread.

use lucent_core::event::EventBus;
use lucent_core::{ArSession, DisplayGeometry, TextureHandle};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

/// Lifecycle states of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// No session yet.
    Uninitialized,
    /// Camera capture running; frames can be acquired.
    Running,
    /// Session exists but capture is suspended.
    Paused,
    /// Session dropped. Terminal.
    Destroyed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Destroyed => "DESTROYED",
        };
        f.write_str(s)
    }
}

pub(crate) struct SessionSlot {
    pub(crate) state: LifecycleState,
    pub(crate) session: Option<Box<dyn ArSession>>,
    pub(crate) camera_texture: TextureHandle,
}

/// State guarded by one mutex, plus a lock-free geometry queue.
///
/// Lifecycle transitions hold the slot lock for their whole duration. The
/// render thread only ever `try_lock`s it, so a transition in progress shows
/// up as a skipped tick instead of a stall.
pub(crate) struct SessionCell {
    slot: Mutex<SessionSlot>,
    geometry_events: EventBus<DisplayGeometry>,
    latest_geometry: Mutex<DisplayGeometry>,
    destroyed: AtomicBool,
}

impl SessionCell {
    pub(crate) fn new(camera_texture: TextureHandle, geometry: DisplayGeometry) -> Self {
        Self {
            slot: Mutex::new(SessionSlot {
                state: LifecycleState::Uninitialized,
                session: None,
                camera_texture,
            }),
            geometry_events: EventBus::new(),
            latest_geometry: Mutex::new(geometry),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Blocking lock for lifecycle transitions. A poisoned lock is recovered:
    /// the slot only holds plain values that stay consistent across a panic.
    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Non-blocking lock for the render thread.
    pub(crate) fn try_lock(&self) -> Option<MutexGuard<'_, SessionSlot>> {
        match self.slot.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Queues a geometry change for the next session update.
    pub(crate) fn push_geometry(&self, geometry: DisplayGeometry) {
        *self
            .latest_geometry
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = geometry;
        self.geometry_events.publish(geometry);
    }

    /// Most recent geometry change, draining older ones.
    pub(crate) fn take_pending_geometry(&self) -> Option<DisplayGeometry> {
        self.geometry_events.drain_latest()
    }

    /// Last geometry reported by the shell, pending or not.
    pub(crate) fn latest_geometry(&self) -> DisplayGeometry {
        *self
            .latest_geometry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Discards queued changes and returns the latest geometry.
    ///
    /// The queue is drained before `latest` is read, so a change racing in
    /// between is either returned here or stays queued for the next update.
    pub(crate) fn settle_geometry(&self) -> DisplayGeometry {
        self.take_pending_geometry();
        self.latest_geometry()
    }

    pub(crate) fn mark_destroyed(&self) {
        self.destroyed.store(true, Ordering::Release);
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucent_core::DisplayRotation;

    fn cell() -> SessionCell {
        SessionCell::new(TextureHandle::default(), DisplayGeometry::default())
    }

    #[test]
    fn test_settle_returns_the_latest_and_empties_the_queue() {
        let cell = cell();
        cell.push_geometry(DisplayGeometry::new(DisplayRotation::Rotation90, 1920, 1080));
        cell.push_geometry(DisplayGeometry::new(DisplayRotation::Rotation180, 1080, 1920));

        assert_eq!(
            cell.settle_geometry(),
            DisplayGeometry::new(DisplayRotation::Rotation180, 1080, 1920)
        );
        assert!(cell.take_pending_geometry().is_none());
    }

    #[test]
    fn test_change_after_settle_stays_queued() {
        let cell = cell();
        let first = DisplayGeometry::new(DisplayRotation::Rotation0, 1080, 1920);
        let second = DisplayGeometry::new(DisplayRotation::Rotation270, 1920, 1080);
        cell.push_geometry(first);
        assert_eq!(cell.settle_geometry(), first);

        cell.push_geometry(second);
        assert_eq!(cell.take_pending_geometry(), Some(second));
    }

    #[test]
    fn test_concurrent_changes_are_never_lost() {
        let cell = std::sync::Arc::new(cell());
        let last = DisplayGeometry::new(DisplayRotation::Rotation90, 640, 480);
        let writer = {
            let cell = std::sync::Arc::clone(&cell);
            std::thread::spawn(move || {
                for i in 1..200 {
                    cell.push_geometry(DisplayGeometry::new(DisplayRotation::Rotation0, i, i));
                }
                cell.push_geometry(last);
            })
        };

        let mut seen = cell.settle_geometry();
        writer.join().unwrap();
        if let Some(queued) = cell.take_pending_geometry() {
            seen = queued;
        }
        assert_eq!(seen, last);
    }
}
