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

//! Trackable and anchor bookkeeping for the render thread.
//!
//! The [`TrackableRegistry`] turns per-frame trackable updates into start and stop
//! transitions; the [`AnchorPool`] turns those transitions into world-fixed
//! anchors. Both are plain owned values driven once per tick.

#![warn(missing_docs)]

pub mod anchor_pool;
pub mod registry;

pub use anchor_pool::{AnchorOutcome, AnchorPool, AnchorRecord, AnchorSnapshot};
pub use registry::{RegistryDelta, TrackableRecord, TrackableRegistry};
