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

//! Concrete tracking providers.
//!
//! Only an in-memory scripted backend lives here for now. It follows a queue of
//! frames prepared by the caller and records every call the runtime makes, which
//! is what the integration tests and the sandbox drive the runtime with.

#![warn(missing_docs)]

pub mod tracking;

pub use tracking::scripted::{FrameSpec, ScriptHandle, ScriptStats, ScriptedProvider};
