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

//! Scripted implementation of the tracking provider.

mod script;
mod session;

pub use script::{FrameSpec, ScriptHandle, ScriptStats};

use lucent_core::{ArSession, Availability, ProviderError, SessionConfig, TrackingProvider};
use script::lock;
use session::ScriptedSession;

/// A [`TrackingProvider`] whose sessions replay frames queued on a [`ScriptHandle`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    script: ScriptHandle,
}

impl ScriptedProvider {
    /// Creates a provider reporting [`Availability::Supported`] with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for queueing frames and inspecting calls. Clones share state.
    pub fn handle(&self) -> ScriptHandle {
        self.script.clone()
    }
}

impl TrackingProvider for ScriptedProvider {
    fn check_availability(&self, user_requested_install: bool) -> Availability {
        let mut state = lock(&self.script);
        state.stats.availability_checks += 1;
        let reported = state.availability;
        // A user-requested install completes before the next check.
        if reported == Availability::InstallRequested && user_requested_install {
            state.availability = Availability::Supported;
        }
        reported
    }

    fn create_session(&self, config: &SessionConfig) -> Result<Box<dyn ArSession>, ProviderError> {
        let mut state = lock(&self.script);
        if let Some(err) = state.create_error.take() {
            log::warn!("Scripted session creation failed: {err}");
            return Err(err);
        }
        state.stats.sessions_created += 1;
        state.stats.applied_geometries.push(config.display_geometry);
        state.stats.configured_images = config.image_database.image_count();
        drop(state);

        log::info!("Scripted session created.");
        Ok(Box::new(ScriptedSession::new(self.script.clone(), config)))
    }
}
