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

//! `env_logger` setup shared by binaries and integration tests.

use env_logger::{Builder, Env};
use serde::{Deserialize, Serialize};

/// Telemetry section of the runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Default `env_logger` filter, overridden by `RUST_LOG` when set.
    pub log_filter: String,
    /// Emit a counter summary every this many ticks. Zero disables summaries.
    pub summary_interval_ticks: u64,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            summary_interval_ticks: 600,
        }
    }
}

/// Installs the global logger.
///
/// Returns `false` when a logger was already installed, which happens when
/// several tests in one binary initialise logging.
pub fn init_logging(settings: &TelemetrySettings) -> bool {
    Builder::from_env(Env::default().default_filter_or(settings.log_filter.as_str()))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}
