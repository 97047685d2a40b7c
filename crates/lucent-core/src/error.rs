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

//! Defines the error taxonomy surfaced to the host shell.
//!
//! Two layers exist. [`ProviderError`] is what a tracking service implementation
//! reports; [`LucentError`] is what the lifecycle controller and frame
//! synchronizer hand to their callers after mapping provider failures.
//! Absence of a frame and absence of anything to draw are values, not errors.

use thiserror::Error;

/// Failure reported by a tracking service implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The device or service build cannot run tracking.
    #[error("tracking is not supported: {0}")]
    Unsupported(String),
    /// The user has not granted camera permission.
    #[error("camera permission was denied")]
    PermissionDenied,
    /// The camera is held by another process.
    #[error("camera is held by another client")]
    CameraUnavailable,
    /// The session is not running and cannot produce frames.
    #[error("session is not running")]
    NotRunning,
    /// The reference image database could not be built or deserialized.
    #[error("invalid image database: {0}")]
    InvalidDatabase(String),
    /// Anchor creation was refused because the pose is not currently tracked.
    #[error("cannot anchor a trackable that is not tracking")]
    NotTracking,
    /// Unrecoverable service failure.
    #[error("fatal tracking failure: {0}")]
    Fatal(String),
}

/// Why a session could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionUnavailableReason {
    /// The tracking service must be installed or updated first.
    #[error("tracking service installation is pending")]
    InstallPending,
    /// The device cannot run the tracking service.
    #[error("device is not supported: {0}")]
    Unsupported(String),
    /// Camera permission is missing.
    #[error("camera permission is missing")]
    PermissionDenied,
    /// The service failed to initialize.
    #[error("service initialization failed: {0}")]
    InitializationFailed(String),
}

/// Errors surfaced by the lifecycle controller and frame synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LucentError {
    /// No session could be created.
    #[error("tracking session unavailable: {reason}")]
    SessionUnavailable {
        /// The underlying cause.
        #[source]
        reason: SessionUnavailableReason,
    },
    /// The camera is held elsewhere. Recoverable by resuming later.
    #[error("camera unavailable: {hint}")]
    CameraUnavailable {
        /// Human readable hint for the shell.
        hint: String,
    },
    /// The service reported a fatal camera or tracking failure for this tick.
    #[error("frame unavailable: {reason}")]
    FrameUnavailable {
        /// Provider description of the failure.
        reason: String,
    },
    /// The operation is not legal in the current lifecycle state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The lifecycle state at the time of the call.
        state: String,
    },
}

impl LucentError {
    /// Whether the shell can recover by retrying the lifecycle operation later.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LucentError::CameraUnavailable { .. }
                | LucentError::SessionUnavailable {
                    reason: SessionUnavailableReason::InstallPending
                }
        )
    }

    /// Maps a provider failure raised while creating a session.
    pub fn from_session_creation(error: ProviderError) -> Self {
        let reason = match error {
            ProviderError::Unsupported(detail) => SessionUnavailableReason::Unsupported(detail),
            ProviderError::PermissionDenied => SessionUnavailableReason::PermissionDenied,
            other => SessionUnavailableReason::InitializationFailed(other.to_string()),
        };
        LucentError::SessionUnavailable { reason }
    }
}

/// Result alias used across the Lucent crates.
pub type LucentResult<T> = Result<T, LucentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_messages() {
        let err = LucentError::InvalidState {
            operation: "resume",
            state: "UNINITIALIZED".to_string(),
        };
        assert_eq!(err.to_string(), "cannot resume while UNINITIALIZED");

        let err = LucentError::CameraUnavailable {
            hint: "close other camera apps".to_string(),
        };
        assert_eq!(err.to_string(), "camera unavailable: close other camera apps");
    }

    #[test]
    fn test_session_unavailable_exposes_source() {
        let err = LucentError::SessionUnavailable {
            reason: SessionUnavailableReason::InstallPending,
        };
        assert!(err.source().is_some());
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_session_creation_mapping() {
        let err = LucentError::from_session_creation(ProviderError::PermissionDenied);
        assert_eq!(
            err,
            LucentError::SessionUnavailable {
                reason: SessionUnavailableReason::PermissionDenied
            }
        );
        let err = LucentError::from_session_creation(ProviderError::Fatal("boom".into()));
        assert!(matches!(
            err,
            LucentError::SessionUnavailable {
                reason: SessionUnavailableReason::InitializationFailed(_)
            }
        ));
        assert!(!err.is_recoverable());
    }
}
