//! Error types for the tracker and its estimators
//!
//! This module provides proper error handling instead of panics. Nothing in
//! here is fatal: every variant corresponds to a dropped input or a skipped
//! update, and processing continues on the next input.

use std::fmt;

/// Errors raised by a single Kalman filter operation
#[derive(Debug, Clone)]
pub enum FilterError {
    /// Innovation covariance could not be inverted, even after regularization
    SingularInnovation {
        /// Description of which update failed
        context: String,
    },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::SingularInnovation { context } => {
                write!(f, "Innovation covariance inversion failed: {}", context)
            }
        }
    }
}

impl std::error::Error for FilterError {}

/// Errors that can occur while ingesting detections or reconfiguring trackers
#[derive(Debug, Clone)]
pub enum TrackerError {
    /// A filter-level numeric error
    Filter(FilterError),

    /// Detection batch frame does not match the cached camera model frame
    FrameMismatch {
        /// Frame id carried by the detection batch
        batch_frame: String,
        /// Frame id of the cached camera model
        camera_frame: String,
    },

    /// No camera intrinsic model has been received yet
    CameraNotReady,

    /// A reconfiguration call named an object that was never registered
    UnknownObject {
        /// The unresolved object name
        name: String,
    },

    /// Startup configuration could not be loaded or parsed
    Configuration {
        /// Description of the configuration issue
        description: String,
    },
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::Filter(e) => write!(f, "Filter error: {}", e),
            TrackerError::FrameMismatch {
                batch_frame,
                camera_frame,
            } => {
                write!(
                    f,
                    "Detection frame [{}] does not match camera frame [{}]",
                    batch_frame, camera_frame
                )
            }
            TrackerError::CameraNotReady => write!(f, "Camera model is not ready"),
            TrackerError::UnknownObject { name } => {
                write!(f, "No tracked object registered under name [{}]", name)
            }
            TrackerError::Configuration { description } => {
                write!(f, "Configuration error: {}", description)
            }
        }
    }
}

impl std::error::Error for TrackerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrackerError::Filter(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FilterError> for TrackerError {
    fn from(e: FilterError) -> Self {
        TrackerError::Filter(e)
    }
}
