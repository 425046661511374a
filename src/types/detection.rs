//! Inbound detection schema
//!
//! One [`DetectionBatch`] corresponds to one classified camera frame: every
//! detection in it shares the batch's coordinate frame and timestamp. The
//! measurement covariance travels with each detection as a row-major 4×4
//! matrix, exactly as the upstream matched-shape message carries it.

use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

use super::attribute::{AttributeKey, Color, Shape};

/// A single classified 2D shape detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Shape category
    pub shape: Shape,
    /// Color category
    pub color: Color,
    /// Detection center, image x (pixels)
    pub x: f64,
    /// Detection center, image y (pixels)
    pub y: f64,
    /// Apparent radius of the detection (pixels)
    pub scale: f64,
    /// In-plane orientation reported by the classifier (radians)
    pub theta: f64,
    /// Row-major 4×4 measurement covariance over `(x, y, z, θ)`
    pub covariance: [f64; 16],
}

impl Detection {
    /// The attribute key this detection associates under.
    pub fn attribute_key(&self) -> AttributeKey {
        AttributeKey::new(self.shape.clone(), self.color.clone())
    }

    /// Measurement covariance as a matrix.
    pub fn measurement_covariance(&self) -> Matrix4<f64> {
        Matrix4::from_row_slice(&self.covariance)
    }
}

/// A batch of detections from one camera frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionBatch {
    /// Coordinate frame the detections were observed in
    pub frame_id: String,
    /// Capture time, seconds
    pub stamp: f64,
    /// Detections in this frame
    pub detections: Vec<Detection>,
}

impl DetectionBatch {
    /// Create a batch.
    pub fn new(frame_id: impl Into<String>, stamp: f64, detections: Vec<Detection>) -> Self {
        Self {
            frame_id: frame_id.into(),
            stamp,
            detections,
        }
    }

    /// Number of detections in the batch.
    #[inline]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    /// Whether the batch carries no detections.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}
