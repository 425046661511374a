/*!
# AUV object tracking

Perception-to-state-estimate stage for an autonomous underwater vehicle:
turns a stream of per-frame 2D shape detections (each tagged with a semantic
attribute such as `buoy/red`) into persistent, smoothed 3D
position-and-orientation estimates, one per known object.

## Features

- Registry of independently configured linear Kalman estimators, keyed by
  semantic attribute
- Monocular scale-to-depth reprojection through a pinhole camera model
- Batch-level frame and readiness gating against the cached camera model
- Live noise-parameter reconfiguration that never disturbs in-flight state

## Modules

- [`pipeline`] - the ingest orchestrator, [`ObjectTracker`]
- [`registry`] - attribute-keyed tracker entries and the parameter channel
- [`kalman`] - fixed-dimension linear Kalman filter
- [`reproject`] - depth-inference strategies
- [`camera`] - pinhole model and the shared camera model cache
- [`types`] - attribute keys, detection schema, startup configuration

## Example

```rust
use auv_object_tracking::{
    CameraInfo, Detection, DetectionBatch, ObjectConfig, ObjectTracker, TrackerConfig,
};

// One known object: a red gate, half a meter in radius
let config = TrackerConfig::new(vec![ObjectConfig::new("start_gate", "gate", "red", 0.5)])
    .with_immediate_tracking(true);
let mut tracker = ObjectTracker::from_config(&config);
tracker.param_channel().update_params("start_gate", 0.05, 1.0).unwrap();

// Camera intrinsics arrive asynchronously
tracker.camera_writer().receive(&CameraInfo {
    frame_id: "cam0".to_string(),
    intrinsics: [500.0, 0.0, 320.0, 0.0, 500.0, 240.0, 0.0, 0.0, 1.0],
});

// One classified detection batch
let mut covariance = [0.0; 16];
for i in 0..4 {
    covariance[i * 5] = 0.1;
}
let batch = DetectionBatch::new(
    "cam0",
    0.0,
    vec![Detection {
        shape: "gate".into(),
        color: "red".into(),
        x: 320.0,
        y: 240.0,
        scale: 50.0,
        theta: 0.0,
        covariance,
    }],
);

tracker.ingest(&batch).unwrap();
for estimate in tracker.estimates() {
    println!("{}: {:?}", estimate.key, estimate.mean.as_slice());
}
```
*/

// ============================================================================
// Core modules
// ============================================================================

/// Pinhole camera model and the shared camera model cache
pub mod camera;

/// Error types
pub mod errors;

/// Fixed-dimension linear Kalman filter
pub mod kalman;

/// Detection ingest pipeline
pub mod pipeline;

/// Tracker registry and parameter update channel
pub mod registry;

/// 2D detection to 3D position reprojection
pub mod reproject;

/// Attribute keys, detection schema, and startup configuration
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use camera::{CameraInfo, CameraModelCache, CameraModelWriter, PinholeCameraModel};
pub use errors::{FilterError, TrackerError};
pub use kalman::{LinearKalmanFilter, ObjectKalmanFilter};
pub use pipeline::{IngestSummary, ObjectTracker};
pub use registry::{NoiseParams, ObjectEstimate, ParamChannel, TrackerEntry, TrackerRegistry};
pub use reproject::{DepthModel, MonocularDepth};
pub use types::{
    AttributeKey, Color, DepthMethod, Detection, DetectionBatch, ObjectConfig, Shape,
    TrackerConfig,
};
