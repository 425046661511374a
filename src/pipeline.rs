//! Detection ingest pipeline
//!
//! [`ObjectTracker`] ties the pieces together: gate each detection batch on
//! camera readiness and frame identity, run the predict phase for every
//! tracked entry, then associate, reproject, and update per detection.
//!
//! Batches are processed to completion one at a time; the only inputs that
//! may arrive asynchronously are camera model updates (through
//! [`CameraModelWriter`]) and noise-parameter reconfigurations (through
//! [`ParamChannel`]), both of which are safe against a concurrently running
//! ingest.

use nalgebra::Vector4;

use crate::camera::{CameraModelCache, CameraModelWriter};
use crate::errors::TrackerError;
use crate::registry::{ObjectEstimate, ParamChannel, TrackerRegistry};
use crate::reproject::{DepthModel, MonocularDepth};
use crate::types::{AttributeKey, DepthMethod, DetectionBatch, TrackerConfig};

impl DepthMethod {
    /// Instantiate the configured depth-inference strategy.
    pub fn model(self) -> Box<dyn DepthModel> {
        match self {
            DepthMethod::Monocular => Box::new(MonocularDepth),
        }
    }
}

/// Counters describing what one ingest cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Entries that ran a predict step this cycle
    pub predicted: usize,
    /// Detections folded into a filter
    pub updated: usize,
    /// Detections dropped (unknown key, untracked entry, or failed update)
    pub skipped: usize,
}

/// The perception-to-state-estimate stage: registry, camera cache, and
/// depth strategy behind a single ingest entry point.
pub struct ObjectTracker {
    registry: TrackerRegistry,
    camera: CameraModelCache,
    depth: Box<dyn DepthModel>,
}

impl ObjectTracker {
    /// Build a tracker from the startup configuration.
    ///
    /// Runs the registry's two-phase startup: all objects are registered
    /// first; reconfiguration hooks are wired afterwards via
    /// [`ObjectTracker::param_channel`].
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            registry: TrackerRegistry::from_config(config),
            camera: CameraModelCache::new(),
            depth: config.depth_method.model(),
        }
    }

    /// The tracker registry.
    pub fn registry(&self) -> &TrackerRegistry {
        &self.registry
    }

    /// The tracker registry, mutably (tracking toggles, resets).
    pub fn registry_mut(&mut self) -> &mut TrackerRegistry {
        &mut self.registry
    }

    /// Write handle for the asynchronous camera-info source.
    pub fn camera_writer(&self) -> CameraModelWriter {
        self.camera.writer()
    }

    /// Reconfiguration handle for the asynchronous parameter source.
    pub fn param_channel(&self) -> ParamChannel {
        self.registry.param_channel()
    }

    /// Current estimates for all tracked entries.
    pub fn estimates(&self) -> Vec<ObjectEstimate> {
        self.registry.estimates()
    }

    /// Current estimate for one object.
    pub fn estimate(&self, key: &AttributeKey) -> Option<ObjectEstimate> {
        self.registry.estimate(key)
    }

    /// Process one detection batch.
    ///
    /// The gates are batch-level and all-or-nothing: a missing camera model
    /// or a frame mismatch drops the whole batch before any entry's predict
    /// runs. Past the gates, every tracked entry predicts exactly once, then
    /// each detection that exact-matches a tracked entry is reprojected and
    /// folded in, in arrival order. Unknown or untracked detections are
    /// skipped silently; a numerically failed update skips only that
    /// detection and keeps the entry's predicted state.
    pub fn ingest(&mut self, batch: &DetectionBatch) -> Result<IngestSummary, TrackerError> {
        let Some((camera_frame, camera_model)) = self.camera.snapshot() else {
            log::warn!("Camera model is not ready.");
            return Err(TrackerError::CameraNotReady);
        };

        if batch.frame_id != camera_frame {
            log::warn!("Matched shape frame does not match camera frame. Discarding message...");
            return Err(TrackerError::FrameMismatch {
                batch_frame: batch.frame_id.clone(),
                camera_frame,
            });
        }

        let mut summary = IngestSummary::default();

        // Predict phase: uncertainty grows for every tracked entry this
        // cycle, with or without a matching detection.
        for key in self.registry.tracked_keys() {
            if let Some(entry) = self.registry.entry_mut(&key) {
                let process_noise = entry.noise_params().process_noise_cov;
                entry.filter.predict(&Vector4::zeros(), &process_noise);
                summary.predicted += 1;
            }
        }

        // Associate, reproject, update
        for detection in &batch.detections {
            let key = detection.attribute_key();

            let Some(entry) = self.registry.entry_mut(&key).filter(|e| e.tracked) else {
                summary.skipped += 1;
                continue;
            };

            let camera_to_object = self.depth.camera_to_object(
                &camera_model,
                detection.x,
                detection.y,
                detection.scale,
                entry.ideal_radius,
            );

            let measurement = Vector4::new(
                camera_to_object.x,
                camera_to_object.y,
                camera_to_object.z,
                detection.theta,
            );

            match entry
                .filter
                .update(&measurement, &detection.measurement_covariance())
            {
                Ok(()) => {
                    summary.updated += 1;
                    log::debug!(
                        "Updated [{}]: mean = {:?}",
                        key,
                        entry.filter.mean().as_slice()
                    );
                }
                Err(e) => {
                    summary.skipped += 1;
                    log::warn!("Skipping update for [{}]: {}", key, e);
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraInfo;
    use crate::types::{Detection, ObjectConfig};

    fn camera_info(frame_id: &str) -> CameraInfo {
        CameraInfo {
            frame_id: frame_id.to_string(),
            intrinsics: [500.0, 0.0, 320.0, 0.0, 500.0, 240.0, 0.0, 0.0, 1.0],
        }
    }

    fn gate_detection() -> Detection {
        let mut covariance = [0.0; 16];
        for i in 0..4 {
            covariance[i * 5] = 0.1;
        }
        Detection {
            shape: "gate".into(),
            color: "red".into(),
            x: 320.0,
            y: 240.0,
            scale: 50.0,
            theta: 0.0,
            covariance,
        }
    }

    fn tracker() -> ObjectTracker {
        let config = TrackerConfig::new(vec![ObjectConfig::new("gate", "gate", "red", 0.5)])
            .with_immediate_tracking(true);
        let tracker = ObjectTracker::from_config(&config);
        tracker.param_channel().update_params("gate", 0.05, 1.0).unwrap();
        tracker
    }

    #[test]
    fn test_batch_before_camera_model_is_dropped() {
        let mut tracker = tracker();
        let batch = DetectionBatch::new("cam0", 0.0, vec![gate_detection()]);

        let err = tracker.ingest(&batch).unwrap_err();
        assert!(matches!(err, TrackerError::CameraNotReady));
    }

    #[test]
    fn test_predict_runs_even_for_empty_batches() {
        let mut tracker = tracker();
        tracker.camera_writer().receive(&camera_info("cam0"));
        let key = AttributeKey::new("gate".into(), "red".into());
        tracker.registry_mut().reset(&key).unwrap();

        let trace_before = tracker.estimate(&key).unwrap().covariance.trace();
        let summary = tracker
            .ingest(&DetectionBatch::new("cam0", 0.0, vec![]))
            .unwrap();

        assert_eq!(summary, IngestSummary { predicted: 1, updated: 0, skipped: 0 });
        assert!(tracker.estimate(&key).unwrap().covariance.trace() > trace_before);
    }

    #[test]
    fn test_unknown_and_untracked_detections_are_skipped() {
        let mut tracker = tracker();
        tracker.camera_writer().receive(&camera_info("cam0"));

        let mut unknown = gate_detection();
        unknown.color = "blue".into();
        let batch = DetectionBatch::new("cam0", 0.0, vec![unknown]);

        let summary = tracker.ingest(&batch).unwrap();
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_failed_update_skips_only_that_detection() {
        let mut tracker = tracker();
        tracker.camera_writer().receive(&camera_info("cam0"));
        let key = AttributeKey::new("gate".into(), "red".into());
        tracker.registry_mut().reset(&key).unwrap();

        let mut poisoned = gate_detection();
        poisoned.covariance = [f64::NAN; 16];
        let batch =
            DetectionBatch::new("cam0", 0.0, vec![poisoned, gate_detection()]);

        let summary = tracker.ingest(&batch).unwrap();
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_repeated_detections_apply_sequentially_to_one_filter() {
        let mut tracker = tracker();
        tracker.camera_writer().receive(&camera_info("cam0"));
        let key = AttributeKey::new("gate".into(), "red".into());
        tracker.registry_mut().reset(&key).unwrap();

        let batch = DetectionBatch::new(
            "cam0",
            0.0,
            vec![gate_detection(), gate_detection()],
        );

        let summary = tracker.ingest(&batch).unwrap();
        assert_eq!(summary.predicted, 1, "one predict per batch, not per detection");
        assert_eq!(summary.updated, 2);
    }
}
