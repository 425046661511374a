//! Pinhole camera model and the shared camera model cache
//!
//! The tracker consumes camera intrinsics as an opaque, asynchronously
//! refreshed input: an independent source pushes [`CameraInfo`] messages
//! through a [`CameraModelWriter`] while the ingest pipeline reads
//! consistent snapshots from the [`CameraModelCache`]. The cache remembers
//! the coordinate frame the model was computed for so the pipeline can
//! reject detection batches from any other frame.

use std::sync::{Arc, PoisonError, RwLock};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Camera intrinsic model update, as delivered by the calibration source.
///
/// `intrinsics` is the row-major 3×3 camera matrix `K`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraInfo {
    /// Coordinate frame the intrinsics were computed for
    pub frame_id: String,
    /// Row-major 3×3 camera matrix
    pub intrinsics: [f64; 9],
}

/// Pinhole projection parameters extracted from a camera matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeCameraModel {
    /// Focal length, x (pixels)
    pub fx: f64,
    /// Focal length, y (pixels)
    pub fy: f64,
    /// Principal point, x (pixels)
    pub cx: f64,
    /// Principal point, y (pixels)
    pub cy: f64,
}

impl PinholeCameraModel {
    /// Create a model from explicit parameters.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Extract the pinhole parameters from a row-major 3×3 camera matrix.
    pub fn from_intrinsics(k: &[f64; 9]) -> Self {
        Self {
            fx: k[0],
            cx: k[2],
            fy: k[4],
            cy: k[5],
        }
    }

    /// Back-project a pixel to the viewing ray through it.
    ///
    /// Returns the ray in the `z = 1` plane convention: multiplying by a
    /// depth gives the 3D point in the camera frame.
    pub fn project_pixel_to_ray(&self, u: f64, v: f64) -> Vector3<f64> {
        Vector3::new((u - self.cx) / self.fx, (v - self.cy) / self.fy, 1.0)
    }
}

/// Cached camera model plus the frame it belongs to.
#[derive(Debug, Clone)]
struct CachedModel {
    frame_id: String,
    model: PinholeCameraModel,
}

/// Holds the most recently received camera model.
///
/// The cache is empty until the first [`CameraInfo`] arrives; every later
/// message overwrites it in place. Reads return a snapshot of the whole
/// frame-id/model pair, so a concurrent writer can never be observed
/// half-applied.
#[derive(Debug, Clone, Default)]
pub struct CameraModelCache {
    inner: Arc<RwLock<Option<CachedModel>>>,
}

/// Write handle for the asynchronous camera-info source.
#[derive(Debug, Clone)]
pub struct CameraModelWriter {
    inner: Arc<RwLock<Option<CachedModel>>>,
}

impl CameraModelCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write handle sharing this cache's storage.
    pub fn writer(&self) -> CameraModelWriter {
        CameraModelWriter {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Whether at least one camera model has been received.
    pub fn ready(&self) -> bool {
        self.read().is_some()
    }

    /// Consistent snapshot of the cached frame id and model, if any.
    pub fn snapshot(&self) -> Option<(String, PinholeCameraModel)> {
        self.read()
            .as_ref()
            .map(|cached| (cached.frame_id.clone(), cached.model))
    }

    /// Frame id of the cached model, if any.
    pub fn frame_id(&self) -> Option<String> {
        self.snapshot().map(|(frame_id, _)| frame_id)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<CachedModel>> {
        // A writer that panicked mid-receive left at worst a stale model;
        // keep serving it rather than propagate the poison.
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CameraModelWriter {
    /// Cache a newly received camera model, replacing any previous one.
    pub fn receive(&self, info: &CameraInfo) {
        let cached = CachedModel {
            frame_id: info.frame_id.clone(),
            model: PinholeCameraModel::from_intrinsics(&info.intrinsics),
        };
        *self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(cached);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_info(frame_id: &str, fx: f64) -> CameraInfo {
        CameraInfo {
            frame_id: frame_id.to_string(),
            intrinsics: [fx, 0.0, 320.0, 0.0, fx, 240.0, 0.0, 0.0, 1.0],
        }
    }

    #[test]
    fn test_from_intrinsics_extracts_pinhole_parameters() {
        let k = [500.0, 0.0, 320.0, 0.0, 510.0, 240.0, 0.0, 0.0, 1.0];
        let model = PinholeCameraModel::from_intrinsics(&k);
        assert_eq!(model.fx, 500.0);
        assert_eq!(model.fy, 510.0);
        assert_eq!(model.cx, 320.0);
        assert_eq!(model.cy, 240.0);
    }

    #[test]
    fn test_ray_through_principal_point_is_optical_axis() {
        let model = PinholeCameraModel::new(500.0, 500.0, 320.0, 240.0);
        let ray = model.project_pixel_to_ray(320.0, 240.0);
        assert_eq!(ray, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_ray_signs_match_image_axes() {
        let model = PinholeCameraModel::new(500.0, 500.0, 320.0, 240.0);
        let ray = model.project_pixel_to_ray(420.0, 140.0);
        assert!(ray.x > 0.0, "pixels right of center point right");
        assert!(ray.y < 0.0, "pixels above center point up (negative v offset)");
        assert_eq!(ray.z, 1.0);
    }

    #[test]
    fn test_cache_starts_empty_and_becomes_ready() {
        let cache = CameraModelCache::new();
        assert!(!cache.ready());
        assert!(cache.snapshot().is_none());

        cache.writer().receive(&test_info("cam0", 500.0));

        assert!(cache.ready());
        assert_eq!(cache.frame_id().as_deref(), Some("cam0"));
    }

    #[test]
    fn test_new_model_overwrites_cache_in_place() {
        let cache = CameraModelCache::new();
        let writer = cache.writer();

        writer.receive(&test_info("cam0", 500.0));
        writer.receive(&test_info("cam1", 600.0));

        let (frame_id, model) = cache.snapshot().unwrap();
        assert_eq!(frame_id, "cam1");
        assert_eq!(model.fx, 600.0);
    }
}
