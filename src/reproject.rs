//! 2D detection to 3D position reprojection
//!
//! Depth inference is an explicit strategy seam: [`DepthModel`] turns an
//! image-space detection into a camera-frame position given the object's
//! known physical size. [`MonocularDepth`] is the only shipped strategy;
//! the configuration layer falls back to it when asked for anything else.
//!
//! Orientation is not reprojected anywhere here: the detection's reported
//! angle passes through to the measurement vector untouched.

use nalgebra::Vector3;

use crate::camera::PinholeCameraModel;

/// Depth-inference strategy: detection geometry in, camera-frame position out.
pub trait DepthModel: Send + Sync {
    /// Position of the object in the camera frame.
    ///
    /// * `px`, `py` - detection center in pixels
    /// * `scale` - apparent radius of the detection in pixels
    /// * `ideal_radius` - known physical radius of the object in meters
    fn camera_to_object(
        &self,
        camera: &PinholeCameraModel,
        px: f64,
        py: f64,
        scale: f64,
        ideal_radius: f64,
    ) -> Vector3<f64>;
}

/// Monocular scale-to-depth inference.
///
/// Inverts the pinhole projection: an object of radius `r` meters that
/// appears `scale` pixels wide at focal length `fx` pixels must sit at depth
/// `z = fx · r / scale`. The pixel's viewing ray scaled by that depth gives
/// the full 3D position.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonocularDepth;

impl DepthModel for MonocularDepth {
    fn camera_to_object(
        &self,
        camera: &PinholeCameraModel,
        px: f64,
        py: f64,
        scale: f64,
        ideal_radius: f64,
    ) -> Vector3<f64> {
        let depth = camera.fx * ideal_radius / scale;
        camera.project_pixel_to_ray(px, py) * depth
    }
}
