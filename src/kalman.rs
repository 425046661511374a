//! Fixed-dimension linear Kalman filter
//!
//! A single object's state estimator: it owns its mean and covariance and
//! knows nothing about other objects. Dimensions are fixed at compile time
//! (state, control, measurement), so all operations are allocation-free
//! static `nalgebra` math.
//!
//! The object tracker instantiates this as [`ObjectKalmanFilter`], a 4/4/4
//! pure integrator over `(x, y, z, θ)`: transition, control, and observation
//! matrices are all identity, so prediction leaves the mean unchanged and
//! only grows covariance by the process noise.

use nalgebra::{SMatrix, SVector};

use crate::errors::FilterError;

/// Regularization added to the innovation covariance when plain inversion
/// fails. Small enough to be invisible against any realistic sensor noise.
const INNOVATION_REGULARIZATION: f64 = 1e-9;

/// Linear-Gaussian state estimator with compile-time dimensions.
///
/// Type parameters: `S` state dimension, `C` control dimension, `U`
/// measurement dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearKalmanFilter<const S: usize, const C: usize, const U: usize> {
    mean: SVector<f64, S>,
    covariance: SMatrix<f64, S, S>,
    transition: SMatrix<f64, S, S>,
    control: SMatrix<f64, S, C>,
    observation: SMatrix<f64, U, S>,
}

/// The tracker's filter configuration: 4D state `(x, y, z, θ)`, 4D control,
/// 4D measurement.
pub type ObjectKalmanFilter = LinearKalmanFilter<4, 4, 4>;

impl<const S: usize, const C: usize, const U: usize> LinearKalmanFilter<S, C, U> {
    /// Create a filter with explicit system matrices.
    pub fn new(
        initial_mean: SVector<f64, S>,
        initial_covariance: SMatrix<f64, S, S>,
        transition: SMatrix<f64, S, S>,
        control: SMatrix<f64, S, C>,
        observation: SMatrix<f64, U, S>,
    ) -> Self {
        Self {
            mean: initial_mean,
            covariance: initial_covariance,
            transition,
            control,
            observation,
        }
    }

    /// Current state mean.
    #[inline]
    pub fn mean(&self) -> &SVector<f64, S> {
        &self.mean
    }

    /// Current state covariance.
    #[inline]
    pub fn covariance(&self) -> &SMatrix<f64, S, S> {
        &self.covariance
    }

    /// Replace the current state with the given mean and covariance.
    ///
    /// Used for explicit reinitialization only; ordinary predict/update
    /// cycles never trigger this.
    pub fn reset(&mut self, mean: SVector<f64, S>, covariance: SMatrix<f64, S, S>) {
        self.mean = mean;
        self.covariance = covariance;
    }

    /// Propagate the state forward one step.
    ///
    /// - `x ← F x + B u`
    /// - `P ← F P Fᵗ + B Q Bᵗ`
    ///
    /// Must run exactly once per ingest cycle for every tracked entry, even
    /// when no measurement arrives: uncertainty grows absent evidence.
    pub fn predict(&mut self, control: &SVector<f64, C>, process_noise: &SMatrix<f64, C, C>) {
        self.mean = self.transition * self.mean + self.control * control;
        self.covariance = self.transition * self.covariance * self.transition.transpose()
            + self.control * process_noise * self.control.transpose();
    }

    /// Fold one measurement into the state.
    ///
    /// Standard linear-Gaussian update: innovation `y = z − H x`, innovation
    /// covariance `S = H P Hᵗ + R`, gain `K = P Hᵗ S⁻¹`, then
    /// `x ← x + K y`, `P ← (I − K H) P`.
    ///
    /// If `S` cannot be inverted directly, one retry is made with a small
    /// diagonal regularization. If that also fails the update is abandoned
    /// and the state keeps its predicted values; the caller decides whether
    /// to log and move on.
    pub fn update(
        &mut self,
        measurement: &SVector<f64, U>,
        measurement_noise: &SMatrix<f64, U, U>,
    ) -> Result<(), FilterError> {
        let innovation = measurement - self.observation * self.mean;
        let innovation_cov =
            self.observation * self.covariance * self.observation.transpose() + measurement_noise;

        // Upstream detections carry their own covariance; garbage there must
        // not poison the filter state.
        if !innovation_cov.iter().all(|v| v.is_finite()) {
            return Err(FilterError::SingularInnovation {
                context: "innovation covariance is not finite".to_string(),
            });
        }

        let inverse = innovation_cov.try_inverse().or_else(|| {
            let regularized = innovation_cov
                + SMatrix::<f64, U, U>::identity() * INNOVATION_REGULARIZATION;
            regularized.try_inverse()
        });

        let Some(innovation_cov_inv) = inverse else {
            return Err(FilterError::SingularInnovation {
                context: format!("S = {:?}", innovation_cov),
            });
        };

        let gain = self.covariance * self.observation.transpose() * innovation_cov_inv;
        self.mean += gain * innovation;
        self.covariance =
            (SMatrix::<f64, S, S>::identity() - gain * self.observation) * self.covariance;

        Ok(())
    }
}

impl<const S: usize> LinearKalmanFilter<S, S, S> {
    /// Create a pure-integrator filter: `F = B = H = I`, zero initial mean.
    ///
    /// Prediction reduces to `P ← P + Q` and the measurement observes the
    /// full state directly.
    pub fn identity_integrator(initial_covariance: SMatrix<f64, S, S>) -> Self {
        Self::new(
            SVector::zeros(),
            initial_covariance,
            SMatrix::identity(),
            SMatrix::identity(),
            SMatrix::identity(),
        )
    }
}
