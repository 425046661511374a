//! Tracker registry and the parameter update channel
//!
//! The registry maps each attribute key to exactly one [`TrackerEntry`]:
//! a Kalman estimator plus its tuning parameters and tracked flag. Entries
//! are created once at startup and live for the process lifetime.
//!
//! Startup is an explicit two-phase protocol:
//!
//! 1. **Register** every configured object ([`TrackerRegistry::register`],
//!    driven by [`TrackerRegistry::from_config`]). Several names may alias
//!    the same attribute key; the last registration wins the key's slot.
//! 2. **Wire** the reconfiguration surface ([`TrackerRegistry::param_channel`])
//!    after all registrations, so the channel's name lookup table is
//!    complete before any hook can fire.
//!
//! The [`ParamChannel`] may be invoked from an asynchronous reconfiguration
//! source while ingest is running. It only ever touches an entry's noise
//! parameters, never the filter's mean/covariance, and each noise-parameter
//! pair sits behind its own mutex so a concurrent predict always observes a
//! whole, untorn matrix.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use nalgebra::{Matrix4, Vector4};
use serde::Serialize;

use crate::errors::TrackerError;
use crate::kalman::{LinearKalmanFilter, ObjectKalmanFilter};
use crate::types::{AttributeKey, ObjectConfig, TrackerConfig};

/// Live-tunable noise parameters of one tracker entry.
///
/// Both matrices are diagonal with all four entries equal, mirroring the
/// scalar-variance reconfiguration surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseParams {
    /// Process noise applied on every predict step
    pub process_noise_cov: Matrix4<f64>,
    /// Covariance used when (re)initializing the filter
    pub initial_cov: Matrix4<f64>,
}

impl NoiseParams {
    /// Build diagonal noise matrices from scalar variances.
    pub fn from_variances(predict_variance: f64, initial_variance: f64) -> Self {
        Self {
            process_noise_cov: Matrix4::from_diagonal_element(predict_variance),
            initial_cov: Matrix4::from_diagonal_element(initial_variance),
        }
    }

    /// All-zero parameters, the state before reconfiguration delivers real
    /// values.
    pub fn zero() -> Self {
        Self::from_variances(0.0, 0.0)
    }
}

/// One tracked object: estimator state plus tuning.
#[derive(Debug)]
pub struct TrackerEntry {
    /// Human-readable object name (the reconfiguration handle)
    pub name: String,
    /// Known physical radius, meters
    pub ideal_radius: f64,
    /// When false, detections for this key are ignored and no prediction runs
    pub tracked: bool,
    /// The object's state estimator
    pub filter: ObjectKalmanFilter,
    params: Arc<Mutex<NoiseParams>>,
}

impl TrackerEntry {
    /// Consistent snapshot of the current noise parameters.
    pub fn noise_params(&self) -> NoiseParams {
        *self.params.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Smoothed state estimate for one object, queryable after each ingest cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectEstimate {
    /// Attribute key of the object
    pub key: AttributeKey,
    /// Human-readable object name
    pub name: String,
    /// Estimated `(x, y, z, θ)` in the camera frame
    pub mean: Vector4<f64>,
    /// Estimate covariance
    pub covariance: Matrix4<f64>,
}

/// Registry of all tracker entries, keyed by attribute.
#[derive(Debug, Default)]
pub struct TrackerRegistry {
    entries: HashMap<AttributeKey, TrackerEntry>,
    name_to_key: HashMap<String, AttributeKey>,
    // Registration order, for deterministic iteration
    order: Vec<AttributeKey>,
}

impl TrackerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the startup configuration (phase 1 for every
    /// object, in list order).
    pub fn from_config(config: &TrackerConfig) -> Self {
        let mut registry = Self::new();
        for object in &config.objects {
            registry.register(object, config.immediate_tracking);
        }
        registry
    }

    /// Register one object (phase 1).
    ///
    /// The entry's filter starts at the origin with whatever initial
    /// covariance is on hand at this point, i.e. zero until reconfiguration
    /// delivers real values. If the attribute key is already occupied the
    /// new registration replaces the old entry.
    pub fn register(&mut self, config: &ObjectConfig, immediate_tracking: bool) -> AttributeKey {
        let key = config.attribute_key();
        let params = Arc::new(Mutex::new(NoiseParams::zero()));

        let entry = TrackerEntry {
            name: config.name.clone(),
            ideal_radius: config.ideal_radius,
            tracked: immediate_tracking,
            filter: LinearKalmanFilter::identity_integrator(Matrix4::zeros()),
            params,
        };

        self.name_to_key.insert(config.name.clone(), key.clone());
        if !self.entries.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.entries.insert(key.clone(), entry);

        log::info!("Loaded object [{}] with attributes [{}].", config.name, key);
        key
    }

    /// Wire the reconfiguration surface (phase 2).
    ///
    /// Must be called after all registrations: the channel snapshots the
    /// complete name alias table, and resolves names against it at call
    /// time.
    pub fn param_channel(&self) -> ParamChannel {
        let params = self
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), Arc::clone(&entry.params)))
            .collect();

        ParamChannel {
            name_to_key: Arc::new(self.name_to_key.clone()),
            params: Arc::new(params),
        }
    }

    /// Number of registered entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry.
    pub fn entry(&self, key: &AttributeKey) -> Option<&TrackerEntry> {
        self.entries.get(key)
    }

    /// Look up an entry mutably.
    pub fn entry_mut(&mut self, key: &AttributeKey) -> Option<&mut TrackerEntry> {
        self.entries.get_mut(key)
    }

    /// Resolve a human-readable name to its attribute key.
    pub fn key_for_name(&self, name: &str) -> Option<&AttributeKey> {
        self.name_to_key.get(name)
    }

    /// All keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &AttributeKey> {
        self.order.iter()
    }

    /// Keys of entries currently marked tracked, in registration order.
    pub fn tracked_keys(&self) -> Vec<AttributeKey> {
        self.order
            .iter()
            .filter(|key| self.entries.get(*key).is_some_and(|e| e.tracked))
            .cloned()
            .collect()
    }

    /// Start or stop tracking an object.
    pub fn set_tracked(&mut self, key: &AttributeKey, tracked: bool) -> Result<(), TrackerError> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| TrackerError::UnknownObject {
                name: key.to_string(),
            })?;
        entry.tracked = tracked;
        log::info!("Set tracking [{}] for [{}].", tracked, key);
        Ok(())
    }

    /// Reinitialize an object's filter: mean back to the origin, covariance
    /// back to the configured initial covariance.
    pub fn reset(&mut self, key: &AttributeKey) -> Result<(), TrackerError> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| TrackerError::UnknownObject {
                name: key.to_string(),
            })?;
        let initial_cov = entry.noise_params().initial_cov;
        entry.filter.reset(Vector4::zeros(), initial_cov);
        log::info!("Reset tracker [{}].", key);
        Ok(())
    }

    /// Current estimate for one object.
    pub fn estimate(&self, key: &AttributeKey) -> Option<ObjectEstimate> {
        self.entries.get(key).map(|entry| ObjectEstimate {
            key: key.clone(),
            name: entry.name.clone(),
            mean: *entry.filter.mean(),
            covariance: *entry.filter.covariance(),
        })
    }

    /// Estimates for all tracked entries, in registration order.
    pub fn estimates(&self) -> Vec<ObjectEstimate> {
        self.order
            .iter()
            .filter(|key| self.entries.get(*key).is_some_and(|e| e.tracked))
            .filter_map(|key| self.estimate(key))
            .collect()
    }
}

/// Cloneable, thread-safe handle for live noise-parameter reconfiguration.
///
/// Resolution is name → key → shared parameter cell, performed at call time
/// exactly as registered names alias keys. Updating parameters never touches
/// a filter's current mean or covariance; only subsequent predict and reset
/// calls observe the new values.
#[derive(Debug, Clone)]
pub struct ParamChannel {
    name_to_key: Arc<HashMap<String, AttributeKey>>,
    params: Arc<HashMap<AttributeKey, Arc<Mutex<NoiseParams>>>>,
}

impl ParamChannel {
    /// Apply a named reconfiguration: overwrite the entry's process-noise
    /// and initial covariance with diagonal matrices built from the given
    /// scalar variances.
    pub fn update_params(
        &self,
        name: &str,
        predict_variance: f64,
        initial_variance: f64,
    ) -> Result<(), TrackerError> {
        let cell = self
            .name_to_key
            .get(name)
            .and_then(|key| self.params.get(key));

        let Some(cell) = cell else {
            log::warn!("Ignoring parameter update for unknown object [{}].", name);
            return Err(TrackerError::UnknownObject {
                name: name.to_string(),
            });
        };

        *cell.lock().unwrap_or_else(PoisonError::into_inner) =
            NoiseParams::from_variances(predict_variance, initial_variance);

        log::info!("Updated tracker params [{}].", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, Shape};

    fn buoy_config(name: &str) -> ObjectConfig {
        ObjectConfig::new(name, "buoy", "red", 0.2)
    }

    fn registry_with_buoy() -> TrackerRegistry {
        let config = TrackerConfig::new(vec![buoy_config("first_buoy")]).with_immediate_tracking(true);
        TrackerRegistry::from_config(&config)
    }

    #[test]
    fn test_registration_creates_zeroed_entry() {
        let registry = registry_with_buoy();
        let key = AttributeKey::new(Shape::Buoy, Color::Red);

        let entry = registry.entry(&key).unwrap();
        assert_eq!(entry.name, "first_buoy");
        assert!(entry.tracked);
        assert_eq!(entry.filter.mean(), &Vector4::zeros());
        assert_eq!(entry.noise_params(), NoiseParams::zero());
    }

    #[test]
    fn test_param_update_resolves_by_name() {
        let registry = registry_with_buoy();
        let channel = registry.param_channel();

        channel.update_params("first_buoy", 0.3, 2.0).unwrap();

        let key = AttributeKey::new(Shape::Buoy, Color::Red);
        let params = registry.entry(&key).unwrap().noise_params();
        assert_eq!(params.process_noise_cov, Matrix4::from_diagonal_element(0.3));
        assert_eq!(params.initial_cov, Matrix4::from_diagonal_element(2.0));
    }

    #[test]
    fn test_param_update_does_not_disturb_filter_state() {
        let mut registry = registry_with_buoy();
        let key = AttributeKey::new(Shape::Buoy, Color::Red);

        // Put some evidence into the filter first
        {
            let entry = registry.entry_mut(&key).unwrap();
            entry
                .filter
                .reset(Vector4::new(1.0, 2.0, 3.0, 0.1), Matrix4::from_diagonal_element(0.5));
        }
        let mean_before = *registry.entry(&key).unwrap().filter.mean();
        let cov_before = *registry.entry(&key).unwrap().filter.covariance();

        registry
            .param_channel()
            .update_params("first_buoy", 9.0, 9.0)
            .unwrap();

        assert_eq!(registry.entry(&key).unwrap().filter.mean(), &mean_before);
        assert_eq!(registry.entry(&key).unwrap().filter.covariance(), &cov_before);
    }

    #[test]
    fn test_param_update_for_unknown_name_fails() {
        let registry = registry_with_buoy();
        let channel = registry.param_channel();

        let err = channel.update_params("kraken", 1.0, 1.0).unwrap_err();
        assert!(matches!(err, TrackerError::UnknownObject { .. }));
    }

    #[test]
    fn test_aliased_names_share_one_entry_last_registration_wins() {
        let config = TrackerConfig::new(vec![buoy_config("buoy_a"), buoy_config("buoy_b")]);
        let registry = TrackerRegistry::from_config(&config);
        let key = AttributeKey::new(Shape::Buoy, Color::Red);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entry(&key).unwrap().name, "buoy_b");

        // Both names resolve; updates through either land on the surviving entry
        let channel = registry.param_channel();
        channel.update_params("buoy_a", 0.7, 0.7).unwrap();
        assert_eq!(
            registry.entry(&key).unwrap().noise_params(),
            NoiseParams::from_variances(0.7, 0.7)
        );
    }

    #[test]
    fn test_set_tracked_toggles_entry() {
        let mut registry = registry_with_buoy();
        let key = AttributeKey::new(Shape::Buoy, Color::Red);

        registry.set_tracked(&key, false).unwrap();
        assert!(!registry.entry(&key).unwrap().tracked);
        assert!(registry.tracked_keys().is_empty());

        registry.set_tracked(&key, true).unwrap();
        assert_eq!(registry.tracked_keys(), vec![key]);
    }

    #[test]
    fn test_reset_reinitializes_from_configured_covariance() {
        let mut registry = registry_with_buoy();
        let key = AttributeKey::new(Shape::Buoy, Color::Red);

        registry.param_channel().update_params("first_buoy", 0.1, 4.0).unwrap();
        {
            let entry = registry.entry_mut(&key).unwrap();
            entry
                .filter
                .reset(Vector4::new(5.0, 5.0, 5.0, 1.0), Matrix4::from_diagonal_element(0.01));
        }

        registry.reset(&key).unwrap();

        let entry = registry.entry(&key).unwrap();
        assert_eq!(entry.filter.mean(), &Vector4::zeros());
        assert_eq!(entry.filter.covariance(), &Matrix4::from_diagonal_element(4.0));
    }

    #[test]
    fn test_estimates_cover_tracked_entries_in_registration_order() {
        let config = TrackerConfig::new(vec![
            buoy_config("first_buoy"),
            ObjectConfig::new("start_gate", "gate", "green", 0.5),
        ])
        .with_immediate_tracking(true);
        let mut registry = TrackerRegistry::from_config(&config);

        let estimates = registry.estimates();
        assert_eq!(estimates.len(), 2);
        assert_eq!(estimates[0].name, "first_buoy");
        assert_eq!(estimates[1].name, "start_gate");

        let gate_key = AttributeKey::new(Shape::Gate, Color::Green);
        registry.set_tracked(&gate_key, false).unwrap();
        assert_eq!(registry.estimates().len(), 1);
    }
}
