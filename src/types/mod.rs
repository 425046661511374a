//! Core types for the tracker
//!
//! - [`AttributeKey`], [`Shape`], [`Color`] - semantic identity of a tracked object
//! - [`Detection`], [`DetectionBatch`] - inbound detection schema
//! - [`ObjectConfig`], [`TrackerConfig`], [`DepthMethod`] - startup configuration

pub mod attribute;
pub mod config;
pub mod detection;

pub use attribute::{AttributeKey, Color, Shape};
pub use config::{DepthMethod, ObjectConfig, TrackerConfig};
pub use detection::{Detection, DetectionBatch};
