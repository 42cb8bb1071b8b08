//! Error types for the tracker.

use thiserror::Error;

/// Reasons a detection is refused before it reaches the motion model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("detection has non-finite coordinates: {0:?}")]
    NonFinite([f32; 4]),

    #[error("detection has non-positive extent: width={width}, height={height}")]
    EmptyBox { width: f32, height: f32 },
}

/// Invalid tracker configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("iou_threshold must lie in [0, 1], got {0}")]
    IouThreshold(f32),

    #[error("min_hits must be at least 1")]
    ZeroMinHits,

    #[error("{name} must be finite and positive, got {value}")]
    NoiseVariance { name: &'static str, value: f64 },
}
