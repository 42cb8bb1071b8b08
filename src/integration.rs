//! Integration module for feeding detector output into the SORT tracker.
//!
//! The detector itself is an external collaborator. This module provides the
//! seam it plugs into ([`DetectionSource`]), conversions from common raw
//! detection layouts ([`IntoDetections`], [`DetectionBuilder`]) and a
//! [`TrackerPipeline`] that runs detection and tracking frame by frame.

mod builder;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use pipeline::TrackerPipeline;
