//! TrackerPipeline for combining detection with tracking.

use crate::error::ConfigError;
use crate::tracker::{SortTracker, TrackerConfig, TrackerOutput};

use super::DetectionSource;

/// A combined tracker that bundles detection inference with SORT.
///
/// Detection for a frame always completes before tracking for that frame
/// starts; there is no partial or streaming input.
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    tracker: SortTracker,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Create a new tracking pipeline with the given detector and tracker config.
    pub fn new(detector: D, config: TrackerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            detector,
            tracker: SortTracker::new(config)?,
        })
    }

    /// Create a new tracking pipeline with default tracker configuration.
    pub fn with_default_config(detector: D) -> Result<Self, ConfigError> {
        Self::new(detector, TrackerConfig::default())
    }

    /// Run detection on one frame and feed the result to the tracker.
    ///
    /// A detector error leaves the tracker untouched, as if the frame had
    /// never been submitted.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<TrackerOutput, D::Error> {
        let detections = self.detector.detect(input, width, height)?;
        Ok(self.tracker.update(detections))
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &SortTracker {
        &self.tracker
    }
}
