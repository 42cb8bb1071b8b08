//! SORT: Simple Online and Realtime Tracking.
//!
//! A per-frame multi-object tracker. Each call to [`SortTracker::update`]
//! takes the detections of one frame and returns the boxes of the confirmed
//! tracks together with their stable identities.
//!
//! ```
//! use sort_tracker::{Detection, SortTracker, TrackerConfig};
//!
//! let config = TrackerConfig {
//!     min_hits: 1,
//!     ..TrackerConfig::default()
//! };
//! let mut tracker = SortTracker::new(config).unwrap();
//!
//! let output = tracker.update(vec![Detection::new(10.0, 10.0, 50.0, 90.0, 0.9)]);
//! assert_eq!(output.tracks.len(), 1);
//! assert_eq!(output.tracks[0].track_id, 1);
//! ```

pub mod error;
pub mod integration;
pub mod tracker;

pub use error::{ConfigError, DetectionError};
pub use integration::{DetectionBuilder, DetectionSource, IntoDetections, TrackerPipeline};
pub use tracker::{
    Detection, Prediction, Rect, RejectedDetection, SortTracker, Track, TrackState,
    TrackedObject, TrackerConfig, TrackerOutput, WarmupPolicy,
};
