//! Main SORT algorithm implementation.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, DetectionError};
use crate::tracker::kalman_filter::{
    DEFAULT_INITIAL_COVARIANCE, DEFAULT_MEASUREMENT_NOISE, DEFAULT_PROCESS_NOISE, KalmanFilter,
};
use crate::tracker::matching::{self, AssignmentResult, Detection};
use crate::tracker::rect::Rect;
use crate::tracker::track::Track;
use crate::tracker::track_state::TrackState;

/// When unconfirmed tracks may be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WarmupPolicy {
    /// Only tracks whose hit streak reached `min_hits` are reported.
    #[default]
    Disabled,
    /// A track matched this frame is also reported while its own age is
    /// below `min_hits`.
    TrackAge,
    /// Any track matched this frame is reported during the first `min_hits`
    /// frames seen by the tracker.
    TrackerStartup,
}

/// Configuration for the SortTracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Frames a track may go unmatched before it is deleted
    pub max_age: u32,
    /// Hit streak required before a track is reported
    pub min_hits: u32,
    /// Minimum IoU for a track/detection pair to be matched
    pub iou_threshold: f32,
    /// Grace for unconfirmed tracks; `TrackAge` reports tracks younger than `min_hits`
    pub warmup: WarmupPolicy,
    /// Observation noise diagonal for `[cx, cy, s, r]`
    pub measurement_noise: [f64; 4],
    /// Process noise diagonal for `[cx, cy, s, r, vx, vy, vs]`
    pub process_noise: [f64; 7],
    /// Covariance diagonal of a newly created track
    pub initial_covariance: [f64; 7],
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_age: 30,
            min_hits: 15,
            iou_threshold: 0.3,
            warmup: WarmupPolicy::Disabled,
            measurement_noise: DEFAULT_MEASUREMENT_NOISE,
            process_noise: DEFAULT_PROCESS_NOISE,
            initial_covariance: DEFAULT_INITIAL_COVARIANCE,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(ConfigError::IouThreshold(self.iou_threshold));
        }
        if self.min_hits == 0 {
            return Err(ConfigError::ZeroMinHits);
        }

        let diagonals: [(&'static str, &[f64]); 3] = [
            ("measurement_noise", &self.measurement_noise),
            ("process_noise", &self.process_noise),
            ("initial_covariance", &self.initial_covariance),
        ];
        for (name, values) in diagonals {
            if let Some(&value) = values.iter().find(|v| !v.is_finite() || **v <= 0.0) {
                return Err(ConfigError::NoiseVariance { name, value });
            }
        }
        Ok(())
    }
}

/// A confirmed track reported for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject {
    pub track_id: u64,
    /// Corrected box in TLBR format
    pub bbox: Rect,
    /// Score of the detection matched this frame
    pub score: f32,
}

impl TrackedObject {
    /// Row in `[x1, y1, x2, y2, score, track_id]` layout.
    pub fn to_row(&self) -> [f32; 6] {
        let [x1, y1, x2, y2] = self.bbox.to_tlbr();
        [x1, y1, x2, y2, self.score, self.track_id as f32]
    }
}

/// Predicted (pre-correction) box of a live track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub track_id: u64,
    pub bbox: Rect,
    pub state: TrackState,
}

/// A detection refused by input validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedDetection {
    /// Position in the input of `update`
    pub index: usize,
    pub error: DetectionError,
}

/// Result of one `update` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerOutput {
    /// Reported tracks, ordered by ascending `track_id`
    pub tracks: Vec<TrackedObject>,
    pub rejected: Vec<RejectedDetection>,
}

impl TrackerOutput {
    /// Reported tracks as an N x 6 array of `[x1, y1, x2, y2, score, track_id]` rows.
    pub fn to_array(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.tracks.len(), 6), |(i, j)| self.tracks[i].to_row()[j])
    }
}

/// SORT multi-object tracker.
///
/// Owns every live track. Each [`update`](Self::update) runs one frame:
/// predict, associate, correct, spawn, prune, report.
#[derive(Debug, Clone)]
pub struct SortTracker {
    tracks: Vec<Track>,
    frame_count: u32,
    next_id: u64,
    config: TrackerConfig,
    kalman_filter: KalmanFilter,
}

impl SortTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "Creating SortTracker: max_age={}, min_hits={}, iou_threshold={:.3}, warmup={:?}",
            config.max_age,
            config.min_hits,
            config.iou_threshold,
            config.warmup
        );

        let kalman_filter = KalmanFilter::new(
            config.measurement_noise,
            config.process_noise,
            config.initial_covariance,
        );
        Ok(Self {
            tracks: Vec::new(),
            frame_count: 0,
            next_id: 1,
            config,
            kalman_filter,
        })
    }

    pub fn update(&mut self, detections: Vec<Detection>) -> TrackerOutput {
        self.frame_count += 1;

        // Step 0: Drop malformed detections before they reach the filter
        let mut valid = Vec::with_capacity(detections.len());
        let mut rejected = Vec::new();
        for (index, det) in detections.into_iter().enumerate() {
            match det.validate() {
                Ok(()) => valid.push(det),
                Err(error) => {
                    log::warn!(
                        "frame {}: rejected detection #{}: {}",
                        self.frame_count,
                        index,
                        error
                    );
                    rejected.push(RejectedDetection { index, error });
                }
            }
        }

        // Step 1: Predict every live track
        let kalman_filter = &self.kalman_filter;
        let predicted: Vec<Rect> = self
            .tracks
            .iter_mut()
            .map(|track| track.predict(kalman_filter))
            .collect();

        // Step 2: Associate predictions with detections
        let det_rects: Vec<Rect> = valid.iter().map(|d| d.bbox).collect();
        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::associate(&predicted, &det_rects, self.config.iou_threshold);

        log::trace!(
            "frame {}: {} tracks, {} detections, {} matched, {} unmatched tracks, {} unmatched detections",
            self.frame_count,
            predicted.len(),
            valid.len(),
            matches.len(),
            unmatched_tracks.len(),
            unmatched_detections.len()
        );

        // Step 3: Correct matched tracks
        for (itracked, idet) in matches {
            self.tracks[itracked].correct(&valid[idet], &self.kalman_filter);
        }

        // Step 4: Init new tracks
        for idet in unmatched_detections {
            let track = Track::new(self.next_id, &valid[idet], &self.kalman_filter);
            log::debug!(
                "frame {}: new track {} at {:?}",
                self.frame_count,
                self.next_id,
                valid[idet].bbox.to_tlbr()
            );
            self.next_id += 1;
            self.tracks.push(track);
        }

        // Step 5: Remove stale tracks
        let max_age = self.config.max_age;
        let frame_count = self.frame_count;
        self.tracks.retain(|track| {
            let keep = track.time_since_update() <= max_age;
            if !keep {
                log::debug!(
                    "frame {}: removing track {} after {} missed frames",
                    frame_count,
                    track.track_id(),
                    track.time_since_update()
                );
            }
            keep
        });

        // Step 6: Report tracks matched this frame that pass the confirmation policy
        let tracks = self
            .tracks
            .iter()
            .filter(|track| self.is_reportable(track))
            .map(|track| TrackedObject {
                track_id: track.track_id(),
                bbox: track.rect(),
                score: track.score(),
            })
            .collect();

        TrackerOutput { tracks, rejected }
    }

    fn is_reportable(&self, track: &Track) -> bool {
        if track.time_since_update() > 0 {
            return false;
        }
        let min_hits = self.config.min_hits;
        track.hit_streak() >= min_hits
            || match self.config.warmup {
                WarmupPolicy::Disabled => false,
                WarmupPolicy::TrackAge => track.age() < min_hits,
                WarmupPolicy::TrackerStartup => self.frame_count <= min_hits,
            }
    }

    /// Predicted (pre-correction) boxes of every live track, ordered by
    /// `track_id`. Tracks born this frame report their initial box.
    pub fn predictions(&self) -> Vec<Prediction> {
        self.tracks
            .iter()
            .map(|track| Prediction {
                track_id: track.track_id(),
                bbox: track.predicted_rect(),
                state: track.state(self.config.min_hits),
            })
            .collect()
    }

    /// Live tracks, ordered by `track_id`.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Number of `update` calls so far.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}
