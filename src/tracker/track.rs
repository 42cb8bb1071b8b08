//! Single object track for multi-object tracking.

use crate::tracker::kalman_filter::{KalmanFilter, StateCovariance, StateVector};
use crate::tracker::matching::Detection;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;

/// One tracked object: a motion model plus identity and lifecycle counters.
///
/// Tracks are created, advanced and corrected only by
/// [`SortTracker`](crate::SortTracker); callers get read-only access.
#[derive(Debug, Clone)]
pub struct Track {
    track_id: u64,
    mean: StateVector,
    covariance: StateCovariance,
    /// Box predicted at the start of the current frame, before correction
    predicted: Rect,
    score: f32,
    age: u32,
    hits: u32,
    hit_streak: u32,
    time_since_update: u32,
    degenerate_steps: u32,
}

impl Track {
    /// Start a track from an unmatched detection. The detection counts as
    /// the first hit.
    pub(crate) fn new(track_id: u64, detection: &Detection, kalman_filter: &KalmanFilter) -> Self {
        let (mean, covariance) = kalman_filter.initiate(detection.bbox.to_z());
        Self {
            track_id,
            mean,
            covariance,
            predicted: detection.bbox,
            score: detection.score,
            age: 0,
            hits: 1,
            hit_streak: 1,
            time_since_update: 0,
            degenerate_steps: 0,
        }
    }

    /// Advance the motion model by one frame and return the predicted box.
    pub(crate) fn predict(&mut self, kalman_filter: &KalmanFilter) -> Rect {
        if KalmanFilter::clamp_scale_velocity(&mut self.mean) {
            self.degenerate_steps += 1;
            log::debug!(
                "track {}: scale velocity clamped (s={:.3})",
                self.track_id,
                self.mean[2]
            );
        }

        let (mean, covariance) = kalman_filter.predict(&self.mean, &self.covariance);
        self.mean = mean;
        self.covariance = covariance;

        self.age += 1;
        if self.time_since_update > 0 {
            self.hit_streak = 0;
        }
        self.time_since_update += 1;

        self.predicted = self.rect();
        self.predicted
    }

    /// Fuse a matched detection into the motion model.
    pub(crate) fn correct(&mut self, detection: &Detection, kalman_filter: &KalmanFilter) {
        self.time_since_update = 0;
        self.hits += 1;
        self.hit_streak += 1;
        self.score = detection.score;

        let measurement = detection.bbox.to_z();
        match kalman_filter.update(&self.mean, &self.covariance, measurement) {
            Some((mean, covariance)) => {
                self.mean = mean;
                self.covariance = covariance;
            }
            None => {
                log::warn!(
                    "track {}: singular innovation covariance, correction skipped",
                    self.track_id
                );
                return;
            }
        }

        if KalmanFilter::repair_posterior(&mut self.mean, measurement) {
            self.degenerate_steps += 1;
            log::warn!(
                "track {}: non-positive scale or aspect ratio after correction, reset to observation",
                self.track_id
            );
        }
    }

    pub fn track_id(&self) -> u64 {
        self.track_id
    }

    /// Current box estimate in TLBR format.
    pub fn rect(&self) -> Rect {
        Rect::from_z([self.mean[0], self.mean[1], self.mean[2], self.mean[3]])
    }

    /// Box predicted for the current frame before any correction was applied.
    pub fn predicted_rect(&self) -> Rect {
        self.predicted
    }

    /// Score of the last detection fused into this track.
    pub fn score(&self) -> f32 {
        self.score
    }

    /// Frames since creation.
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Total number of detections fused into this track, including the one
    /// that created it.
    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn hit_streak(&self) -> u32 {
        self.hit_streak
    }

    pub fn time_since_update(&self) -> u32 {
        self.time_since_update
    }

    /// Number of frames in which the scale guard had to intervene. A value
    /// that keeps growing marks an unreliable track.
    pub fn degenerate_steps(&self) -> u32 {
        self.degenerate_steps
    }

    pub fn mean(&self) -> &StateVector {
        &self.mean
    }

    pub fn covariance(&self) -> &StateCovariance {
        &self.covariance
    }

    pub fn state(&self, min_hits: u32) -> TrackState {
        if self.time_since_update > 0 {
            TrackState::Lost
        } else if self.hit_streak >= min_hits {
            TrackState::Confirmed
        } else {
            TrackState::Tentative
        }
    }
}
