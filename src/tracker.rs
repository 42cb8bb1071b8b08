mod hungarian;
mod kalman_filter;
mod matching;
mod rect;
mod sort_tracker;
mod track;
mod track_state;

pub use hungarian::{assignment_cost, linear_sum_assignment};
pub use kalman_filter::{StateCovariance, StateVector};
pub use matching::{AssignmentResult, Detection, associate, iou_distance, linear_assignment};
pub use rect::{Rect, iou_batch};
pub use sort_tracker::{
    Prediction, RejectedDetection, SortTracker, TrackedObject, TrackerConfig, TrackerOutput,
    WarmupPolicy,
};
pub use track::Track;
pub use track_state::TrackState;
