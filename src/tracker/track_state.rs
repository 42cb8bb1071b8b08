use serde::{Deserialize, Serialize};

/// Track lifecycle state as seen from the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackState {
    /// Matched this frame, hit streak still below `min_hits`
    #[default]
    Tentative,
    /// Matched this frame with a hit streak of at least `min_hits`
    Confirmed,
    /// Not matched this frame; coasting on its motion model
    Lost,
}
