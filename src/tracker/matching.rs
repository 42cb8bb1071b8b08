//! Detection input and IoU-based association for multi-object tracking.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::DetectionError;
use crate::tracker::hungarian::linear_sum_assignment;
use crate::tracker::rect::{Rect, iou_batch};

/// Detection input for the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box in TLBR format (x1, y1, x2, y2)
    pub bbox: Rect,
    /// Detection confidence score
    pub score: f32,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self {
            bbox: Rect::new(x1, y1, x2, y2),
            score,
        }
    }

    pub fn from_rect(bbox: Rect, score: f32) -> Self {
        Self { bbox, score }
    }

    /// Check that the box is finite with positive width and height.
    pub fn validate(&self) -> Result<(), DetectionError> {
        if !self.bbox.is_finite() {
            return Err(DetectionError::NonFinite(self.bbox.to_tlbr()));
        }
        let (width, height) = (self.bbox.width(), self.bbox.height());
        if width <= 0.0 || height <= 0.0 {
            return Err(DetectionError::EmptyBox { width, height });
        }
        Ok(())
    }
}

/// Compute IoU distance matrix between tracks and detections.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    iou_batch(track_boxes, det_boxes).mapv(|iou| 1.0 - iou)
}

/// Outcome of one association round. All index lists are ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    /// `(track_idx, detection_idx)` pairs, ordered by track index
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Assign detections to tracks so that the summed IoU over the matched pairs
/// is maximal, using only pairs with `iou >= iou_threshold`.
///
/// `iou_matrix` has one row per track and one column per detection.
/// Pairs below the threshold cost the same as leaving both sides
/// unmatched, so the solver never prefers them, and any such pair it
/// returns is dropped into the unmatched lists.
pub fn linear_assignment(iou_matrix: &Array2<f32>, iou_threshold: f32) -> AssignmentResult {
    let (num_rows, num_cols) = iou_matrix.dim();

    if num_rows == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: vec![],
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    if num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: vec![],
        };
    }

    let eligible = |iou: f32| iou.is_finite() && iou >= iou_threshold;
    let cost = iou_matrix.mapv(|iou| if eligible(iou) { 1.0 - iou as f64 } else { 1.0 });

    let mut matches = vec![];
    let mut unmatched_tracks = vec![];
    let mut unmatched_detections_mask = vec![true; num_cols];

    for (row_idx, col) in linear_sum_assignment(&cost).into_iter().enumerate() {
        match col {
            Some(col_idx) if eligible(iou_matrix[[row_idx, col_idx]]) => {
                matches.push((row_idx, col_idx));
                unmatched_detections_mask[col_idx] = false;
            }
            _ => unmatched_tracks.push(row_idx),
        }
    }

    let unmatched_detections = unmatched_detections_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| u.then_some(i))
        .collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}

/// Associate predicted track boxes with detection boxes by IoU.
pub fn associate(track_boxes: &[Rect], det_boxes: &[Rect], iou_threshold: f32) -> AssignmentResult {
    linear_assignment(&iou_batch(track_boxes, det_boxes), iou_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_validate_detection() {
        assert!(Detection::new(0.0, 0.0, 10.0, 10.0, 0.9).validate().is_ok());

        assert_eq!(
            Detection::new(5.0, 0.0, 5.0, 10.0, 0.9).validate(),
            Err(DetectionError::EmptyBox {
                width: 0.0,
                height: 10.0
            })
        );
        assert!(matches!(
            Detection::new(0.0, 10.0, 10.0, 2.0, 0.9).validate(),
            Err(DetectionError::EmptyBox { .. })
        ));
        assert!(matches!(
            Detection::new(f32::NAN, 0.0, 10.0, 10.0, 0.9).validate(),
            Err(DetectionError::NonFinite(_))
        ));
        assert!(matches!(
            Detection::new(0.0, 0.0, f32::INFINITY, 10.0, 0.9).validate(),
            Err(DetectionError::NonFinite(_))
        ));
    }

    #[test]
    fn test_iou_distance() {
        let a = [Rect::new(0.0, 0.0, 10.0, 10.0)];
        let b = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(50.0, 50.0, 60.0, 60.0)];
        let dists = iou_distance(&a, &b);
        assert!(dists[[0, 0]].abs() < 1e-6);
        assert_eq!(dists[[0, 1]], 1.0);
    }

    #[test]
    fn test_diagonal_beats_cross_pairing() {
        let ious = array![[0.9, 0.1], [0.1, 0.9]];
        let result = linear_assignment(&ious, 0.3);
        assert_eq!(result.matches, vec![(0, 0), (1, 1)]);
        assert!(result.unmatched_tracks.is_empty());
        assert!(result.unmatched_detections.is_empty());
    }

    #[test]
    fn test_maximizes_total_iou() {
        // Greedy on the best pair (0, 0) would leave track 1 unmatched.
        let ious = array![[0.8, 0.7], [0.6, 0.0]];
        let result = linear_assignment(&ious, 0.3);
        assert_eq!(result.matches, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_below_threshold_never_matched() {
        let ious = array![[0.1, 0.25], [0.29, 0.0]];
        let result = linear_assignment(&ious, 0.3);
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_tracks, vec![0, 1]);
        assert_eq!(result.unmatched_detections, vec![0, 1]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let ious = array![[0.5]];
        let result = linear_assignment(&ious, 0.5);
        assert_eq!(result.matches, vec![(0, 0)]);
    }

    #[test]
    fn test_ineligible_pairs_do_not_block_eligible_ones() {
        // Only (1, 0) clears the gate.
        let ious = array![[0.2, 0.1], [0.6, 0.2], [0.0, 0.0]];
        let result = linear_assignment(&ious, 0.3);
        assert_eq!(result.matches, vec![(1, 0)]);
        assert_eq!(result.unmatched_tracks, vec![0, 2]);
        assert_eq!(result.unmatched_detections, vec![1]);
    }

    #[test]
    fn test_rectangular_partitions() {
        let tracks = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(100.0, 100.0, 110.0, 110.0),
        ];
        let dets = [
            Rect::new(101.0, 100.0, 111.0, 110.0),
            Rect::new(300.0, 300.0, 310.0, 310.0),
            Rect::new(1.0, 0.0, 11.0, 10.0),
        ];
        let result = associate(&tracks, &dets, 0.3);
        assert_eq!(result.matches, vec![(0, 2), (1, 0)]);
        assert!(result.unmatched_tracks.is_empty());
        assert_eq!(result.unmatched_detections, vec![1]);
    }

    #[test]
    fn test_empty_inputs() {
        let boxes = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(5.0, 5.0, 9.0, 9.0)];

        let no_tracks = associate(&[], &boxes, 0.3);
        assert!(no_tracks.matches.is_empty());
        assert!(no_tracks.unmatched_tracks.is_empty());
        assert_eq!(no_tracks.unmatched_detections, vec![0, 1]);

        let no_dets = associate(&boxes, &[], 0.3);
        assert!(no_dets.matches.is_empty());
        assert_eq!(no_dets.unmatched_tracks, vec![0, 1]);
        assert!(no_dets.unmatched_detections.is_empty());

        assert_eq!(associate(&[], &[], 0.3), AssignmentResult::default());
    }

    #[test]
    fn test_equal_overlap_is_deterministic() {
        // Two identical tracks competing for two identical detections.
        let boxes = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(0.0, 0.0, 10.0, 10.0)];
        let first = associate(&boxes, &boxes, 0.3);
        assert_eq!(first.matches, vec![(0, 0), (1, 1)]);
        for _ in 0..10 {
            assert_eq!(associate(&boxes, &boxes, 0.3), first);
        }
    }
}
