//! Trait for object detection backends feeding the tracker.

use ndarray::{Array2, ArrayView2};

use crate::tracker::Detection;

/// Trait for object detection inference backends.
///
/// Implement this trait to connect any detection model to the tracker.
/// Closures with the same signature implement it too.
///
/// # Example
///
/// ```ignore
/// use sort_tracker::{DetectionSource, Detection};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, input: &[u8], width: u32, height: u32) -> Result<Vec<Detection>, Self::Error> {
///         // Run inference and return score-filtered detections
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error;

    /// Run inference on raw image data and return the detections of one frame.
    ///
    /// Detections are expected to be already filtered by confidence; the
    /// tracker does not look at scores when associating.
    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error>;
}

impl<F, E> DetectionSource for F
where
    F: FnMut(&[u8], u32, u32) -> Result<Vec<Detection>, E>,
{
    type Error = E;

    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error> {
        self(input, width, height)
    }
}

/// Helper trait for converting model-specific outputs to `Detection`.
pub trait IntoDetections {
    /// Convert the output into a vector of detections.
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}

/// Rows of `[x1, y1, x2, y2, score]`.
impl IntoDetections for Vec<[f32; 5]> {
    fn into_detections(self) -> Vec<Detection> {
        self.into_iter()
            .map(|[x1, y1, x2, y2, score]| Detection::new(x1, y1, x2, y2, score))
            .collect()
    }
}

/// An N x K array whose rows start with `x1, y1, x2, y2[, score]`.
///
/// Columns past the fifth (class id, ...) are ignored. Without a score
/// column every detection gets a score of 1.0.
impl IntoDetections for ArrayView2<'_, f32> {
    fn into_detections(self) -> Vec<Detection> {
        if self.ncols() < 4 {
            log::warn!(
                "detection array has {} columns, expected at least 4; ignoring it",
                self.ncols()
            );
            return Vec::new();
        }
        self.rows()
            .into_iter()
            .map(|row| {
                let score = if row.len() > 4 { row[4] } else { 1.0 };
                Detection::new(row[0], row[1], row[2], row[3], score)
            })
            .collect()
    }
}

impl IntoDetections for Array2<f32> {
    fn into_detections(self) -> Vec<Detection> {
        self.view().into_detections()
    }
}
