//! Constant-velocity Kalman filter over bounding boxes, on fixed-size nalgebra matrices.
//!
//! The state is `[cx, cy, s, r, vx, vy, vs]`: box center, scale (area) and
//! aspect ratio, plus the velocities of center and scale. The aspect ratio
//! has no rate term. Observations are `[cx, cy, s, r]`.

use nalgebra::{Matrix4, SMatrix, SVector, Vector4};

/// Filter state mean.
pub type StateVector = SVector<f64, 7>;
/// Filter state covariance.
pub type StateCovariance = SMatrix<f64, 7, 7>;

type UpdateMatrix = SMatrix<f64, 4, 7>;
type KalmanGain = SMatrix<f64, 7, 4>;

/// Default observation noise diagonal for `[cx, cy, s, r]`.
pub const DEFAULT_MEASUREMENT_NOISE: [f64; 4] = [1.0, 1.0, 10.0, 10.0];
/// Default process noise diagonal for `[cx, cy, s, r, vx, vy, vs]`.
pub const DEFAULT_PROCESS_NOISE: [f64; 7] = [1.0, 1.0, 1.0, 1.0, 0.01, 0.01, 0.0001];
/// Default initial covariance diagonal. Velocities are unobserved at birth.
pub const DEFAULT_INITIAL_COVARIANCE: [f64; 7] = [10.0, 10.0, 10.0, 10.0, 1e4, 1e4, 1e4];

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: StateCovariance,
    update_mat: UpdateMatrix,
    process_cov: StateCovariance,
    innovation_cov: Matrix4<f64>,
    initial_cov: StateCovariance,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_MEASUREMENT_NOISE,
            DEFAULT_PROCESS_NOISE,
            DEFAULT_INITIAL_COVARIANCE,
        )
    }
}

impl KalmanFilter {
    pub fn new(
        measurement_noise: [f64; 4],
        process_noise: [f64; 7],
        initial_covariance: [f64; 7],
    ) -> Self {
        let mut motion_mat = StateCovariance::identity();
        for i in 0..3 {
            motion_mat[(i, 4 + i)] = 1.0;
        }

        let mut update_mat = UpdateMatrix::zeros();
        for i in 0..4 {
            update_mat[(i, i)] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            process_cov: StateCovariance::from_diagonal(&StateVector::from(process_noise)),
            innovation_cov: Matrix4::from_diagonal(&Vector4::from(measurement_noise)),
            initial_cov: StateCovariance::from_diagonal(&StateVector::from(initial_covariance)),
        }
    }

    /// Create a track state from an unassociated measurement, with zero velocity.
    pub fn initiate(&self, measurement: [f64; 4]) -> (StateVector, StateCovariance) {
        let mut mean = StateVector::zeros();
        mean.fixed_rows_mut::<4>(0).copy_from(&Vector4::from(measurement));
        (mean, self.initial_cov)
    }

    /// Run the prediction step: `x = F x`, `P = F P F^T + Q`.
    pub fn predict(
        &self,
        mean: &StateVector,
        covariance: &StateCovariance,
    ) -> (StateVector, StateCovariance) {
        let new_mean = self.motion_mat * mean;
        let new_covariance =
            self.motion_mat * covariance * self.motion_mat.transpose() + self.process_cov;
        (new_mean, new_covariance)
    }

    /// Project the state distribution into measurement space.
    pub fn project(
        &self,
        mean: &StateVector,
        covariance: &StateCovariance,
    ) -> (Vector4<f64>, Matrix4<f64>) {
        let mean_proj = self.update_mat * mean;
        let covariance_proj =
            self.update_mat * covariance * self.update_mat.transpose() + self.innovation_cov;
        (mean_proj, covariance_proj)
    }

    /// Run the correction step against a measurement `[cx, cy, s, r]`.
    ///
    /// Returns `None` when the innovation covariance cannot be inverted.
    pub fn update(
        &self,
        mean: &StateVector,
        covariance: &StateCovariance,
        measurement: [f64; 4],
    ) -> Option<(StateVector, StateCovariance)> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);
        let innovation = Vector4::from(measurement) - projected_mean;

        // K = P * H^T * S^-1
        let s_inv = projected_cov.try_inverse()?;
        let kalman_gain: KalmanGain = covariance * self.update_mat.transpose() * s_inv;

        let new_mean = mean + kalman_gain * innovation;
        let new_covariance = covariance - kalman_gain * projected_cov * kalman_gain.transpose();

        Some((new_mean, new_covariance))
    }

    /// Zero the scale velocity when the next prediction would drive the
    /// scale to zero or below. Returns true when the guard fired.
    pub fn clamp_scale_velocity(mean: &mut StateVector) -> bool {
        if mean[2] + mean[6] <= 0.0 {
            mean[6] = 0.0;
            true
        } else {
            false
        }
    }

    /// Restore a positive scale and aspect ratio after a correction by
    /// falling back to the observed values. Returns true when a repair was
    /// needed.
    pub fn repair_posterior(mean: &mut StateVector, measurement: [f64; 4]) -> bool {
        let mut repaired = false;
        if mean[2].is_nan() || mean[2] <= 0.0 {
            mean[2] = measurement[2];
            mean[6] = 0.0;
            repaired = true;
        }
        if mean[3].is_nan() || mean[3] <= 0.0 {
            mean[3] = measurement[3];
            repaired = true;
        }
        repaired
    }
}
