//! Constant-velocity Kalman filter over XYAH boxes, on nalgebra fixed-size matrices.

use nalgebra::{SMatrix, SVector};
use tracing::warn;

/// State: center x, center y, aspect ratio, height and their velocities.
pub type StateMean = SVector<f64, 8>;
pub type StateCovariance = SMatrix<f64, 8, 8>;

type Measurement = SVector<f64, 4>;

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: SMatrix<f64, 8, 8>,
    update_mat: SMatrix<f64, 4, 8>,
    std_weight_position: f64,
    std_weight_velocity: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanFilter {
    pub fn new() -> Self {
        let mut motion_mat = SMatrix::<f64, 8, 8>::identity();
        let mut update_mat = SMatrix::<f64, 4, 8>::zeros();
        for i in 0..4 {
            motion_mat[(i, 4 + i)] = 1.0;
            update_mat[(i, i)] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 160.0,
        }
    }

    pub fn initiate(&self, measurement: [f64; 4]) -> (StateMean, StateCovariance) {
        let mut mean = StateMean::zeros();
        mean.fixed_rows_mut::<4>(0)
            .copy_from(&Measurement::from(measurement));

        let h = measurement[3];
        let std = [
            2.0 * self.std_weight_position * h,
            2.0 * self.std_weight_position * h,
            1e-2,
            2.0 * self.std_weight_position * h,
            10.0 * self.std_weight_velocity * h,
            10.0 * self.std_weight_velocity * h,
            1e-5,
            10.0 * self.std_weight_velocity * h,
        ];

        (mean, diagonal_variance(std))
    }

    pub fn predict(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
    ) -> (StateMean, StateCovariance) {
        let h = mean[3];
        let motion_cov = diagonal_variance([
            self.std_weight_position * h,
            self.std_weight_position * h,
            1e-2,
            self.std_weight_position * h,
            self.std_weight_velocity * h,
            self.std_weight_velocity * h,
            1e-5,
            self.std_weight_velocity * h,
        ]);

        let new_mean = self.motion_mat * mean;
        let new_covariance =
            self.motion_mat * covariance * self.motion_mat.transpose() + motion_cov;

        (new_mean, new_covariance)
    }

    /// Project the state distribution into measurement space.
    pub fn project(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
    ) -> (Measurement, SMatrix<f64, 4, 4>) {
        let h = mean[3];
        let innovation_cov = diagonal_variance([
            self.std_weight_position * h,
            self.std_weight_position * h,
            1e-1,
            self.std_weight_position * h,
        ]);

        let mean_proj = self.update_mat * mean;
        let covariance_proj =
            self.update_mat * covariance * self.update_mat.transpose() + innovation_cov;

        (mean_proj, covariance_proj)
    }

    /// Correct the state with a measurement. A singular innovation covariance
    /// (zero-height box) leaves the state unchanged.
    pub fn update(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
        measurement: [f64; 4],
    ) -> (StateMean, StateCovariance) {
        let (projected_mean, projected_cov) = self.project(mean, covariance);

        let Some(s_inv) = projected_cov.try_inverse() else {
            warn!(?measurement, "singular innovation covariance, skipping correction");
            return (*mean, *covariance);
        };

        let innovation = Measurement::from(measurement) - projected_mean;
        let kalman_gain = covariance * self.update_mat.transpose() * s_inv;

        let new_mean = mean + kalman_gain * innovation;
        let new_covariance = covariance - kalman_gain * projected_cov * kalman_gain.transpose();

        (new_mean, new_covariance)
    }
}

fn diagonal_variance<const D: usize>(std: [f64; D]) -> SMatrix<f64, D, D> {
    SMatrix::from_diagonal(&SVector::from(std).map(|s| s * s))
}
