use nalgebra::{DMatrix, Matrix3};

use crate::error::RectifyError;
use crate::geometry::{Correspondence, Point2, Vec3};

/// Relative tolerance used for determinant and w-component tests.
pub const DEFAULT_RELATIVE_EPSILON: f64 = 1e-12;

/// A 3x3 homography matrix, row-major.
///
/// Only defined up to a non-zero scale: `H` and `c * H` describe the same
/// transform, and nothing downstream depends on the scale.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Homography {
    pub data: [[f64; 3]; 3],
}

impl Homography {
    pub fn from_rows(data: [[f64; 3]; 3]) -> Self {
        Self { data }
    }

    /// Estimate the homography taking each source point to its target.
    ///
    /// Shorthand for [`HomographyEstimator::estimate`] with default config.
    pub fn estimate(correspondences: &[Correspondence; 4]) -> Result<Self, RectifyError> {
        HomographyEstimator::default().estimate(correspondences)
    }

    /// `H * v`.
    pub fn apply(&self, v: Vec3) -> Vec3 {
        let h = &self.data;
        Vec3::new(
            h[0][0] * v.x + h[0][1] * v.y + h[0][2] * v.z,
            h[1][0] * v.x + h[1][1] * v.y + h[1][2] * v.z,
            h[2][0] * v.x + h[2][1] * v.y + h[2][2] * v.z,
        )
    }

    /// `c * H`. Describes the same transform for any `c != 0`.
    pub fn scaled(&self, c: f64) -> Self {
        let mut data = self.data;
        for row in data.iter_mut() {
            for v in row.iter_mut() {
                *v *= c;
            }
        }
        Self { data }
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.data;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Largest singular value.
    pub fn operator_norm(&self) -> f64 {
        self.to_matrix()
            .singular_values()
            .iter()
            .fold(0.0f64, |acc, &s| acc.max(s))
    }

    pub fn frobenius_norm(&self) -> f64 {
        self.data.iter().flatten().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Compute the inverse homography.
    pub fn inverse(&self) -> Result<Self, RectifyError> {
        self.inverse_with(DEFAULT_RELATIVE_EPSILON)
    }

    /// Inverse via the adjugate. Fails when `|det| <= eps * ||H||^3`, which
    /// keeps the test independent of the scale of `H`.
    pub fn inverse_with(&self, relative_epsilon: f64) -> Result<Self, RectifyError> {
        let m = &self.data;
        let det = self.determinant();
        let norm = self.operator_norm();

        if !det.is_finite() || det.abs() <= relative_epsilon * norm.powi(3) {
            return Err(RectifyError::SingularHomography { det, norm });
        }

        let inv_det = 1.0 / det;
        let mut inv = [[0.0f64; 3]; 3];

        inv[0][0] = (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det;
        inv[0][1] = (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det;
        inv[0][2] = (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det;
        inv[1][0] = (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det;
        inv[1][1] = (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det;
        inv[1][2] = (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det;
        inv[2][0] = (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det;
        inv[2][1] = (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det;
        inv[2][2] = (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det;

        Ok(Homography { data: inv })
    }

    pub fn to_matrix(&self) -> Matrix3<f64> {
        let m = &self.data;
        Matrix3::new(
            m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
        )
    }

    pub fn from_matrix(m: &Matrix3<f64>) -> Self {
        let mut data = [[0.0f64; 3]; 3];
        for (r, row) in data.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = m[(r, c)];
            }
        }
        Self { data }
    }
}

/// Thresholds for the DLT estimator.
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Reject when `sigma_min / sigma_second` exceeds this: the null vector
    /// is not well separated from the next singular direction.
    pub null_space_ratio: f64,
    /// Reject when `sigma_second / sigma_max` falls below this: the null
    /// space is (numerically) at least two-dimensional.
    pub rank_tolerance: f64,
    /// Twice the triangle area of three points, relative to the squared
    /// extent of the point set, below which they count as collinear.
    pub collinearity_tolerance: f64,
    /// Translate and scale the source points to a well-conditioned frame
    /// before building the design matrix.
    pub condition: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            null_space_ratio: 0.1,
            rank_tolerance: 1e-9,
            collinearity_tolerance: 1e-6,
            condition: true,
        }
    }
}

/// Direct Linear Transform over exactly four correspondences.
#[derive(Debug, Clone, Default)]
pub struct HomographyEstimator {
    pub config: EstimatorConfig,
}

impl HomographyEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Estimate `H` such that `target ~ H * source` for all four pairs.
    ///
    /// The result is scaled to unit Frobenius norm with the sign chosen so
    /// that source points have positive w.
    pub fn estimate(
        &self,
        correspondences: &[Correspondence; 4],
    ) -> Result<Homography, RectifyError> {
        let sources: [Point2; 4] = std::array::from_fn(|i| correspondences[i].source);
        let targets: [Point2; 4] = std::array::from_fn(|i| correspondences[i].target);
        check_general_position(&sources, "source", self.config.collinearity_tolerance)?;
        check_general_position(&targets, "target", self.config.collinearity_tolerance)?;

        let t = if self.config.condition {
            conditioning_transform(&sources)
        } else {
            Matrix3::identity()
        };

        // 8 equations padded with a zero row so the SVD yields all 9 right
        // singular vectors.
        let mut a = DMatrix::<f64>::zeros(9, 9);
        for (i, c) in correspondences.iter().enumerate() {
            let s = t * nalgebra::Vector3::new(c.source.x, c.source.y, 1.0);
            let (sx, sy) = (s[0] / s[2], s[1] / s[2]);
            let (tx, ty) = (c.target.x, c.target.y);

            let r0 = 2 * i;
            a[(r0, 0)] = -sx;
            a[(r0, 1)] = -sy;
            a[(r0, 2)] = -1.0;
            a[(r0, 6)] = sx * tx;
            a[(r0, 7)] = sy * tx;
            a[(r0, 8)] = tx;

            let r1 = 2 * i + 1;
            a[(r1, 3)] = -sx;
            a[(r1, 4)] = -sy;
            a[(r1, 5)] = -1.0;
            a[(r1, 6)] = sx * ty;
            a[(r1, 7)] = sy * ty;
            a[(r1, 8)] = ty;
        }

        let svd = a.svd(false, true);
        let v_t = svd
            .v_t
            .ok_or_else(|| RectifyError::DegenerateInput("SVD did not produce V^T".into()))?;
        let sigma = &svd.singular_values;

        let mut order: Vec<usize> = (0..sigma.len()).collect();
        order.sort_by(|&i, &j| sigma[i].total_cmp(&sigma[j]));
        let (smallest, second, largest) = (
            sigma[order[0]],
            sigma[order[1]],
            sigma[order[order.len() - 1]],
        );
        log::debug!(
            "DLT singular values: min {smallest:e}, second {second:e}, max {largest:e}"
        );

        if largest.is_nan() || largest <= 0.0 || second <= self.config.rank_tolerance * largest {
            return Err(RectifyError::DegenerateInput(format!(
                "null space is not one-dimensional (sigma_second / sigma_max = {:e})",
                second / largest
            )));
        }
        if smallest / second > self.config.null_space_ratio {
            return Err(RectifyError::DegenerateInput(format!(
                "null vector is not well separated (sigma_min / sigma_second = {:e})",
                smallest / second
            )));
        }

        let h = v_t.row(order[0]);
        let hc = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);
        let raw = Homography::from_matrix(&(hc * t));

        let (cx, cy) = centroid(&sources);
        let w = raw.apply(Vec3::new(cx, cy, 1.0)).z;
        let norm = raw.frobenius_norm();
        let homography = raw.scaled(if w < 0.0 { -1.0 / norm } else { 1.0 / norm });

        let det = homography.determinant();
        let bound = DEFAULT_RELATIVE_EPSILON * homography.operator_norm().powi(3);
        if !det.is_finite() || det.abs() <= bound {
            return Err(RectifyError::DegenerateInput(format!(
                "estimated homography is rank deficient (det {det:e})"
            )));
        }
        Ok(homography)
    }
}

fn centroid(pts: &[Point2; 4]) -> (f64, f64) {
    let (sx, sy) = pts.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    (sx / 4.0, sy / 4.0)
}

/// Similarity taking the points' centroid to the origin with mean distance sqrt(2).
fn conditioning_transform(pts: &[Point2; 4]) -> Matrix3<f64> {
    let (cx, cy) = centroid(pts);
    let mean_dist = pts
        .iter()
        .map(|p| (p.x - cx).hypot(p.y - cy))
        .sum::<f64>()
        / 4.0;
    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

/// No non-finite coordinates, no coincident points, no three collinear.
fn check_general_position(
    pts: &[Point2; 4],
    role: &str,
    tolerance: f64,
) -> Result<(), RectifyError> {
    for (i, p) in pts.iter().enumerate() {
        if !p.is_finite() {
            return Err(RectifyError::DegenerateInput(format!(
                "{role} point {i} is not finite"
            )));
        }
    }

    let mut extent = 0.0f64;
    for i in 0..4 {
        for j in (i + 1)..4 {
            let d = (pts[j] - pts[i]).norm();
            extent = extent.max(d * d);
        }
    }
    if extent == 0.0 {
        return Err(RectifyError::DegenerateInput(format!(
            "all {role} points coincide"
        )));
    }

    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    for [i, j, k] in TRIPLES {
        let area2 = (pts[j] - pts[i]).cross(pts[k] - pts[i]).abs();
        if area2 <= tolerance * extent {
            return Err(RectifyError::DegenerateInput(format!(
                "{role} points {i}, {j}, {k} are collinear or coincident"
            )));
        }
    }
    Ok(())
}
