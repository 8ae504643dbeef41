#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::error::RectifyError;
use crate::geometry::{Point2, Vec3};

use super::homography::{Homography, DEFAULT_RELATIVE_EPSILON};

/// Forward (pixel → uv) and inverse (uv → scene ray) mapping through a
/// fixed homography.
///
/// Immutable after construction, so a single mapper can be shared across
/// threads for batch mapping.
#[derive(Debug, Clone)]
pub struct ProjectiveMapper {
    homography: Homography,
    /// `Err((det, norm))` when `H` is singular.
    inverse: Result<Homography, (f64, f64)>,
    norm: f64,
    relative_epsilon: f64,
}

impl ProjectiveMapper {
    pub fn new(homography: Homography) -> Self {
        Self::with_epsilon(homography, DEFAULT_RELATIVE_EPSILON)
    }

    pub fn with_epsilon(homography: Homography, relative_epsilon: f64) -> Self {
        let norm = homography.operator_norm();
        let inverse = homography
            .inverse_with(relative_epsilon)
            .map_err(|_| (homography.determinant(), norm));
        Self {
            homography,
            inverse,
            norm,
            relative_epsilon,
        }
    }

    pub fn homography(&self) -> &Homography {
        &self.homography
    }

    /// The inverse homography, if `H` is invertible.
    pub fn inverse_homography(&self) -> Result<&Homography, RectifyError> {
        self.inverse
            .as_ref()
            .map_err(|&(det, norm)| RectifyError::SingularHomography { det, norm })
    }

    /// Map a pixel-space point to uv space.
    ///
    /// The w threshold scales with `||H||` and with the length of the
    /// homogeneous input, so `H` and `c * H` accept and reject the same
    /// points.
    pub fn forward(&self, p: Point2) -> Result<Point2, RectifyError> {
        let x = p.homogeneous();
        let eps = self.relative_epsilon * self.norm * x.norm();
        self.homography.apply(x).dehomogenize(eps)
    }

    /// Map a uv-space point back to an unnormalized scene-space ray.
    ///
    /// The scale of the returned vector (in particular its z component) is
    /// not determined by the four correspondences.
    pub fn inverse(&self, uv: Point2) -> Result<Vec3, RectifyError> {
        Ok(self.inverse_homography()?.apply(uv.homogeneous()))
    }

    /// Forward-map a batch of points, failing on the first point at infinity.
    pub fn forward_all(&self, points: &[Point2]) -> Result<Vec<Point2>, RectifyError> {
        #[cfg(feature = "parallel")]
        let mapped: Result<Vec<Point2>, RectifyError> =
            points.par_iter().map(|&p| self.forward(p)).collect();

        #[cfg(not(feature = "parallel"))]
        let mapped: Result<Vec<Point2>, RectifyError> =
            points.iter().map(|&p| self.forward(p)).collect();

        mapped
    }
}
