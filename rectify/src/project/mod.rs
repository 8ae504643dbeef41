//! Homography estimation and projective point mapping.
#[allow(clippy::needless_range_loop)]
pub mod homography;
pub mod mapper;

pub use homography::{EstimatorConfig, Homography, HomographyEstimator};
pub use mapper::ProjectiveMapper;
