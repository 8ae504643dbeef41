//! Full pipeline run over a scene: estimate → map → solve.
use serde::Serialize;

use crate::error::RectifyError;
use crate::geometry::Point2;
use crate::project::{Homography, HomographyEstimator, ProjectiveMapper};
use crate::scene::SceneConfig;
use crate::solve::{aspect, depth, AspectEstimate, DepthEstimate};

/// Camera quantities derived from the depth scale.
#[derive(Debug, Clone, Serialize)]
pub struct CameraReport {
    pub fov_degrees: f64,
    pub aperture_mm: f64,
    pub focal_length_mm: f64,
}

/// Every output of one run. Built all-or-nothing: any failed precondition
/// aborts the run before a report exists.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub scene: String,
    pub normalized: bool,
    pub homography: Homography,
    pub inverse_homography: Homography,
    /// Auxiliary points in uv space.
    pub uv_points: Vec<Point2>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect: Option<AspectEstimate>,
    /// Auxiliary points with u stretched by the fused λ.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rectified_points: Option<Vec<Point2>>,
    /// Only computed in the normalized frame, where λ is a focal length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<DepthEstimate>,
    /// Auxiliary points on the base plane, scaled by the corrected edge lengths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_points: Option<Vec<Point2>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraReport>,
}

impl Report {
    pub fn run(scene: &SceneConfig) -> Result<Self, RectifyError> {
        Self::run_with(scene, &HomographyEstimator::default())
    }

    pub fn run_with(
        scene: &SceneConfig,
        estimator: &HomographyEstimator,
    ) -> Result<Self, RectifyError> {
        scene.validate()?;

        let homography = estimator.estimate(&scene.correspondences()?)?;
        let mapper = ProjectiveMapper::new(homography);
        let inverse_homography = *mapper.inverse_homography()?;

        let uv_points = mapper.forward_all(&scene.auxiliary_points()?)?;

        let triples = scene
            .triples()?
            .iter()
            .map(|t| t.try_map(|p| mapper.forward(p)))
            .collect::<Result<Vec<_>, _>>()?;
        let aspect = if triples.is_empty() {
            None
        } else {
            Some(aspect::estimate(&triples)?)
        };
        let rectified_points = aspect
            .as_ref()
            .map(|a| uv_points.iter().map(|&uv| a.rectify(uv)).collect());

        let normalized = scene.frame()?.is_some();
        let depth = if normalized {
            Some(depth::estimate(&mapper)?)
        } else {
            log::debug!("scene {} is in pixel coordinates; skipping depth scale", scene.name);
            None
        };
        let base_points = depth
            .as_ref()
            .map(|d| uv_points.iter().map(|&uv| d.to_base(uv)).collect());
        let camera = depth.as_ref().map(|d| CameraReport {
            fov_degrees: d.fov_degrees,
            aperture_mm: scene.aperture_mm,
            focal_length_mm: d.focal_length(scene.aperture_mm),
        });

        Ok(Report {
            scene: scene.name.clone(),
            normalized,
            homography,
            inverse_homography,
            uv_points,
            aspect,
            rectified_points,
            depth,
            base_points,
            camera,
        })
    }
}
