use serde::{Deserialize, Serialize};

use crate::error::RectifyError;
use crate::frame::ImageFrame;
use crate::geometry::{Correspondence, Point2, PointTriple, UNIT_SQUARE};

/// Literal input for one rectification run, matching the TOML format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Pixel positions of the quadrilateral's corners.
    pub source: [Point2; 4],
    /// uv targets for `source`, in the same order.
    #[serde(default = "default_target")]
    pub target: [Point2; 4],
    /// Pixel points grouped in consecutive (A, O, B) right-angle triples.
    #[serde(default)]
    pub auxiliary: Vec<Point2>,
    /// Photo width and height in pixels.
    #[serde(default)]
    pub image_size: Option<[f64; 2]>,
    /// Estimate in centered, y-up, width-normalized coordinates.
    /// Requires `image_size`; needed for a meaningful field of view.
    #[serde(default)]
    pub normalize: bool,
    /// Horizontal sensor aperture used to express λ as a focal length.
    #[serde(default = "default_aperture")]
    pub aperture_mm: f64,
}

fn default_name() -> String {
    "scene".to_string()
}

fn default_target() -> [Point2; 4] {
    UNIT_SQUARE
}

fn default_aperture() -> f64 {
    36.0
}

impl SceneConfig {
    /// Parse and validate a TOML scene description.
    pub fn from_toml(toml_str: &str) -> Result<Self, RectifyError> {
        let scene: SceneConfig =
            toml::from_str(toml_str).map_err(|e| RectifyError::InvalidScene(e.to_string()))?;
        scene.validate()?;
        Ok(scene)
    }

    /// The built-in sculpture-base scene.
    pub fn reference() -> Self {
        SceneConfig::from_toml(include_str!("../scenes/reference.toml"))
            .expect("built-in reference scene should be valid")
    }

    pub fn validate(&self) -> Result<(), RectifyError> {
        if !self.auxiliary.len().is_multiple_of(3) {
            return Err(RectifyError::InvalidScene(format!(
                "auxiliary point count {} is not a multiple of 3",
                self.auxiliary.len()
            )));
        }
        if self.aperture_mm.is_nan() || self.aperture_mm <= 0.0 {
            return Err(RectifyError::InvalidScene(format!(
                "aperture_mm must be positive, got {}",
                self.aperture_mm
            )));
        }
        self.frame().map(|_| ())
    }

    /// The coordinate conversion applied before estimation, if any.
    pub fn frame(&self) -> Result<Option<ImageFrame>, RectifyError> {
        match (self.normalize, self.image_size) {
            (false, _) => Ok(None),
            (true, Some([w, h])) => ImageFrame::new(w, h).map(Some),
            (true, None) => Err(RectifyError::InvalidScene(
                "normalize requires image_size".into(),
            )),
        }
    }

    fn to_working(&self, p: Point2) -> Result<Point2, RectifyError> {
        Ok(match self.frame()? {
            Some(frame) => frame.to_device(p),
            None => p,
        })
    }

    /// Source/target pairs, with sources in the working frame.
    pub fn correspondences(&self) -> Result<[Correspondence; 4], RectifyError> {
        let frame = self.frame()?;
        Ok(std::array::from_fn(|i| {
            let source = match frame {
                Some(f) => f.to_device(self.source[i]),
                None => self.source[i],
            };
            Correspondence::new(source, self.target[i])
        }))
    }

    /// Auxiliary points in the working frame.
    pub fn auxiliary_points(&self) -> Result<Vec<Point2>, RectifyError> {
        self.auxiliary.iter().map(|&p| self.to_working(p)).collect()
    }

    /// Right-angle triples in the working frame.
    pub fn triples(&self) -> Result<Vec<PointTriple>, RectifyError> {
        self.validate()?;
        let pts = self.auxiliary_points()?;
        Ok(pts
            .chunks_exact(3)
            .map(|c| PointTriple::new(c[0], c[1], c[2]))
            .collect())
    }
}
