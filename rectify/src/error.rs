use thiserror::Error;

#[derive(Debug, Error)]
pub enum RectifyError {
    #[error("degenerate correspondences: {0}")]
    DegenerateInput(String),

    #[error("homography is singular (det {det:e}, norm {norm:e})")]
    SingularHomography { det: f64, norm: f64 },

    #[error("point ({x}, {y}) maps to infinity (w = {w:e})")]
    PointAtInfinity { x: f64, y: f64, w: f64 },

    #[error(
        "right-angle assumption violated for {input}: {numerator:e} / {denominator:e} is not positive"
    )]
    OrthogonalityViolated {
        input: String,
        numerator: f64,
        denominator: f64,
    },

    #[error("invalid scene: {0}")]
    InvalidScene(String),
}

impl RectifyError {
    /// Re-label the input an orthogonality failure refers to.
    ///
    /// Other variants pass through unchanged.
    pub fn for_input(self, label: impl Into<String>) -> Self {
        match self {
            RectifyError::OrthogonalityViolated {
                numerator,
                denominator,
                ..
            } => RectifyError::OrthogonalityViolated {
                input: label.into(),
                numerator,
                denominator,
            },
            other => other,
        }
    }
}
