use crate::error::RectifyError;
use crate::geometry::Point2;

/// Pixel dimensions of the source photograph.
///
/// Used to move pixel coordinates into a centered, y-up frame scaled so the
/// image width spans [-1, 1]. A homography estimated in either frame gives
/// the same uv results as long as every point goes through the same
/// conversion; only the device frame gives a meaningful field of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageFrame {
    pub width: f64,
    pub height: f64,
}

impl ImageFrame {
    pub fn new(width: f64, height: f64) -> Result<Self, RectifyError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(RectifyError::InvalidScene(format!(
                "image size must be positive, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    /// Pixel → device coordinates.
    pub fn to_device(&self, p: Point2) -> Point2 {
        let s = self.half_width();
        Point2::new(
            (p.x - self.width / 2.0) / s,
            -(p.y - self.height / 2.0) / s,
        )
    }

    /// Device → pixel coordinates.
    #[cfg(test)]
    fn to_pixel(&self, p: Point2) -> Point2 {
        let s = self.half_width();
        Point2::new(p.x * s + self.width / 2.0, -p.y * s + self.height / 2.0)
    }
}
