//! Depth scale and field of view from the base rectangle's right angle.
//!
//! Inverse-mapping the unit-square corners gives scene rays `(x, y, z)` in
//! which z carries an unknown scale. Under a pinhole model with the image
//! plane at unit distance, the true points are `(x, y, λ·z)` where λ is the
//! focal length in normalized image units. Requiring the two base edges to be
//! perpendicular fixes λ:
//!
//! ```text
//! ud.x·vd.x + ud.y·vd.y + λ²·ud.z·vd.z = 0
//! ```

use crate::error::RectifyError;
use crate::geometry::{Point2, Vec3, UNIT_SQUARE};
use crate::project::ProjectiveMapper;

/// Orthonormal frame of the base rectangle in camera space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BaseFrame {
    /// Rows: unit u edge, unit v edge, their cross product (plane normal).
    pub axes: [Vec3; 3],
    /// The λ-corrected origin corner.
    pub origin: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DepthEstimate {
    pub lambda: f64,
    pub fov_degrees: f64,
    /// `|u edge| / |v edge|` after correcting depth.
    pub aspect_ratio: f64,
    /// Corrected corners in unit-square order: origin, u axis, v axis, diagonal.
    pub corners: [Vec3; 4],
    /// Lengths of the u and v edges, in the (arbitrary) units of the rays.
    pub base_lengths: [f64; 2],
    pub base_frame: BaseFrame,
}

impl DepthEstimate {
    /// Focal length for a sensor of the given horizontal aperture, via
    /// `fov = 2·atan(aperture / 2f)`.
    pub fn focal_length(&self, aperture_mm: f64) -> f64 {
        aperture_mm * self.lambda / 2.0
    }

    /// Scale a uv point by the corrected edge lengths, giving its position
    /// on the base plane in the units of `base_lengths`.
    pub fn to_base(&self, uv: Point2) -> Point2 {
        let [len_u, len_v] = self.base_lengths;
        Point2::new(uv.x * len_u, uv.y * len_v)
    }
}

/// Inverse-map the unit-square corners through `mapper` and solve.
pub fn estimate(mapper: &ProjectiveMapper) -> Result<DepthEstimate, RectifyError> {
    let rays = [
        mapper.inverse(UNIT_SQUARE[0])?,
        mapper.inverse(UNIT_SQUARE[1])?,
        mapper.inverse(UNIT_SQUARE[2])?,
        mapper.inverse(UNIT_SQUARE[3])?,
    ];
    solve_corners(&rays)
}

/// Solve from the four inverse-mapped corners (origin, u axis, v axis, diagonal).
pub fn solve_corners(corners: &[Vec3; 4]) -> Result<DepthEstimate, RectifyError> {
    let ud = corners[1] - corners[0];
    let vd = corners[2] - corners[0];

    let numerator = ud.x * vd.x + ud.y * vd.y;
    let denominator = -(ud.z * vd.z);
    let ratio = numerator / denominator;
    if ratio.is_nan() || ratio <= 0.0 || ratio.is_infinite() {
        return Err(RectifyError::OrthogonalityViolated {
            input: "depth edges".into(),
            numerator,
            denominator,
        });
    }
    let lambda = ratio.sqrt();
    let fov_degrees = (2.0 * (1.0 / lambda).atan()).to_degrees();

    let corrected = corners.map(|c| c.scale_z(lambda));
    let q_u = corrected[1] - corrected[0];
    let q_v = corrected[2] - corrected[0];
    let (len_u, len_v) = (q_u.norm(), q_v.norm());
    if len_u <= 0.0 || len_v <= 0.0 || len_u.is_nan() || len_v.is_nan() {
        return Err(RectifyError::DegenerateInput(
            "base edge has zero length after depth correction".into(),
        ));
    }

    let u_unit = q_u.scale(1.0 / len_u);
    let v_unit = q_v.scale(1.0 / len_v);
    let base_frame = BaseFrame {
        axes: [u_unit, v_unit, u_unit.cross(v_unit)],
        origin: corrected[0],
    };

    log::debug!("depth scale λ = {lambda}, fov = {fov_degrees:.4}°");

    Ok(DepthEstimate {
        lambda,
        fov_degrees,
        aspect_ratio: len_u / len_v,
        corners: corrected,
        base_lengths: [len_u, len_v],
        base_frame,
    })
}
