//! Planar aspect-ratio recovery from right angles.
//!
//! The unit-square homography fixes the quadrilateral's corners but not the
//! rectangle's true aspect ratio. If an angle A-O-B in uv space is known to
//! be a right angle in the scene, stretching u by λ must make the arms
//! orthogonal:
//!
//! ```text
//! λ² · qa.x · qb.x + qa.y · qb.y = 0   ⟹   λ = sqrt(-(qa.y · qb.y) / (qa.x · qb.x))
//! ```

use crate::error::RectifyError;
use crate::geometry::{Point2, PointTriple};

/// Fused λ over several right-angle triples.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AspectEstimate {
    /// Per-triple λ, in input order.
    pub estimates: Vec<f64>,
    /// Arithmetic mean of `estimates`.
    pub lambda: f64,
    /// `(max - min) / mean` of the estimates; 0 for a single triple.
    ///
    /// Informational only: no acceptance threshold is applied.
    pub discrepancy: f64,
}

impl AspectEstimate {
    /// Stretch a uv point's u coordinate by λ.
    pub fn rectify(&self, uv: Point2) -> Point2 {
        Point2::new(self.lambda * uv.x, uv.y)
    }
}

/// Solve λ for one triple already mapped to uv space.
pub fn solve_triple(triple: &PointTriple) -> Result<f64, RectifyError> {
    let (qa, qb) = triple.arms();
    let numerator = -(qa.y * qb.y);
    let denominator = qa.x * qb.x;
    let ratio = numerator / denominator;

    if ratio.is_nan() || ratio <= 0.0 || ratio.is_infinite() {
        return Err(RectifyError::OrthogonalityViolated {
            input: "triple".into(),
            numerator,
            denominator,
        });
    }
    Ok(ratio.sqrt())
}

/// Solve every triple and fuse by arithmetic mean.
pub fn estimate(triples: &[PointTriple]) -> Result<AspectEstimate, RectifyError> {
    if triples.is_empty() {
        return Err(RectifyError::InvalidScene(
            "at least one right-angle triple is required".into(),
        ));
    }

    let estimates = triples
        .iter()
        .enumerate()
        .map(|(i, t)| solve_triple(t).map_err(|e| e.for_input(format!("triple {i}"))))
        .collect::<Result<Vec<_>, _>>()?;

    let lambda = estimates.iter().sum::<f64>() / estimates.len() as f64;
    let (lo, hi) = estimates
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &l| {
            (lo.min(l), hi.max(l))
        });
    let discrepancy = (hi - lo) / lambda;

    log::debug!(
        "aspect estimates {estimates:?}, fused λ = {lambda}, discrepancy {discrepancy:.4}"
    );

    Ok(AspectEstimate {
        estimates,
        lambda,
        discrepancy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(a: (f64, f64), o: (f64, f64), b: (f64, f64)) -> PointTriple {
        PointTriple::new(
            Point2::new(a.0, a.1),
            Point2::new(o.0, o.1),
            Point2::new(b.0, b.1),
        )
    }

    #[test]
    fn closed_form_synthetic() {
        let t = triple((2.0, 1.0), (0.0, 0.0), (-1.0, 3.0));
        let lambda = solve_triple(&t).unwrap();
        assert!((lambda - 1.5f64.sqrt()).abs() < 1e-12, "λ={lambda}");

        // Stretched arms are orthogonal.
        let dot = lambda * lambda * 2.0 * -1.0 + 1.0 * 3.0;
        assert!(dot.abs() < 1e-12);
    }

    #[test]
    fn vertex_offset_does_not_matter() {
        let a = solve_triple(&triple((2.0, 1.0), (0.0, 0.0), (-1.0, 3.0))).unwrap();
        let b = solve_triple(&triple((7.0, -4.0), (5.0, -5.0), (4.0, -2.0))).unwrap();
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn same_sign_products_are_rejected() {
        let t = triple((2.0, 1.0), (0.0, 0.0), (1.0, 3.0));
        let err = solve_triple(&t).unwrap_err();
        assert!(
            matches!(err, RectifyError::OrthogonalityViolated { .. }),
            "{err}"
        );
    }

    #[test]
    fn degenerate_arms_are_rejected() {
        // qa.x * qb.x == 0: no finite λ.
        let t = triple((0.0, 1.0), (0.0, 0.0), (-1.0, 3.0));
        assert!(solve_triple(&t).is_err());
        // qa.y * qb.y == 0: λ would be zero.
        let t = triple((2.0, 0.0), (0.0, 0.0), (-1.0, 3.0));
        assert!(solve_triple(&t).is_err());
    }

    #[test]
    fn fuses_by_mean_and_reports_discrepancy() {
        let t1 = triple((2.0, 1.0), (0.0, 0.0), (-1.0, 3.0)); // sqrt(1.5)
        let t2 = triple((1.0, 1.0), (0.0, 0.0), (-1.0, 2.0)); // sqrt(2)
        let est = estimate(&[t1, t2]).unwrap();
        let (l1, l2) = (1.5f64.sqrt(), 2.0f64.sqrt());
        assert!((est.lambda - (l1 + l2) / 2.0).abs() < 1e-12);
        assert!((est.discrepancy - (l2 - l1) / est.lambda).abs() < 1e-12);
        assert_eq!(est.estimates.len(), 2);

        let p = est.rectify(Point2::new(0.5, 0.25));
        assert!((p.x - 0.5 * est.lambda).abs() < 1e-15);
        assert_eq!(p.y, 0.25);
    }

    #[test]
    fn failing_triple_is_named() {
        let good = triple((2.0, 1.0), (0.0, 0.0), (-1.0, 3.0));
        let bad = triple((2.0, 1.0), (0.0, 0.0), (1.0, 3.0));
        let err = estimate(&[good, bad]).unwrap_err();
        assert!(err.to_string().contains("triple 1"), "{err}");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            estimate(&[]),
            Err(RectifyError::InvalidScene(_))
        ));
    }
}
