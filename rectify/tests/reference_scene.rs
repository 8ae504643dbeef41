//! Regression tests over the sculpture-base photograph, in pixel and
//! normalized coordinates.

use rectify::geometry::{Correspondence, Point2, PointTriple, UNIT_SQUARE};
use rectify::project::{Homography, ProjectiveMapper};
use rectify::report::Report;
use rectify::scene::SceneConfig;
use rectify::solve::{aspect, depth};
use rectify::RectifyError;

const LAMBDA_1: f64 = 2.3554372776676202;
const LAMBDA_2: f64 = 2.2761462143032642;
const LAMBDA_MEAN: f64 = 2.3157917459854422;

fn source() -> [Point2; 4] {
    [
        Point2::new(660.0, 1162.0),
        Point2::new(1992.0, 726.0),
        Point2::new(123.0, 917.0),
        Point2::new(1441.0, 630.0),
    ]
}

fn auxiliary() -> [Point2; 6] {
    [
        Point2::new(531.0, 941.0),
        Point2::new(737.0, 974.0),
        Point2::new(987.0, 842.0),
        Point2::new(1283.0, 808.0),
        Point2::new(1481.0, 830.0),
        Point2::new(1647.0, 697.0),
    ]
}

fn pixel_mapper() -> ProjectiveMapper {
    let h = Homography::estimate(&Correspondence::unit_square(source())).unwrap();
    ProjectiveMapper::new(h)
}

#[test]
fn pixel_corners_map_to_unit_square() {
    let mapper = pixel_mapper();
    for (i, (&p, &t)) in source().iter().zip(UNIT_SQUARE.iter()).enumerate() {
        let uv = mapper.forward(p).unwrap();
        assert!(
            (uv.x - t.x).abs() < 1e-9 && (uv.y - t.y).abs() < 1e-9,
            "corner {i}: expected {t:?}, got {uv:?}"
        );
    }
}

#[test]
fn pixel_lambda_estimates_match_reference() {
    let mapper = pixel_mapper();
    let aux = auxiliary();
    let triples: Vec<PointTriple> = aux
        .chunks_exact(3)
        .map(|c| {
            PointTriple::new(c[0], c[1], c[2])
                .try_map(|p| mapper.forward(p))
                .unwrap()
        })
        .collect();

    let l1 = aspect::solve_triple(&triples[0]).unwrap();
    let l2 = aspect::solve_triple(&triples[1]).unwrap();
    assert!((l1 - LAMBDA_1).abs() < 1e-6, "λ1={l1}");
    assert!((l2 - LAMBDA_2).abs() < 1e-6, "λ2={l2}");

    let fused = aspect::estimate(&triples).unwrap();
    assert!((fused.lambda - LAMBDA_MEAN).abs() < 1e-6, "λ={}", fused.lambda);
    // The two right angles agree to within about 3.4%.
    assert!(
        (fused.discrepancy - 0.0342392892).abs() < 1e-6,
        "discrepancy={}",
        fused.discrepancy
    );
}

#[test]
fn rectified_points_match_reference() {
    let report = Report::run(&SceneConfig::reference()).unwrap();
    let rectified = report.rectified_points.unwrap();
    let expected = [
        [0.269865539324868, 0.6080939260638484],
        [0.3576361370411738, 0.36218118853795983],
        [0.8824496433973053, 0.5559648330405657],
        [1.2564957293154624, 0.41009824689730384],
        [1.3501458915933955, 0.16779649653242185],
        [2.1265728118677876, 0.4577002762569027],
    ];
    for (i, (p, e)) in rectified.iter().zip(expected.iter()).enumerate() {
        assert!(
            (p.x - e[0]).abs() < 1e-6 && (p.y - e[1]).abs() < 1e-6,
            "point {i}: expected {e:?}, got {p:?}"
        );
    }
}

#[test]
fn normalized_and_pixel_runs_agree_on_lambda() {
    let normalized = Report::run(&SceneConfig::reference()).unwrap();
    let mut scene = SceneConfig::reference();
    scene.normalize = false;
    let pixel = Report::run(&scene).unwrap();

    let a = normalized.aspect.unwrap();
    let b = pixel.aspect.unwrap();
    assert!((a.lambda - LAMBDA_MEAN).abs() < 1e-6);
    assert!((a.lambda - b.lambda).abs() < 1e-9);
    for (p, q) in normalized.uv_points.iter().zip(&pixel.uv_points) {
        assert!((p.x - q.x).abs() < 1e-9 && (p.y - q.y).abs() < 1e-9);
    }
}

#[test]
fn normalized_depth_scale_and_fov() {
    let report = Report::run(&SceneConfig::reference()).unwrap();
    let d = report.depth.unwrap();
    assert!((d.lambda - 2.8910264897809888).abs() < 1e-5, "λ={}", d.lambda);
    assert!((d.fov_degrees - 38.160791226086396).abs() < 1e-5, "fov={}", d.fov_degrees);
    assert!((d.aspect_ratio - 2.445427027320009).abs() < 1e-5, "aspect={}", d.aspect_ratio);

    let camera = report.camera.unwrap();
    assert!((camera.focal_length_mm - 52.038476816057795).abs() < 1e-4);
}

#[test]
fn depth_from_mapper_matches_report() {
    let scene = SceneConfig::reference();
    let h = Homography::estimate(&scene.correspondences().unwrap()).unwrap();
    let d = depth::estimate(&ProjectiveMapper::new(h)).unwrap();
    let report = Report::run(&scene).unwrap();
    assert!((d.lambda - report.depth.unwrap().lambda).abs() < 1e-12);
}

#[test]
fn inverse_homography_undoes_forward() {
    let report = Report::run(&SceneConfig::reference()).unwrap();
    let forward = ProjectiveMapper::new(report.homography);
    let back = ProjectiveMapper::new(report.inverse_homography);
    let scene = SceneConfig::reference();
    for p in scene.auxiliary_points().unwrap() {
        let uv = forward.forward(p).unwrap();
        let q = back.forward(uv).unwrap();
        assert!((p.x - q.x).abs() < 1e-9 && (p.y - q.y).abs() < 1e-9, "{p:?} vs {q:?}");
    }
}

#[test]
fn same_quadrant_arms_violate_right_angle() {
    // Vertex at the origin corner; both arms point into the same quadrant.
    let mapper = pixel_mapper();
    let triple = PointTriple::new(
        Point2::new(531.0, 941.0),
        Point2::new(660.0, 1162.0),
        Point2::new(987.0, 842.0),
    )
    .try_map(|p| mapper.forward(p))
    .unwrap();
    assert!(matches!(
        aspect::solve_triple(&triple),
        Err(RectifyError::OrthogonalityViolated { .. })
    ));
}

#[test]
fn scene_round_trips_through_toml() {
    let text = r#"
        name = "custom"
        source = [[660, 1162], [1992, 726], [123, 917], [1441, 630]]
        auxiliary = [[531, 941], [737, 974], [987, 842]]
    "#;
    let scene = SceneConfig::from_toml(text).unwrap();
    let report = Report::run(&scene).unwrap();
    assert_eq!(report.scene, "custom");
    let est = report.aspect.unwrap();
    assert_eq!(est.estimates.len(), 1);
    assert!((est.lambda - LAMBDA_1).abs() < 1e-6);
    assert_eq!(est.discrepancy, 0.0);
}
