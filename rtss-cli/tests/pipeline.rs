//! Tests d'intégration: source GeoJSON → registre → segmentation → export

use std::path::PathBuf;

use approx::assert_abs_diff_eq;
use geo::Point;
use rtss::{Chainage, InterpolationParams, ReseauSegmenter, Rtss};
use rtss_cli::export::export_to_geojson;
use rtss_cli::source::{parse_ranges, read_measurements};
use rtss_cli::{load_registry, Config, RunReport, RunStatus};

const ROUTES: &str = r#"{"type":"FeatureCollection","features":[
    {"type":"Feature","properties":{"num_rts":"00010-01-210-000C","val_longr_sous_route":500,"nom_route":"Route Jean-Lesage"},
     "geometry":{"type":"LineString","coordinates":[[0,0],[250,0],[500,0]]}},
    {"type":"Feature","properties":{"num_rts":"20-1-10-C","val_longr_sous_route":"500","nom_route":"Chemin du Roy"},
     "geometry":{"type":"LineString","coordinates":[[0,1000],[500,1000]]}},
    {"type":"Feature","properties":{"num_rts":"30-1-10-C","nom_route":"Sans longueur"},
     "geometry":{"type":"LineString","coordinates":[[0,2000],[500,2000]]}}
]}"#;

fn temp_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_mtq_network() {
    let routes = temp_file("rtss_pipeline_routes_load.geojson", ROUTES);
    let config = Config::from_preset("mtq").unwrap();
    let mut report = RunReport::new("test");

    let registry = load_registry(&routes, &config, &mut report).unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(report.routes_loaded, 2);
    assert_eq!(report.issues.len(), 1);

    // Le nom indexé permet la recherche textuelle
    let found = registry.search("chemin", 1);
    assert_eq!(found[0].0, Rtss::new("00020-01-010-000C").unwrap());

    let located = registry
        .geocoder_inv_point(&Point::new(250.0, 997.0), 10.0)
        .unwrap();
    assert_eq!(located.rtss(), &Rtss::new("20-1-10-C").unwrap());
    assert_abs_diff_eq!(located.chainage().value(), 250.0, epsilon = 1e-6);
    assert_abs_diff_eq!(located.offset(), 3.0, epsilon = 1e-6);

    std::fs::remove_file(routes).ok();
}

#[test]
fn test_segment_ranges_to_geojson() {
    let routes = temp_file("rtss_pipeline_routes_segment.geojson", ROUTES);
    let output = std::env::temp_dir().join("rtss_pipeline_segments.geojson");
    let config = Config::from_preset("mtq").unwrap();
    let mut report = RunReport::new("segment");
    let registry = load_registry(&routes, &config, &mut report).unwrap();

    let ranges = parse_ranges(
        r#"[
            {"rtss":"10-1-210-C","chainage_d":"0+000","chainage_f":"0+250","attributes":{"vitesse":70}},
            {"rtss":"10-1-210-C","chainage_d":250,"chainage_f":500,"attributes":{"vitesse":90}},
            {"rtss":"99-1-10-C","chainage_d":0,"chainage_f":100,"attributes":{"vitesse":50}}
        ]"#,
    )
    .unwrap();

    let mut segmenter = ReseauSegmenter::new(registry);
    let build = segmenter.add_ranges(ranges);
    report.record_build(&build);
    assert_eq!(build.applied, 2);
    assert_eq!(build.skipped.len(), 1);

    let features = segmenter.create_features(true).unwrap();
    export_to_geojson(&features, &segmenter.geocodage().frame(), &output).unwrap();
    report.features_written = features.len();
    report.finalize();
    assert_eq!(report.status, RunStatus::PartialSuccess);

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let written = parsed["features"].as_array().unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(written[0]["properties"]["vitesse"], "70");
    assert_eq!(written[1]["properties"]["chainage_d"], 250.0);

    std::fs::remove_file(routes).ok();
    std::fs::remove_file(output).ok();
}

#[test]
fn test_interpolate_measurements() {
    let routes = temp_file("rtss_pipeline_routes_interp.geojson", ROUTES);
    let points: Vec<String> = (0..50)
        .map(|i| {
            let etat = if i < 20 { "bon" } else { "mauvais" };
            format!(
                r#"{{"type":"Feature","properties":{{"etat":"{}"}},"geometry":{{"type":"Point","coordinates":[{},2]}}}}"#,
                etat,
                i * 10 + 3
            )
        })
        .collect();
    let measures = temp_file(
        "rtss_pipeline_measures.geojson",
        &format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            points.join(",")
        ),
    );

    let config = Config::from_preset("mtq").unwrap();
    let mut report = RunReport::new("interpolate");
    let registry = load_registry(&routes, &config, &mut report).unwrap();
    let source = read_measurements(&measures, "etat", None).unwrap();
    assert_eq!(source.measurements.len(), 50);

    let mut segmenter = ReseauSegmenter::new(registry);
    let params = InterpolationParams {
        step: 10.0,
        max_dist: 20.0,
        attribute: "etat".to_string(),
        match_route: false,
    };
    let build = segmenter
        .interpolate_nearest(&source.measurements, &params)
        .unwrap();
    assert_eq!(build.applied, 2);

    let r10 = Rtss::new("00010-01-210-000C").unwrap();
    let values = segmenter.elements_at(&r10, Chainage::new(100.0).unwrap());
    assert_eq!(values[0].get("etat"), Some("bon"));
    let values = segmenter.elements_at(&r10, Chainage::new(400.0).unwrap());
    assert_eq!(values[0].get("etat"), Some("mauvais"));

    std::fs::remove_file(routes).ok();
    std::fs::remove_file(measures).ok();
}
