//! Tests d'intégration: géocodage, recherche et segmentation sur un petit réseau

use approx::assert_abs_diff_eq;
use geo::{EuclideanLength, Geometry, LineString, Point};
use rtss::{
    AttributeRange, Attributes, Chainage, FeatRtss, Geocodage, GeocodageOptions, LineRtss,
    PointRtss, ReferenceFrame, ReseauSegmenter, RouteRecord, Rtss, TraceMode,
};

fn record(code: &str, coords: Vec<(f64, f64)>, chainage_f: f64) -> RouteRecord {
    RouteRecord {
        rtss: code.to_string(),
        chainage_d: None,
        chainage_f,
        geometry: LineString::from(coords),
        frame: ReferenceFrame::default(),
        name: None,
    }
}

/// Quart de cercle de rayon 200 m, 90 sommets
fn arc() -> LineString<f64> {
    (0..=90)
        .map(|i| {
            let a = (i as f64).to_radians();
            (200.0 * a.cos(), 200.0 * a.sin())
        })
        .collect::<Vec<_>>()
        .into()
}

#[test]
fn test_scenario_mid_route_offset() {
    let registry = Geocodage::from_records(
        vec![record(
            "00010-01-210-000C",
            vec![(0.0, 0.0), (250.0, 0.0), (500.0, 0.0)],
            500.0,
        )],
        GeocodageOptions::default(),
    )
    .unwrap();

    let rtss = Rtss::new("00010-01-210-000C").unwrap();
    let point = PointRtss::new(rtss.clone(), Chainage::parse("0+250").unwrap(), 3.0);
    let xy = registry.get(&rtss).unwrap().geocoder_point(&point, true).unwrap();

    // 3 m à droite d'une route orientée vers l'est
    assert_abs_diff_eq!(xy.x(), 250.0, epsilon = 0.01);
    assert_abs_diff_eq!(xy.y(), -3.0, epsilon = 0.01);

    let back = registry.geocoder_inv_point(&xy, 10.0).unwrap();
    assert_eq!(back.rtss(), &rtss);
    assert_abs_diff_eq!(back.chainage().value(), 250.0, epsilon = 0.01);
    assert_abs_diff_eq!(back.offset(), 3.0, epsilon = 0.01);
}

#[test]
fn test_round_trip_on_curve() {
    let line = arc();
    let length = line.euclidean_length();
    let segment = length / 90.0;
    let feat = FeatRtss::new(
        Rtss::new("00138-02-050-000C").unwrap(),
        line,
        Chainage::ZERO,
        Chainage::new(length).unwrap(),
    )
    .unwrap();

    for i in [0usize, 10, 33, 57, 89] {
        let chainage = Chainage::new((i as f64 + 0.5) * segment).unwrap();
        for offset in [-4.0, 0.0, 2.5] {
            let p = feat.point_from_chainage(chainage, offset, true);
            let back = feat.geocoder_inv_point(&p);
            assert_abs_diff_eq!(back.chainage().value(), chainage.value(), epsilon = 0.01);
            assert_abs_diff_eq!(back.offset(), offset, epsilon = 0.01);
        }
    }
}

#[test]
fn test_clamping_never_extrapolates() {
    let line = arc();
    let feat = FeatRtss::new(
        Rtss::new("00138-02-050-000C").unwrap(),
        line.clone(),
        Chainage::new(1000.0).unwrap(),
        Chainage::new(1300.0).unwrap(),
    )
    .unwrap();

    let before = feat.point_from_chainage(Chainage::ZERO, 0.0, false);
    let after = feat.point_from_chainage(Chainage::new(99_999.0).unwrap(), 0.0, false);
    assert_eq!(before.0, line.0[0]);
    assert_abs_diff_eq!(after.x(), line.0[90].x, epsilon = 1e-9);
    assert_abs_diff_eq!(after.y(), line.0[90].y, epsilon = 1e-9);

    let far = feat.geocoder_inv_point(&Point::new(-500.0, -500.0));
    assert!(feat.contains_chainage(far.chainage()));
}

#[test]
fn test_trace_mode_follows_curve() {
    let line = arc();
    let length = line.euclidean_length();
    let rtss = Rtss::new("00138-02-050-000C").unwrap();
    let feat = FeatRtss::new(
        rtss.clone(),
        line,
        Chainage::ZERO,
        Chainage::new(length).unwrap(),
    )
    .unwrap();

    let descriptor =
        LineRtss::from_chainages(rtss, Chainage::ZERO, Chainage::new(length).unwrap(), 0.0, 0.0)
            .unwrap();
    let traced = feat
        .geocoder_line(&descriptor, TraceMode::Trace, true, true)
        .unwrap();
    let vertex = feat
        .geocoder_line(&descriptor, TraceMode::Vertex, true, true)
        .unwrap();
    assert_eq!(traced.0.len(), 91);
    assert_eq!(vertex.0.len(), 2);
}

#[test]
fn test_nearest_route_endpoint_bias() {
    let registry = Geocodage::from_records(
        vec![
            record("00010-01-210-000C", vec![(0.0, 0.0), (1000.0, 0.0)], 1000.0),
            record("00020-01-010-000C", vec![(0.0, 20.0), (1000.0, 20.0)], 1000.0),
        ],
        GeocodageOptions::default(),
    )
    .unwrap();

    // Extrémités proches de A, sommet milieu proche de B
    let query = LineString::from(vec![(100.0, 5.0), (500.0, 18.0), (900.0, 5.0)]);
    let ranked = registry
        .nearests_rtss(&Geometry::LineString(query.clone()), 2, 100.0)
        .unwrap();
    assert_eq!(ranked[0].0, Rtss::new("00010-01-210-000C").unwrap());
    assert_eq!(ranked[1].0, Rtss::new("00020-01-010-000C").unwrap());
    assert_abs_diff_eq!(ranked[0].1, 5.0, epsilon = 1e-9);

    let located = registry.geocoder_inv_line(&query, 100.0).unwrap();
    assert_eq!(located.rtss(), &ranked[0].0);
}

#[test]
fn test_search_thousand_routes() {
    let records: Vec<RouteRecord> = (1..=100)
        .flat_map(|num| {
            (201..=210).map(move |section| {
                let y = (num * 100 + section) as f64;
                record(
                    &format!("{:05}-01-{:03}-000C", num, section),
                    vec![(0.0, y), (50.0, y)],
                    50.0,
                )
            })
        })
        .collect();
    let registry = Geocodage::from_records(records, GeocodageOptions::default()).unwrap();
    assert_eq!(registry.len(), 1000);

    let results = registry.search("0010-01-210", 5);
    assert_eq!(results.len(), 5);
    assert_eq!(results[0].0, Rtss::new("00010-01-210-000C").unwrap());
    assert!(results[0].1 > results[1].1);
}

#[test]
fn test_rtss_forms_are_idempotent() {
    for form in ["00010-01-210-000C", "0001001210000C", "10-1-210-C", "1001210000c"] {
        let rtss = Rtss::new(form).unwrap();
        assert_eq!(Rtss::new(rtss.value()).unwrap(), rtss);
    }
}

#[test]
fn test_chainage_format_round_trip() {
    for value in [0.0, 12.3456, 2293.0, 15_004.75] {
        for precision in [0, 1, 3] {
            let formatted = Chainage::new(value).unwrap().formatted(precision);
            let parsed = Chainage::parse(&formatted).unwrap();
            assert_eq!(parsed.formatted(precision), formatted);
            assert_abs_diff_eq!(
                parsed.value(),
                Chainage::new(value).unwrap().rounded(precision).value(),
                epsilon = 1e-9
            );
        }
    }
}

#[test]
fn test_network_segmentation() {
    let registry = Geocodage::from_records(
        vec![
            record("00010-01-210-000C", vec![(0.0, 0.0), (500.0, 0.0)], 500.0),
            record("00020-01-010-000C", vec![(0.0, 100.0), (500.0, 100.0)], 500.0),
        ],
        GeocodageOptions::default(),
    )
    .unwrap();
    let mut segmenter = ReseauSegmenter::new(registry);

    let range = |code: &str, d: f64, f: f64, limit: &str| {
        let mut attributes = Attributes::new();
        attributes.insert("vitesse".to_string(), limit.to_string());
        AttributeRange {
            rtss: code.to_string(),
            chainage_d: d,
            chainage_f: f,
            attributes,
            offsets: None,
        }
    };

    let report = segmenter.add_ranges(vec![
        range("00010-01-210-000C", 0.0, 250.0, "70"),
        range("00010-01-210-000C", 250.0, 500.0, "90"),
        range("20-1-10-C", 100.0, 400.0, "50"),
    ]);
    assert!(report.is_clean());
    assert_eq!(report.applied, 3);

    let features = segmenter.create_features(true).unwrap();
    assert_eq!(features.len(), 3);
    assert_eq!(features[2].rtss, Rtss::new("00020-01-010-000C").unwrap());
    assert_abs_diff_eq!(features[2].geometry.0[0].x, 100.0, epsilon = 1e-9);

    let r10 = Rtss::new("00010-01-210-000C").unwrap();
    assert_eq!(
        segmenter.elements_at(&r10, Chainage::new(260.0).unwrap())[0].get("vitesse"),
        Some("90")
    );
}
