//! Segmentation de tout le réseau
//!
//! `ReseauSegmenter` possède un `Geocodage` et une `LinearReferencing` par
//! route, créée à la demande. Deux constructions en lot:
//! - depuis des intervalles attribués (`add_ranges`)
//! - par interpolation du plus proche voisin sur un nuage de mesures
//!   (`interpolate_nearest`)
//!
//! Les erreurs d'une entrée n'interrompent pas le lot: elles sont
//! consignées dans un `BuildReport`.

use std::collections::BTreeMap;
use std::sync::Arc;

use geo::Point;
use rayon::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use tracing::{debug, info, warn};

use crate::feat_rtss::FeatRtss;
use crate::geocodage::Geocodage;
use crate::linear_referencing::{LinearReferencing, SegmentFeature};
use crate::segmentation::{Attributes, LineSegmentationElement};
use crate::{Chainage, ErrorKind, Rtss, RtssError};

/// Intervalle attribué d'une source tabulaire
#[derive(Debug, Clone)]
pub struct AttributeRange {
    pub rtss: String,
    pub chainage_d: f64,
    pub chainage_f: f64,
    pub attributes: Attributes,
    /// Décalages au début et à la fin de l'intervalle
    pub offsets: Option<(f64, f64)>,
}

/// Mesure ponctuelle à interpoler le long des routes
#[derive(Debug, Clone)]
pub struct Measurement {
    pub point: Point<f64>,
    pub value: String,
    /// Route de la mesure, si connue
    pub rtss: Option<Rtss>,
}

/// Paramètres de l'interpolation au plus proche voisin
#[derive(Debug, Clone)]
pub struct InterpolationParams {
    /// Pas d'échantillonnage en chaînage
    pub step: f64,
    /// Distance maximale d'une mesure à l'échantillon
    pub max_dist: f64,
    /// Nom de l'attribut produit
    pub attribute: String,
    /// Ne retenir que les mesures du même numéro de route
    pub match_route: bool,
}

impl Default for InterpolationParams {
    fn default() -> Self {
        Self {
            step: 10.0,
            max_dist: 50.0,
            attribute: "value".to_string(),
            match_route: false,
        }
    }
}

/// Entrée ignorée d'un lot
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    pub rtss: String,
    pub chainage_d: Option<f64>,
    pub chainage_f: Option<f64>,
    pub kind: ErrorKind,
    pub reason: String,
}

/// Bilan d'une construction en lot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Éléments ajoutés
    pub applied: usize,
    /// Entrées ignorées
    pub skipped: Vec<Skipped>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    fn skip(&mut self, rtss: &str, range: Option<(f64, f64)>, error: &RtssError) {
        warn!(rtss, error = %error, "Entry skipped");
        self.skipped.push(Skipped {
            rtss: rtss.to_string(),
            chainage_d: range.map(|r| r.0),
            chainage_f: range.map(|r| r.1),
            kind: error.kind(),
            reason: error.to_string(),
        });
    }

    /// Cumule un autre bilan
    pub fn extend(&mut self, other: BuildReport) {
        self.applied += other.applied;
        self.skipped.extend(other.skipped);
    }
}

/// Une suite d'échantillons de même valeur: `[début, fin)`
type Run = (Chainage, Chainage, String);

/// Segmentation du réseau
#[derive(Debug, Clone)]
pub struct ReseauSegmenter {
    geocodage: Geocodage,
    segments: BTreeMap<Rtss, LinearReferencing>,
}

impl ReseauSegmenter {
    pub fn new(geocodage: Geocodage) -> Self {
        Self {
            geocodage,
            segments: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn geocodage(&self) -> &Geocodage {
        &self.geocodage
    }

    /// Segmentation d'une route, créée au premier accès
    ///
    /// # Errors
    ///
    /// `RtssError::UnknownRtss` si la route est absente du registre.
    pub fn linear_referencing_mut(
        &mut self,
        rtss: &Rtss,
    ) -> Result<&mut LinearReferencing, RtssError> {
        let feat = Arc::clone(self.geocodage.get(rtss)?);
        Ok(self
            .segments
            .entry(rtss.clone())
            .or_insert_with(|| LinearReferencing::new(feat)))
    }

    /// Segmentation d'une route, si elle a déjà été créée
    pub fn linear_referencing(&self, rtss: &Rtss) -> Option<&LinearReferencing> {
        self.segments.get(rtss)
    }

    /// Crée la segmentation de toutes les routes du registre
    pub fn populate_all(&mut self) {
        for (rtss, feat) in self.geocodage.iter() {
            self.segments
                .entry(rtss.clone())
                .or_insert_with(|| LinearReferencing::new(Arc::clone(feat)));
        }
    }

    /// Segmentations créées, par RTSS
    pub fn iter(&self) -> impl Iterator<Item = (&Rtss, &LinearReferencing)> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Éléments actifs sur une route au chaînage donné
    pub fn elements_at(&self, rtss: &Rtss, chainage: Chainage) -> &[LineSegmentationElement] {
        self.segments
            .get(rtss)
            .map(|lr| lr.elements_at(chainage))
            .unwrap_or(&[])
    }

    /// Ajoute des intervalles attribués
    ///
    /// Les chaînages sont ramenés dans le domaine de la route; un intervalle
    /// inversé est remis dans le sens du chaînage avec ses décalages.
    pub fn add_ranges<I>(&mut self, ranges: I) -> BuildReport
    where
        I: IntoIterator<Item = AttributeRange>,
    {
        let mut report = BuildReport::default();

        for range in ranges {
            let bounds = Some((range.chainage_d, range.chainage_f));
            let rtss = match Rtss::new(&range.rtss) {
                Ok(rtss) => rtss,
                Err(e) => {
                    report.skip(&range.rtss, bounds, &e);
                    continue;
                }
            };
            if let Err(e) = self.add_range(&rtss, range) {
                report.skip(rtss.value(), bounds, &e);
                continue;
            }
            report.applied += 1;
        }

        info!(
            applied = report.applied,
            skipped = report.skipped.len(),
            "Attribute ranges applied"
        );
        report
    }

    fn add_range(&mut self, rtss: &Rtss, range: AttributeRange) -> Result<(), RtssError> {
        let lr = self.linear_referencing_mut(rtss)?;
        let feat = lr.feat();

        let (mut start, mut end) = (range.chainage_d, range.chainage_f);
        let mut offsets = range.offsets;
        if end < start {
            std::mem::swap(&mut start, &mut end);
            offsets = offsets.map(|(d, f)| (f, d));
        }

        let cd = feat.clamp_chainage(Chainage::saturating(start));
        let cf = feat.clamp_chainage(Chainage::saturating(end));
        if cf <= cd {
            return Err(RtssError::OffRoute {
                rtss: rtss.value().to_string(),
                chainage: start,
                chainage_d: feat.chainage_d().value(),
                chainage_f: feat.chainage_f().value(),
            });
        }

        let mut element = LineSegmentationElement::new(range.attributes);
        if let Some((d, f)) = offsets {
            element = element.with_offsets(d, f);
        }
        lr.add_element(element, cd, cf)
    }

    /// Segmente le réseau par interpolation au plus proche voisin
    ///
    /// Chaque route est échantillonnée tous les `params.step`; à chaque
    /// échantillon, la mesure la plus proche à moins de `params.max_dist`
    /// donne la valeur. Un point de rupture n'est créé que lorsque la valeur
    /// change. L'échantillonnage est parallèle par route; les résultats sont
    /// appliqués dans l'ordre des RTSS.
    ///
    /// # Errors
    ///
    /// `RtssError::InvalidChainage` si le pas n'est pas strictement positif.
    pub fn interpolate_nearest(
        &mut self,
        measurements: &[Measurement],
        params: &InterpolationParams,
    ) -> Result<BuildReport, RtssError> {
        if !(params.step > 0.0 && params.step.is_finite()) {
            return Err(RtssError::invalid_chainage(
                params.step.to_string(),
                "interpolation step must be positive",
            ));
        }

        let tree: RTree<GeomWithData<[f64; 2], usize>> = RTree::bulk_load(
            measurements
                .iter()
                .enumerate()
                .map(|(i, m)| GeomWithData::new([m.point.x(), m.point.y()], i))
                .collect(),
        );

        let routes: Vec<(Rtss, Arc<FeatRtss>)> = self
            .geocodage
            .iter()
            .map(|(rtss, feat)| (rtss.clone(), Arc::clone(feat)))
            .collect();

        let sampled: Vec<(Rtss, Vec<Run>)> = routes
            .par_iter()
            .map(|(rtss, feat)| {
                let runs = sample_route(feat, &tree, measurements, params);
                (rtss.clone(), runs)
            })
            .collect();

        let mut report = BuildReport::default();
        for (rtss, runs) in sampled {
            if runs.is_empty() {
                continue;
            }
            debug!(rtss = %rtss, runs = runs.len(), "Interpolated runs");
            for (start, end, value) in runs {
                let element = LineSegmentationElement::single(params.attribute.as_str(), value);
                let result = self
                    .linear_referencing_mut(&rtss)
                    .and_then(|lr| lr.add_element(element, start, end));
                match result {
                    Ok(()) => report.applied += 1,
                    Err(e) => report.skip(rtss.value(), Some((start.value(), end.value())), &e),
                }
            }
        }

        info!(
            measurements = measurements.len(),
            routes = routes.len(),
            applied = report.applied,
            skipped = report.skipped.len(),
            "Nearest-neighbour interpolation done"
        );
        Ok(report)
    }

    /// Ajoute les segmentations d'un autre segmenteur, route par route
    ///
    /// Les routes inconnues de ce segmenteur sont ignorées. Retourne le
    /// nombre de routes fusionnées.
    pub fn merge(&mut self, other: &ReseauSegmenter) -> Result<usize, RtssError> {
        let mut merged = 0;
        for (rtss, lr) in other.iter() {
            if !self.geocodage.contains(rtss) {
                warn!(rtss = %rtss, "Route unknown to this segmenter, not merged");
                continue;
            }
            self.linear_referencing_mut(rtss)?.merge(lr)?;
            merged += 1;
        }
        Ok(merged)
    }

    /// Entités de tout le réseau, par RTSS puis chaînage
    pub fn create_features(&self, densify: bool) -> Result<Vec<SegmentFeature>, RtssError> {
        let segments: Vec<&LinearReferencing> = self.segments.values().collect();
        let features: Vec<Vec<SegmentFeature>> = segments
            .par_iter()
            .map(|lr| lr.create_features(densify))
            .collect::<Result<_, _>>()?;
        Ok(features.into_iter().flatten().collect())
    }
}

/// Échantillonne une route et regroupe les échantillons de même valeur
fn sample_route(
    feat: &FeatRtss,
    tree: &RTree<GeomWithData<[f64; 2], usize>>,
    measurements: &[Measurement],
    params: &InterpolationParams,
) -> Vec<Run> {
    let (cd, cf) = (feat.chainage_d().value(), feat.chainage_f().value());
    let max_d2 = params.max_dist * params.max_dist;
    let route_num = feat.rtss().num_route();

    let mut runs: Vec<Run> = Vec::new();
    let mut current: Option<(Chainage, &str)> = None;
    let mut i = 0usize;

    loop {
        let at = cd + i as f64 * params.step;
        if at >= cf {
            break;
        }
        let chainage = Chainage::saturating(at);
        let p = feat.point_from_chainage(chainage, 0.0, false);

        let value = tree
            .nearest_neighbor_iter_with_distance_2(&[p.x(), p.y()])
            .take_while(|(_, d2)| *d2 <= max_d2)
            .map(|(node, _)| &measurements[node.data])
            .find(|m| {
                !params.match_route
                    || matches!(
                        (m.rtss.as_ref().and_then(Rtss::num_route), route_num),
                        (Some(a), Some(b)) if a == b
                    )
            })
            .map(|m| m.value.as_str());

        if current.map(|(_, v)| Some(v)) != Some(value) {
            if let Some((start, v)) = current.take() {
                runs.push((start, chainage, v.to_string()));
            }
            current = value.map(|v| (chainage, v));
        }
        i += 1;
    }

    if let Some((start, v)) = current {
        runs.push((start, feat.chainage_f(), v.to_string()));
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ReferenceFrame;
    use crate::geocodage::{GeocodageOptions, RouteRecord};
    use geo::LineString;

    fn c(v: f64) -> Chainage {
        Chainage::new(v).unwrap()
    }

    fn rtss(code: &str) -> Rtss {
        Rtss::new(code).unwrap()
    }

    fn segmenter() -> ReseauSegmenter {
        let records = vec![
            RouteRecord {
                rtss: "00010-01-210-000C".to_string(),
                chainage_d: None,
                chainage_f: 500.0,
                geometry: LineString::from(vec![(0.0, 0.0), (500.0, 0.0)]),
                frame: ReferenceFrame::default(),
                name: None,
            },
            RouteRecord {
                rtss: "00020-01-010-000C".to_string(),
                chainage_d: None,
                chainage_f: 500.0,
                geometry: LineString::from(vec![(0.0, 1000.0), (500.0, 1000.0)]),
                frame: ReferenceFrame::default(),
                name: None,
            },
        ];
        ReseauSegmenter::new(Geocodage::from_records(records, GeocodageOptions::default()).unwrap())
    }

    fn range(code: &str, d: f64, f: f64, value: &str) -> AttributeRange {
        let mut attributes = Attributes::new();
        attributes.insert("surface".to_string(), value.to_string());
        AttributeRange {
            rtss: code.to_string(),
            chainage_d: d,
            chainage_f: f,
            attributes,
            offsets: None,
        }
    }

    #[test]
    fn test_lazy_population() {
        let mut seg = segmenter();
        assert!(seg.is_empty());
        seg.linear_referencing_mut(&rtss("00010-01-210-000C")).unwrap();
        assert_eq!(seg.len(), 1);
        assert!(matches!(
            seg.linear_referencing_mut(&rtss("00099-01-010-000C")),
            Err(RtssError::UnknownRtss(_))
        ));
        seg.populate_all();
        assert_eq!(seg.len(), 2);
    }

    #[test]
    fn test_add_ranges_clamps_and_skips() {
        let mut seg = segmenter();
        let report = seg.add_ranges(vec![
            range("00010-01-210-000C", -50.0, 200.0, "asphalte"),
            range("00010-01-210-000C", 450.0, 900.0, "gravier"),
            range("00099-01-010-000C", 0.0, 10.0, "béton"),
            range("ab$", 0.0, 10.0, "béton"),
            range("00020-01-010-000C", 600.0, 700.0, "béton"),
        ]);

        assert_eq!(report.applied, 2);
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(report.skipped[0].kind, ErrorKind::NotFound);
        assert_eq!(report.skipped[1].kind, ErrorKind::Validation);
        assert_eq!(report.skipped[2].kind, ErrorKind::Domain);

        let r = rtss("00010-01-210-000C");
        assert_eq!(seg.elements_at(&r, c(0.0))[0].get("surface"), Some("asphalte"));
        assert_eq!(seg.elements_at(&r, c(499.0))[0].get("surface"), Some("gravier"));
        assert!(seg.elements_at(&r, c(300.0)).is_empty());
    }

    #[test]
    fn test_reversed_range() {
        let mut seg = segmenter();
        let mut reversed = range("00010-01-210-000C", 300.0, 100.0, "asphalte");
        reversed.offsets = Some((1.0, 5.0));
        let report = seg.add_ranges(vec![reversed]);
        assert!(report.is_clean());
        let elements = seg.elements_at(&rtss("00010-01-210-000C"), c(100.0));
        assert_eq!(elements[0].offsets(), Some((5.0, 1.0)));
    }

    #[test]
    fn test_interpolate_nearest_run_length() {
        let mut seg = segmenter();
        let measurements: Vec<Measurement> = (0..50)
            .map(|i| Measurement {
                point: Point::new(i as f64 * 10.0 + 3.0, 2.0),
                value: if i < 20 { "A".to_string() } else { "B".to_string() },
                rtss: None,
            })
            .collect();

        let params = InterpolationParams {
            step: 10.0,
            max_dist: 20.0,
            attribute: "classe".to_string(),
            match_route: false,
        };
        let report = seg.interpolate_nearest(&measurements, &params).unwrap();
        assert_eq!(report.applied, 2);

        let r = rtss("00010-01-210-000C");
        let lr = seg.linear_referencing(&r).unwrap();
        // 0, 200, 500
        assert_eq!(lr.len(), 3);
        assert_eq!(lr.values_at(c(150.0), "classe"), vec!["A"]);
        assert_eq!(lr.values_at(c(250.0), "classe"), vec!["B"]);

        // Route 20 à 1 km: aucune mesure assez proche
        assert!(seg.linear_referencing(&rtss("00020-01-010-000C")).is_none());
    }

    #[test]
    fn test_interpolate_match_route() {
        let mut seg = segmenter();
        let measurements = vec![Measurement {
            point: Point::new(250.0, 5.0),
            value: "X".to_string(),
            rtss: Some(rtss("00020-01-010-000C")),
        }];
        let params = InterpolationParams {
            step: 50.0,
            max_dist: 5000.0,
            attribute: "classe".to_string(),
            match_route: true,
        };
        seg.interpolate_nearest(&measurements, &params).unwrap();
        assert!(seg.linear_referencing(&rtss("00010-01-210-000C")).is_none());
        let lr = seg.linear_referencing(&rtss("00020-01-010-000C")).unwrap();
        assert_eq!(lr.values_at(c(0.0), "classe"), vec!["X"]);
    }

    #[test]
    fn test_match_route_skips_measurement_without_rtss() {
        let records = vec![RouteRecord {
            rtss: "ABCDE-01-210-000C".to_string(),
            chainage_d: None,
            chainage_f: 100.0,
            geometry: LineString::from(vec![(0.0, 0.0), (100.0, 0.0)]),
            frame: ReferenceFrame::default(),
            name: None,
        }];
        let geocodage = Geocodage::from_records(records, GeocodageOptions::default()).unwrap();
        let route = rtss("ABCDE-01-210-000C");
        assert_eq!(route.num_route(), None);

        let mut seg = ReseauSegmenter::new(geocodage);
        let measurements = vec![Measurement {
            point: Point::new(50.0, 1.0),
            value: "X".to_string(),
            rtss: None,
        }];
        let params = InterpolationParams {
            step: 10.0,
            max_dist: 20.0,
            attribute: "classe".to_string(),
            match_route: true,
        };
        let report = seg.interpolate_nearest(&measurements, &params).unwrap();
        assert_eq!(report.applied, 0);
        assert!(seg.linear_referencing(&route).is_none());
    }

    #[test]
    fn test_invalid_step() {
        let mut seg = segmenter();
        let params = InterpolationParams {
            step: 0.0,
            ..InterpolationParams::default()
        };
        assert!(seg.interpolate_nearest(&[], &params).is_err());
    }

    #[test]
    fn test_merge_and_features() {
        let mut seg = segmenter();
        seg.add_ranges(vec![range("00010-01-210-000C", 0.0, 100.0, "asphalte")]);

        let mut other = segmenter();
        other.add_ranges(vec![
            range("00010-01-210-000C", 50.0, 150.0, "gravier"),
            range("00020-01-010-000C", 0.0, 100.0, "béton"),
        ]);

        assert_eq!(seg.merge(&other).unwrap(), 2);
        let features = seg.create_features(false).unwrap();
        // [0,50) asphalte, [50,100) asphalte + gravier, [100,150) gravier, route 20
        assert_eq!(features.len(), 5);
        assert_eq!(features[0].rtss, rtss("00010-01-210-000C"));
        assert_eq!(features[4].rtss, rtss("00020-01-010-000C"));
    }
}
