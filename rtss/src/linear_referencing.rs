//! Segmentation d'une route
//!
//! Les points de rupture sont indexés par chaînage dans une `BTreeMap`. Deux
//! marqueurs de fin, au début et à la fin du domaine, sont toujours présents:
//! les clés partitionnent donc `[chainage_d, chainage_f)` et chaque chaînage
//! du domaine relève d'exactement un point de rupture, celui qui le précède
//! ou lui est égal.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use geo::LineString;
use tracing::{debug, warn};

use crate::feat_rtss::FeatRtss;
use crate::segmentation::{Attributes, LineSegmentationElement, SegmentationPoint};
use crate::{Chainage, Rtss, RtssError};

/// Entité géocodée d'un intervalle de segmentation
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentFeature {
    pub geometry: LineString<f64>,
    pub rtss: Rtss,
    pub chainage_d: Chainage,
    pub chainage_f: Chainage,
    pub attributes: Attributes,
}

/// Route + points de rupture
#[derive(Debug, Clone)]
pub struct LinearReferencing {
    feat: Arc<FeatRtss>,
    segmentation: BTreeMap<Chainage, SegmentationPoint>,
}

impl LinearReferencing {
    pub fn new(feat: Arc<FeatRtss>) -> Self {
        let mut lr = Self {
            feat,
            segmentation: BTreeMap::new(),
        };
        lr.clear();
        lr
    }

    #[inline]
    pub fn rtss(&self) -> &Rtss {
        self.feat.rtss()
    }

    #[inline]
    pub fn feat(&self) -> &Arc<FeatRtss> {
        &self.feat
    }

    #[inline]
    pub fn chainage_d(&self) -> Chainage {
        self.feat.chainage_d()
    }

    #[inline]
    pub fn chainage_f(&self) -> Chainage {
        self.feat.chainage_f()
    }

    /// Nombre de points de rupture (marqueurs de fin compris)
    pub fn len(&self) -> usize {
        self.segmentation.len()
    }

    /// Vrai si aucun élément n'est actif sur la route
    pub fn is_empty(&self) -> bool {
        self.segmentation.values().all(SegmentationPoint::is_end_marker)
    }

    /// Points de rupture par chaînage croissant
    pub fn breakpoints(&self) -> impl Iterator<Item = &SegmentationPoint> {
        self.segmentation.values()
    }

    /// Retire tous les éléments: il ne reste que les deux marqueurs de fin
    pub fn clear(&mut self) {
        let rtss = self.feat.rtss().clone();
        let (cd, cf) = (self.chainage_d(), self.chainage_f());
        self.segmentation.clear();
        self.segmentation
            .insert(cd, SegmentationPoint::end_marker(rtss.clone(), cd));
        self.segmentation
            .insert(cf, SegmentationPoint::end_marker(rtss, cf));
    }

    fn check_on_route(&self, chainage: Chainage) -> Result<(), RtssError> {
        if self.feat.contains_chainage(chainage) {
            return Ok(());
        }
        Err(RtssError::OffRoute {
            rtss: self.rtss().value().to_string(),
            chainage: chainage.value(),
            chainage_d: self.chainage_d().value(),
            chainage_f: self.chainage_f().value(),
        })
    }

    fn previous_key(&self, chainage: Chainage) -> Option<Chainage> {
        self.segmentation.range(..chainage).next_back().map(|(&k, _)| k)
    }

    fn next_key(&self, chainage: Chainage) -> Option<Chainage> {
        self.segmentation
            .range((Bound::Excluded(chainage), Bound::Unbounded))
            .next()
            .map(|(&k, _)| k)
    }

    /// Ajoute un point de rupture
    ///
    /// L'intervalle qui le contient est coupé en deux. Avec `copy_elements`,
    /// le nouveau point reçoit une copie des éléments du point précédent;
    /// sinon il devient un marqueur de fin. Les biseaux restent continus de
    /// part et d'autre de la coupure.
    ///
    /// # Errors
    ///
    /// - `RtssError::OffRoute` si le chaînage est hors du domaine
    /// - `RtssError::DuplicateBreakpoint` si un point existe déjà à ce chaînage
    pub fn add_segmentation(
        &mut self,
        chainage: Chainage,
        copy_elements: bool,
    ) -> Result<(), RtssError> {
        self.check_on_route(chainage)?;
        if self.segmentation.contains_key(&chainage) {
            return Err(RtssError::DuplicateBreakpoint {
                rtss: self.rtss().value().to_string(),
                chainage: chainage.value(),
            });
        }

        // Les deux marqueurs de fin encadrent tout chaînage du domaine
        let (Some(prev), Some(next)) = (self.previous_key(chainage), self.next_key(chainage))
        else {
            return Err(RtssError::UnknownBreakpoint {
                rtss: self.rtss().value().to_string(),
                chainage: chainage.value(),
            });
        };
        let t = fraction(prev, next, chainage);

        let mut tail = Vec::new();
        if let Some(prev_point) = self.segmentation.get_mut(&prev) {
            let mut head = Vec::with_capacity(prev_point.elements().len());
            for element in prev_point.elements() {
                let (a, b) = element.split_at(t);
                head.push(a);
                if copy_elements {
                    tail.push(b);
                }
            }
            *prev_point.elements_mut() = head;
        }

        let point = SegmentationPoint::with_elements(self.rtss().clone(), chainage, tail);
        self.segmentation.insert(chainage, point);
        debug!(rtss = %self.rtss(), chainage = chainage.value(), copy_elements, "Breakpoint added");
        Ok(())
    }

    /// Ajoute un élément sur `[chainage_d, chainage_f)`
    ///
    /// Les points de rupture manquants aux deux bornes sont créés (par copie),
    /// puis l'élément est ajouté à chaque point de rupture de l'intervalle.
    /// Un élément en biseau reçoit des bornes locales pour chaque morceau.
    pub fn add_element(
        &mut self,
        element: LineSegmentationElement,
        chainage_d: Chainage,
        chainage_f: Chainage,
    ) -> Result<(), RtssError> {
        if chainage_f <= chainage_d {
            return Err(RtssError::InvalidDomain {
                rtss: self.rtss().value().to_string(),
                chainage_d: chainage_d.value(),
                chainage_f: chainage_f.value(),
            });
        }
        self.check_on_route(chainage_d)?;
        self.check_on_route(chainage_f)?;

        for bound in [chainage_d, chainage_f] {
            if !self.segmentation.contains_key(&bound) {
                self.add_segmentation(bound, true)?;
            }
        }

        let keys: Vec<Chainage> = self
            .segmentation
            .range(chainage_d..=chainage_f)
            .map(|(&k, _)| k)
            .collect();
        for w in keys.windows(2) {
            let t0 = fraction(chainage_d, chainage_f, w[0]);
            let t1 = fraction(chainage_d, chainage_f, w[1]);
            if let Some(point) = self.segmentation.get_mut(&w[0]) {
                point.elements_mut().push(element.piece(t0, t1));
            }
        }
        Ok(())
    }

    /// Retire un point de rupture, en signalant le refus par une erreur
    ///
    /// Les biseaux de l'intervalle précédent sont prolongés jusqu'au nouveau
    /// point de rupture terminal: par continuation du biseau de même
    /// attributs porté par le point retiré s'il existe, sinon par
    /// extrapolation linéaire.
    ///
    /// # Errors
    ///
    /// - `RtssError::UnknownBreakpoint` si aucun point n'existe à ce chaînage
    /// - `RtssError::Refused` pour une borne du domaine, ou, avec `check_end`,
    ///   pour un marqueur de fin qui termine un intervalle non vide
    pub fn try_remove_segmentation(
        &mut self,
        chainage: Chainage,
        check_end: bool,
    ) -> Result<SegmentationPoint, RtssError> {
        let rtss = self.rtss().value().to_string();
        let Some(point) = self.segmentation.get(&chainage) else {
            return Err(RtssError::UnknownBreakpoint {
                rtss,
                chainage: chainage.value(),
            });
        };
        if chainage == self.chainage_d() || chainage == self.chainage_f() {
            return Err(RtssError::refused(rtss, chainage.value(), "domain bound"));
        }
        let (Some(prev), Some(next)) = (self.previous_key(chainage), self.next_key(chainage))
        else {
            return Err(RtssError::refused(rtss, chainage.value(), "unbounded breakpoint"));
        };

        let prev_is_empty = self
            .segmentation
            .get(&prev)
            .map_or(true, SegmentationPoint::is_end_marker);
        if check_end && point.is_end_marker() && !prev_is_empty {
            return Err(RtssError::refused(
                rtss,
                chainage.value(),
                "end marker terminates a non-empty interval",
            ));
        }

        let Some(removed) = self.segmentation.remove(&chainage) else {
            return Err(RtssError::UnknownBreakpoint {
                rtss,
                chainage: chainage.value(),
            });
        };

        let old_span = chainage.value() - prev.value();
        let new_span = next.value() - prev.value();
        if let Some(prev_point) = self.segmentation.get_mut(&prev) {
            let mut used = vec![false; removed.elements().len()];
            for element in prev_point.elements_mut().iter_mut() {
                let Some((od, oc)) = element.offsets() else {
                    continue;
                };
                let continuation = removed.elements().iter().enumerate().find(|(i, e)| {
                    !used[*i] && e.offsets().is_some() && e.attributes() == element.attributes()
                });
                let offset_f = match continuation {
                    Some((i, e)) => {
                        used[i] = true;
                        e.offset_bounds().1
                    }
                    None => od + (oc - od) / old_span * new_span,
                };
                *element = element.with_end_offset(offset_f);
            }
        }

        debug!(rtss = %self.rtss(), chainage = chainage.value(), "Breakpoint removed");
        Ok(removed)
    }

    /// Retire un point de rupture; `false` si la transition est refusée
    pub fn remove_segmentation(&mut self, chainage: Chainage, check_end: bool) -> bool {
        match self.try_remove_segmentation(chainage, check_end) {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    rtss = %self.rtss(),
                    chainage = chainage.value(),
                    error = %e,
                    "Breakpoint removal refused"
                );
                false
            }
        }
    }

    /// Déplace un point de rupture avec ses éléments
    ///
    /// Tout est vérifié avant la moindre modification.
    pub fn try_move_segmentation(
        &mut self,
        chainage: Chainage,
        new_chainage: Chainage,
    ) -> Result<(), RtssError> {
        let rtss = self.rtss().value().to_string();
        if !self.segmentation.contains_key(&chainage) {
            return Err(RtssError::UnknownBreakpoint {
                rtss,
                chainage: chainage.value(),
            });
        }
        if chainage == self.chainage_d() || chainage == self.chainage_f() {
            return Err(RtssError::refused(rtss, chainage.value(), "domain bound"));
        }
        if new_chainage == chainage {
            return Ok(());
        }
        if self.segmentation.contains_key(&new_chainage) {
            return Err(RtssError::refused(
                rtss,
                new_chainage.value(),
                "destination is occupied",
            ));
        }
        self.check_on_route(new_chainage)?;

        let (Some(prev), Some(next)) = (self.previous_key(chainage), self.next_key(chainage))
        else {
            return Err(RtssError::refused(rtss, chainage.value(), "unbounded breakpoint"));
        };

        if prev < new_chainage && new_chainage < next {
            // Même voisinage: les bornes locales restent valables
            if let Some(mut point) = self.segmentation.remove(&chainage) {
                point.set_chainage(new_chainage);
                self.segmentation.insert(new_chainage, point);
            }
        } else {
            let moved = self.try_remove_segmentation(chainage, false)?;
            self.add_segmentation(new_chainage, true)?;
            if let Some(point) = self.segmentation.get_mut(&new_chainage) {
                *point.elements_mut() = moved.elements().to_vec();
            }
        }

        debug!(
            rtss = %self.rtss(),
            chainage = chainage.value(),
            new_chainage = new_chainage.value(),
            "Breakpoint moved"
        );
        Ok(())
    }

    /// Déplace un point de rupture; `false` si la transition est refusée
    pub fn move_segmentation(&mut self, chainage: Chainage, new_chainage: Chainage) -> bool {
        match self.try_move_segmentation(chainage, new_chainage) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    rtss = %self.rtss(),
                    chainage = chainage.value(),
                    new_chainage = new_chainage.value(),
                    error = %e,
                    "Breakpoint move refused"
                );
                false
            }
        }
    }

    /// Point de rupture actif au chaînage (celui qui le précède ou lui est égal)
    pub fn segmentation_at(&self, chainage: Chainage) -> Option<&SegmentationPoint> {
        if chainage < self.chainage_d() {
            return None;
        }
        self.segmentation
            .range(..=chainage)
            .next_back()
            .map(|(_, point)| point)
    }

    /// Éléments actifs au chaînage
    pub fn elements_at(&self, chainage: Chainage) -> &[LineSegmentationElement] {
        self.segmentation_at(chainage)
            .map(SegmentationPoint::elements)
            .unwrap_or(&[])
    }

    /// Valeurs d'un attribut actives au chaînage
    pub fn values_at(&self, chainage: Chainage, key: &str) -> Vec<&str> {
        self.elements_at(chainage)
            .iter()
            .filter_map(|e| e.get(key))
            .collect()
    }

    /// Intervalles `[début, fin)` et leur point de rupture
    pub fn intervals(&self) -> impl Iterator<Item = (Chainage, Chainage, &SegmentationPoint)> {
        self.segmentation
            .iter()
            .zip(self.segmentation.keys().skip(1))
            .map(|((&start, point), &end)| (start, end, point))
    }

    /// Ajoute les éléments d'une autre segmentation de la même route
    ///
    /// # Errors
    ///
    /// `RtssError::RtssMismatch` si les deux segmentations portent sur des
    /// routes différentes.
    pub fn merge(&mut self, other: &LinearReferencing) -> Result<(), RtssError> {
        if other.rtss() != self.rtss() {
            return Err(RtssError::RtssMismatch {
                expected: self.rtss().value().to_string(),
                found: other.rtss().value().to_string(),
            });
        }

        for (start, end, point) in other.intervals() {
            let cd = self.feat.clamp_chainage(start);
            let cf = self.feat.clamp_chainage(end);
            if cf <= cd {
                continue;
            }
            let (t0, t1) = (fraction(start, end, cd), fraction(start, end, cf));
            for element in point.elements() {
                self.add_element(element.piece(t0, t1), cd, cf)?;
            }
        }
        Ok(())
    }

    /// Retire les points de rupture redondants
    ///
    /// Un point est redondant quand ses éléments sont ceux du point précédent
    /// et qu'aucun ne porte de décalage. Retourne le nombre de points retirés.
    pub fn simplify(&mut self) -> usize {
        let keys: Vec<Chainage> = self.segmentation.keys().copied().collect();
        let (cd, cf) = (self.chainage_d(), self.chainage_f());
        let mut removed = 0;
        let mut prev = cd;

        for key in keys {
            if key == cd || key == cf {
                continue;
            }
            let redundant = match (self.segmentation.get(&prev), self.segmentation.get(&key)) {
                (Some(p), Some(k)) => {
                    p.elements() == k.elements() && !p.has_offsets() && !k.has_offsets()
                }
                _ => false,
            };
            if redundant {
                self.segmentation.remove(&key);
                removed += 1;
            } else {
                prev = key;
            }
        }

        if removed > 0 {
            debug!(rtss = %self.rtss(), removed, "Segmentation simplified");
        }
        removed
    }

    /// Une entité par élément et par intervalle non vide
    pub fn create_features(&self, densify: bool) -> Result<Vec<SegmentFeature>, RtssError> {
        let mut features = Vec::new();
        for (start, end, point) in self.intervals() {
            for element in point.elements() {
                let (offset_d, offset_f) = element.offset_bounds();
                let geometry = self
                    .feat
                    .line_between(start, end, offset_d, offset_f, densify)?;
                features.push(SegmentFeature {
                    geometry,
                    rtss: self.rtss().clone(),
                    chainage_d: start,
                    chainage_f: end,
                    attributes: element.attributes().clone(),
                });
            }
        }
        Ok(features)
    }
}

/// Position relative de `chainage` dans `[start, end]`
fn fraction(start: Chainage, end: Chainage, chainage: Chainage) -> f64 {
    let span = end.value() - start.value();
    if span > 0.0 {
        (chainage.value() - start.value()) / span
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn c(v: f64) -> Chainage {
        Chainage::new(v).unwrap()
    }

    fn lr() -> LinearReferencing {
        let feat = FeatRtss::new(
            Rtss::new("00010-01-210-000C").unwrap(),
            LineString::from(vec![(0.0, 0.0), (500.0, 0.0)]),
            c(0.0),
            c(500.0),
        )
        .unwrap();
        LinearReferencing::new(Arc::new(feat))
    }

    fn voie(value: &str) -> LineSegmentationElement {
        LineSegmentationElement::single("voie", value)
    }

    /// Les clés partitionnent le domaine et chaque chaînage a un seul point actif
    fn assert_coverage(lr: &LinearReferencing) {
        let keys: Vec<Chainage> = lr.breakpoints().map(|p| p.chainage()).collect();
        assert_eq!(keys.first(), Some(&lr.chainage_d()));
        assert_eq!(keys.last(), Some(&lr.chainage_f()));
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        for i in 0..500 {
            let at = c(i as f64 + 0.5);
            let point = lr.segmentation_at(at).unwrap();
            assert!(point.chainage() <= at);
        }
    }

    #[test]
    fn test_new_has_two_end_markers() {
        let lr = lr();
        assert_eq!(lr.len(), 2);
        assert!(lr.is_empty());
        assert!(lr.elements_at(c(250.0)).is_empty());
        assert!(lr.segmentation_at(c(0.0)).unwrap().is_end_marker());
    }

    #[test]
    fn test_add_segmentation_errors() {
        let mut lr = lr();
        assert!(matches!(
            lr.add_segmentation(c(600.0), true),
            Err(RtssError::OffRoute { .. })
        ));
        lr.add_segmentation(c(100.0), true).unwrap();
        assert!(matches!(
            lr.add_segmentation(c(100.0), true),
            Err(RtssError::DuplicateBreakpoint { .. })
        ));
        assert!(matches!(
            lr.add_segmentation(c(500.0), false),
            Err(RtssError::DuplicateBreakpoint { .. })
        ));
    }

    #[test]
    fn test_add_element() {
        let mut lr = lr();
        lr.add_element(voie("A"), c(100.0), c(300.0)).unwrap();
        lr.add_element(voie("B"), c(200.0), c(400.0)).unwrap();

        assert_eq!(lr.values_at(c(50.0), "voie"), Vec::<&str>::new());
        assert_eq!(lr.values_at(c(150.0), "voie"), vec!["A"]);
        assert_eq!(lr.values_at(c(250.0), "voie"), vec!["A", "B"]);
        assert_eq!(lr.values_at(c(350.0), "voie"), vec!["B"]);
        assert!(lr.elements_at(c(450.0)).is_empty());
        assert_coverage(&lr);
    }

    #[test]
    fn test_split_merge_law() {
        let mut lr = lr();
        lr.add_element(voie("A").with_offsets(0.0, 4.0), c(100.0), c(300.0))
            .unwrap();
        lr.add_element(voie("B"), c(100.0), c(300.0)).unwrap();
        let before: Vec<LineSegmentationElement> = lr.elements_at(c(100.0)).to_vec();

        lr.add_segmentation(c(150.0), true).unwrap();
        assert_eq!(lr.elements_at(c(150.0)).len(), 2);
        assert_abs_diff_eq!(lr.elements_at(c(100.0))[0].offset_bounds().1, 1.0);
        assert!(lr.remove_segmentation(c(150.0), true));

        assert_eq!(lr.elements_at(c(100.0)), before.as_slice());
        assert_coverage(&lr);
    }

    #[test]
    fn test_remove_refusals() {
        let mut lr = lr();
        lr.add_element(voie("A"), c(100.0), c(300.0)).unwrap();

        assert!(!lr.remove_segmentation(c(0.0), true));
        assert!(!lr.remove_segmentation(c(500.0), true));
        assert!(!lr.remove_segmentation(c(42.0), true));
        // 300 termine l'intervalle [100, 300)
        assert!(!lr.remove_segmentation(c(300.0), true));
        assert!(matches!(
            lr.try_remove_segmentation(c(300.0), true),
            Err(RtssError::Refused { .. })
        ));

        // Sans vérification: l'élément s'étend jusqu'à la fin du domaine
        assert!(lr.remove_segmentation(c(300.0), false));
        assert_eq!(lr.values_at(c(450.0), "voie"), vec!["A"]);
    }

    #[test]
    fn test_remove_extrapolates_taper() {
        let mut lr = lr();
        lr.add_element(voie("A").with_offsets(0.0, 2.0), c(100.0), c(200.0))
            .unwrap();
        lr.add_element(voie("B"), c(200.0), c(300.0)).unwrap();

        assert!(lr.remove_segmentation(c(200.0), true));
        let element = &lr.elements_at(c(100.0))[0];
        assert_eq!(element.get("voie"), Some("A"));
        // [100, 300): pente de 2 par 100 m prolongée
        assert_abs_diff_eq!(element.offset_bounds().1, 4.0);
    }

    #[test]
    fn test_move_segmentation() {
        let mut lr = lr();
        lr.add_element(voie("A"), c(100.0), c(200.0)).unwrap();
        lr.add_element(voie("B"), c(200.0), c(300.0)).unwrap();

        assert!(lr.move_segmentation(c(200.0), c(250.0)));
        assert_eq!(lr.values_at(c(225.0), "voie"), vec!["A"]);
        assert_eq!(lr.values_at(c(260.0), "voie"), vec!["B"]);

        // Destination occupée ou hors route: rien ne change
        let snapshot: Vec<SegmentationPoint> = lr.breakpoints().cloned().collect();
        assert!(!lr.move_segmentation(c(250.0), c(300.0)));
        assert!(!lr.move_segmentation(c(250.0), c(900.0)));
        assert!(!lr.move_segmentation(c(0.0), c(10.0)));
        let after: Vec<SegmentationPoint> = lr.breakpoints().cloned().collect();
        assert_eq!(snapshot, after);
        assert_coverage(&lr);
    }

    #[test]
    fn test_move_across_breakpoints() {
        let mut lr = lr();
        lr.add_element(voie("A"), c(100.0), c(200.0)).unwrap();
        lr.add_element(voie("B"), c(200.0), c(300.0)).unwrap();

        assert!(lr.move_segmentation(c(100.0), c(400.0)));
        assert_eq!(lr.values_at(c(150.0), "voie"), Vec::<&str>::new());
        assert_eq!(lr.values_at(c(450.0), "voie"), vec!["A"]);
        assert_coverage(&lr);
    }

    #[test]
    fn test_merge_and_simplify() {
        let mut lr = lr();
        lr.add_element(voie("A"), c(0.0), c(200.0)).unwrap();

        let mut other = LinearReferencing::new(Arc::clone(lr.feat()));
        other.add_element(voie("B"), c(100.0), c(300.0)).unwrap();
        lr.merge(&other).unwrap();
        assert_eq!(lr.values_at(c(150.0), "voie"), vec!["A", "B"]);
        assert_eq!(lr.values_at(c(250.0), "voie"), vec!["B"]);

        lr.add_segmentation(c(50.0), true).unwrap();
        assert_eq!(lr.simplify(), 1);
        assert_eq!(lr.values_at(c(60.0), "voie"), vec!["A"]);
        assert_coverage(&lr);
    }

    #[test]
    fn test_merge_other_route() {
        let mut lr = lr();
        let feat = FeatRtss::new(
            Rtss::new("00020-01-010-000C").unwrap(),
            LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]),
            c(0.0),
            c(10.0),
        )
        .unwrap();
        let other = LinearReferencing::new(Arc::new(feat));
        assert!(matches!(
            lr.merge(&other),
            Err(RtssError::RtssMismatch { .. })
        ));
    }

    #[test]
    fn test_create_features() {
        let mut lr = lr();
        lr.add_element(voie("A"), c(100.0), c(300.0)).unwrap();
        lr.add_element(voie("B").with_offsets(3.0, 3.0), c(200.0), c(300.0))
            .unwrap();

        let features = lr.create_features(false).unwrap();
        assert_eq!(features.len(), 3);
        assert_eq!(features[0].chainage_d, c(100.0));
        assert_eq!(features[0].chainage_f, c(200.0));
        assert_eq!(features[2].attributes.get("voie").map(String::as_str), Some("B"));
        let last = &features[2].geometry.0;
        assert_abs_diff_eq!(last[0].y, -3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(last[last.len() - 1].x, 300.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clear() {
        let mut lr = lr();
        lr.add_element(voie("A"), c(100.0), c(300.0)).unwrap();
        lr.clear();
        assert_eq!(lr.len(), 2);
        assert!(lr.is_empty());
    }
}
