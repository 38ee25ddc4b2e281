//! Modèle de segmentation: points de rupture et éléments attribués
//!
//! Un `SegmentationPoint` est un point de rupture (décalage nul) qui porte
//! la liste des éléments actifs jusqu'au point de rupture suivant. Une liste
//! vide est un marqueur de fin.
//!
//! Les bornes de décalage d'un élément sont locales à l'intervalle du point
//! de rupture qui le porte: `offset_d` au début de l'intervalle, `offset_f`
//! à sa fin.

use std::collections::BTreeMap;

use crate::geometry::PointRtss;
use crate::{Chainage, Rtss};

/// Attributs d'un élément (clé → valeur)
pub type Attributes = BTreeMap<String, String>;

/// Élément attribué d'un intervalle de segmentation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineSegmentationElement {
    attributes: Attributes,
    offsets: Option<(f64, f64)>,
}

impl LineSegmentationElement {
    pub fn new(attributes: Attributes) -> Self {
        Self {
            attributes,
            offsets: None,
        }
    }

    /// Élément avec un seul attribut
    pub fn single(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert(key.into(), value.into());
        Self::new(attributes)
    }

    /// Élément dessiné parallèlement (ou en biseau) à la route
    pub fn with_offsets(mut self, offset_d: f64, offset_f: f64) -> Self {
        self.offsets = Some((offset_d, offset_f));
        self
    }

    #[inline]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[inline]
    pub fn offsets(&self) -> Option<(f64, f64)> {
        self.offsets
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Vrai si le décalage varie le long de l'intervalle
    pub fn is_tapered(&self) -> bool {
        matches!(self.offsets, Some((d, f)) if d != f)
    }

    /// Décalages au début et à la fin (0 si l'élément suit l'axe)
    pub fn offset_bounds(&self) -> (f64, f64) {
        self.offsets.unwrap_or((0.0, 0.0))
    }

    /// Décalage à la fraction `t` de l'intervalle
    pub fn offset_at(&self, t: f64) -> f64 {
        let (d, f) = self.offset_bounds();
        d + t * (f - d)
    }

    /// Coupe l'élément à la fraction `t` de son intervalle
    ///
    /// Le décalage reste continu: la fin du premier morceau est le début du
    /// second.
    pub(crate) fn split_at(&self, t: f64) -> (Self, Self) {
        match self.offsets {
            Some((d, f)) => {
                let mid = d + t * (f - d);
                (
                    Self {
                        attributes: self.attributes.clone(),
                        offsets: Some((d, mid)),
                    },
                    Self {
                        attributes: self.attributes.clone(),
                        offsets: Some((mid, f)),
                    },
                )
            }
            None => (self.clone(), self.clone()),
        }
    }

    /// Borne de fin remplacée
    pub(crate) fn with_end_offset(&self, offset_f: f64) -> Self {
        let mut out = self.clone();
        if let Some((d, _)) = out.offsets {
            out.offsets = Some((d, offset_f));
        }
        out
    }

    /// Bornes locales d'un morceau `[t0, t1]` de l'intervalle
    pub(crate) fn piece(&self, t0: f64, t1: f64) -> Self {
        let mut out = self.clone();
        if self.offsets.is_some() {
            out.offsets = Some((self.offset_at(t0), self.offset_at(t1)));
        }
        out
    }
}

/// Point de rupture d'une segmentation
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationPoint {
    point: PointRtss,
    elements: Vec<LineSegmentationElement>,
}

impl SegmentationPoint {
    /// Marqueur de fin (aucun élément)
    pub fn end_marker(rtss: Rtss, chainage: Chainage) -> Self {
        Self {
            point: PointRtss::on_centerline(rtss, chainage),
            elements: Vec::new(),
        }
    }

    pub fn with_elements(
        rtss: Rtss,
        chainage: Chainage,
        elements: Vec<LineSegmentationElement>,
    ) -> Self {
        Self {
            point: PointRtss::on_centerline(rtss, chainage),
            elements,
        }
    }

    #[inline]
    pub fn point(&self) -> &PointRtss {
        &self.point
    }

    #[inline]
    pub fn chainage(&self) -> Chainage {
        self.point.chainage()
    }

    #[inline]
    pub fn rtss(&self) -> &Rtss {
        self.point.rtss()
    }

    #[inline]
    pub fn elements(&self) -> &[LineSegmentationElement] {
        &self.elements
    }

    pub(crate) fn elements_mut(&mut self) -> &mut Vec<LineSegmentationElement> {
        &mut self.elements
    }

    pub(crate) fn set_chainage(&mut self, chainage: Chainage) {
        self.point = self.point.with_chainage(chainage);
    }

    pub fn is_end_marker(&self) -> bool {
        self.elements.is_empty()
    }

    /// Vrai si un élément porte des bornes de décalage
    pub fn has_offsets(&self) -> bool {
        self.elements.iter().any(|e| e.offsets().is_some())
    }
}
