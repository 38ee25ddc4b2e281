//! Géocodeur d'une route
//!
//! `FeatRtss` possède la polyligne planaire d'un RTSS et son domaine de
//! chaînage `[chainage_d, chainage_f]`. Il convertit les descripteurs en
//! référence linéaire vers des géométries planaires et inversement.
//!
//! Le chaînage est mis à l'échelle de la longueur géométrique:
//! `longueur = L · (c − chainage_d) / (chainage_f − chainage_d)`, borné aux
//! deux extrémités du domaine. Les fonctions de géocodage sont totales: un
//! chaînage hors domaine est ramené sur la borne la plus proche.

pub(crate) mod measure;

use std::sync::OnceLock;

use geo::{Coord, Densify, EuclideanDistance, Geometry, LineString, Point, Polygon};
use tracing::debug;

use crate::geometry::{LineRtss, PointRtss, PolygonRtss, RtssGeometry};
use crate::{Chainage, Rtss, RtssError};

/// Pas de densification par défaut (mètres)
pub const DEFAULT_DENSIFY_STEP: f64 = 1.0;

/// Mode de géocodage des lignes et polygones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraceMode {
    /// Seuls les points fournis sont géocodés
    Vertex,
    /// Les sommets de la route situés entre deux points fournis sont aussi
    /// rejoués, pour suivre la courbure
    #[default]
    Trace,
}

/// Géocodeur d'un RTSS
#[derive(Debug)]
pub struct FeatRtss {
    rtss: Rtss,
    geometry: LineString<f64>,
    cumul: Vec<f64>,
    chainage_d: Chainage,
    chainage_f: Chainage,
    densify_step: f64,
    /// Copie densifiée et ses longueurs cumulées, calculée à la demande
    densified: OnceLock<(LineString<f64>, Vec<f64>)>,
}

impl Clone for FeatRtss {
    fn clone(&self) -> Self {
        Self {
            rtss: self.rtss.clone(),
            geometry: self.geometry.clone(),
            cumul: self.cumul.clone(),
            chainage_d: self.chainage_d,
            chainage_f: self.chainage_f,
            densify_step: self.densify_step,
            densified: OnceLock::new(),
        }
    }
}

impl FeatRtss {
    /// # Errors
    ///
    /// - `RtssError::InvalidDomain` si `chainage_f <= chainage_d`
    /// - `RtssError::InvalidGeometry` si la polyligne a moins de 2 sommets ou
    ///   des coordonnées non finies
    pub fn new(
        rtss: Rtss,
        geometry: LineString<f64>,
        chainage_d: Chainage,
        chainage_f: Chainage,
    ) -> Result<Self, RtssError> {
        if chainage_f <= chainage_d {
            return Err(RtssError::InvalidDomain {
                rtss: rtss.value().to_string(),
                chainage_d: chainage_d.value(),
                chainage_f: chainage_f.value(),
            });
        }
        if geometry.0.len() < 2 {
            return Err(RtssError::invalid_geometry(
                rtss.value(),
                "route polyline needs at least 2 vertices",
            ));
        }
        if geometry.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(RtssError::invalid_geometry(
                rtss.value(),
                "non finite coordinate",
            ));
        }

        let cumul = measure::cumulative_lengths(&geometry);
        let length = cumul[cumul.len() - 1];
        if length == 0.0 {
            debug!(rtss = %rtss, "Zero-length route geometry, chainage clamps to chainage_d");
        }

        Ok(Self {
            rtss,
            geometry,
            cumul,
            chainage_d,
            chainage_f,
            densify_step: DEFAULT_DENSIFY_STEP,
            densified: OnceLock::new(),
        })
    }

    /// Change le pas de densification (ignoré s'il n'est pas strictement positif)
    pub fn with_densify_step(mut self, step: f64) -> Self {
        if step > 0.0 && step.is_finite() {
            self.densify_step = step;
            self.densified = OnceLock::new();
        }
        self
    }

    #[inline]
    pub fn rtss(&self) -> &Rtss {
        &self.rtss
    }

    /// Polyligne source
    #[inline]
    pub fn geometry(&self) -> &LineString<f64> {
        &self.geometry
    }

    #[inline]
    pub fn chainage_d(&self) -> Chainage {
        self.chainage_d
    }

    #[inline]
    pub fn chainage_f(&self) -> Chainage {
        self.chainage_f
    }

    /// Longueur géométrique de la polyligne
    #[inline]
    pub fn length(&self) -> f64 {
        self.cumul[self.cumul.len() - 1]
    }

    #[inline]
    pub fn densify_step(&self) -> f64 {
        self.densify_step
    }

    /// Polyligne densifiée au pas `densify_step`
    pub fn densified_geometry(&self) -> &LineString<f64> {
        &self.densified().0
    }

    fn densified(&self) -> &(LineString<f64>, Vec<f64>) {
        self.densified.get_or_init(|| {
            let line = self.geometry.densify(self.densify_step);
            let cumul = measure::cumulative_lengths(&line);
            debug!(
                rtss = %self.rtss,
                vertices = line.0.len(),
                step = self.densify_step,
                "Densified route geometry"
            );
            (line, cumul)
        })
    }

    /// Vrai si le chaînage est dans `[chainage_d, chainage_f]`
    pub fn contains_chainage(&self, chainage: Chainage) -> bool {
        chainage >= self.chainage_d && chainage <= self.chainage_f
    }

    /// Chaînage ramené dans le domaine de la route
    pub fn clamp_chainage(&self, chainage: Chainage) -> Chainage {
        chainage.clamp(self.chainage_d, self.chainage_f)
    }

    /// Chaînage → longueur géométrique (bornée)
    pub fn chainage_to_length(&self, chainage: Chainage) -> f64 {
        let c = self.clamp_chainage(chainage).value();
        let (cd, cf) = (self.chainage_d.value(), self.chainage_f.value());
        self.length() * ((c - cd) / (cf - cd))
    }

    /// Longueur géométrique → chaînage (borné)
    pub fn length_to_chainage(&self, length: f64) -> Chainage {
        let total = self.length();
        if total <= 0.0 {
            return self.chainage_d;
        }
        let l = length.clamp(0.0, total);
        let (cd, cf) = (self.chainage_d.value(), self.chainage_f.value());
        self.clamp_chainage(Chainage::saturating(cd + (cf - cd) * (l / total)))
    }

    /// Chaînage de chacun des sommets de la polyligne source
    pub fn vertex_chainages(&self) -> Vec<Chainage> {
        self.cumul
            .iter()
            .map(|&l| self.length_to_chainage(l))
            .collect()
    }

    /// Tangente unitaire à la longueur `length`
    ///
    /// Avec `densify`, la tangente est une différence centrée sur un pas de
    /// la polyligne densifiée, ce qui lisse les sommets.
    fn tangent_at(&self, length: f64, densify: bool) -> Coord<f64> {
        if densify {
            let (line, cumul) = self.densified();
            let half = self.densify_step / 2.0;
            let total = self.length();
            let a = measure::point_at(line, cumul, (length - half).max(0.0));
            let b = measure::point_at(line, cumul, (length + half).min(total));
            if let Some(d) = measure::direction(a, b) {
                return d;
            }
        }
        measure::segment_direction(&self.geometry, &self.cumul, length)
    }

    /// Point à `length`, décalé de `offset` à droite de la tangente
    fn offset_coord(&self, length: f64, offset: f64, densify: bool) -> Coord<f64> {
        let p = measure::point_at(&self.geometry, &self.cumul, length);
        if offset == 0.0 {
            return p;
        }
        let t = self.tangent_at(length, densify);
        // Normale à droite de (dx, dy): (dy, -dx)
        Coord {
            x: p.x + offset * t.y,
            y: p.y - offset * t.x,
        }
    }

    /// Géocode `(chaînage, décalage)` en point planaire
    pub fn point_from_chainage(&self, chainage: Chainage, offset: f64, densify: bool) -> Point<f64> {
        Point::from(self.offset_coord(self.chainage_to_length(chainage), offset, densify))
    }

    fn check_rtss(&self, rtss: &Rtss) -> Result<(), RtssError> {
        if rtss != &self.rtss {
            return Err(RtssError::RtssMismatch {
                expected: self.rtss.value().to_string(),
                found: rtss.value().to_string(),
            });
        }
        Ok(())
    }

    /// Géocode un `PointRtss`
    pub fn geocoder_point(&self, point: &PointRtss, densify: bool) -> Result<Point<f64>, RtssError> {
        self.check_rtss(point.rtss())?;
        Ok(self.point_from_chainage(point.chainage(), point.offset(), densify))
    }

    /// Géocode un `LineRtss`
    ///
    /// Avec `interpolate_offset`, le décalage varie linéairement entre deux
    /// points successifs selon la distance parcourue sur l'axe; sinon il reste
    /// celui du point de départ jusqu'au point suivant.
    pub fn geocoder_line(
        &self,
        line: &LineRtss,
        mode: TraceMode,
        interpolate_offset: bool,
        densify: bool,
    ) -> Result<LineString<f64>, RtssError> {
        self.check_rtss(line.rtss())?;
        let pairs: Vec<(Chainage, f64)> = line.chainage_offsets().collect();
        Ok(LineString::new(self.trace(&pairs, mode, interpolate_offset, densify)))
    }

    /// Géocode un `PolygonRtss`
    pub fn geocoder_polygon(
        &self,
        polygon: &PolygonRtss,
        mode: TraceMode,
        interpolate_offset: bool,
        densify: bool,
    ) -> Result<Polygon<f64>, RtssError> {
        self.check_rtss(polygon.rtss())?;
        let pairs: Vec<(Chainage, f64)> = polygon.chainage_offsets().collect();
        let mut coords = self.trace(&pairs, mode, interpolate_offset, densify);
        if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
            if first != last {
                coords.push(first);
            }
        }
        Ok(Polygon::new(LineString::new(coords), vec![]))
    }

    /// Géocode un descripteur quelconque (décalages interpolés)
    pub fn geocoder(
        &self,
        geometry: &RtssGeometry,
        mode: TraceMode,
        densify: bool,
    ) -> Result<Geometry<f64>, RtssError> {
        match geometry {
            RtssGeometry::Point(p) => self.geocoder_point(p, densify).map(Geometry::Point),
            RtssGeometry::Line(l) => self
                .geocoder_line(l, mode, true, densify)
                .map(Geometry::LineString),
            RtssGeometry::Polygon(p) => self
                .geocoder_polygon(p, mode, true, densify)
                .map(Geometry::Polygon),
        }
    }

    /// Suite de coordonnées planaires pour une suite `(chaînage, décalage)`
    fn trace(
        &self,
        pairs: &[(Chainage, f64)],
        mode: TraceMode,
        interpolate_offset: bool,
        densify: bool,
    ) -> Vec<Coord<f64>> {
        let mut coords: Vec<Coord<f64>> = Vec::with_capacity(pairs.len());

        if mode == TraceMode::Vertex || pairs.len() < 2 {
            for &(c, o) in pairs {
                push_dedup(
                    &mut coords,
                    self.offset_coord(self.chainage_to_length(c), o, densify),
                );
            }
            return coords;
        }

        for w in pairs.windows(2) {
            let (l0, o0) = (self.chainage_to_length(w[0].0), w[0].1);
            let (l1, o1) = (self.chainage_to_length(w[1].0), w[1].1);
            let total = (l1 - l0).abs();

            let mut positions = vec![l0];
            if l1 >= l0 {
                positions.extend(self.cumul.iter().copied().filter(|&v| v > l0 && v < l1));
            } else {
                positions.extend(self.cumul.iter().rev().copied().filter(|&v| v < l0 && v > l1));
            }
            positions.push(l1);

            for l in positions {
                let offset = if interpolate_offset && total > 0.0 {
                    let d = (l - l0).abs();
                    o0 + d / total * (o1 - o0)
                } else {
                    o0
                };
                push_dedup(&mut coords, self.offset_coord(l, offset, densify));
            }
        }

        coords
    }

    /// Géocodage inverse d'un point planaire
    ///
    /// Le décalage est positif à droite de la route.
    pub fn geocoder_inv_point(&self, point: &Point<f64>) -> PointRtss {
        let proj = measure::project(&self.geometry, &self.cumul, point.0);
        let offset = if proj.left {
            -proj.distance
        } else {
            proj.distance
        };
        PointRtss::new(self.rtss.clone(), self.length_to_chainage(proj.length), offset)
    }

    /// Géocodage inverse de chaque sommet d'une ligne
    pub fn geocoder_inv_line(&self, line: &LineString<f64>) -> Result<LineRtss, RtssError> {
        let points = line
            .points()
            .map(|p| self.geocoder_inv_point(&p))
            .collect();
        LineRtss::new(points)
    }

    /// Géocodage inverse de l'anneau extérieur d'un polygone
    pub fn geocoder_inv_polygon(&self, polygon: &Polygon<f64>) -> Result<PolygonRtss, RtssError> {
        let points = polygon
            .exterior()
            .points()
            .map(|p| self.geocoder_inv_point(&p))
            .collect();
        PolygonRtss::new(points)
    }

    /// Transect perpendiculaire à la route au chaînage donné, de
    /// `-dist_left` à `+dist_right` (ou l'inverse avec `reverse`)
    pub fn transect(
        &self,
        chainage: Chainage,
        dist_left: f64,
        dist_right: f64,
        reverse: bool,
        densify: bool,
    ) -> LineString<f64> {
        let l = self.chainage_to_length(chainage);
        let left = self.offset_coord(l, -dist_left, densify);
        let right = self.offset_coord(l, dist_right, densify);
        if reverse {
            LineString::new(vec![right, left])
        } else {
            LineString::new(vec![left, right])
        }
    }

    /// Ligne entre deux chaînages, décalage interpolé de `offset_d` à `offset_f`
    pub fn line_between(
        &self,
        chainage_d: Chainage,
        chainage_f: Chainage,
        offset_d: f64,
        offset_f: f64,
        densify: bool,
    ) -> Result<LineString<f64>, RtssError> {
        let line = LineRtss::from_chainages(
            self.rtss.clone(),
            chainage_d,
            chainage_f,
            offset_d,
            offset_f,
        )?;
        self.geocoder_line(&line, TraceMode::Trace, true, densify)
    }

    /// Azimut de la route au chaînage donné, en degrés depuis le nord (sens horaire)
    pub fn angle_at(&self, chainage: Chainage) -> f64 {
        let t = self.tangent_at(self.chainage_to_length(chainage), false);
        t.x.atan2(t.y).to_degrees().rem_euclid(360.0)
    }

    /// Distance planaire entre un point et la polyligne
    pub fn distance_to(&self, point: &Point<f64>) -> f64 {
        point.euclidean_distance(&self.geometry)
    }
}

/// Ajoute une coordonnée en ignorant un doublon consécutif
fn push_dedup(coords: &mut Vec<Coord<f64>>, c: Coord<f64>) {
    const TOLERANCE: f64 = 1e-9;
    if let Some(last) = coords.last() {
        if (last.x - c.x).abs() < TOLERANCE && (last.y - c.y).abs() < TOLERANCE {
            return;
        }
    }
    coords.push(c);
}
