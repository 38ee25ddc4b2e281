//! Polygone en référence linéaire

use crate::geometry::{check_same_route, LineRtss, PointRtss};
use crate::{Chainage, Rtss, RtssError};

/// Écart de chaînage maximal entre deux sommets d'une même grappe lors de
/// l'extraction de la ligne centrale
pub const CLUSTER_TOLERANCE: f64 = 0.5;

/// Anneau fermé de `PointRtss` sur un seul RTSS (au moins 4 points)
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRtss {
    points: Vec<PointRtss>,
}

impl PolygonRtss {
    /// Construit le polygone, en fermant l'anneau si nécessaire
    ///
    /// # Errors
    ///
    /// - `RtssError::MultiRoute` si les points sont sur plusieurs RTSS
    /// - `RtssError::InvalidGeometry` s'il reste moins de 4 points une fois fermé
    pub fn new(mut points: Vec<PointRtss>) -> Result<Self, RtssError> {
        let rtss = check_same_route(&points)?.clone();

        let first = points[0].clone();
        let last = &points[points.len() - 1];
        if last.chainage() != first.chainage() || last.offset() != first.offset() {
            points.push(first);
        }

        if points.len() < 4 {
            return Err(RtssError::invalid_geometry(
                rtss.value(),
                format!("polygon needs at least 4 points once closed, got {}", points.len()),
            ));
        }

        Ok(Self { points })
    }

    /// Rectangle dans l'espace chaînage/décalage
    pub fn from_bounds(
        rtss: Rtss,
        chainage_d: Chainage,
        chainage_f: Chainage,
        offset_min: f64,
        offset_max: f64,
    ) -> Result<Self, RtssError> {
        Self::new(vec![
            PointRtss::new(rtss.clone(), chainage_d, offset_min),
            PointRtss::new(rtss.clone(), chainage_f, offset_min),
            PointRtss::new(rtss.clone(), chainage_f, offset_max),
            PointRtss::new(rtss, chainage_d, offset_max),
        ])
    }

    #[inline]
    pub fn rtss(&self) -> &Rtss {
        self.points[0].rtss()
    }

    /// Points de l'anneau (le dernier répète le premier)
    #[inline]
    pub fn points(&self) -> &[PointRtss] {
        &self.points
    }

    pub fn chainage_d(&self) -> Chainage {
        self.points
            .iter()
            .map(|p| p.chainage())
            .min()
            .unwrap_or_default()
    }

    pub fn chainage_f(&self) -> Chainage {
        self.points
            .iter()
            .map(|p| p.chainage())
            .max()
            .unwrap_or_default()
    }

    pub fn offset_min(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.offset())
            .fold(f64::INFINITY, f64::min)
    }

    pub fn offset_max(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.offset())
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Étendue en chaînage
    pub fn width(&self) -> f64 {
        self.chainage_f().value() - self.chainage_d().value()
    }

    /// Étendue en décalage
    pub fn height(&self) -> f64 {
        self.offset_max() - self.offset_min()
    }

    /// Ligne centrale approchée du polygone
    ///
    /// Les sommets sont triés par `(chaînage, décalage)` puis regroupés par
    /// balayage: un sommet rejoint la grappe courante si son chaînage est à
    /// moins de `CLUSTER_TOLERANCE` du sommet précédent. Chaque grappe donne
    /// un point au chaînage moyen, décalé au milieu de ses décalages extrêmes.
    /// Retourne `None` s'il y a moins de deux grappes.
    pub fn centerline(&self) -> Option<LineRtss> {
        let mut vertices: Vec<(f64, f64)> = self.points[..self.points.len() - 1]
            .iter()
            .map(|p| (p.chainage().value(), p.offset()))
            .collect();
        vertices.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

        let mut clusters: Vec<Vec<(f64, f64)>> = Vec::new();
        for v in vertices {
            match clusters.last_mut() {
                Some(cluster)
                    if v.0 - cluster[cluster.len() - 1].0 <= CLUSTER_TOLERANCE =>
                {
                    cluster.push(v)
                }
                _ => clusters.push(vec![v]),
            }
        }

        if clusters.len() < 2 {
            return None;
        }

        let rtss = self.rtss().clone();
        let points = clusters
            .iter()
            .map(|cluster| {
                let mean_c = cluster.iter().map(|v| v.0).sum::<f64>() / cluster.len() as f64;
                let min_o = cluster.iter().map(|v| v.1).fold(f64::INFINITY, f64::min);
                let max_o = cluster.iter().map(|v| v.1).fold(f64::NEG_INFINITY, f64::max);
                PointRtss::new(
                    rtss.clone(),
                    Chainage::saturating(mean_c),
                    (min_o + max_o) / 2.0,
                )
            })
            .collect();

        LineRtss::new(points).ok()
    }

    /// Paires `(chaînage, décalage)` de l'anneau
    pub fn chainage_offsets(&self) -> impl Iterator<Item = (Chainage, f64)> + '_ {
        self.points.iter().map(|p| (p.chainage(), p.offset()))
    }
}
