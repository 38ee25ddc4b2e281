//! Ligne en référence linéaire

use crate::geometry::{check_same_route, PointRtss, Side};
use crate::{Chainage, Rtss, RtssError};

/// Suite ordonnée de `PointRtss` sur un seul RTSS, avec au moins deux
/// chaînages distincts
#[derive(Debug, Clone, PartialEq)]
pub struct LineRtss {
    points: Vec<PointRtss>,
}

impl LineRtss {
    /// # Errors
    ///
    /// - `RtssError::MultiRoute` si les points sont sur plusieurs RTSS
    /// - `RtssError::InvalidGeometry` s'il y a moins de deux chaînages distincts
    pub fn new(points: Vec<PointRtss>) -> Result<Self, RtssError> {
        let rtss = check_same_route(&points)?;

        let first = points[0].chainage();
        if points.iter().all(|p| p.chainage() == first) {
            return Err(RtssError::invalid_geometry(
                rtss.value(),
                "line needs at least two distinct chainages",
            ));
        }

        Ok(Self { points })
    }

    /// Ligne de deux points, décalage `offset_d` au début et `offset_f` à la fin
    pub fn from_chainages(
        rtss: Rtss,
        chainage_d: Chainage,
        chainage_f: Chainage,
        offset_d: f64,
        offset_f: f64,
    ) -> Result<Self, RtssError> {
        Self::new(vec![
            PointRtss::new(rtss.clone(), chainage_d, offset_d),
            PointRtss::new(rtss, chainage_f, offset_f),
        ])
    }

    #[inline]
    pub fn rtss(&self) -> &Rtss {
        self.points[0].rtss()
    }

    #[inline]
    pub fn points(&self) -> &[PointRtss] {
        &self.points
    }

    pub fn start(&self) -> &PointRtss {
        &self.points[0]
    }

    pub fn end(&self) -> &PointRtss {
        &self.points[self.points.len() - 1]
    }

    /// Plus petit chaînage de la ligne
    pub fn chainage_d(&self) -> Chainage {
        self.points
            .iter()
            .map(|p| p.chainage())
            .min()
            .unwrap_or_default()
    }

    /// Plus grand chaînage de la ligne
    pub fn chainage_f(&self) -> Chainage {
        self.points
            .iter()
            .map(|p| p.chainage())
            .max()
            .unwrap_or_default()
    }

    /// Longueur en chaînage (somme des |Δchaînage|)
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].chainage().value() - w[0].chainage().value()).abs())
            .sum()
    }

    /// Vrai si la ligne suit le sens du chaînage
    pub fn is_increasing(&self) -> bool {
        self.end().chainage() >= self.start().chainage()
    }

    /// Décalage interpolé linéairement au chaînage donné
    ///
    /// Hors de la ligne, le décalage de l'extrémité la plus proche est retourné.
    pub fn offset_at(&self, chainage: Chainage) -> f64 {
        let c = chainage.value();
        for w in self.points.windows(2) {
            let (c0, c1) = (w[0].chainage().value(), w[1].chainage().value());
            let (lo, hi) = if c0 <= c1 { (c0, c1) } else { (c1, c0) };
            if c < lo || c > hi {
                continue;
            }
            if c1 == c0 {
                return w[0].offset();
            }
            let t = (c - c0) / (c1 - c0);
            return w[0].offset() + t * (w[1].offset() - w[0].offset());
        }

        let start = self.start();
        let end = self.end();
        if (c - start.chainage().value()).abs() <= (c - end.chainage().value()).abs() {
            start.offset()
        } else {
            end.offset()
        }
    }

    /// Copie de la ligne dont les décalages varient linéairement de
    /// `offset_d` au premier point à `offset_f` au dernier
    pub fn tapered(&self, offset_d: f64, offset_f: f64) -> Self {
        let total = self.length();
        let mut travelled = 0.0;
        let mut points = Vec::with_capacity(self.points.len());

        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                travelled +=
                    (p.chainage().value() - self.points[i - 1].chainage().value()).abs();
            }
            let t = if total > 0.0 { travelled / total } else { 0.0 };
            points.push(p.with_offset(offset_d + t * (offset_f - offset_d)));
        }

        Self { points }
    }

    /// Ligne parcourue dans le sens inverse
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// Côté où se trouve la majeure partie de la ligne, pondéré par le chaînage
    pub fn dominant_side(&self) -> Side {
        let weighted: f64 = self
            .points
            .windows(2)
            .map(|w| {
                let dc = (w[1].chainage().value() - w[0].chainage().value()).abs();
                dc * (w[0].offset() + w[1].offset()) / 2.0
            })
            .sum();
        Side::from_offset(weighted)
    }

    /// Paires `(chaînage, décalage)` dans l'ordre de la ligne
    pub fn chainage_offsets(&self) -> impl Iterator<Item = (Chainage, f64)> + '_ {
        self.points.iter().map(|p| (p.chainage(), p.offset()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rtss() -> Rtss {
        Rtss::new("00010-01-210-000C").unwrap()
    }

    fn pt(c: f64, o: f64) -> PointRtss {
        PointRtss::new(rtss(), Chainage::new(c).unwrap(), o)
    }

    #[test]
    fn test_requires_distinct_chainages() {
        assert!(LineRtss::new(vec![pt(10.0, 0.0), pt(10.0, 2.0)]).is_err());
        assert!(LineRtss::new(vec![pt(10.0, 0.0)]).is_err());
        assert!(LineRtss::new(vec![]).is_err());
        assert!(LineRtss::new(vec![pt(10.0, 0.0), pt(20.0, 0.0)]).is_ok());
    }

    #[test]
    fn test_single_route() {
        let other = PointRtss::new(
            Rtss::new("00020-01-010-000C").unwrap(),
            Chainage::new(20.0).unwrap(),
            0.0,
        );
        let err = LineRtss::new(vec![pt(10.0, 0.0), other]).unwrap_err();
        assert!(matches!(err, RtssError::MultiRoute { .. }));
    }

    #[test]
    fn test_length_and_bounds() {
        let line = LineRtss::new(vec![pt(100.0, 0.0), pt(50.0, 0.0), pt(150.0, 0.0)]).unwrap();
        assert_eq!(line.length(), 150.0);
        assert_eq!(line.chainage_d().value(), 50.0);
        assert_eq!(line.chainage_f().value(), 150.0);
        assert!(line.is_increasing());
    }

    #[test]
    fn test_taper_and_offset_at() {
        let line = LineRtss::new(vec![pt(0.0, 0.0), pt(50.0, 0.0), pt(100.0, 0.0)])
            .unwrap()
            .tapered(2.0, 6.0);
        assert_eq!(line.points()[1].offset(), 4.0);
        assert_eq!(line.offset_at(Chainage::new(25.0).unwrap()), 3.0);
        assert_eq!(line.offset_at(Chainage::new(500.0).unwrap()), 6.0);
    }

    #[test]
    fn test_reverse_and_dominant_side() {
        let line = LineRtss::new(vec![pt(0.0, -1.0), pt(80.0, -1.0), pt(100.0, 4.0)]).unwrap();
        assert_eq!(line.dominant_side(), Side::Left);
        let rev = line.reversed();
        assert_eq!(rev.start().chainage().value(), 100.0);
        assert!(!rev.is_increasing());
        assert_eq!(rev.dominant_side(), Side::Left);
    }
}
