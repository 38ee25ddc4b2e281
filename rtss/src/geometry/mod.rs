//! Descripteurs de géométrie en référence linéaire
//!
//! Ces types ne portent aucune géométrie planaire: ils sont produits et
//! consommés par `FeatRtss`.

pub mod line;
pub mod point;
pub mod polygon;

pub use line::LineRtss;
pub use point::{PointRtss, Side};
pub use polygon::PolygonRtss;

use crate::{Rtss, RtssError};

/// Descripteur quelconque, pour le géocodage générique
#[derive(Debug, Clone, PartialEq)]
pub enum RtssGeometry {
    Point(PointRtss),
    Line(LineRtss),
    Polygon(PolygonRtss),
}

impl RtssGeometry {
    pub fn rtss(&self) -> &Rtss {
        match self {
            RtssGeometry::Point(p) => p.rtss(),
            RtssGeometry::Line(l) => l.rtss(),
            RtssGeometry::Polygon(p) => p.rtss(),
        }
    }
}

impl From<PointRtss> for RtssGeometry {
    fn from(value: PointRtss) -> Self {
        RtssGeometry::Point(value)
    }
}

impl From<LineRtss> for RtssGeometry {
    fn from(value: LineRtss) -> Self {
        RtssGeometry::Line(value)
    }
}

impl From<PolygonRtss> for RtssGeometry {
    fn from(value: PolygonRtss) -> Self {
        RtssGeometry::Polygon(value)
    }
}

/// Vérifie que tous les points sont sur le même RTSS et le retourne
pub(crate) fn check_same_route(points: &[PointRtss]) -> Result<&Rtss, RtssError> {
    let Some(first) = points.first() else {
        return Err(RtssError::invalid_geometry("", "no point"));
    };
    let rtss = first.rtss();

    if let Some(other) = points.iter().find(|p| p.rtss() != rtss) {
        return Err(RtssError::MultiRoute {
            first: rtss.value().to_string(),
            other: other.rtss().value().to_string(),
        });
    }

    Ok(rtss)
}
