//! Nœuds R-tree des segments de routes

use geo::{EuclideanDistance, Line, LineString, Point};
use rstar::{PointDistance, RTreeObject, AABB};

use crate::feat_rtss::measure::closest_on_segment;

/// Segment d'une route dans l'index spatial
///
/// `route_id` renvoie à la table d'identifiants du registre, ce qui permet
/// de retirer tous les segments d'une route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSegmentNode {
    pub route_id: u32,
    pub segment: Line<f64>,
    aabb: AABB<[f64; 2]>,
}

impl RouteSegmentNode {
    pub fn new(route_id: u32, segment: Line<f64>) -> Self {
        let start = [segment.start.x, segment.start.y];
        let end = [segment.end.x, segment.end.y];

        Self {
            route_id,
            segment,
            aabb: AABB::from_corners(start, end),
        }
    }

    /// Un nœud par segment de la polyligne
    pub fn from_line_string(route_id: u32, line: &LineString<f64>) -> Vec<Self> {
        line.lines().map(|segment| Self::new(route_id, segment)).collect()
    }
}

impl RTreeObject for RouteSegmentNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

impl PointDistance for RouteSegmentNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let p = Point::new(point[0], point[1]);
        let d = p.euclidean_distance(&closest_on_segment(&self.segment, &p));
        d * d
    }
}
