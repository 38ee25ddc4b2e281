//! Mesures le long d'une polyligne (longueurs cumulées, interpolation, projection)

use geo::kernels::{Kernel, Orientation, RobustKernel};
use geo::{
    Closest, ClosestPoint, Coord, EuclideanDistance, EuclideanLength, Line, LineInterpolatePoint,
    LineString, Point,
};

/// Longueurs cumulées à chaque sommet (`cumul[0] == 0`)
pub(crate) fn cumulative_lengths(line: &LineString<f64>) -> Vec<f64> {
    let mut cumul = Vec::with_capacity(line.0.len());
    let mut acc = 0.0;
    cumul.push(acc);
    for segment in line.lines() {
        acc += segment.euclidean_length();
        cumul.push(acc);
    }
    cumul
}

/// Segment contenant la longueur `length` et position relative `t` sur ce segment
pub(crate) fn locate(line: &LineString<f64>, cumul: &[f64], length: f64) -> (usize, f64) {
    let last_segment = line.0.len().saturating_sub(2);
    let idx = cumul
        .partition_point(|&c| c <= length)
        .saturating_sub(1)
        .min(last_segment);

    let seg_len = cumul[idx + 1] - cumul[idx];
    let t = if seg_len > 0.0 {
        ((length - cumul[idx]) / seg_len).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (idx, t)
}

/// Point situé à `length` depuis le début de la polyligne
pub(crate) fn point_at(line: &LineString<f64>, cumul: &[f64], length: f64) -> Coord<f64> {
    let (idx, t) = locate(line, cumul, length);
    let segment = Line::new(line.0[idx], line.0[idx + 1]);
    segment
        .line_interpolate_point(t)
        .map_or(segment.start, |p| p.0)
}

/// Point du segment le plus proche de `p`
///
/// Un segment dégénéré renvoie son origine.
pub(crate) fn closest_on_segment(segment: &Line<f64>, p: &Point<f64>) -> Point<f64> {
    match segment.closest_point(p) {
        Closest::Intersection(q) | Closest::SinglePoint(q)
            if q.x().is_finite() && q.y().is_finite() =>
        {
            q
        }
        _ => Point(segment.start),
    }
}

/// Vecteur unitaire de `a` vers `b`, `None` si les points sont confondus
pub(crate) fn direction(a: Coord<f64>, b: Coord<f64>) -> Option<Coord<f64>> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let norm = (dx * dx + dy * dy).sqrt();
    if norm > 0.0 {
        Some(Coord {
            x: dx / norm,
            y: dy / norm,
        })
    } else {
        None
    }
}

/// Direction du segment contenant `length`
///
/// Les segments de longueur nulle sont sautés au profit du premier segment
/// non dégénéré suivant, puis précédent.
pub(crate) fn segment_direction(line: &LineString<f64>, cumul: &[f64], length: f64) -> Coord<f64> {
    let (idx, _) = locate(line, cumul, length);
    let coords = &line.0;

    (idx..coords.len() - 1)
        .chain((0..idx).rev())
        .find_map(|i| direction(coords[i], coords[i + 1]))
        .unwrap_or(Coord { x: 1.0, y: 0.0 })
}

/// Résultat de la projection d'un point sur une polyligne
#[derive(Debug, Clone, Copy)]
pub(crate) struct Projection {
    /// Longueur le long de la polyligne jusqu'au point projeté
    pub length: f64,
    /// Distance perpendiculaire (non signée)
    pub distance: f64,
    /// Point à gauche du segment retenu
    pub left: bool,
}

/// Projette `p` sur le segment le plus proche de la polyligne
pub(crate) fn project(line: &LineString<f64>, cumul: &[f64], p: Coord<f64>) -> Projection {
    let point = Point(p);
    let mut best: Option<(usize, Line<f64>, f64, f64)> = None;

    for (i, segment) in line.lines().enumerate() {
        let q = closest_on_segment(&segment, &point);
        let distance = point.euclidean_distance(&q);
        if best.map_or(true, |(_, _, d, _)| distance < d) {
            let along = Point(segment.start).euclidean_distance(&q);
            best = Some((i, segment, distance, along));
        }
    }

    match best {
        Some((i, segment, distance, along)) => Projection {
            length: (cumul[i] + along).min(cumul[i + 1]),
            distance,
            left: RobustKernel::orient2d(segment.start, segment.end, p)
                == Orientation::CounterClockwise,
        },
        None => Projection {
            length: 0.0,
            distance: Point(line.0.first().copied().unwrap_or(p)).euclidean_distance(&point),
            left: false,
        },
    }
}
