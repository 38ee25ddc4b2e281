//! Registre du réseau routier
//!
//! `Geocodage` possède tous les `FeatRtss` du réseau, un index spatial des
//! segments de routes pour la recherche de la route la plus proche et un
//! index textuel pour la recherche approximative. Les trois structures sont
//! maintenues cohérentes par `add_route` et `remove_route`.

pub mod index;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use geo::{Centroid, Coord, Geometry, LineString, Point};
use rstar::RTree;
use tracing::{debug, info, warn};

use crate::feat_rtss::{FeatRtss, TraceMode, DEFAULT_DENSIFY_STEP};
use crate::frame::ReferenceFrame;
use crate::geometry::{LineRtss, PointRtss, RtssGeometry};
use crate::search::SearchEngine;
use crate::{Chainage, Rtss, RtssError};

pub use index::RouteSegmentNode;

/// Nombre de résultats par défaut d'une recherche textuelle
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Enregistrement d'une source de routes
#[derive(Debug, Clone)]
pub struct RouteRecord {
    /// Code RTSS (toute forme acceptée par `Rtss::new`)
    pub rtss: String,
    /// Chaînage de début (0 si absent)
    pub chainage_d: Option<f64>,
    /// Chaînage de fin
    pub chainage_f: f64,
    /// Polyligne planaire
    pub geometry: LineString<f64>,
    /// Référentiel de la polyligne
    pub frame: ReferenceFrame,
    /// Nom affiché, indexé pour la recherche textuelle
    pub name: Option<String>,
}

/// Options du registre
#[derive(Debug, Clone)]
pub struct GeocodageOptions {
    /// Pas de densification des routes (mètres)
    pub densify_step: f64,
    /// Indexer aussi les noms de routes dans la recherche textuelle
    pub index_names: bool,
}

impl Default for GeocodageOptions {
    fn default() -> Self {
        Self {
            densify_step: DEFAULT_DENSIFY_STEP,
            index_names: true,
        }
    }
}

/// Registre des routes
#[derive(Debug, Clone)]
pub struct Geocodage {
    routes: BTreeMap<Rtss, Arc<FeatRtss>>,
    names: HashMap<Rtss, String>,
    index: RTree<RouteSegmentNode>,
    ids: HashMap<Rtss, u32>,
    rev_ids: HashMap<u32, Rtss>,
    next_id: u32,
    search_engine: SearchEngine<Rtss>,
    frame: ReferenceFrame,
    options: GeocodageOptions,
}

impl Geocodage {
    /// Registre vide dans le référentiel donné
    ///
    /// # Errors
    ///
    /// `RtssError::NonMetricFrame` si le référentiel n'est pas métrique.
    pub fn new(frame: ReferenceFrame, options: GeocodageOptions) -> Result<Self, RtssError> {
        frame.ensure_metric()?;
        Ok(Self {
            routes: BTreeMap::new(),
            names: HashMap::new(),
            index: RTree::new(),
            ids: HashMap::new(),
            rev_ids: HashMap::new(),
            next_id: 0,
            search_engine: SearchEngine::new(),
            frame,
            options,
        })
    }

    /// Construit le registre depuis une source de routes
    ///
    /// Le référentiel du premier enregistrement devient celui du registre.
    /// L'index spatial est chargé en bloc. Pour un RTSS répété, le dernier
    /// enregistrement l'emporte.
    ///
    /// # Errors
    ///
    /// - `RtssError::NonMetricFrame` si un référentiel n'est pas métrique
    /// - `RtssError::FrameMismatch` si les référentiels diffèrent
    /// - les erreurs de validation de `Rtss`, `Chainage` et `FeatRtss`
    pub fn from_records<I>(records: I, options: GeocodageOptions) -> Result<Self, RtssError>
    where
        I: IntoIterator<Item = RouteRecord>,
    {
        let mut records = records.into_iter().peekable();
        let frame = records.peek().map(|r| r.frame).unwrap_or_default();
        let mut registry = Self::new(frame, options)?;

        // Un RTSS répété remplace l'enregistrement précédent
        let mut built: BTreeMap<Rtss, (FeatRtss, Option<String>)> = BTreeMap::new();
        for record in records {
            let (feat, name) = registry.build_route(record)?;
            let rtss = feat.rtss().clone();
            if built.insert(rtss.clone(), (feat, name)).is_some() {
                warn!(rtss = %rtss, "Duplicate route record, previous one replaced");
            }
        }

        let mut nodes = Vec::new();
        for (rtss, (feat, name)) in built {
            let id = registry.register(&feat, name.as_deref());
            nodes.extend(RouteSegmentNode::from_line_string(id, feat.geometry()));
            registry.routes.insert(rtss, Arc::new(feat));
        }
        registry.index = RTree::bulk_load(nodes);

        info!(
            routes = registry.routes.len(),
            segments = registry.index.size(),
            frame = %registry.frame,
            "Route registry built"
        );
        Ok(registry)
    }

    fn build_route(&self, record: RouteRecord) -> Result<(FeatRtss, Option<String>), RtssError> {
        let rtss = Rtss::new(&record.rtss)?;
        record.frame.ensure_metric()?;
        if record.frame.epsg != self.frame.epsg {
            return Err(RtssError::FrameMismatch {
                rtss: rtss.value().to_string(),
                expected: self.frame.to_string(),
                found: record.frame.to_string(),
            });
        }

        let chainage_d = Chainage::new(record.chainage_d.unwrap_or(0.0))?;
        let chainage_f = Chainage::new(record.chainage_f)?;
        let feat = FeatRtss::new(rtss, record.geometry, chainage_d, chainage_f)?
            .with_densify_step(self.options.densify_step);
        Ok((feat, record.name))
    }

    /// Attribue un identifiant et indexe les alias textuels de la route
    fn register(&mut self, feat: &FeatRtss, name: Option<&str>) -> u32 {
        let rtss = feat.rtss().clone();
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(rtss.clone(), id);
        self.rev_ids.insert(id, rtss.clone());

        let mut aliases = vec![rtss.value().to_string(), rtss.formatted(), rtss.short()];
        if let Some(name) = name {
            self.names.insert(rtss.clone(), name.to_string());
            if self.options.index_names {
                aliases.push(name.to_string());
            }
        }
        self.search_engine.index(rtss, aliases);
        id
    }

    /// Ajoute un enregistrement de source
    pub fn add_record(&mut self, record: RouteRecord) -> Result<Arc<FeatRtss>, RtssError> {
        let (feat, name) = self.build_route(record)?;
        Ok(self.add_route(feat, name.as_deref()))
    }

    /// Ajoute (ou remplace) une route
    pub fn add_route(&mut self, feat: FeatRtss, name: Option<&str>) -> Arc<FeatRtss> {
        if self.routes.contains_key(feat.rtss()) {
            self.remove_route(feat.rtss());
        }

        let id = self.register(&feat, name);
        for node in RouteSegmentNode::from_line_string(id, feat.geometry()) {
            self.index.insert(node);
        }

        debug!(rtss = %feat.rtss(), id, "Route added");
        let feat = Arc::new(feat);
        self.routes.insert(feat.rtss().clone(), Arc::clone(&feat));
        feat
    }

    /// Retire une route du registre et de ses index
    pub fn remove_route(&mut self, rtss: &Rtss) -> Option<Arc<FeatRtss>> {
        let feat = self.routes.remove(rtss)?;

        if let Some(id) = self.ids.remove(rtss) {
            self.rev_ids.remove(&id);
            for node in RouteSegmentNode::from_line_string(id, feat.geometry()) {
                self.index.remove(&node);
            }
        }
        self.search_engine.remove(rtss);
        self.names.remove(rtss);

        debug!(rtss = %rtss, "Route removed");
        Some(feat)
    }

    /// Géocodeur d'un RTSS
    ///
    /// # Errors
    ///
    /// `RtssError::UnknownRtss` si la route est absente.
    pub fn get(&self, rtss: &Rtss) -> Result<&Arc<FeatRtss>, RtssError> {
        self.routes
            .get(rtss)
            .ok_or_else(|| RtssError::UnknownRtss(rtss.value().to_string()))
    }

    pub fn contains(&self, rtss: &Rtss) -> bool {
        self.routes.contains_key(rtss)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    #[inline]
    pub fn frame(&self) -> ReferenceFrame {
        self.frame
    }

    #[inline]
    pub fn options(&self) -> &GeocodageOptions {
        &self.options
    }

    /// Nom affiché d'une route
    pub fn name(&self, rtss: &Rtss) -> Option<&str> {
        self.names.get(rtss).map(String::as_str)
    }

    /// Routes par ordre de RTSS
    pub fn iter(&self) -> impl Iterator<Item = (&Rtss, &Arc<FeatRtss>)> {
        self.routes.iter()
    }

    pub fn rtss_list(&self) -> Vec<Rtss> {
        self.routes.keys().cloned().collect()
    }

    /// Toutes les routes d'un numéro de route
    pub fn routes_for_num(&self, num_route: u32) -> Vec<&Rtss> {
        self.routes
            .keys()
            .filter(|rtss| rtss.num_route() == Some(num_route))
            .collect()
    }

    /// Routes les plus proches d'une géométrie, au plus `k`, à moins de `max_dist`
    ///
    /// - point: distance point-route
    /// - ligne: moyenne des distances de la route aux deux extrémités de la ligne
    /// - polygone: distance au centroïde
    ///
    /// Résultats par distance croissante puis RTSS croissant.
    pub fn nearests_rtss(
        &self,
        geometry: &Geometry<f64>,
        k: usize,
        max_dist: f64,
    ) -> Result<Vec<(Rtss, f64)>, RtssError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        match geometry {
            Geometry::Point(p) => Ok(self.nearest_to_coord(p.0, k, max_dist)),
            Geometry::LineString(line) => {
                let (Some(&a), Some(&b)) = (line.0.first(), line.0.last()) else {
                    return Err(RtssError::invalid_geometry("", "empty line query"));
                };
                Ok(self.nearest_to_endpoints(a, b, k, max_dist))
            }
            Geometry::Line(line) => Ok(self.nearest_to_endpoints(line.start, line.end, k, max_dist)),
            Geometry::Polygon(polygon) => {
                let centroid = polygon
                    .centroid()
                    .ok_or_else(|| RtssError::invalid_geometry("", "empty polygon query"))?;
                Ok(self.nearest_to_coord(centroid.0, k, max_dist))
            }
            other => Err(RtssError::UnsupportedGeometry(geometry_name(other).to_string())),
        }
    }

    /// Route la plus proche
    ///
    /// # Errors
    ///
    /// `RtssError::NoRouteNearby` si aucune route n'est à moins de `max_dist`.
    pub fn nearest_rtss(
        &self,
        geometry: &Geometry<f64>,
        max_dist: f64,
    ) -> Result<(Rtss, f64), RtssError> {
        self.nearests_rtss(geometry, 1, max_dist)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                let at = query_coord(geometry).unwrap_or(Coord { x: f64::NAN, y: f64::NAN });
                RtssError::NoRouteNearby {
                    x: at.x,
                    y: at.y,
                    max_dist,
                }
            })
    }

    fn nearest_to_coord(&self, at: Coord<f64>, k: usize, max_dist: f64) -> Vec<(Rtss, f64)> {
        let max_d2 = max_dist * max_dist;
        let mut seen = HashSet::new();
        let mut found: Vec<(Rtss, f64)> = Vec::new();
        // Distance de la k-ième route trouvée: les routes à égalité sont
        // encore collectées pour départager par RTSS
        let mut kth = f64::INFINITY;

        for (node, d2) in self.index.nearest_neighbor_iter_with_distance_2(&[at.x, at.y]) {
            if d2 > max_d2 || d2 > kth {
                break;
            }
            if !seen.insert(node.route_id) {
                continue;
            }
            if let Some(rtss) = self.rev_ids.get(&node.route_id) {
                found.push((rtss.clone(), d2.sqrt()));
                if found.len() == k {
                    kth = d2;
                }
            }
        }

        sort_ranked(&mut found);
        found.truncate(k);
        found
    }

    fn nearest_to_endpoints(
        &self,
        a: Coord<f64>,
        b: Coord<f64>,
        k: usize,
        max_dist: f64,
    ) -> Vec<(Rtss, f64)> {
        let max_d2 = max_dist * max_dist;
        // Une moyenne sous max_dist implique une extrémité sous max_dist
        let candidates: HashSet<u32> = self
            .index
            .locate_within_distance([a.x, a.y], max_d2)
            .chain(self.index.locate_within_distance([b.x, b.y], max_d2))
            .map(|node| node.route_id)
            .collect();

        let (pa, pb) = (Point::from(a), Point::from(b));
        let mut found: Vec<(Rtss, f64)> = candidates
            .into_iter()
            .filter_map(|id| {
                let rtss = self.rev_ids.get(&id)?;
                let feat = self.routes.get(rtss)?;
                let mean = (feat.distance_to(&pa) + feat.distance_to(&pb)) / 2.0;
                (mean <= max_dist).then(|| (rtss.clone(), mean))
            })
            .collect();

        sort_ranked(&mut found);
        found.truncate(k);
        found
    }

    /// Géocodage inverse d'un point sur un RTSS imposé
    ///
    /// Le résultat n'est retenu que si `|décalage| <= max_dist`. Sans
    /// `max_dist`, le décalage calculé sert de seuil et le point est
    /// toujours retenu.
    pub fn geocoder_point_on_rtss(
        &self,
        point: &Point<f64>,
        rtss: &Rtss,
        max_dist: Option<f64>,
    ) -> Result<Option<PointRtss>, RtssError> {
        let located = self.get(rtss)?.geocoder_inv_point(point);
        let limit = max_dist.unwrap_or(located.offset().abs());
        Ok((located.offset().abs() <= limit).then_some(located))
    }

    /// Géocodage inverse d'un point sur la route la plus proche
    pub fn geocoder_inv_point(
        &self,
        point: &Point<f64>,
        max_dist: f64,
    ) -> Result<PointRtss, RtssError> {
        let (rtss, _) = self.nearest_rtss(&Geometry::Point(*point), max_dist)?;
        Ok(self.get(&rtss)?.geocoder_inv_point(point))
    }

    /// Géocodage inverse d'une ligne sur la route la plus proche de ses extrémités
    pub fn geocoder_inv_line(
        &self,
        line: &LineString<f64>,
        max_dist: f64,
    ) -> Result<LineRtss, RtssError> {
        let (rtss, _) = self.nearest_rtss(&Geometry::LineString(line.clone()), max_dist)?;
        self.get(&rtss)?.geocoder_inv_line(line)
    }

    /// Géocode un descripteur sur sa route
    pub fn geocoder(
        &self,
        geometry: &RtssGeometry,
        mode: TraceMode,
        densify: bool,
    ) -> Result<Geometry<f64>, RtssError> {
        self.get(geometry.rtss())?.geocoder(geometry, mode, densify)
    }

    /// Recherche textuelle approximative
    ///
    /// Les zéros de tête du groupe route sont retirés d'une requête avec
    /// tirets (`0010-01-210` → `10-01-210`) pour correspondre à la forme
    /// courte indexée.
    pub fn search(&self, text: &str, limit: usize) -> Vec<(Rtss, f64)> {
        let query = normalize_query(text);
        debug!(query = %query, limit, "Searching routes");
        self.search_engine.search(&query, limit)
    }
}

/// Tri par distance/score croissant puis RTSS
fn sort_ranked(found: &mut [(Rtss, f64)]) {
    found.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
}

fn normalize_query(text: &str) -> String {
    let text = text.trim();
    match text.split_once('-') {
        Some((route, rest)) if route.chars().all(|c| c.is_ascii_digit()) => {
            let stripped = route.trim_start_matches('0');
            let stripped = if stripped.is_empty() && !route.is_empty() {
                "0"
            } else {
                stripped
            };
            format!("{}-{}", stripped, rest)
        }
        _ => text.to_string(),
    }
}

fn query_coord(geometry: &Geometry<f64>) -> Option<Coord<f64>> {
    match geometry {
        Geometry::Point(p) => Some(p.0),
        Geometry::LineString(l) => l.0.first().copied(),
        Geometry::Line(l) => Some(l.start),
        Geometry::Polygon(p) => p.centroid().map(|c| c.0),
        _ => None,
    }
}

fn geometry_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
