//! Lecture des sources GeoJSON (routes, mesures) et des plages d'attributs JSON

use std::path::Path;

use anyhow::{Context, Result};
use geo::{Coord, Geometry, LineString};
use geojson::{Feature, FeatureCollection, GeoJson};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use rtss::{AttributeRange, Attributes, Chainage, Measurement, RouteRecord, Rtss};

use crate::config::Config;

/// Entité de la source rejetée à la lecture
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    #[error("Feature {feature}: missing property {field:?}")]
    MissingProperty { feature: String, field: String },

    #[error("Feature {feature}: invalid value {value:?} for property {field:?}")]
    InvalidProperty {
        feature: String,
        field: String,
        value: String,
    },

    #[error("Feature {feature}: no geometry")]
    MissingGeometry { feature: String },

    #[error("Feature {feature}: unsupported geometry {kind}")]
    UnsupportedGeometry { feature: String, kind: String },
}

/// Routes lues et entités rejetées
#[derive(Debug, Default)]
pub struct RouteSource {
    pub records: Vec<RouteRecord>,
    pub rejected: Vec<SourceError>,
}

/// Mesures lues et entités rejetées
#[derive(Debug, Default)]
pub struct MeasurementSource {
    pub measurements: Vec<Measurement>,
    pub rejected: Vec<SourceError>,
}

/// Lit une FeatureCollection GeoJSON
pub fn read_collection(path: &Path) -> Result<FeatureCollection> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read file: {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .context(format!("Failed to parse GeoJSON: {}", path.display()))?;
    FeatureCollection::try_from(geojson).context("Expected a GeoJSON FeatureCollection")
}

/// Lit les routes d'un GeoJSON selon le mapping de la configuration
pub fn read_routes(path: &Path, config: &Config) -> Result<RouteSource> {
    let collection = read_collection(path)?;
    let frame = config.frame()?;
    let mut source = RouteSource::default();

    for (index, feature) in collection.features.iter().enumerate() {
        match route_record(index, feature, config) {
            Ok(mut record) => {
                record.frame = frame;
                source.records.push(record);
            }
            Err(e) => {
                warn!(error = %e, "Route feature rejected");
                source.rejected.push(e);
            }
        }
    }

    debug!(
        routes = source.records.len(),
        rejected = source.rejected.len(),
        path = %path.display(),
        "Routes read"
    );
    Ok(source)
}

fn route_record(
    index: usize,
    feature: &Feature,
    config: &Config,
) -> Result<RouteRecord, SourceError> {
    let id = feature_id(index, feature);
    let rtss = property_string(&id, feature, &config.rtss_field)?;
    let chainage_f = property_f64(&id, feature, &config.chainage_f_field)?;
    let chainage_d = match &config.chainage_d_field {
        Some(field) => Some(property_f64(&id, feature, field)?),
        None => None,
    };
    let name = config
        .name_field
        .as_ref()
        .and_then(|field| optional_string(feature, field));
    let geometry = route_geometry(&id, feature)?;

    Ok(RouteRecord {
        rtss,
        chainage_d,
        chainage_f,
        geometry,
        frame: Default::default(),
        name,
    })
}

/// Géométrie linéaire d'une route; les parties d'un MultiLineString sont
/// mises bout à bout
fn route_geometry(id: &str, feature: &Feature) -> Result<LineString<f64>, SourceError> {
    match feature_geometry(id, feature)? {
        Geometry::LineString(line) => Ok(line),
        Geometry::MultiLineString(multi) => {
            let mut coords: Vec<Coord<f64>> = Vec::new();
            for part in multi.0 {
                for c in part.0 {
                    if coords.last() != Some(&c) {
                        coords.push(c);
                    }
                }
            }
            Ok(LineString::new(coords))
        }
        other => Err(SourceError::UnsupportedGeometry {
            feature: id.to_string(),
            kind: geometry_kind(&other).to_string(),
        }),
    }
}

/// Lit des mesures ponctuelles: `value_field` fournit la valeur,
/// `rtss_field` (optionnel) la route de la mesure
pub fn read_measurements(
    path: &Path,
    value_field: &str,
    rtss_field: Option<&str>,
) -> Result<MeasurementSource> {
    let collection = read_collection(path)?;
    let mut source = MeasurementSource::default();

    for (index, feature) in collection.features.iter().enumerate() {
        match measurement(index, feature, value_field, rtss_field) {
            Ok(m) => source.measurements.push(m),
            Err(e) => {
                warn!(error = %e, "Measurement feature rejected");
                source.rejected.push(e);
            }
        }
    }

    debug!(
        measurements = source.measurements.len(),
        rejected = source.rejected.len(),
        "Measurements read"
    );
    Ok(source)
}

fn measurement(
    index: usize,
    feature: &Feature,
    value_field: &str,
    rtss_field: Option<&str>,
) -> Result<Measurement, SourceError> {
    let id = feature_id(index, feature);
    let value = property_string(&id, feature, value_field)?;
    let rtss = match rtss_field.and_then(|field| optional_string(feature, field)) {
        Some(code) => Some(Rtss::new(&code).map_err(|_| SourceError::InvalidProperty {
            feature: id.clone(),
            field: rtss_field.unwrap_or_default().to_string(),
            value: code.clone(),
        })?),
        None => None,
    };

    let point = match feature_geometry(&id, feature)? {
        Geometry::Point(p) => p,
        other => {
            return Err(SourceError::UnsupportedGeometry {
                feature: id,
                kind: geometry_kind(&other).to_string(),
            })
        }
    };

    Ok(Measurement { point, value, rtss })
}

/// Plage d'attributs telle qu'écrite dans le fichier JSON
#[derive(Debug, Deserialize)]
struct RangeEntry {
    rtss: String,
    chainage_d: ChainageValue,
    chainage_f: ChainageValue,
    #[serde(default)]
    attributes: serde_json::Map<String, Value>,
    #[serde(default)]
    offsets: Option<(f64, f64)>,
}

/// Chaînage numérique ou au format `km+m`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChainageValue {
    Number(f64),
    Text(String),
}

impl ChainageValue {
    fn resolve(&self) -> Result<f64> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => Ok(Chainage::parse(s)?.value()),
        }
    }
}

/// Lit un tableau JSON de plages d'attributs
pub fn read_ranges(path: &Path) -> Result<Vec<AttributeRange>> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read ranges file: {}", path.display()))?;
    parse_ranges(&content).context(format!("Failed to parse ranges: {}", path.display()))
}

/// Parse le contenu d'un fichier de plages
pub fn parse_ranges(content: &str) -> Result<Vec<AttributeRange>> {
    let entries: Vec<RangeEntry> = serde_json::from_str(content)?;

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let chainage_d = entry
                .chainage_d
                .resolve()
                .context(format!("Range {}: invalid chainage_d", i))?;
            let chainage_f = entry
                .chainage_f
                .resolve()
                .context(format!("Range {}: invalid chainage_f", i))?;
            let attributes: Attributes = entry
                .attributes
                .into_iter()
                .map(|(k, v)| (k, scalar_to_string(&v)))
                .collect();
            Ok(AttributeRange {
                rtss: entry.rtss,
                chainage_d,
                chainage_f,
                attributes,
                offsets: entry.offsets,
            })
        })
        .collect()
}

fn feature_id(index: usize, feature: &Feature) -> String {
    match &feature.id {
        Some(geojson::feature::Id::String(s)) => s.clone(),
        Some(geojson::feature::Id::Number(n)) => n.to_string(),
        None => format!("#{}", index),
    }
}

fn feature_geometry(id: &str, feature: &Feature) -> Result<Geometry<f64>, SourceError> {
    let geometry = feature
        .geometry
        .clone()
        .ok_or_else(|| SourceError::MissingGeometry {
            feature: id.to_string(),
        })?;
    let kind = value_kind(&geometry.value).to_string();
    Geometry::<f64>::try_from(geometry).map_err(|_| SourceError::UnsupportedGeometry {
        feature: id.to_string(),
        kind,
    })
}

fn property_string(id: &str, feature: &Feature, field: &str) -> Result<String, SourceError> {
    optional_string(feature, field).ok_or_else(|| SourceError::MissingProperty {
        feature: id.to_string(),
        field: field.to_string(),
    })
}

fn optional_string(feature: &Feature, field: &str) -> Option<String> {
    match feature.property(field)? {
        Value::Null => None,
        value => Some(scalar_to_string(value)),
    }
}

fn property_f64(id: &str, feature: &Feature, field: &str) -> Result<f64, SourceError> {
    let value = feature
        .property(field)
        .filter(|v| !v.is_null())
        .ok_or_else(|| SourceError::MissingProperty {
            feature: id.to_string(),
            field: field.to_string(),
        })?;

    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| SourceError::InvalidProperty {
            feature: id.to_string(),
            field: field.to_string(),
            value: scalar_to_string(value),
        })
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_kind(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
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
