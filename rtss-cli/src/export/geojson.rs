//! Export des segments vers GeoJSON avec geozero (streaming)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geo::Geometry;
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use serde_json::{Map, Value};

use rtss::{ReferenceFrame, SegmentFeature};

/// Exporte des segments en GeoJSON dans un fichier
pub fn export_to_geojson(
    features: &[SegmentFeature],
    frame: &ReferenceFrame,
    output_path: &Path,
) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    write_features(&mut writer, features, frame)?;
    writer.flush()?;
    Ok(())
}

/// Écrit une FeatureCollection complète
pub fn write_features<W: Write>(
    writer: &mut W,
    features: &[SegmentFeature],
    frame: &ReferenceFrame,
) -> Result<()> {
    // Header FeatureCollection avec CRS
    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::{}"}}}},"features":["#,
        frame.epsg
    )?;

    for (i, feature) in features.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(writer, i, feature)?;
    }

    write!(writer, "]}}")?;
    Ok(())
}

/// Écrit un segment en GeoJSON
fn write_feature<W: Write>(writer: &mut W, id: usize, feature: &SegmentFeature) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","id":{},"#, id)?;

    write!(writer, r#""geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    Geometry::LineString(feature.geometry.clone()).process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    write!(writer, r#","properties":"#)?;
    serde_json::to_writer(&mut *writer, &properties(feature))?;
    write!(writer, "}}")?;

    Ok(())
}

/// Propriétés d'un segment: attributs puis RTSS et bornes de chaînage
fn properties(feature: &SegmentFeature) -> Map<String, Value> {
    let mut props: Map<String, Value> = feature
        .attributes
        .iter()
        .map(|(key, value)| (key.clone(), Value::from(value.as_str())))
        .collect();
    props.insert("rtss".to_string(), Value::from(feature.rtss.value()));
    props.insert("chainage_d".to_string(), Value::from(feature.chainage_d.value()));
    props.insert("chainage_f".to_string(), Value::from(feature.chainage_f.value()));
    props
}
