//! File-backed layer sources and sinks. The format is picked from the file
//! extension: `.geojson`/`.json` or `.shp`.

mod geojson;
mod shp;

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::layer::VectorLayer;
use crate::pipeline::UNIQ_ID;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    GeoJson,
    Shapefile,
}

fn detect_format(path: &Path) -> Result<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("geojson") | Some("json") => Ok(Format::GeoJson),
        Some("shp") => Ok(Format::Shapefile),
        _ => bail!("cannot tell the format of {} (expected .geojson, .json or .shp)", path.display()),
    }
}

fn layer_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("layer")
        .to_string()
}

/// Read a vector layer from disk. A `UNIQ_ID` column is guaranteed on the
/// result: sources that do not carry one get sequential feature indices.
pub fn read_layer(path: &Path) -> Result<VectorLayer> {
    let name = layer_name(path);
    let mut layer = match detect_format(path)? {
        Format::GeoJson => {
            let bytes = fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            geojson::read_from_geojson_bytes(&name, &bytes)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        }
        Format::Shapefile => shp::read_shapefile(&name, path)?,
    };
    layer.ensure_id_field(UNIQ_ID);
    Ok(layer)
}

/// Write a vector layer to disk. Refuses to overwrite unless `force` is set.
pub fn write_layer(layer: &VectorLayer, path: &Path, force: bool) -> Result<()> {
    let format = detect_format(path)?;
    if path.exists() && !force {
        bail!("{} already exists (pass --force to overwrite)", path.display());
    }
    match format {
        Format::GeoJson => {
            let bytes = geojson::write_to_geojson_bytes(layer)?;
            fs::write(path, bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        Format::Shapefile => shp::write_shapefile(layer, path)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, LineString};

    use crate::layer::{Feature, FieldType, FieldValue, VectorLayer};
    use crate::pipeline::UNIQ_ID;
    use super::{read_layer, write_layer};

    fn line_layer() -> VectorLayer {
        let mut layer = VectorLayer::new("roads", Some(2039));
        layer.add_field("FT_LANES", FieldType::Float);
        layer.push(Feature {
            geometry: Geometry::LineString(LineString::from(vec![(0.0, 0.0), (10.0, 0.0)])),
            values: vec![FieldValue::Float(2.0)],
        }).unwrap();
        layer
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_layer(&line_layer(), &dir.path().join("roads.gpkg"), false).is_err());
    }

    #[test]
    fn existing_files_need_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roads.geojson");
        write_layer(&line_layer(), &path, false).unwrap();

        assert!(write_layer(&line_layer(), &path, false).is_err());
        write_layer(&line_layer(), &path, true).unwrap();
    }

    #[test]
    fn read_assigns_road_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roads.geojson");
        write_layer(&line_layer(), &path, false).unwrap();

        let back = read_layer(&path).unwrap();
        let idx = back.field_index(UNIQ_ID).unwrap();
        assert_eq!(back.features[0].values[idx], FieldValue::Int(0));
    }
}
