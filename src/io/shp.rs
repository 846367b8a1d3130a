use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use geo::{Geometry, LineString, MultiLineString, MultiPolygon};
use shapefile::dbase::{FieldName, FieldValue as DbfValue, Record, TableWriterBuilder};
use shapefile::{Reader, Shape, Writer};

use crate::geom;
use crate::layer::{Feature, FieldType, FieldValue, VectorLayer};

/// Read a shapefile (with its DBF attribute table) into a layer.
/// Polyline, polygon and point shapes are supported; the EPSG code is left
/// unknown (`.prj` sidecars are not interpreted).
pub(crate) fn read_shapefile(name: &str, path: &Path) -> Result<VectorLayer> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut shapes: Vec<Geometry<f64>> = Vec::new();
    let mut records: Vec<Record> = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.context("Error reading shape+record")?;
        shapes.push(shape_to_geometry(shape)?);
        records.push(record);
    }

    let mut layer = VectorLayer::new(name, None);

    // DBF rows all share one schema; take the column names from the first
    // record, sorted for a deterministic order.
    if let Some(first) = records.first() {
        let mut names: Vec<String> = first.clone().into_iter().map(|(name, _)| name).collect();
        names.sort();
        for column in &names {
            let ty = match first.get(column) {
                Some(DbfValue::Integer(_)) => FieldType::Int,
                Some(DbfValue::Character(_)) => FieldType::Text,
                _ => FieldType::Float,
            };
            layer.add_field(column, ty);
        }

        for (geometry, record) in shapes.into_iter().zip(&records) {
            let values = names.iter()
                .map(|column| dbf_to_value(record.get(column)))
                .collect();
            layer.push(Feature { geometry, values })?;
        }
    }
    Ok(layer)
}

/// Write a polygon layer as a shapefile with a DBF attribute table.
pub(crate) fn write_shapefile(layer: &VectorLayer, path: &Path) -> Result<()> {
    let mut builder = TableWriterBuilder::new();
    for field in &layer.fields {
        let name = FieldName::try_from(field.name.as_ref())
            .map_err(|e| anyhow!("invalid DBF field name {:?}: {e:?}", field.name))?;
        builder = match field.ty {
            FieldType::Float => builder.add_numeric_field(name, 18, 6),
            FieldType::Int => builder.add_numeric_field(name, 18, 0),
            FieldType::Text => builder.add_character_field(name, 254),
        };
    }

    let mut writer = Writer::from_path(path, builder)
        .with_context(|| format!("Failed to create shapefile: {}", path.display()))?;

    for (row, feature) in layer.features.iter().enumerate() {
        let Some(mp) = geom::to_multi_polygon(&feature.geometry) else {
            bail!("feature {row} in layer {:?} is not a polygon geometry", layer.name);
        };

        let mut record = Record::default();
        for (field, value) in layer.fields.iter().zip(&feature.values) {
            record.insert(field.name.to_string(), value_to_dbf(field.ty, value));
        }
        writer.write_shape_and_record(&geo_to_shp(&mp), &record)
            .with_context(|| format!("Failed to write feature {row}"))?;
    }
    Ok(())
}

fn dbf_to_value(value: Option<&DbfValue>) -> FieldValue {
    match value {
        Some(DbfValue::Numeric(Some(v))) => FieldValue::Float(*v),
        Some(DbfValue::Float(Some(v))) => FieldValue::Float(*v as f64),
        Some(DbfValue::Double(v)) => FieldValue::Float(*v),
        Some(DbfValue::Integer(v)) => FieldValue::Int(*v as i64),
        Some(DbfValue::Character(Some(s))) => FieldValue::Text(s.trim().into()),
        _ => FieldValue::Null,
    }
}

fn value_to_dbf(ty: FieldType, value: &FieldValue) -> DbfValue {
    match (ty, value) {
        (FieldType::Text, FieldValue::Text(s)) => DbfValue::Character(Some(s.to_string())),
        (FieldType::Text, _) => DbfValue::Character(None),
        (_, value) => DbfValue::Numeric(value.as_f64()),
    }
}

/// Coerce a generic shape into a geometry, raising an error on shape kinds
/// a road layer has no business containing.
fn shape_to_geometry(shape: Shape) -> Result<Geometry<f64>> {
    match shape {
        Shape::Polyline(polyline) => {
            let parts: Vec<LineString<f64>> = polyline.parts().iter()
                .map(|part| LineString::new(
                    part.iter().map(|p| geo::Coord { x: p.x, y: p.y }).collect(),
                ))
                .collect();
            Ok(Geometry::MultiLineString(MultiLineString::new(parts)))
        }
        Shape::Polygon(polygon) => Ok(Geometry::MultiPolygon(shp_to_geo(&polygon))),
        Shape::Point(point) => Ok(Geometry::Point(geo::Point::new(point.x, point.y))),
        other => bail!("unsupported shape in layer: {:?}", other.shapetype()),
    }
}

/// Convert shapefile::Polygon to geo::MultiPolygon<f64>.
/// Shapefiles store exterior rings clockwise with their holes following.
fn shp_to_geo(polygon: &shapefile::Polygon) -> MultiPolygon<f64> {
    fn ring_to_linestring(points: &[shapefile::Point]) -> LineString<f64> {
        let mut coords: Vec<geo::Coord<f64>> = points.iter()
            .map(|p| geo::Coord { x: p.x, y: p.y })
            .collect();
        if !coords.is_empty() && coords[0] != coords[coords.len() - 1] {
            coords.push(coords[0]);
        }
        LineString::new(coords)
    }

    let mut polys: Vec<geo::Polygon<f64>> = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes: Vec<LineString<f64>> = Vec::new();

    for ring in polygon.rings() {
        match ring {
            shapefile::PolygonRing::Outer(points) => {
                if let Some(ext) = exterior.take() {
                    polys.push(geo::Polygon::new(ext, std::mem::take(&mut holes)));
                }
                exterior = Some(ring_to_linestring(points));
            }
            shapefile::PolygonRing::Inner(points) => holes.push(ring_to_linestring(points)),
        }
    }
    if let Some(ext) = exterior {
        polys.push(geo::Polygon::new(ext, holes));
    }

    MultiPolygon::new(polys)
}

/// Convert geo::MultiPolygon<f64> to shapefile::Polygon, restoring the
/// shapefile winding convention (exteriors CW, holes CCW).
fn geo_to_shp(mp: &MultiPolygon<f64>) -> shapefile::Polygon {
    fn ring_points(ring: &LineString<f64>, clockwise: bool) -> Vec<shapefile::Point> {
        let mut pts: Vec<shapefile::Point> = ring.coords()
            .map(|c| shapefile::Point { x: c.x, y: c.y })
            .collect();
        if !pts.is_empty()
            && (pts[0].x != pts[pts.len() - 1].x || pts[0].y != pts[pts.len() - 1].y)
        {
            pts.push(pts[0]);
        }

        let mut area = 0.0;
        for w in pts.windows(2) {
            area += w[0].x * w[1].y - w[1].x * w[0].y;
        }
        // Negative signed area already means clockwise.
        if (area > 0.0) == clockwise {
            pts.reverse();
        }
        pts
    }

    let mut rings: Vec<shapefile::PolygonRing<shapefile::Point>> = Vec::new();
    for poly in &mp.0 {
        rings.push(shapefile::PolygonRing::Outer(ring_points(poly.exterior(), true)));
        for hole in poly.interiors() {
            rings.push(shapefile::PolygonRing::Inner(ring_points(hole, false)));
        }
    }
    shapefile::Polygon::with_rings(rings)
}
