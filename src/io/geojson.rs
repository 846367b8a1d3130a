use ahash::AHashMap;
use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPolygon, Polygon};
use serde_json::{json, Value};

use crate::layer::{Feature, FieldType, FieldValue, VectorLayer};

/// Write a layer to GeoJSON bytes, including the legacy `crs` member when
/// the EPSG code is known.
pub(crate) fn write_to_geojson_bytes(layer: &VectorLayer) -> Result<Vec<u8>> {
    let features: Vec<Value> = layer.features.iter()
        .map(|feature| {
            Ok(json!({
                "type": "Feature",
                "geometry": geometry_to_json(&feature.geometry)?,
                "properties": properties_to_json(layer, feature),
            }))
        })
        .collect::<Result<_>>()?;

    let mut collection = json!({
        "type": "FeatureCollection",
        "name": layer.name.as_ref(),
        "features": features,
    });
    if let Some(epsg) = layer.epsg {
        collection["crs"] = json!({
            "type": "name",
            "properties": { "name": format!("urn:ogc:def:crs:EPSG::{epsg}") },
        });
    }

    serde_json::to_vec(&collection).context("Failed to serialize GeoJSON to bytes")
}

/// Read a layer from GeoJSON bytes. Line, polygon and their multi variants
/// are accepted; the schema is the union of all property keys in order of
/// first appearance.
pub(crate) fn read_from_geojson_bytes(name: &str, bytes: &[u8]) -> Result<VectorLayer> {
    let value: Value = serde_json::from_slice(bytes).context("Failed to parse GeoJSON bytes")?;
    let Some(features) = value["features"].as_array() else {
        bail!("not a GeoJSON FeatureCollection: missing \"features\"");
    };

    let mut layer = VectorLayer::new(name, parse_crs(&value));

    // First pass: collect the schema so every row has the full width.
    let mut index: AHashMap<String, usize> = AHashMap::new();
    for feature in features {
        if let Some(properties) = feature["properties"].as_object() {
            for (key, value) in properties {
                if !index.contains_key(key) {
                    index.insert(key.clone(), layer.fields.len());
                    layer.add_field(key, infer_field_type(value));
                }
            }
        }
    }

    for (row, feature) in features.iter().enumerate() {
        let geometry = json_to_geometry(&feature["geometry"])
            .with_context(|| format!("reading geometry of feature {row}"))?;

        let mut values = vec![FieldValue::Null; layer.fields.len()];
        if let Some(properties) = feature["properties"].as_object() {
            for (key, value) in properties {
                values[index[key]] = json_to_value(value);
            }
        }
        layer.push(Feature { geometry, values })?;
    }
    Ok(layer)
}

/// EPSG code from the legacy `crs` member, e.g. `urn:ogc:def:crs:EPSG::2039`.
fn parse_crs(value: &Value) -> Option<u32> {
    let name = value["crs"]["properties"]["name"].as_str()?;
    name.rsplit(':').next()?.parse().ok()
}

fn infer_field_type(value: &Value) -> FieldType {
    match value {
        Value::Number(n) if n.is_i64() => FieldType::Int,
        Value::Number(_) => FieldType::Float,
        Value::String(_) => FieldType::Text,
        _ => FieldType::Float,
    }
}

fn json_to_value(value: &Value) -> FieldValue {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(v) => FieldValue::Int(v),
            None => n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null),
        },
        Value::String(s) => FieldValue::Text(s.as_str().into()),
        Value::Bool(b) => FieldValue::Int(*b as i64),
        _ => FieldValue::Null,
    }
}

fn value_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Float(v) => json!(v),
        FieldValue::Int(v) => json!(v),
        FieldValue::Text(v) => json!(v.as_ref()),
        FieldValue::Null => Value::Null,
    }
}

fn properties_to_json(layer: &VectorLayer, feature: &Feature) -> Value {
    let map: serde_json::Map<String, Value> = layer.fields.iter()
        .zip(&feature.values)
        .map(|(field, value)| (field.name.to_string(), value_to_json(value)))
        .collect();
    Value::Object(map)
}

fn ring_to_json(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

fn polygon_to_json(polygon: &Polygon<f64>) -> Value {
    let mut rings = vec![ring_to_json(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(ring_to_json));
    Value::Array(rings)
}

fn geometry_to_json(geometry: &Geometry<f64>) -> Result<Value> {
    Ok(match geometry {
        Geometry::LineString(line) => json!({
            "type": "LineString",
            "coordinates": ring_to_json(line),
        }),
        Geometry::MultiLineString(mls) => json!({
            "type": "MultiLineString",
            "coordinates": mls.0.iter().map(ring_to_json).collect::<Vec<_>>(),
        }),
        Geometry::Polygon(polygon) => json!({
            "type": "Polygon",
            "coordinates": polygon_to_json(polygon),
        }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.0.iter().map(polygon_to_json).collect::<Vec<_>>(),
        }),
        other => bail!("unsupported geometry type for GeoJSON output: {other:?}"),
    })
}

/// Parse a position list `[[x, y], ...]` into a line string.
fn parse_positions(coords: &Value) -> Result<LineString<f64>> {
    let positions = coords.as_array()
        .ok_or_else(|| anyhow!("expected an array of positions"))?;

    let mut points = Vec::with_capacity(positions.len());
    for position in positions {
        let pair = position.as_array()
            .filter(|pair| pair.len() >= 2)
            .ok_or_else(|| anyhow!("position must be an [x, y] array"))?;
        let x = pair[0].as_f64().ok_or_else(|| anyhow!("coordinate x must be a number"))?;
        let y = pair[1].as_f64().ok_or_else(|| anyhow!("coordinate y must be a number"))?;
        points.push(Coord { x, y });
    }
    Ok(LineString::new(points))
}

/// Parse a ring, closing it if the source left it open.
fn parse_ring(coords: &Value) -> Result<LineString<f64>> {
    let mut ring = parse_positions(coords)?;
    if !ring.0.is_empty() && ring.0[0] != ring.0[ring.0.len() - 1] {
        let first = ring.0[0];
        ring.0.push(first);
    }
    Ok(ring)
}

fn parse_polygon(coords: &Value) -> Result<Polygon<f64>> {
    let rings = coords.as_array()
        .ok_or_else(|| anyhow!("polygon coordinates must be an array of rings"))?;
    if rings.is_empty() {
        bail!("polygon has no rings");
    }
    let exterior = parse_ring(&rings[0])?;
    let interiors = rings[1..].iter().map(parse_ring).collect::<Result<_>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn json_to_geometry(geometry: &Value) -> Result<Geometry<f64>> {
    let ty = geometry["type"].as_str()
        .ok_or_else(|| anyhow!("feature geometry is missing a type"))?;
    let coords = &geometry["coordinates"];

    Ok(match ty {
        "LineString" => Geometry::LineString(parse_positions(coords)?),
        "MultiLineString" => {
            let parts = coords.as_array()
                .ok_or_else(|| anyhow!("MultiLineString coordinates must be an array"))?;
            Geometry::MultiLineString(MultiLineString::new(
                parts.iter().map(parse_positions).collect::<Result<_>>()?,
            ))
        }
        "Polygon" => Geometry::Polygon(parse_polygon(coords)?),
        "MultiPolygon" => {
            let parts = coords.as_array()
                .ok_or_else(|| anyhow!("MultiPolygon coordinates must be an array"))?;
            Geometry::MultiPolygon(MultiPolygon::new(
                parts.iter().map(parse_polygon).collect::<Result<_>>()?,
            ))
        }
        other => bail!("unsupported geometry type: {other}"),
    })
}
