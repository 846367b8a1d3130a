use std::sync::Arc;

use ahash::AHashMap;
use anyhow::{Context, Result};

use crate::geom::reproject;
use crate::layer::{Feature, FieldType, FieldValue, VectorLayer};

/// Provenance column stamped on every merged feature.
pub const LAYER_FIELD: &str = "layer";

/// Concatenates feature collections into one layer with the declared CRS.
///
/// Schemas are unified by column name in order of first appearance; rows
/// missing a column are padded with nulls. Each feature is stamped with the
/// name of the layer it came from. Sources whose EPSG code differs from the
/// target are reprojected; a source with no EPSG code is taken to already be
/// in the target system and is only stamped.
#[derive(Debug, Clone)]
pub struct MergeLayers {
    pub target_epsg: u32,
}

impl MergeLayers {
    pub fn run(&self, inputs: &[&VectorLayer]) -> Result<VectorLayer> {
        let mut output = VectorLayer::new("merged", Some(self.target_epsg));

        let mut index: AHashMap<Arc<str>, usize> = AHashMap::new();
        for layer in inputs {
            for field in &layer.fields {
                if !index.contains_key(&field.name) {
                    index.insert(field.name.clone(), output.fields.len());
                    output.fields.push(field.clone());
                }
            }
        }
        let stamp = output.add_field(LAYER_FIELD, FieldType::Text);

        for layer in inputs {
            let mapping: Vec<usize> = layer.fields.iter()
                .map(|field| index[&field.name])
                .collect();
            let warp = match layer.epsg {
                Some(epsg) if epsg != self.target_epsg => Some(epsg),
                _ => None,
            };

            for feature in &layer.features {
                let geometry = match warp {
                    Some(epsg) => reproject(&feature.geometry, epsg, self.target_epsg)
                        .with_context(|| format!("merging layer {:?}", layer.name))?,
                    None => feature.geometry.clone(),
                };

                let mut values = vec![FieldValue::Null; output.fields.len()];
                for (src, value) in feature.values.iter().enumerate() {
                    values[mapping[src]] = value.clone();
                }
                values[stamp] = FieldValue::Text(layer.name.clone());
                output.features.push(Feature { geometry, values });
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, Point};

    use crate::layer::{Feature, FieldDef, FieldType, FieldValue, VectorLayer};
    use super::{MergeLayers, LAYER_FIELD};

    fn one_point_layer(name: &str, epsg: Option<u32>, field: &str, value: f64) -> VectorLayer {
        let mut layer = VectorLayer::new(name, epsg);
        layer.add_field(field, FieldType::Float);
        layer.push(Feature {
            geometry: Geometry::Point(Point::new(1.0, 2.0)),
            values: vec![FieldValue::Float(value)],
        }).unwrap();
        layer
    }

    #[test]
    fn schemas_unify_and_rows_pad_with_nulls() {
        let a = one_point_layer("a", Some(2039), "A", 1.0);
        let b = one_point_layer("b", Some(2039), "B", 2.0);
        let merged = MergeLayers { target_epsg: 2039 }.run(&[&a, &b]).unwrap();

        let names: Vec<&str> = merged.fields.iter().map(|f: &FieldDef| f.name.as_ref()).collect();
        assert_eq!(names, vec!["A", "B", LAYER_FIELD]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.features[0].values[1], FieldValue::Null);
        assert_eq!(merged.features[1].values[0], FieldValue::Null);
    }

    #[test]
    fn features_are_stamped_with_their_source_layer() {
        let a = one_point_layer("left_half", Some(2039), "A", 1.0);
        let merged = MergeLayers { target_epsg: 2039 }.run(&[&a]).unwrap();

        let stamp = merged.field_index(LAYER_FIELD).unwrap();
        assert_eq!(merged.features[0].values[stamp], FieldValue::Text("left_half".into()));
    }

    #[test]
    fn unknown_epsg_passes_through_with_target_stamped() {
        let a = one_point_layer("a", None, "A", 1.0);
        let merged = MergeLayers { target_epsg: 2039 }.run(&[&a]).unwrap();
        assert_eq!(merged.epsg, Some(2039));
        assert_eq!(merged.features[0].geometry, Geometry::Point(Point::new(1.0, 2.0)));
    }

    #[test]
    fn geographic_sources_are_reprojected() {
        let mut a = VectorLayer::new("a", Some(4326));
        a.add_field("A", FieldType::Float);
        a.push(Feature {
            geometry: Geometry::Point(Point::new(35.2045169444444, 31.7343936111111)),
            values: vec![FieldValue::Float(1.0)],
        }).unwrap();

        let merged = MergeLayers { target_epsg: 2039 }.run(&[&a]).unwrap();
        let Geometry::Point(p) = &merged.features[0].geometry else { panic!("expected a point") };
        assert!((p.x() - 219529.584).abs() < 500.0);
        assert!((p.y() - 626907.39).abs() < 500.0);
    }

    #[test]
    fn unsupported_source_epsg_is_fatal() {
        let a = one_point_layer("a", Some(3857), "A", 1.0);
        assert!(MergeLayers { target_epsg: 2039 }.run(&[&a]).is_err());
    }
}
