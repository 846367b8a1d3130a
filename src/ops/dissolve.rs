use std::sync::Arc;

use ahash::AHashMap;
use anyhow::{bail, Result};
use geo::{BooleanOps, Geometry};

use crate::geom;
use crate::layer::{Feature, FieldValue, VectorLayer};

/// Unions the geometries of features sharing a value in `field`.
///
/// Output order follows first appearance of each value, and the first
/// feature of a group donates its attribute row. Grouping by the road
/// identifier is what keeps distinct roads from fusing even when their
/// polygons touch.
#[derive(Debug, Clone)]
pub struct Dissolve<'a> {
    pub field: &'a str,
}

/// Hashable stand-in for an attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Int(i64),
    Bits(u64),
    Text(Arc<str>),
    Null,
}

fn group_key(value: &FieldValue) -> GroupKey {
    match value {
        FieldValue::Int(v) => GroupKey::Int(*v),
        FieldValue::Float(v) => GroupKey::Bits(v.to_bits()),
        FieldValue::Text(v) => GroupKey::Text(v.clone()),
        FieldValue::Null => GroupKey::Null,
    }
}

impl Dissolve<'_> {
    pub fn run(&self, input: &VectorLayer) -> Result<VectorLayer> {
        let Some(field) = input.field_index(self.field) else {
            bail!("layer {:?} has no field {:?}", input.name, self.field);
        };

        let mut output = input.empty_like("dissolved");
        let mut slots: AHashMap<GroupKey, usize> = AHashMap::new();

        for (row, feature) in input.features.iter().enumerate() {
            let Some(mp) = geom::to_multi_polygon(&feature.geometry) else {
                bail!("feature {row} in layer {:?} is not a polygon geometry", input.name);
            };

            match slots.entry(group_key(&feature.values[field])) {
                std::collections::hash_map::Entry::Occupied(slot) => {
                    let merged = &mut output.features[*slot.get()];
                    let Geometry::MultiPolygon(acc) = &merged.geometry else {
                        unreachable!("dissolve accumulates multipolygons");
                    };
                    merged.geometry = Geometry::MultiPolygon(acc.union(&mp));
                }
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(output.features.len());
                    output.features.push(Feature {
                        geometry: Geometry::MultiPolygon(mp),
                        values: feature.values.clone(),
                    });
                }
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use geo::{Area, Geometry, LineString, MultiPolygon, Polygon};

    use crate::layer::{Feature, FieldType, FieldValue, VectorLayer};
    use super::Dissolve;

    fn square(x: f64, y: f64, size: f64) -> Geometry<f64> {
        Geometry::Polygon(Polygon::new(
            LineString::from(vec![(x, y), (x + size, y), (x + size, y + size), (x, y + size), (x, y)]),
            vec![],
        ))
    }

    fn layer(rows: &[(i64, Geometry<f64>)]) -> VectorLayer {
        let mut layer = VectorLayer::new("buffers", Some(2039));
        layer.add_field("UNIQ_ID", FieldType::Int);
        for (id, geometry) in rows {
            layer.push(Feature {
                geometry: geometry.clone(),
                values: vec![FieldValue::Int(*id)],
            }).unwrap();
        }
        layer
    }

    #[test]
    fn groups_by_field_value() {
        let input = layer(&[
            (1, square(0.0, 0.0, 2.0)),
            (1, square(1.0, 0.0, 2.0)),
            (2, square(10.0, 0.0, 2.0)),
        ]);
        let out = Dissolve { field: "UNIQ_ID" }.run(&input).unwrap();
        assert_eq!(out.len(), 2);

        let Geometry::MultiPolygon(first) = &out.features[0].geometry else { panic!() };
        assert!((first.unsigned_area() - 6.0).abs() < 1e-9); // two overlapping squares
    }

    #[test]
    fn touching_polygons_with_distinct_ids_stay_separate() {
        let input = layer(&[
            (1, square(0.0, 0.0, 2.0)),
            (2, square(2.0, 0.0, 2.0)), // shares an edge with the first
        ]);
        let out = Dissolve { field: "UNIQ_ID" }.run(&input).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn first_feature_donates_attributes() {
        let mut input = layer(&[]);
        input.add_field("TAG", FieldType::Text);
        for (id, tag) in [(5_i64, "a"), (5, "b")] {
            input.push(Feature {
                geometry: square(0.0, 0.0, 1.0),
                values: vec![FieldValue::Int(id), FieldValue::Text(tag.into())],
            }).unwrap();
        }
        let out = Dissolve { field: "UNIQ_ID" }.run(&input).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.features[0].values[1], FieldValue::Text("a".into()));
    }

    #[test]
    fn non_polygon_input_is_fatal() {
        let mut input = layer(&[]);
        input.push(Feature {
            geometry: Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 0.0)])),
            values: vec![FieldValue::Int(1)],
        }).unwrap();
        assert!(Dissolve { field: "UNIQ_ID" }.run(&input).is_err());
    }

    #[test]
    fn missing_group_field_is_fatal() {
        let input = layer(&[(1, square(0.0, 0.0, 1.0))]);
        assert!(Dissolve { field: "OTHER" }.run(&input).is_err());
    }

    #[test]
    fn multipolygon_features_are_accepted() {
        let Geometry::Polygon(a) = square(0.0, 0.0, 1.0) else { panic!() };
        let Geometry::Polygon(b) = square(5.0, 0.0, 1.0) else { panic!() };
        let input = layer(&[(1, Geometry::MultiPolygon(MultiPolygon::new(vec![a, b])))]);
        let out = Dissolve { field: "UNIQ_ID" }.run(&input).unwrap();
        assert_eq!(out.len(), 1);
    }
}
