use anyhow::{bail, Context, Result};
use geo::Geometry;

use crate::geom::{self, JoinParams, JoinStyle, Side};
use crate::layer::{Feature, VectorLayer};

/// Offsets each line feature into a polygon on one side of its direction of
/// travel. The offset distance is read per feature from a numeric field, so
/// every road half gets its own lane-weighted width.
///
/// Features whose width comes out non-positive contribute no polygon; the
/// other side of the road still can.
#[derive(Debug, Clone)]
pub struct SingleSidedBuffer<'a> {
    pub distance_field: &'a str,
    pub side: Side,
    pub segments: u32,
    pub join_style: JoinStyle,
    pub miter_limit: f64,
}

impl SingleSidedBuffer<'_> {
    pub fn run(&self, input: &VectorLayer) -> Result<VectorLayer> {
        let suffix = match self.side {
            Side::Left => "left",
            Side::Right => "right",
        };
        let mut output = input.empty_like(&format!("{}_{suffix}", input.name));
        let params = JoinParams {
            join: self.join_style,
            segments: self.segments,
            miter_limit: self.miter_limit,
        };

        for (row, feature) in input.features.iter().enumerate() {
            let distance = input.number(feature, self.distance_field)
                .with_context(|| format!("reading buffer width of feature {row}"))?;

            let lines = geom::line_strings(&feature.geometry);
            if lines.is_empty() {
                bail!("feature {row} in layer {:?} is not a line geometry", input.name);
            }

            let mut pieces = Vec::new();
            for line in lines {
                if let Some(mp) = geom::single_sided(line, self.side, distance, &params) {
                    pieces.extend(mp.0);
                }
            }
            if let Some(polygon) = geom::union_pieces(pieces) {
                output.features.push(Feature {
                    geometry: Geometry::MultiPolygon(polygon),
                    values: feature.values.clone(),
                });
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use geo::{Area, BoundingRect, Geometry, LineString};

    use crate::geom::{JoinStyle, Side};
    use crate::layer::{Feature, FieldType, FieldValue, VectorLayer};
    use super::SingleSidedBuffer;

    fn line_layer(rows: &[(Vec<(f64, f64)>, f64)]) -> VectorLayer {
        let mut layer = VectorLayer::new("roads", Some(2039));
        layer.add_field("WIDTH", FieldType::Float);
        for (coords, width) in rows {
            layer.push(Feature {
                geometry: Geometry::LineString(LineString::from(coords.clone())),
                values: vec![FieldValue::Float(*width)],
            }).unwrap();
        }
        layer
    }

    fn op(side: Side) -> SingleSidedBuffer<'static> {
        SingleSidedBuffer {
            distance_field: "WIDTH",
            side,
            segments: 8,
            join_style: JoinStyle::Round,
            miter_limit: 2.0,
        }
    }

    #[test]
    fn width_comes_from_the_field_per_feature() {
        let layer = line_layer(&[
            (vec![(0.0, 0.0), (10.0, 0.0)], 1.0),
            (vec![(0.0, 50.0), (10.0, 50.0)], 3.0),
        ]);
        let out = op(Side::Right).run(&layer).unwrap();
        assert_eq!(out.len(), 2);

        let areas: Vec<f64> = out.features.iter()
            .map(|f| match &f.geometry {
                Geometry::MultiPolygon(mp) => mp.unsigned_area(),
                _ => panic!("expected polygons"),
            })
            .collect();
        assert!((areas[0] - 10.0).abs() < 1e-9);
        assert!((areas[1] - 30.0).abs() < 1e-9);
    }

    #[test]
    fn right_side_lies_right_of_travel() {
        let layer = line_layer(&[(vec![(0.0, 0.0), (10.0, 0.0)], 2.0)]);
        let out = op(Side::Right).run(&layer).unwrap();
        let bounds = match &out.features[0].geometry {
            Geometry::MultiPolygon(mp) => mp.bounding_rect().unwrap(),
            _ => panic!("expected polygons"),
        };
        assert!(bounds.max().y < 1e-9 && bounds.min().y < -1.9);
    }

    #[test]
    fn zero_width_features_are_skipped() {
        let layer = line_layer(&[
            (vec![(0.0, 0.0), (10.0, 0.0)], 0.0),
            (vec![(0.0, 50.0), (10.0, 50.0)], 1.0),
        ]);
        let out = op(Side::Left).run(&layer).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn non_line_geometry_is_fatal() {
        let mut layer = VectorLayer::new("roads", None);
        layer.add_field("WIDTH", FieldType::Float);
        layer.push(Feature {
            geometry: Geometry::Point(geo::Point::new(0.0, 0.0)),
            values: vec![FieldValue::Float(1.0)],
        }).unwrap();
        assert!(op(Side::Right).run(&layer).is_err());
    }
}
