use anyhow::{bail, Result};

use crate::layer::{FieldType, FieldValue, VectorLayer};

/// Adds (or replaces) a float column computed as `source_field` × `factor`.
///
/// A missing or non-numeric source field aborts the run; this is where the
/// pipeline surfaces a line layer that lacks its lane-count columns.
#[derive(Debug, Clone)]
pub struct FieldCalculator<'a> {
    pub field_name: &'a str,
    pub source_field: &'a str,
    pub factor: f64,
}

impl FieldCalculator<'_> {
    pub fn run(&self, input: &VectorLayer) -> Result<VectorLayer> {
        let Some(source) = input.field_index(self.source_field) else {
            bail!("layer {:?} has no field {:?}", input.name, self.source_field);
        };

        let mut output = input.clone();
        let target = output.add_field(self.field_name, FieldType::Float);
        for (row, feature) in output.features.iter_mut().enumerate() {
            let Some(value) = feature.values[source].as_f64() else {
                bail!(
                    "field {:?} is null or not numeric in feature {row} of layer {:?}",
                    self.source_field, input.name
                );
            };
            feature.values[target] = FieldValue::Float(value * self.factor);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, Point};

    use crate::layer::{Feature, FieldType, FieldValue, VectorLayer};
    use super::FieldCalculator;

    fn lane_layer(values: &[f64]) -> VectorLayer {
        let mut layer = VectorLayer::new("roads", None);
        layer.add_field("FT_LANES", FieldType::Float);
        for &v in values {
            layer.push(Feature {
                geometry: Geometry::Point(Point::new(0.0, 0.0)),
                values: vec![FieldValue::Float(v)],
            }).unwrap();
        }
        layer
    }

    #[test]
    fn scales_the_source_column() {
        let calc = FieldCalculator { field_name: "WFT_LANES", source_field: "FT_LANES", factor: 2.5 };
        let out = calc.run(&lane_layer(&[2.0, 3.0])).unwrap();

        let idx = out.field_index("WFT_LANES").unwrap();
        assert_eq!(out.features[0].values[idx], FieldValue::Float(5.0));
        assert_eq!(out.features[1].values[idx], FieldValue::Float(7.5));
    }

    #[test]
    fn missing_source_field_is_fatal() {
        let calc = FieldCalculator { field_name: "W", source_field: "TF_LANES", factor: 2.5 };
        assert!(calc.run(&lane_layer(&[1.0])).is_err());
    }

    #[test]
    fn null_source_value_is_fatal() {
        let mut layer = lane_layer(&[]);
        layer.push(Feature {
            geometry: Geometry::Point(Point::new(0.0, 0.0)),
            values: vec![FieldValue::Null],
        }).unwrap();
        let calc = FieldCalculator { field_name: "W", source_field: "FT_LANES", factor: 2.5 };
        assert!(calc.run(&layer).is_err());
    }
}
