use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use geo::Geometry;

/// Attribute column types carried by a layer schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Float,
    Int,
    Text,
}

/// A single attribute value. Rows are stored parallel to the layer schema.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Int(i64),
    Text(Arc<str>),
    Null,
}

impl FieldValue {
    /// Numeric view of the value, if it has one.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// One column of a layer schema.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: Arc<str>,
    pub ty: FieldType,
}

/// A single feature: one geometry plus one attribute row.
///
/// `values` must stay parallel to the owning layer's `fields`.
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub values: Vec<FieldValue>,
}

/// An in-memory feature collection with a shared attribute schema.
#[derive(Debug, Clone)]
pub struct VectorLayer {
    pub name: Arc<str>,
    pub epsg: Option<u32>, // EPSG code, if known
    pub fields: Vec<FieldDef>,
    pub features: Vec<Feature>,
}

impl VectorLayer {
    pub fn new(name: &str, epsg: Option<u32>) -> Self {
        Self {
            name: Arc::from(name),
            epsg,
            fields: Vec::new(),
            features: Vec::new(),
        }
    }

    /// Copy of this layer's identity and schema, with no features.
    pub fn empty_like(&self, name: &str) -> Self {
        Self {
            name: Arc::from(name),
            epsg: self.epsg,
            fields: self.fields.clone(),
            features: Vec::new(),
        }
    }

    /// Get the number of features.
    #[inline] pub fn len(&self) -> usize { self.features.len() }

    /// Check if there are no features.
    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }

    /// Index of a named column, if present.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name.as_ref() == name)
    }

    /// Append a column to the schema, padding existing rows with nulls.
    /// Reuses the slot if a column of that name already exists.
    pub fn add_field(&mut self, name: &str, ty: FieldType) -> usize {
        if let Some(idx) = self.field_index(name) {
            self.fields[idx].ty = ty;
            return idx;
        }
        self.fields.push(FieldDef { name: Arc::from(name), ty });
        for feature in &mut self.features {
            feature.values.push(FieldValue::Null);
        }
        self.fields.len() - 1
    }

    /// Numeric value of a named column for one feature.
    pub fn number(&self, feature: &Feature, field: &str) -> Result<f64> {
        let idx = self.field_index(field)
            .ok_or_else(|| anyhow!("layer {:?} has no field {:?}", self.name, field))?;
        feature.values[idx].as_f64()
            .ok_or_else(|| anyhow!("field {:?} in layer {:?} is not numeric", field, self.name))
    }

    /// Append a feature, checking its row width against the schema.
    pub fn push(&mut self, feature: Feature) -> Result<()> {
        if feature.values.len() != self.fields.len() {
            bail!(
                "feature row has {} values but layer {:?} has {} fields",
                feature.values.len(), self.name, self.fields.len()
            );
        }
        self.features.push(feature);
        Ok(())
    }

    /// Make sure an integer identifier column exists, filling missing or null
    /// entries with the feature's position in the layer.
    pub fn ensure_id_field(&mut self, name: &str) {
        let idx = match self.field_index(name) {
            Some(idx) => idx,
            None => self.add_field(name, FieldType::Int),
        };
        for (row, feature) in self.features.iter_mut().enumerate() {
            if feature.values[idx].is_null() {
                feature.values[idx] = FieldValue::Int(row as i64);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, Point};

    use super::{Feature, FieldType, FieldValue, VectorLayer};

    fn point_feature(values: Vec<FieldValue>) -> Feature {
        Feature { geometry: Geometry::Point(Point::new(0.0, 0.0)), values }
    }

    #[test]
    fn add_field_pads_existing_rows() {
        let mut layer = VectorLayer::new("pts", None);
        layer.add_field("a", FieldType::Float);
        layer.push(point_feature(vec![FieldValue::Float(1.0)])).unwrap();

        let idx = layer.add_field("b", FieldType::Int);
        assert_eq!(idx, 1);
        assert_eq!(layer.features[0].values[1], FieldValue::Null);
    }

    #[test]
    fn add_field_reuses_existing_slot() {
        let mut layer = VectorLayer::new("pts", None);
        assert_eq!(layer.add_field("a", FieldType::Float), 0);
        assert_eq!(layer.add_field("a", FieldType::Int), 0);
        assert_eq!(layer.fields.len(), 1);
    }

    #[test]
    fn push_rejects_mismatched_row() {
        let mut layer = VectorLayer::new("pts", None);
        layer.add_field("a", FieldType::Float);
        assert!(layer.push(point_feature(vec![])).is_err());
    }

    #[test]
    fn ensure_id_field_fills_nulls_only() {
        let mut layer = VectorLayer::new("pts", None);
        layer.add_field("UNIQ_ID", FieldType::Int);
        layer.push(point_feature(vec![FieldValue::Int(7)])).unwrap();
        layer.push(point_feature(vec![FieldValue::Null])).unwrap();

        layer.ensure_id_field("UNIQ_ID");
        assert_eq!(layer.features[0].values[0], FieldValue::Int(7));
        assert_eq!(layer.features[1].values[0], FieldValue::Int(1));
    }

    #[test]
    fn number_reads_ints_and_floats() {
        let mut layer = VectorLayer::new("pts", None);
        layer.add_field("n", FieldType::Int);
        layer.push(point_feature(vec![FieldValue::Int(3)])).unwrap();

        let value = layer.number(&layer.features[0], "n").unwrap();
        assert_eq!(value, 3.0);
        assert!(layer.number(&layer.features[0], "missing").is_err());
    }
}
