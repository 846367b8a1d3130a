mod bbox;
mod offset;
mod proj;

pub use offset::{CapStyle, JoinStyle, Side};

pub(crate) use bbox::BoundingBox;
pub(crate) use offset::{buffer_line, buffer_polygon, single_sided, union_pieces, JoinParams};
pub(crate) use proj::reproject;

use geo::{Geometry, LineString, MultiPolygon};

/// Areal view of a geometry, if it has one.
pub(crate) fn to_multi_polygon(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(poly) => Some(MultiPolygon::new(vec![poly.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        _ => None,
    }
}

/// Component line strings of a line geometry. Empty for anything else.
pub(crate) fn line_strings(geometry: &Geometry<f64>) -> Vec<&LineString<f64>> {
    match geometry {
        Geometry::LineString(line) => vec![line],
        Geometry::MultiLineString(mls) => mls.0.iter().collect(),
        _ => Vec::new(),
    }
}
