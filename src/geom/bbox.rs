use geo::{BoundingRect, Geometry, Rect};
use rstar::{RTreeObject, AABB};

/// A bounding box in an R-tree, associated with a feature by index.
#[derive(Debug, Clone)]
pub(crate) struct BoundingBox {
    idx: usize, // Index of the corresponding feature in its layer
    bbox: Rect<f64>,
}

impl BoundingBox {
    /// Wrap a feature geometry, if it has an extent at all.
    pub(crate) fn from_geometry(idx: usize, geometry: &Geometry<f64>) -> Option<Self> {
        geometry.bounding_rect().map(|bbox| Self { idx, bbox })
    }

    /// Get the index of the corresponding feature.
    #[inline] pub(crate) fn idx(&self) -> usize { self.idx }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}
