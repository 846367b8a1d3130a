use anyhow::{bail, Result};
use geo::{BooleanOps, Geometry, MultiPolygon};
use rstar::{RTree, RTreeObject};

use crate::geom::{self, BoundingBox};
use crate::layer::{Feature, VectorLayer};

/// Subtracts every intersecting overlay feature from each input feature.
/// Features with nothing left after subtraction are dropped.
#[derive(Debug, Clone, Copy)]
pub struct Difference;

impl Difference {
    pub fn run(&self, input: &VectorLayer, overlay: &VectorLayer) -> Result<VectorLayer> {
        let mut overlay_geoms: Vec<MultiPolygon<f64>> = Vec::with_capacity(overlay.len());
        for (row, feature) in overlay.features.iter().enumerate() {
            let Some(mp) = geom::to_multi_polygon(&feature.geometry) else {
                bail!("overlay feature {row} in layer {:?} is not a polygon geometry", overlay.name);
            };
            overlay_geoms.push(mp);
        }
        let rtree = RTree::bulk_load(
            overlay.features.iter().enumerate()
                .filter_map(|(idx, feature)| BoundingBox::from_geometry(idx, &feature.geometry))
                .collect(),
        );

        let mut output = input.empty_like(&format!("{}_difference", input.name));
        for (row, feature) in input.features.iter().enumerate() {
            let Some(mp) = geom::to_multi_polygon(&feature.geometry) else {
                bail!("feature {row} in layer {:?} is not a polygon geometry", input.name);
            };
            let Some(bbox) = BoundingBox::from_geometry(row, &feature.geometry) else {
                continue; // nothing with an extent, nothing to keep
            };

            let mut remaining = mp;
            for candidate in rtree.locate_in_envelope_intersecting(&bbox.envelope()) {
                remaining = remaining.difference(&overlay_geoms[candidate.idx()]);
                if remaining.0.is_empty() {
                    break;
                }
            }
            if !remaining.0.is_empty() {
                output.features.push(Feature {
                    geometry: Geometry::MultiPolygon(remaining),
                    values: feature.values.clone(),
                });
            }
        }
        Ok(output)
    }
}
