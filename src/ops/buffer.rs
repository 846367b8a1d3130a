use anyhow::{bail, Result};
use geo::{BooleanOps, Geometry, MultiPolygon};

use crate::geom::{self, CapStyle, JoinParams, JoinStyle};
use crate::layer::{Feature, VectorLayer};

/// Symmetric offset of every feature by a fixed distance, optionally
/// dissolving the buffered features into a single one so overlapping
/// neighborhoods are not double-counted.
///
/// Polygons grow outward; open lines are buffered on both sides with the
/// configured end caps.
#[derive(Debug, Clone)]
pub struct Buffer {
    pub distance: f64,
    pub segments: u32,
    pub end_cap_style: CapStyle,
    pub join_style: JoinStyle,
    pub miter_limit: f64,
    pub dissolve: bool,
}

impl Buffer {
    pub fn run(&self, input: &VectorLayer) -> Result<VectorLayer> {
        if !(self.distance > 0.0) {
            bail!("buffer distance must be positive, got {}", self.distance);
        }

        let mut output = input.empty_like(&format!("{}_buffered", input.name));
        for (row, feature) in input.features.iter().enumerate() {
            let buffered = self.buffer_geometry(&feature.geometry).ok_or_else(|| {
                anyhow::anyhow!(
                    "feature {row} in layer {:?} cannot be buffered: unsupported or empty geometry",
                    input.name
                )
            })?;
            output.features.push(Feature {
                geometry: Geometry::MultiPolygon(buffered),
                values: feature.values.clone(),
            });
        }

        if self.dissolve && output.features.len() > 1 {
            let mut features = std::mem::take(&mut output.features).into_iter();
            if let Some(first) = features.next() {
                let Geometry::MultiPolygon(mut acc) = first.geometry else {
                    unreachable!("buffer emits multipolygons");
                };
                for feature in features {
                    if let Geometry::MultiPolygon(mp) = feature.geometry {
                        acc = acc.union(&mp);
                    }
                }
                output.features.push(Feature {
                    geometry: Geometry::MultiPolygon(acc),
                    values: first.values,
                });
            }
        }
        Ok(output)
    }

    fn buffer_geometry(&self, geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
        let params = JoinParams {
            join: self.join_style,
            segments: self.segments,
            miter_limit: self.miter_limit,
        };
        match geometry {
            Geometry::Polygon(poly) => geom::buffer_polygon(poly, self.distance, &params),
            Geometry::MultiPolygon(mp) => {
                let mut pieces = Vec::new();
                for poly in &mp.0 {
                    pieces.extend(geom::buffer_polygon(poly, self.distance, &params)?.0);
                }
                geom::union_pieces(pieces)
            }
            Geometry::LineString(line) => {
                geom::buffer_line(line, self.distance, self.end_cap_style, &params)
            }
            Geometry::MultiLineString(mls) => {
                let mut pieces = Vec::new();
                for line in &mls.0 {
                    pieces.extend(
                        geom::buffer_line(line, self.distance, self.end_cap_style, &params)?.0,
                    );
                }
                geom::union_pieces(pieces)
            }
            _ => None,
        }
    }
}
