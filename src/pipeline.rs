use std::sync::Arc;

use anyhow::{Context, Result};

use crate::geom::{CapStyle, JoinStyle, Side};
use crate::layer::VectorLayer;
use crate::ops::{
    Buffer, DeleteColumns, Difference, Dissolve, FieldCalculator, MergeLayers,
    SingleSidedBuffer, LAYER_FIELD,
};

/// Forward lane count column expected on the input layer.
pub const FT_LANES: &str = "FT_LANES";
/// Reverse lane count column expected on the input layer.
pub const TF_LANES: &str = "TF_LANES";
/// Per-road identifier column the dissolve step groups by.
pub const UNIQ_ID: &str = "UNIQ_ID";

// Derived per-direction width columns, dropped again before the road layer
// is returned.
const WFT_LANES: &str = "WFT_LANES";
const WTF_LANES: &str = "WTF_LANES";

/// CRS of the merged road polygons (Israeli TM Grid). The pin is part of the
/// tool's contract, not derived from the input layer.
const ROAD_EPSG: u32 = 2039;

const ROAD_SEGMENTS: u32 = 8;
const ROAD_MITER_LIMIT: f64 = 2.0;
const SIDEWALK_SEGMENTS: u32 = 5;
const SIDEWALK_MITER_LIMIT: f64 = 2.0;

/// Lane-weighted road buffer pipeline.
///
/// Takes a line layer carrying numeric `FT_LANES`/`TF_LANES` lane counts and
/// produces a road polygon layer, each side of a road offset by its lane
/// count × `lane_weight`, plus a sidewalk ring of `sidewalk_width` around
/// every road with the road surface itself cut back out.
///
/// The stages run strictly in order and the first failure aborts the whole
/// run; there is no partial output.
#[derive(Debug, Clone, Copy)]
pub struct BufferByLanes {
    pub lane_weight: f64,
    pub sidewalk_width: f64,
}

impl Default for BufferByLanes {
    fn default() -> Self {
        Self { lane_weight: 2.5, sidewalk_width: 2.5 }
    }
}

impl BufferByLanes {
    /// Run the pipeline, returning the (road, sidewalk) polygon layers.
    pub fn run(&self, input: &VectorLayer) -> Result<(VectorLayer, VectorLayer)> {
        let forward = FieldCalculator {
            field_name: WFT_LANES,
            source_field: FT_LANES,
            factor: self.lane_weight,
        }
        .run(input)
        .context("computing forward lane widths")?;

        let weighted = FieldCalculator {
            field_name: WTF_LANES,
            source_field: TF_LANES,
            factor: self.lane_weight,
        }
        .run(&forward)
        .context("computing reverse lane widths")?;

        // The right side always takes the forward widths and the left side
        // the reverse widths; swapping them silently mirrors every road.
        let right = SingleSidedBuffer {
            distance_field: WFT_LANES,
            side: Side::Right,
            segments: ROAD_SEGMENTS,
            join_style: JoinStyle::Round,
            miter_limit: ROAD_MITER_LIMIT,
        }
        .run(&weighted)
        .context("buffering the forward side")?;

        let left = SingleSidedBuffer {
            distance_field: WTF_LANES,
            side: Side::Left,
            segments: ROAD_SEGMENTS,
            join_style: JoinStyle::Round,
            miter_limit: ROAD_MITER_LIMIT,
        }
        .run(&weighted)
        .context("buffering the reverse side")?;

        let merged = MergeLayers { target_epsg: ROAD_EPSG }
            .run(&[&left, &right])
            .context("merging the side buffers")?;

        let dissolved = Dissolve { field: UNIQ_ID }
            .run(&merged)
            .context("dissolving road halves")?;

        let mut road = DeleteColumns { columns: &[LAYER_FIELD, WFT_LANES, WTF_LANES] }
            .run(&dissolved);
        road.name = Arc::from("road");

        let sidewalk_buffer = Buffer {
            distance: self.sidewalk_width,
            segments: SIDEWALK_SEGMENTS,
            end_cap_style: CapStyle::Flat,
            join_style: JoinStyle::Miter,
            miter_limit: SIDEWALK_MITER_LIMIT,
            dissolve: true,
        }
        .run(&road)
        .context("buffering the sidewalk")?;

        let mut sidewalk = Difference
            .run(&sidewalk_buffer, &road)
            .context("cutting the road out of the sidewalk")?;
        sidewalk.name = Arc::from("sidewalk");

        Ok((road, sidewalk))
    }
}
