#![doc = "Lane-weighted road and sidewalk polygon toolkit"]
pub use geo;

mod geom;
mod layer;
mod ops;
mod pipeline;

pub mod io;

#[doc(inline)]
pub use layer::{Feature, FieldDef, FieldType, FieldValue, VectorLayer};

#[doc(inline)]
pub use pipeline::{BufferByLanes, FT_LANES, TF_LANES, UNIQ_ID};

#[doc(inline)]
pub use ops::{
    Buffer, DeleteColumns, Difference, Dissolve, FieldCalculator, MergeLayers,
    SingleSidedBuffer, LAYER_FIELD,
};

#[doc(inline)]
pub use geom::{CapStyle, JoinStyle, Side};
