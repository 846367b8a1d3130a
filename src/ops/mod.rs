//! The geometry engine operations the road pipeline is chained from.
//! Each operation is a parameter struct with a `run` method taking its
//! input layer(s) by reference and producing a fresh layer.

mod buffer;
mod delete_columns;
mod difference;
mod dissolve;
mod field_calculator;
mod merge;
mod single_sided_buffer;

pub use buffer::Buffer;
pub use delete_columns::DeleteColumns;
pub use difference::Difference;
pub use dissolve::Dissolve;
pub use field_calculator::FieldCalculator;
pub use merge::{MergeLayers, LAYER_FIELD};
pub use single_sided_buffer::SingleSidedBuffer;
