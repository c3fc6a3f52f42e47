pub mod construction;
pub mod model;
pub mod serialization;
pub mod tu_format;

pub use construction::GraphLoader;
pub use model::{EdgeAttributes, GraphInstance, LabeledGraph, NodeAttributes, NodeId, RawGraph};
pub use serialization::GraphWriter;
pub use tu_format::{AttributeSelection, TuRawData};
