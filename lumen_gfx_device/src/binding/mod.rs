pub mod texture_units;
pub mod vertex_array;

pub use texture_units::TextureUnitTable;
pub use vertex_array::{VertexArrayCache, VertexArrayKey};
