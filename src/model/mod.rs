//! Data model shared by every pipeline stage.
//!
//! Pages of primitives reduce to spans, spans to classified blocks, and
//! blocks to chunks. Each level is serializable so intermediate artifacts can
//! be written next to the chunks.

mod block;
mod chunk;
mod geometry;
mod page;
mod span;

pub use block::{Block, BlockKind};
pub use chunk::{Chunk, ChunkType};
pub use geometry::BBox;
pub use page::{ImageData, Page, PageInfo, Primitive, TextLine, TextRun};
pub use span::Span;
