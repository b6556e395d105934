//! # structchunk
//!
//! Structural PDF parsing and token-budgeted chunking for retrieval
//! pipelines.
//!
//! A document flows through a fixed sequence of stages: span extraction,
//! header/footer removal, table-of-contents suppression, column clustering,
//! block grouping and classification, table/caption/sidebar
//! reclassification, heading levels, image attachment, cross-page merging,
//! and finally a chunker that cuts the block stream on heading boundaries
//! and a token budget.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! fn main() -> structchunk::Result<()> {
//!     let output = structchunk::chunk_file("manual.pdf", Path::new("out"))?;
//!     for chunk in &output.chunks {
//!         println!("{} {:?} ({} tokens)", chunk.chunk_id, chunk.heading_path, chunk.token_count);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Artifacts
//!
//! - `<doc>_chunks.json`: the chunk list
//! - `<doc>_spans.json`: spans after filtering (optional)
//! - `<doc>_blocks.json`: decoded page primitives, loadable with
//!   [`MemorySource::from_json_file`] (optional)
//! - `<doc>_images/`: persisted JPEG images

pub mod batch;
pub mod chunker;
pub mod codec;
pub mod detect;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod select;
pub mod source;
pub mod text;

// Re-export commonly used types
pub use batch::{BatchFailure, BatchReport, BatchRunner, DocumentSummary};
pub use chunker::{Chunker, TiktokenTokenizer, Tokenizer, WhitespaceTokenizer};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, PdfFormat};
pub use error::{Error, Result};
pub use export::{ArtifactPaths, JsonFormat};
pub use model::{
    BBox, Block, BlockKind, Chunk, ChunkType, ImageData, Page, PageInfo, Primitive, Span,
    TextLine, TextRun,
};
pub use parser::{ChunkerOptions, LayoutOutput, LayoutPipeline, LayoutStats};
pub use pipeline::{Analysis, ChunkStats, DocumentChunker, DocumentOutput};
pub use select::FileSelector;
pub use source::{MemorySource, PageSource, PdfSource};

use std::path::Path;

/// Chunk a PDF or page dump with default options and write artifacts to
/// `output_dir`.
///
/// Tokens are counted with `cl100k_base`.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// let output = structchunk::chunk_file("manual.pdf", Path::new("out")).unwrap();
/// println!("{} chunks", output.chunks.len());
/// ```
pub fn chunk_file<P: AsRef<Path>>(path: P, output_dir: &Path) -> Result<DocumentOutput> {
    chunk_file_with_options(path, output_dir, ChunkerOptions::default())
}

/// Chunk a single file with custom options.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use structchunk::{chunk_file_with_options, ChunkerOptions};
///
/// let options = ChunkerOptions::new()
///     .with_max_tokens(800)
///     .with_toc(true);
/// let output = chunk_file_with_options("manual.pdf", Path::new("out"), options).unwrap();
/// ```
pub fn chunk_file_with_options<P: AsRef<Path>>(
    path: P,
    output_dir: &Path,
    options: ChunkerOptions,
) -> Result<DocumentOutput> {
    DocumentChunker::new(options)?.process_file(path, output_dir)
}

/// Chunk PDF bytes in memory without writing anything.
pub fn chunk_bytes(document_name: &str, data: &[u8], options: ChunkerOptions) -> Result<Vec<Chunk>> {
    let source = PdfSource::from_bytes(data)?;
    DocumentChunker::new(options)?.chunk_source(document_name, &source)
}

/// Chunk every selected file in `input_dir`.
///
/// `pattern` is an exact file name, a wildcard such as `*.pdf`, or a
/// regular expression prefixed with `re:`.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use structchunk::{chunk_directory, ChunkerOptions};
///
/// let report = chunk_directory(
///     Path::new("manuals"),
///     "re:pump_.*\\.pdf",
///     Path::new("out"),
///     ChunkerOptions::default(),
/// )
/// .unwrap();
/// println!("{} documents, {} failures", report.documents.len(), report.failures.len());
/// ```
pub fn chunk_directory(
    input_dir: &Path,
    pattern: &str,
    output_dir: &Path,
    options: ChunkerOptions,
) -> Result<BatchReport> {
    let selector = FileSelector::parse(pattern)?;
    let runner = BatchRunner::new(DocumentChunker::new(options)?);
    runner.run(input_dir, &selector, output_dir)
}
