//! Per-document processing: extraction, layout, chunking, artifacts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::chunker::{Chunker, TiktokenTokenizer, Tokenizer};
use crate::error::Result;
use crate::export::{write_json, ArtifactPaths, JsonFormat};
use crate::model::{Block, BlockKind, Chunk, Page, PageInfo};
use crate::parser::{ChunkerOptions, LayoutOutput, LayoutPipeline, SpanExtractor};
use crate::source::{open_path, PageSource};

/// Counters for one processed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChunkStats {
    pub pages: usize,
    pub spans_extracted: usize,
    pub spans_dropped_margins: usize,
    pub spans_dropped_toc: usize,
    pub toc_pages: Vec<u32>,
    pub blocks: usize,
    pub blocks_by_kind: BTreeMap<BlockKind, usize>,
    pub images_attached: usize,
    pub image_failures: usize,
    pub chunks: usize,
    pub total_tokens: usize,
    /// Chunks under the advisory minimum
    pub chunks_below_min: usize,
}

/// Extraction and layout results before chunking.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub pages: Vec<PageInfo>,
    /// Decoded pages, present when the raw block export is enabled
    pub raw_pages: Vec<Page>,
    pub image_failures: usize,
    pub layout: LayoutOutput,
}

/// Everything produced for one document.
#[derive(Debug, Clone)]
pub struct DocumentOutput {
    pub document_name: String,
    pub chunks: Vec<Chunk>,
    pub stats: ChunkStats,
    pub chunks_path: PathBuf,
    pub spans_path: Option<PathBuf>,
    pub blocks_path: Option<PathBuf>,
}

/// Turns documents into chunk artifacts.
///
/// Holds validated options and a shared tokenizer; cheap to clone and safe
/// to share across threads.
#[derive(Clone)]
pub struct DocumentChunker {
    options: ChunkerOptions,
    tokenizer: Arc<dyn Tokenizer>,
    format: JsonFormat,
}

impl DocumentChunker {
    /// Create a chunker counting tokens with `cl100k_base`.
    pub fn new(options: ChunkerOptions) -> Result<Self> {
        let tokenizer = TiktokenTokenizer::cl100k()?;
        Self::with_tokenizer(options, Arc::new(tokenizer))
    }

    /// Create a chunker with a custom tokenizer.
    pub fn with_tokenizer(options: ChunkerOptions, tokenizer: Arc<dyn Tokenizer>) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            tokenizer,
            format: JsonFormat::Pretty,
        })
    }

    /// Set the JSON layout of written artifacts.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    pub fn options(&self) -> &ChunkerOptions {
        &self.options
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    /// Run extraction and layout analysis. Images go to `image_dir` when
    /// given.
    pub fn analyze(&self, source: &dyn PageSource, image_dir: Option<&Path>) -> Result<Analysis> {
        let extraction = SpanExtractor::new(&self.options, image_dir).extract(source)?;
        let layout = LayoutPipeline::new(&self.options).run(extraction.spans, &extraction.pages);
        Ok(Analysis {
            pages: extraction.pages,
            raw_pages: extraction.raw_pages,
            image_failures: extraction.image_failures,
            layout,
        })
    }

    /// Chunk an ordered block list.
    pub fn chunk_blocks(
        &self,
        document_name: &str,
        blocks: Vec<Block>,
        output_dir: Option<&Path>,
    ) -> Vec<Chunk> {
        let chunker = Chunker::new(document_name, &self.options, self.tokenizer.as_ref());
        match output_dir {
            Some(dir) => chunker.with_output_dir(dir).chunk(blocks),
            None => chunker.chunk(blocks),
        }
    }

    /// Chunk a source in memory. Nothing is written; image chunks carry no
    /// paths.
    pub fn chunk_source(&self, document_name: &str, source: &dyn PageSource) -> Result<Vec<Chunk>> {
        let analysis = self.analyze(source, None)?;
        Ok(self.chunk_blocks(document_name, analysis.layout.blocks, None))
    }

    /// Process one document and write its artifacts under `output_dir`.
    ///
    /// `document_name` is recorded on every chunk; its file stem names the
    /// artifacts.
    pub fn process(
        &self,
        document_name: &str,
        source: &dyn PageSource,
        output_dir: &Path,
    ) -> Result<DocumentOutput> {
        let artifacts = ArtifactPaths::new(output_dir, artifact_stem(document_name));
        fs::create_dir_all(output_dir)?;

        let analysis = self.analyze(source, Some(&artifacts.images))?;
        let layout = analysis.layout;

        let mut stats = ChunkStats {
            pages: analysis.pages.len(),
            spans_extracted: layout.stats.spans_in,
            spans_dropped_margins: layout.stats.spans_dropped_margins,
            spans_dropped_toc: layout.stats.spans_dropped_toc,
            toc_pages: layout.stats.toc_pages.clone(),
            blocks: layout.blocks.len(),
            images_attached: layout.stats.images_attached,
            image_failures: analysis.image_failures,
            ..ChunkStats::default()
        };
        for block in &layout.blocks {
            *stats.blocks_by_kind.entry(block.kind).or_insert(0) += 1;
        }

        let spans_path = if self.options.export_spans {
            write_json(&artifacts.spans, &layout.spans, self.format)?;
            Some(artifacts.spans.clone())
        } else {
            None
        };
        let blocks_path = if self.options.export_blocks {
            write_json(&artifacts.blocks, &analysis.raw_pages, self.format)?;
            Some(artifacts.blocks.clone())
        } else {
            None
        };

        let chunks = self.chunk_blocks(document_name, layout.blocks, Some(output_dir));
        write_json(&artifacts.chunks, &chunks, self.format)?;

        stats.chunks = chunks.len();
        stats.total_tokens = chunks.iter().map(|c| c.token_count).sum();
        stats.chunks_below_min = chunks
            .iter()
            .filter(|c| c.token_count < self.options.min_tokens)
            .count();

        log::info!(
            "{}: {} pages, {} blocks, {} chunks ({} tokens)",
            document_name,
            stats.pages,
            stats.blocks,
            stats.chunks,
            stats.total_tokens
        );

        Ok(DocumentOutput {
            document_name: document_name.to_string(),
            chunks,
            stats,
            chunks_path: artifacts.chunks,
            spans_path,
            blocks_path,
        })
    }

    /// Open a PDF or page dump and process it.
    pub fn process_file<P: AsRef<Path>>(&self, path: P, output_dir: &Path) -> Result<DocumentOutput> {
        let path = path.as_ref();
        let source = open_path(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.process(&name, source.as_ref(), output_dir)
    }
}

/// Stem that names the artifacts of `document_name`.
pub fn artifact_stem(document_name: &str) -> &str {
    Path::new(document_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(document_name)
}
