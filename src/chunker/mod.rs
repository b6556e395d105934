//! Heading-aware, token-budgeted chunking.
//!
//! Blocks are consumed in order while a heading stack tracks the current
//! ancestry. A chunk is sealed when a breaking heading arrives, when the
//! page changes, when a non-flowing kind meets a different kind, or when the
//! token budget would be exceeded. Chunks made only of headings are dropped
//! without consuming an id.

mod tokenizer;

pub use tokenizer::{TiktokenTokenizer, Tokenizer, WhitespaceTokenizer};

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::model::{Block, BlockKind, Chunk, ChunkType};
use crate::parser::{patterns, ChunkerOptions};
use crate::text::TextNormalizer;

/// Splits an ordered block list into chunks for one document.
pub struct Chunker<'a> {
    options: &'a ChunkerOptions,
    tokenizer: &'a dyn Tokenizer,
    normalizer: TextNormalizer,
    document_name: String,
    output_dir: Option<PathBuf>,

    pending: Vec<Block>,
    heading_path: Vec<String>,
    next_id: u32,
    chunks: Vec<Chunk>,
}

impl<'a> Chunker<'a> {
    pub fn new(
        document_name: impl Into<String>,
        options: &'a ChunkerOptions,
        tokenizer: &'a dyn Tokenizer,
    ) -> Self {
        Self {
            options,
            tokenizer,
            normalizer: TextNormalizer::new(),
            document_name: document_name.into(),
            output_dir: None,
            pending: Vec::new(),
            heading_path: Vec::new(),
            next_id: 1,
            chunks: Vec::new(),
        }
    }

    /// Rewrite image paths relative to `dir`.
    pub fn with_output_dir(mut self, dir: &Path) -> Self {
        self.output_dir = Some(dir.to_path_buf());
        self
    }

    /// Chunk all blocks and return the sealed chunks.
    pub fn chunk(mut self, blocks: Vec<Block>) -> Vec<Chunk> {
        for block in blocks {
            self.push(block);
        }
        self.flush();
        log::debug!(
            "{}: {} chunks",
            self.document_name,
            self.chunks.len()
        );
        self.chunks
    }

    fn push(&mut self, block: Block) {
        if block.is_heading() {
            self.push_heading(block);
            return;
        }

        if let Some(last) = self.pending.last() {
            let kind_break = last.kind != block.kind
                && !(last.kind.is_flowing() && block.kind.is_flowing());
            if last.page != block.page || kind_break {
                self.flush();
            }
        }

        if !self.pending.is_empty() {
            let candidate = self.compose(self.pending.iter().chain(std::iter::once(&block)));
            if self.tokenizer.count(&candidate) > self.options.max_tokens {
                self.flush();
            }
        }
        self.pending.push(block);
    }

    fn push_heading(&mut self, block: Block) {
        let level = usize::from(block.heading_level.unwrap_or(1).max(1));
        let numbered = patterns::numeric_prefix(&block.text).is_some();
        let breaks = !numbered || level <= usize::from(self.options.heading_break_level);

        if breaks {
            self.flush();
        }
        self.heading_path.truncate(level - 1);
        self.heading_path.push(block.text.clone());
        self.pending.push(block);
    }

    /// Normalized chunk text for `blocks`, as it would be emitted.
    fn compose<'b>(&self, blocks: impl Iterator<Item = &'b Block>) -> String {
        let joined = blocks
            .map(|b| b.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        self.normalizer.normalize(&joined)
    }

    fn flush(&mut self) {
        let blocks = std::mem::take(&mut self.pending);
        if blocks.is_empty() || blocks.iter().all(Block::is_heading) {
            return;
        }

        let text = self.compose(blocks.iter());
        let token_count = self.tokenizer.count(&text);

        let chunk_type = ChunkType::from_kinds(blocks.iter().map(|b| b.kind));
        let block_kinds: Vec<BlockKind> = blocks
            .iter()
            .map(|b| b.kind)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let pages: Vec<u32> = blocks
            .iter()
            .flat_map(Block::pages)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let blocks: Vec<Block> = blocks
            .into_iter()
            .map(|block| self.rewrite_paths(block))
            .collect();
        let mut seen = HashSet::new();
        let image_paths: Vec<String> = blocks
            .iter()
            .flat_map(|b| b.image_paths.iter())
            .filter(|p| seen.insert(p.as_str()))
            .cloned()
            .collect();

        if token_count < self.options.min_tokens {
            log::debug!(
                "{}: chunk {} has {} tokens, below {}",
                self.document_name,
                self.next_id,
                token_count,
                self.options.min_tokens
            );
        }

        self.chunks.push(Chunk {
            document_name: self.document_name.clone(),
            chunk_id: self.next_id,
            pages,
            heading_path: self.heading_path.clone(),
            text,
            token_count,
            chunk_type,
            image_paths,
            block_kinds,
            blocks,
        });
        self.next_id += 1;
    }

    fn rewrite_paths(&self, mut block: Block) -> Block {
        let Some(dir) = self.output_dir.as_deref() else {
            return block;
        };
        for path in &mut block.image_paths {
            *path = relative_path(path, dir);
        }
        for span in &mut block.spans {
            if let Some(path) = span.image_path.as_mut() {
                *path = relative_path(path, dir);
            }
        }
        block
    }
}

/// `path` relative to `base` with forward slashes; unchanged when `path`
/// lies outside `base`.
pub fn relative_path(path: &str, base: &Path) -> String {
    match Path::new(path).strip_prefix(base) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string(),
    }
}
