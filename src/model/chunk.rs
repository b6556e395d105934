//! Final retrieval chunks.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Block, BlockKind};

/// Classification of a whole chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Heading,
    Paragraph,
    ListItem,
    Table,
    Caption,
    Sidebar,
    Image,
    /// Blocks of more than one kind
    Mixed,
}

impl ChunkType {
    /// Derive the chunk type from the kinds of its blocks.
    ///
    /// All images gives `Image`, one shared kind gives that kind, anything
    /// else is `Mixed`.
    pub fn from_kinds<I>(kinds: I) -> ChunkType
    where
        I: IntoIterator<Item = BlockKind>,
    {
        let mut iter = kinds.into_iter();
        let Some(first) = iter.next() else {
            return ChunkType::Mixed;
        };
        if iter.all(|k| k == first) {
            first.into()
        } else {
            ChunkType::Mixed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Heading => "heading",
            ChunkType::Paragraph => "paragraph",
            ChunkType::ListItem => "list_item",
            ChunkType::Table => "table",
            ChunkType::Caption => "caption",
            ChunkType::Sidebar => "sidebar",
            ChunkType::Image => "image",
            ChunkType::Mixed => "mixed",
        }
    }
}

impl From<BlockKind> for ChunkType {
    fn from(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Heading => ChunkType::Heading,
            BlockKind::Paragraph => ChunkType::Paragraph,
            BlockKind::ListItem => ChunkType::ListItem,
            BlockKind::Table => ChunkType::Table,
            BlockKind::Caption => ChunkType::Caption,
            BlockKind::Sidebar => ChunkType::Sidebar,
            BlockKind::Image => ChunkType::Image,
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token-budgeted, heading-aware unit of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub document_name: String,
    /// 1-based, strictly increasing within a document
    pub chunk_id: u32,
    /// Sorted, de-duplicated page numbers
    pub pages: Vec<u32>,
    /// Ancestor heading texts active when the chunk was sealed
    pub heading_path: Vec<String>,
    pub text: String,
    pub token_count: usize,
    pub chunk_type: ChunkType,
    /// Image paths relative to the output directory
    pub image_paths: Vec<String>,
    /// Sorted distinct kinds of the contributing blocks
    pub block_kinds: Vec<BlockKind>,
    pub blocks: Vec<Block>,
}

impl Chunk {
    /// Whether every contributing block is a heading.
    pub fn is_heading_only(&self) -> bool {
        self.blocks.iter().all(Block::is_heading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_type_uniform() {
        let t = ChunkType::from_kinds([BlockKind::Paragraph, BlockKind::Paragraph]);
        assert_eq!(t, ChunkType::Paragraph);
    }

    #[test]
    fn test_chunk_type_images() {
        let t = ChunkType::from_kinds([BlockKind::Image, BlockKind::Image]);
        assert_eq!(t, ChunkType::Image);
    }

    #[test]
    fn test_chunk_type_mixed() {
        let t = ChunkType::from_kinds([BlockKind::Paragraph, BlockKind::ListItem]);
        assert_eq!(t, ChunkType::Mixed);
        assert_eq!(t.to_string(), "mixed");
    }

    #[test]
    fn test_chunk_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ChunkType::ListItem).unwrap(),
            "\"list_item\""
        );
    }
}
