//! Classified blocks.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BBox, Span};

/// Structural classification of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading,
    Paragraph,
    ListItem,
    Table,
    Caption,
    Sidebar,
    Image,
}

impl BlockKind {
    /// Stable lowercase name used in artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Heading => "heading",
            BlockKind::Paragraph => "paragraph",
            BlockKind::ListItem => "list_item",
            BlockKind::Table => "table",
            BlockKind::Caption => "caption",
            BlockKind::Sidebar => "sidebar",
            BlockKind::Image => "image",
        }
    }

    /// Running prose: paragraphs and list items may share a chunk.
    pub fn is_flowing(&self) -> bool {
        matches!(self, BlockKind::Paragraph | BlockKind::ListItem)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A grouped, classified run of spans forming one structural unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    /// Normalized text
    pub text: String,
    /// Page the block starts on
    pub page: u32,
    /// Heading depth; set only on headings
    #[serde(default)]
    pub heading_level: Option<u8>,
    #[serde(default)]
    pub is_process_step: bool,
    /// Persisted images belonging to this block
    #[serde(default)]
    pub image_paths: Vec<String>,
    pub spans: Vec<Span>,
}

impl Block {
    /// Create a block.
    pub fn new(kind: BlockKind, text: impl Into<String>, page: u32, spans: Vec<Span>) -> Self {
        Self {
            kind,
            text: text.into(),
            page,
            heading_level: None,
            is_process_step: false,
            image_paths: Vec::new(),
            spans,
        }
    }

    /// Create a singleton image block from an image span.
    pub fn image(span: Span) -> Self {
        let mut block = Self::new(BlockKind::Image, String::new(), span.page, Vec::new());
        if let Some(path) = &span.image_path {
            block.image_paths.push(path.clone());
        }
        block.spans.push(span);
        block
    }

    pub fn is_heading(&self) -> bool {
        self.kind == BlockKind::Heading
    }

    pub fn is_image(&self) -> bool {
        self.kind == BlockKind::Image
    }

    /// Union of the span boxes.
    pub fn bbox(&self) -> BBox {
        BBox::union_all(self.spans.iter().map(|s| &s.bbox)).unwrap_or_default()
    }

    /// Mean font size over the text spans, 0 when there are none.
    pub fn font_size(&self) -> f32 {
        let sizes: Vec<f32> = self
            .spans
            .iter()
            .filter(|s| !s.is_image)
            .map(|s| s.font_size)
            .collect();
        if sizes.is_empty() {
            return 0.0;
        }
        sizes.iter().sum::<f32>() / sizes.len() as f32
    }

    /// Page of the last span; differs from `page` after a cross-page merge.
    pub fn last_page(&self) -> u32 {
        self.spans.last().map(|s| s.page).unwrap_or(self.page)
    }

    /// Pages touched by this block.
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        std::iter::once(self.page).chain(self.spans.iter().map(|s| s.page))
    }
}
