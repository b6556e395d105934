//! Decoded page primitives.
//!
//! A [`Page`] is what a page source hands to the span extractor: the page
//! size plus a tree of text and image primitives. The same types are written
//! to `<doc>_blocks.json` when a raw dump is requested, so a dump can be
//! loaded back and re-chunked.

use serde::{Deserialize, Serialize};

use super::BBox;

/// A single decoded page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Primitives in content order
    pub primitives: Vec<Primitive>,
}

impl Page {
    /// Create a new page with the given dimensions.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            primitives: Vec::new(),
        }
    }

    /// Create a new page with standard Letter size (8.5 x 11 inches).
    pub fn letter(number: u32) -> Self {
        Self::new(number, 612.0, 792.0) // 8.5 * 72, 11 * 72
    }

    /// Create a new page with standard A4 size (210 x 297 mm).
    pub fn a4(number: u32) -> Self {
        Self::new(number, 595.0, 842.0)
    }

    /// Add a primitive to the page.
    pub fn add_primitive(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    /// Add a text block made of the given lines.
    pub fn add_text(&mut self, lines: Vec<TextLine>) {
        let bbox = BBox::union_all(lines.iter().map(|l| &l.bbox)).unwrap_or_default();
        self.primitives.push(Primitive::Text { bbox, lines });
    }

    /// Add an image primitive.
    pub fn add_image(&mut self, bbox: BBox, image: ImageData) {
        self.primitives.push(Primitive::Image { bbox, image });
    }

    /// Page geometry without the primitives.
    pub fn info(&self) -> PageInfo {
        PageInfo::new(self.number, self.width, self.height)
    }

    /// Check if the page has no primitives.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

/// A primitive block on a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    /// A block of text lines
    Text {
        bbox: BBox,
        lines: Vec<TextLine>,
    },

    /// A placed raster image
    Image {
        bbox: BBox,
        /// Image payload; never serialized into dumps
        #[serde(skip, default)]
        image: ImageData,
    },
}

impl Primitive {
    pub fn bbox(&self) -> &BBox {
        match self {
            Primitive::Text { bbox, .. } | Primitive::Image { bbox, .. } => bbox,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Primitive::Image { .. })
    }
}

/// A line inside a text primitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub bbox: BBox,
    pub runs: Vec<TextRun>,
}

impl TextLine {
    /// Build a line whose box is the union of its runs.
    pub fn from_runs(runs: Vec<TextRun>) -> Self {
        let bbox = BBox::union_all(runs.iter().map(|r| &r.bbox)).unwrap_or_default();
        Self { bbox, runs }
    }
}

/// A run of text sharing one font.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    /// Font size in points
    pub font_size: f32,
    pub bold: bool,
    pub bbox: BBox,
}

impl TextRun {
    pub fn new(text: impl Into<String>, font_size: f32, bold: bool, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            font_size,
            bold,
            bbox,
        }
    }
}

/// Raw image payload as delivered by the page source.
#[derive(Debug, Clone, Default)]
pub enum ImageData {
    /// Self-describing encoded bytes (JPEG, PNG)
    Encoded(Vec<u8>),

    /// Uncompressed samples, 8 bits per component
    Raw {
        width: u32,
        height: u32,
        /// 1 = gray, 3 = RGB, 4 = CMYK
        components: u8,
        samples: Vec<u8>,
    },

    /// No payload available
    #[default]
    Missing,
}

/// Page geometry used by the layout stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub number: u32,
    pub width: f32,
    pub height: f32,
}

impl PageInfo {
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
        }
    }

    /// Letter-sized fallback for pages the source did not describe.
    pub fn letter(number: u32) -> Self {
        Self::new(number, 612.0, 792.0)
    }
}
