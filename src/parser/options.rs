//! Chunking options and configuration.

use crate::error::{Error, Result};

/// Options for turning a document into chunks.
///
/// Built once per chunker and passed by reference into every stage.
#[derive(Debug, Clone)]
pub struct ChunkerOptions {
    /// Maximum tokens per chunk
    pub max_tokens: usize,

    /// Advisory minimum tokens per chunk; only reported, never enforced
    pub min_tokens: usize,

    /// Numbered headings at or above this level (numerically <=) open a new chunk
    pub heading_break_level: u8,

    /// Drop repeated spans in the top margin
    pub remove_headers: bool,

    /// Drop repeated spans in the bottom margin
    pub remove_footers: bool,

    /// Top margin zone as a fraction of page height
    pub header_zone: f32,

    /// Bottom margin zone as a fraction of page height
    pub footer_zone: f32,

    /// Distinct pages a signature must appear on to count as repeated
    pub min_repeat_pages: usize,

    /// Keep table-of-contents pages
    pub include_toc: bool,

    /// Last page number examined by the TOC detector
    pub toc_max_page: u32,

    /// Fraction of TOC-like lines that marks a page as TOC
    pub toc_line_ratio: f32,

    /// Maximum words in a heading
    pub heading_max_words: usize,

    /// Maximum characters in a heading
    pub heading_max_chars: usize,

    /// Font size ratio over the body size that suggests a heading
    pub heading_size_ratio: f32,

    /// Horizontal midpoint gap that separates columns (points)
    pub column_gap: f32,

    /// Decode and persist images
    pub extract_images: bool,

    /// JPEG quality for persisted images (1-100)
    pub image_quality: u8,

    /// Maximum distance between an image and the block above it, as a
    /// fraction of page height
    pub image_attach_distance: f32,

    /// Images starting above this fraction of page height may attach to the
    /// previous page
    pub image_top_fraction: f32,

    /// A paragraph starting within this many points of the page top may
    /// continue the previous page's paragraph
    pub cross_page_top: f32,

    /// Write `<doc>_spans.json`
    pub export_spans: bool,

    /// Write `<doc>_blocks.json`
    pub export_blocks: bool,

    /// Process batch documents in parallel
    pub parallel: bool,
}

impl ChunkerOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the token window.
    pub fn with_token_window(mut self, min_tokens: usize, max_tokens: usize) -> Self {
        self.min_tokens = min_tokens;
        self.max_tokens = max_tokens;
        self
    }

    /// Set the maximum tokens per chunk.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the heading level threshold for numbered headings.
    pub fn with_heading_break_level(mut self, level: u8) -> Self {
        self.heading_break_level = level;
        self
    }

    /// Enable or disable header removal.
    pub fn with_header_removal(mut self, remove: bool) -> Self {
        self.remove_headers = remove;
        self
    }

    /// Enable or disable footer removal.
    pub fn with_footer_removal(mut self, remove: bool) -> Self {
        self.remove_footers = remove;
        self
    }

    /// Set the margin zones as fractions of page height.
    pub fn with_margin_zones(mut self, header: f32, footer: f32) -> Self {
        self.header_zone = header;
        self.footer_zone = footer;
        self
    }

    /// Set how many pages a signature must repeat on.
    pub fn with_min_repeat_pages(mut self, pages: usize) -> Self {
        self.min_repeat_pages = pages;
        self
    }

    /// Keep or drop table-of-contents pages.
    pub fn with_toc(mut self, include: bool) -> Self {
        self.include_toc = include;
        self
    }

    /// Set the TOC page ceiling and line ratio.
    pub fn with_toc_detection(mut self, max_page: u32, line_ratio: f32) -> Self {
        self.toc_max_page = max_page;
        self.toc_line_ratio = line_ratio;
        self
    }

    /// Set heading length limits.
    pub fn with_heading_limits(mut self, max_words: usize, max_chars: usize) -> Self {
        self.heading_max_words = max_words;
        self.heading_max_chars = max_chars;
        self
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Enable or disable the span dump.
    pub fn with_span_export(mut self, export: bool) -> Self {
        self.export_spans = export;
        self
    }

    /// Enable or disable the raw primitive dump.
    pub fn with_block_export(mut self, export: bool) -> Self {
        self.export_blocks = export;
        self
    }

    /// Enable or disable parallel batch processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel batch processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(Error::InvalidConfig("max_tokens must be positive".into()));
        }
        if self.min_tokens > self.max_tokens {
            return Err(Error::InvalidConfig(format!(
                "min_tokens ({}) exceeds max_tokens ({})",
                self.min_tokens, self.max_tokens
            )));
        }
        if self.heading_break_level == 0 {
            return Err(Error::InvalidConfig(
                "heading_break_level must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("header_zone", self.header_zone),
            ("footer_zone", self.footer_zone),
            ("toc_line_ratio", self.toc_line_ratio),
            ("image_attach_distance", self.image_attach_distance),
            ("image_top_fraction", self.image_top_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be within 0.0..=1.0, got {}",
                    name, value
                )));
            }
        }
        if self.image_quality == 0 || self.image_quality > 100 {
            return Err(Error::InvalidConfig(format!(
                "image_quality must be within 1..=100, got {}",
                self.image_quality
            )));
        }
        Ok(())
    }
}

impl Default for ChunkerOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1500,
            min_tokens: 50,
            heading_break_level: 2,
            remove_headers: true,
            remove_footers: true,
            header_zone: 0.10,
            footer_zone: 0.10,
            min_repeat_pages: 3,
            include_toc: false,
            toc_max_page: 10,
            toc_line_ratio: 0.20,
            heading_max_words: 12,
            heading_max_chars: 120,
            heading_size_ratio: 1.05,
            column_gap: 100.0,
            extract_images: true,
            image_quality: 90,
            image_attach_distance: 0.25,
            image_top_fraction: 0.15,
            cross_page_top: 100.0,
            export_spans: false,
            export_blocks: false,
            parallel: true,
        }
    }
}
