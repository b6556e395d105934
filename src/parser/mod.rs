//! Layout analysis: spans to classified, ordered blocks.
//!
//! Stages run in a fixed order:
//!
//! 1. header/footer removal ([`MarginFilter`])
//! 2. TOC detection ([`TocDetector`])
//! 3. column clustering ([`assign_columns`])
//! 4. block grouping and classification ([`BlockGrouper`])
//! 5. table, caption, and sidebar reclassification ([`reclassify`])
//! 6. heading levels ([`assign_heading_levels`])
//! 7. image attachment ([`attach_images`])
//! 8. cross-page paragraph merging ([`merge_across_pages`])

mod classify;
mod columns;
mod extract;
mod fonts;
mod grouping;
mod headings;
mod images;
mod margins;
mod merge;
mod options;
pub mod patterns;
mod reclassify;
mod toc;

pub use classify::{classify, Candidate, Rule, RULES};
pub use columns::assign_columns;
pub use extract::{Extraction, SpanExtractor};
pub use fonts::{FontStatistics, LayoutContext, DEFAULT_BODY_SIZE};
pub use grouping::{merge_lines, BlockGrouper};
pub use headings::assign_heading_levels;
pub use images::attach_images;
pub use margins::{MarginFilter, SpanSignature};
pub use merge::merge_across_pages;
pub use options::ChunkerOptions;
pub use reclassify::{caption_pass, reclassify, sidebar_pass, table_pass, Pass, PASSES};
pub use toc::TocDetector;

use serde::Serialize;

use crate::model::{Block, PageInfo, Span};

/// Counters collected while running the layout stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutStats {
    pub spans_in: usize,
    pub spans_dropped_margins: usize,
    pub spans_dropped_toc: usize,
    pub toc_pages: Vec<u32>,
    /// Highest column count on any page
    pub max_columns: usize,
    pub images_attached: usize,
    pub blocks: usize,
}

/// Result of the layout stages.
#[derive(Debug, Clone, Default)]
pub struct LayoutOutput {
    /// Surviving spans with column ids
    pub spans: Vec<Span>,
    /// Final ordered blocks
    pub blocks: Vec<Block>,
    pub stats: LayoutStats,
}

/// Runs the layout stages over extracted spans.
pub struct LayoutPipeline<'a> {
    options: &'a ChunkerOptions,
}

impl<'a> LayoutPipeline<'a> {
    pub fn new(options: &'a ChunkerOptions) -> Self {
        Self { options }
    }

    pub fn run(&self, spans: Vec<Span>, pages: &[PageInfo]) -> LayoutOutput {
        let mut stats = LayoutStats {
            spans_in: spans.len(),
            ..LayoutStats::default()
        };
        let geometry = LayoutContext::new(pages);

        let (spans, dropped) = MarginFilter::new(self.options).filter(spans, &geometry);
        stats.spans_dropped_margins = dropped;

        let before_toc = spans.len();
        let (mut spans, toc_pages) = TocDetector::new(self.options).filter(spans, &geometry);
        stats.spans_dropped_toc = before_toc - spans.len();
        stats.toc_pages = toc_pages.into_iter().collect();

        stats.max_columns = assign_columns(&mut spans, self.options.column_gap);

        let ctx = geometry.with_fonts(&spans);
        let mut blocks = BlockGrouper::new(self.options).group(spans.clone(), &ctx);
        reclassify(&mut blocks, &ctx);
        assign_heading_levels(&mut blocks);
        stats.images_attached = attach_images(&mut blocks, &ctx, self.options);
        let blocks = merge_across_pages(blocks, self.options);
        stats.blocks = blocks.len();

        log::debug!(
            "Layout: {} spans in, {} blocks out, TOC pages {:?}",
            stats.spans_in,
            stats.blocks,
            stats.toc_pages
        );

        LayoutOutput {
            spans,
            blocks,
            stats,
        }
    }
}
