//! Table, caption, and sidebar reclassification.
//!
//! Each pass reads the current blocks and returns the kind every block
//! should have afterwards. Passes run in order, so later passes see the
//! results of earlier ones.

use std::collections::BTreeSet;

use crate::model::{Block, BlockKind};

use super::patterns;
use super::LayoutContext;

/// A reclassification pass.
pub type Pass = fn(&[Block], &LayoutContext) -> Vec<BlockKind>;

/// Minimum spans in a table block.
const TABLE_MIN_SPANS: usize = 5;
/// Minimum distinct 10-point x buckets in a table block.
const TABLE_MIN_X_BUCKETS: usize = 2;
/// Small-print ratio for captions identified by adjacency.
const CAPTION_SIZE_RATIO: f32 = 0.9;
/// Sidebars are narrower than this fraction of the page width.
const SIDEBAR_WIDTH_FRACTION: f32 = 0.4;
/// Sidebars sit within this many points of a page edge.
const SIDEBAR_EDGE_DISTANCE: f32 = 50.0;

pub const PASSES: &[(&str, Pass)] = &[
    ("table", table_pass),
    ("caption", caption_pass),
    ("sidebar", sidebar_pass),
];

/// Run every pass in order over `blocks`.
pub fn reclassify(blocks: &mut [Block], ctx: &LayoutContext) {
    for (name, pass) in PASSES {
        let kinds = pass(blocks, ctx);
        let mut changed = 0;
        for (block, kind) in blocks.iter_mut().zip(kinds) {
            if block.kind != kind {
                block.kind = kind;
                if kind != BlockKind::Heading {
                    block.heading_level = None;
                }
                changed += 1;
            }
        }
        log::debug!("Reclassify {}: {} blocks changed", name, changed);
    }
}

/// Many spans spread over several x positions.
pub fn table_pass(blocks: &[Block], _ctx: &LayoutContext) -> Vec<BlockKind> {
    blocks
        .iter()
        .map(|block| {
            if block.is_image() {
                return block.kind;
            }
            let buckets: BTreeSet<i32> = block
                .spans
                .iter()
                .map(|s| (s.bbox.x0 / 10.0).round() as i32)
                .collect();
            if block.spans.len() > TABLE_MIN_SPANS && buckets.len() >= TABLE_MIN_X_BUCKETS {
                BlockKind::Table
            } else {
                block.kind
            }
        })
        .collect()
}

/// Caption-labelled small print, or small paragraphs right before or after
/// a table or image. Headings are not exempt from the label rule.
pub fn caption_pass(blocks: &[Block], ctx: &LayoutContext) -> Vec<BlockKind> {
    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            if matches!(block.kind, BlockKind::Image | BlockKind::Table) {
                return block.kind;
            }
            let size = block.font_size();
            let average = ctx.average_size(block.page);

            if patterns::is_caption_text(&block.text) && size < average {
                return BlockKind::Caption;
            }

            let near_figure = |j: Option<usize>| {
                j.and_then(|j| blocks.get(j))
                    .is_some_and(|other| matches!(other.kind, BlockKind::Table | BlockKind::Image))
            };
            if block.kind == BlockKind::Paragraph
                && size < CAPTION_SIZE_RATIO * average
                && (near_figure(i.checked_sub(1)) || near_figure(Some(i + 1)))
            {
                return BlockKind::Caption;
            }
            block.kind
        })
        .collect()
}

/// Narrow text hugging a page edge.
pub fn sidebar_pass(blocks: &[Block], ctx: &LayoutContext) -> Vec<BlockKind> {
    blocks
        .iter()
        .map(|block| {
            if matches!(block.kind, BlockKind::Heading | BlockKind::Image) {
                return block.kind;
            }
            let page = ctx.page(block.page);
            let bbox = block.bbox();
            let narrow = bbox.width() < SIDEBAR_WIDTH_FRACTION * page.width;
            let at_edge = bbox.x0 < SIDEBAR_EDGE_DISTANCE
                || bbox.x1 > page.width - SIDEBAR_EDGE_DISTANCE;
            if narrow && at_edge {
                BlockKind::Sidebar
            } else {
                block.kind
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, PageInfo, Span};

    fn text_block(kind: BlockKind, text: &str, size: f32, bbox: BBox) -> Block {
        Block::new(
            kind,
            text,
            1,
            vec![Span::text(text, size, false, bbox, 1, 0, 0)],
        )
    }

    fn ctx_with(blocks: &[Block]) -> LayoutContext {
        let spans: Vec<Span> = blocks.iter().flat_map(|b| b.spans.clone()).collect();
        LayoutContext::new(&[PageInfo::letter(1)]).with_fonts(&spans)
    }

    const BODY: BBox = BBox {
        x0: 72.0,
        y0: 100.0,
        x1: 540.0,
        y1: 112.0,
    };

    #[test]
    fn test_table_detected() {
        let spans: Vec<Span> = (0..6)
            .map(|i| {
                let x = 72.0 + (i % 3) as f32 * 120.0;
                Span::text("cell", 10.0, false, BBox::new(x, 100.0, x + 60.0, 112.0), 1, 0, i / 3)
            })
            .collect();
        let blocks = vec![Block::new(BlockKind::Paragraph, "cells", 1, spans)];
        let kinds = table_pass(&blocks, &ctx_with(&blocks));
        assert_eq!(kinds, vec![BlockKind::Table]);
    }

    #[test]
    fn test_single_column_lines_not_table() {
        let spans: Vec<Span> = (0..8)
            .map(|i| Span::text("line", 10.0, false, BODY, 1, 0, i))
            .collect();
        let blocks = vec![Block::new(BlockKind::Paragraph, "lines", 1, spans)];
        assert_eq!(
            table_pass(&blocks, &ctx_with(&blocks)),
            vec![BlockKind::Paragraph]
        );
    }

    #[test]
    fn test_caption_by_label() {
        let blocks = vec![
            text_block(BlockKind::Paragraph, "Body text here", 11.0, BODY),
            text_block(BlockKind::Paragraph, "More body text", 11.0, BODY),
            text_block(BlockKind::Paragraph, "Figure 2: Pump", 8.0, BODY),
        ];
        let kinds = caption_pass(&blocks, &ctx_with(&blocks));
        assert_eq!(kinds[2], BlockKind::Caption);
        assert_eq!(kinds[0], BlockKind::Paragraph);
    }

    #[test]
    fn test_caption_by_adjacency() {
        let blocks = vec![
            text_block(BlockKind::Paragraph, "Body text here", 11.0, BODY),
            Block::image(Span::image(BBox::new(72.0, 200.0, 300.0, 400.0), 1, 1, None)),
            text_block(BlockKind::Paragraph, "Pump housing, side view", 8.0, BODY),
            text_block(BlockKind::Paragraph, "Body text again", 11.0, BODY),
        ];
        let kinds = caption_pass(&blocks, &ctx_with(&blocks));
        assert_eq!(
            kinds,
            vec![
                BlockKind::Paragraph,
                BlockKind::Image,
                BlockKind::Caption,
                BlockKind::Paragraph
            ]
        );
    }

    #[test]
    fn test_small_bold_caption_heading_becomes_caption() {
        let mut label = Block::new(
            BlockKind::Heading,
            "Figure 3: Pump assembly",
            1,
            vec![Span::text("Figure 3: Pump assembly", 8.0, true, BODY, 1, 1, 0)],
        );
        label.heading_level = Some(1);
        let mut blocks = vec![
            text_block(BlockKind::Paragraph, "The pump sits on a base plate.", 10.0, BODY),
            label,
            text_block(BlockKind::Paragraph, "Bolt the base to the floor.", 10.0, BODY),
        ];
        let ctx = ctx_with(&blocks);
        reclassify(&mut blocks, &ctx);
        assert_eq!(blocks[1].kind, BlockKind::Caption);
        assert_eq!(blocks[1].heading_level, None);
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
    }

    #[test]
    fn test_caption_by_adjacency_across_page_break() {
        let small = Span::text("Pump housing, side view", 8.0, false, BODY, 2, 0, 0);
        let body = Span::text("Body text again", 11.0, false, BODY, 2, 1, 0);
        let blocks = vec![
            text_block(BlockKind::Paragraph, "Body text here", 11.0, BODY),
            Block::image(Span::image(BBox::new(72.0, 500.0, 300.0, 700.0), 1, 1, None)),
            Block::new(BlockKind::Paragraph, "Pump housing, side view", 2, vec![small]),
            Block::new(BlockKind::Paragraph, "Body text again", 2, vec![body]),
        ];
        let kinds = caption_pass(&blocks, &ctx_with(&blocks));
        assert_eq!(kinds[2], BlockKind::Caption);
        assert_eq!(kinds[3], BlockKind::Paragraph);
    }

    #[test]
    fn test_sidebar() {
        let blocks = vec![
            text_block(BlockKind::Paragraph, "Note", 9.0, BBox::new(20.0, 300.0, 150.0, 312.0)),
            text_block(BlockKind::Paragraph, "Body", 10.0, BODY),
            text_block(BlockKind::Heading, "Tip", 12.0, BBox::new(20.0, 320.0, 60.0, 332.0)),
        ];
        let kinds = sidebar_pass(&blocks, &ctx_with(&blocks));
        assert_eq!(
            kinds,
            vec![BlockKind::Sidebar, BlockKind::Paragraph, BlockKind::Heading]
        );
    }

    #[test]
    fn test_passes_run_in_order() {
        let spans: Vec<Span> = (0..6)
            .map(|i| {
                let x = 72.0 + (i % 2) as f32 * 200.0;
                Span::text("v", 10.0, false, BBox::new(x, 100.0, x + 60.0, 112.0), 1, 0, i / 2)
            })
            .collect();
        let mut blocks = vec![
            Block::new(BlockKind::Paragraph, "table", 1, spans),
            text_block(BlockKind::Paragraph, "Limits per model", 7.0, BODY),
            text_block(BlockKind::Paragraph, "Ordinary paragraph text", 10.0, BODY),
        ];
        let ctx = ctx_with(&blocks);
        reclassify(&mut blocks, &ctx);
        assert_eq!(blocks[0].kind, BlockKind::Table);
        assert_eq!(blocks[1].kind, BlockKind::Caption);
        assert_eq!(blocks[2].kind, BlockKind::Paragraph);
    }
}
