//! Grouping spans into classified blocks.
//!
//! Two passes: spans sharing (page, block, line, column) merge into one line
//! span, then line spans sharing (page, block) gather into a block which is
//! classified when the key changes. Image spans always become singleton
//! image blocks.

use std::collections::HashMap;

use crate::model::{Block, Span};
use crate::text::TextNormalizer;

use super::classify::{classify, Candidate};
use super::patterns;
use super::{ChunkerOptions, LayoutContext};

type LineKey = (u32, usize, usize, usize);

/// Builds classified blocks from column-assigned spans.
pub struct BlockGrouper<'a> {
    options: &'a ChunkerOptions,
    normalizer: TextNormalizer,
}

impl<'a> BlockGrouper<'a> {
    pub fn new(options: &'a ChunkerOptions) -> Self {
        Self {
            options,
            normalizer: TextNormalizer::new(),
        }
    }

    /// Group and classify.
    pub fn group(&self, spans: Vec<Span>, ctx: &LayoutContext) -> Vec<Block> {
        let mut lines = merge_lines(spans);
        lines.sort_by(|a, b| {
            (a.page, a.block_no, a.line_no)
                .cmp(&(b.page, b.block_no, b.line_no))
                .then(a.bbox.y0.total_cmp(&b.bbox.y0))
        });

        let mut blocks = Vec::new();
        let mut pending: Vec<Span> = Vec::new();

        for span in lines {
            if span.is_image {
                self.flush(&mut pending, ctx, &mut blocks);
                blocks.push(Block::image(span));
                continue;
            }
            if let Some(last) = pending.last() {
                if (last.page, last.block_no) != (span.page, span.block_no) {
                    self.flush(&mut pending, ctx, &mut blocks);
                }
            }
            pending.push(span);
        }
        self.flush(&mut pending, ctx, &mut blocks);

        log::debug!("Grouped {} blocks", blocks.len());
        blocks
    }

    fn flush(&self, pending: &mut Vec<Span>, ctx: &LayoutContext, blocks: &mut Vec<Block>) {
        if pending.is_empty() {
            return;
        }
        let spans = std::mem::take(pending);
        let joined = spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let text = self.normalizer.normalize_inline(&joined);
        if text.is_empty() {
            return;
        }

        let page = spans[0].page;
        let kind = classify(
            &Candidate {
                text: &text,
                spans: &spans,
                body_size: ctx.body_size(page),
            },
            self.options,
        );

        let mut block = Block::new(kind, text, page, spans);
        block.is_process_step = patterns::is_process_step(&block.text);
        blocks.push(block);
    }
}

/// Merge spans that share (page, block, line, column) into one span each,
/// in first-occurrence order. Image spans pass through unchanged.
pub fn merge_lines(spans: Vec<Span>) -> Vec<Span> {
    struct Acc {
        span: Span,
        sizes: Vec<f32>,
    }

    let mut merged: Vec<Acc> = Vec::new();
    let mut index: HashMap<LineKey, usize> = HashMap::new();

    for span in spans {
        if span.is_image {
            merged.push(Acc {
                span,
                sizes: Vec::new(),
            });
            continue;
        }
        let key = (span.page, span.block_no, span.line_no, span.column_id);
        match index.get(&key) {
            Some(&i) => {
                let acc = &mut merged[i];
                acc.span.text.push(' ');
                acc.span.text.push_str(&span.text);
                acc.span.bold &= span.bold;
                acc.span.bbox = acc.span.bbox.union(&span.bbox);
                acc.sizes.push(span.font_size);
            }
            None => {
                index.insert(key, merged.len());
                let size = span.font_size;
                merged.push(Acc {
                    span,
                    sizes: vec![size],
                });
            }
        }
    }

    merged
        .into_iter()
        .map(|mut acc| {
            if !acc.sizes.is_empty() {
                acc.span.font_size = acc.sizes.iter().sum::<f32>() / acc.sizes.len() as f32;
            }
            acc.span
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, BlockKind, PageInfo};

    fn span(text: &str, bold: bool, block: usize, line: usize, x0: f32, y0: f32) -> Span {
        Span::text(
            text,
            10.0,
            bold,
            BBox::new(x0, y0, x0 + 40.0, y0 + 12.0),
            1,
            block,
            line,
        )
    }

    fn ctx(spans: &[Span]) -> LayoutContext {
        LayoutContext::new(&[PageInfo::letter(1)]).with_fonts(spans)
    }

    #[test]
    fn test_merge_lines_joins_runs() {
        let mut a = span("Hello", true, 0, 0, 72.0, 100.0);
        a.font_size = 10.0;
        let mut b = span("world", false, 0, 0, 120.0, 100.0);
        b.font_size = 12.0;
        let merged = merge_lines(vec![a, b, span("next", false, 0, 1, 72.0, 114.0)]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "Hello world");
        assert!(!merged[0].bold);
        assert_eq!(merged[0].font_size, 11.0);
        assert_eq!(merged[0].bbox, BBox::new(72.0, 100.0, 160.0, 112.0));
    }

    #[test]
    fn test_merge_lines_respects_columns() {
        let mut left = span("left", false, 0, 0, 72.0, 100.0);
        let mut right = span("right", false, 0, 0, 320.0, 100.0);
        left.column_id = 0;
        right.column_id = 1;
        assert_eq!(merge_lines(vec![left, right]).len(), 2);
    }

    #[test]
    fn test_group_blocks_and_classify() {
        let spans = vec![
            span("1", true, 0, 0, 72.0, 80.0),
            span("Introduction", true, 0, 0, 90.0, 80.0),
            span("This manual describes", false, 1, 0, 72.0, 100.0),
            span("the pump.", false, 1, 1, 72.0, 114.0),
            span("• Check seals", false, 2, 0, 72.0, 140.0),
            span("Step 1: Open the valve", false, 3, 0, 72.0, 160.0),
        ];
        let context = ctx(&spans);
        let options = ChunkerOptions::default();
        let blocks = BlockGrouper::new(&options).group(spans, &context);

        let kinds: Vec<BlockKind> = blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Heading,
                BlockKind::Paragraph,
                BlockKind::ListItem,
                BlockKind::Paragraph
            ]
        );
        assert_eq!(blocks[0].text, "1 Introduction");
        assert_eq!(blocks[1].text, "This manual describes the pump.");
        assert!(blocks[3].is_process_step);
        assert!(!blocks[1].is_process_step);
    }

    #[test]
    fn test_bold_step_heading_keeps_step_flag() {
        let spans = vec![
            span("Step 1: Open the valve", true, 0, 0, 72.0, 80.0),
            span("Turn the handle fully to the left.", false, 1, 0, 72.0, 100.0),
        ];
        let context = ctx(&spans);
        let options = ChunkerOptions::default();
        let blocks = BlockGrouper::new(&options).group(spans, &context);

        assert_eq!(blocks[0].kind, BlockKind::Heading);
        assert!(blocks[0].is_process_step);
        assert!(!blocks[1].is_process_step);
    }

    #[test]
    fn test_images_become_singleton_blocks() {
        let spans = vec![
            span("Before", false, 0, 0, 72.0, 100.0),
            Span::image(BBox::new(72.0, 120.0, 300.0, 300.0), 1, 1, None),
            span("After the figure text", false, 2, 0, 72.0, 320.0),
        ];
        let context = ctx(&spans);
        let options = ChunkerOptions::default();
        let blocks = BlockGrouper::new(&options).group(spans, &context);

        assert_eq!(blocks.len(), 3);
        assert!(blocks[1].is_image());
        assert!(blocks[1].text.is_empty());
    }

    #[test]
    fn test_text_normalized() {
        let spans = vec![span("o\u{FB03}ce   hours", false, 0, 0, 72.0, 100.0)];
        let context = ctx(&spans);
        let options = ChunkerOptions::default();
        let blocks = BlockGrouper::new(&options).group(spans, &context);
        assert_eq!(blocks[0].text, "office hours");
    }
}
