//! Merging paragraphs split by a page break.

use crate::model::{Block, BlockKind};

use super::patterns;
use super::ChunkerOptions;

/// Merge a paragraph into its predecessor when it continues on the next
/// page: both paragraphs, adjacent pages, the continuation starts near the
/// page top and does not open a new structure.
pub fn merge_across_pages(blocks: Vec<Block>, options: &ChunkerOptions) -> Vec<Block> {
    let mut merged: Vec<Block> = Vec::with_capacity(blocks.len());
    let mut count = 0;

    for block in blocks {
        if let Some(previous) = merged.last_mut() {
            if continues(previous, &block, options) {
                previous.text.push(' ');
                previous.text.push_str(&block.text);
                previous.spans.extend(block.spans);
                previous.image_paths.extend(block.image_paths);
                previous.is_process_step |= block.is_process_step;
                count += 1;
                continue;
            }
        }
        merged.push(block);
    }

    log::debug!("Cross-page merges: {}", count);
    merged
}

fn continues(previous: &Block, next: &Block, options: &ChunkerOptions) -> bool {
    if previous.kind != BlockKind::Paragraph || next.kind != BlockKind::Paragraph {
        return false;
    }
    if next.page != previous.last_page() + 1 {
        return false;
    }
    let starts_at_top = next
        .spans
        .first()
        .is_some_and(|s| s.bbox.y0 <= options.cross_page_top);
    let text = next.text.as_str();
    starts_at_top
        && !patterns::matches_heading_pattern(text)
        && !patterns::is_list_start(text)
        && !patterns::is_caption_text(text)
        && patterns::numeric_prefix(text).is_none()
}
