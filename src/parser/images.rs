//! Attaching image paths to text blocks.

use crate::model::{Block, BlockKind};

use super::{ChunkerOptions, LayoutContext};

/// Attach each persisted image to the text block it most likely belongs to.
///
/// Candidates, in order: the nearest same-page block above the image within
/// the attach distance; for images near the page top, the last text block
/// of the previous page; otherwise the next paragraph on the same page.
/// Image blocks themselves are left in place. Returns the number attached.
pub fn attach_images(blocks: &mut [Block], ctx: &LayoutContext, options: &ChunkerOptions) -> usize {
    let mut attachments: Vec<(usize, String)> = Vec::new();

    for (i, block) in blocks.iter().enumerate() {
        if !block.is_image() {
            continue;
        }
        let Some(path) = block.spans.first().and_then(|s| s.image_path.clone()) else {
            continue;
        };
        if let Some(target) = find_target(blocks, i, ctx, options) {
            attachments.push((target, path));
        }
    }

    let attached = attachments.len();
    for (target, path) in attachments {
        blocks[target].image_paths.push(path);
    }
    log::debug!("Attached {} images", attached);
    attached
}

fn is_text_target(block: &Block) -> bool {
    !block.is_heading() && !block.is_image()
}

fn find_target(
    blocks: &[Block],
    image_index: usize,
    ctx: &LayoutContext,
    options: &ChunkerOptions,
) -> Option<usize> {
    let image = &blocks[image_index];
    let image_box = image.bbox();
    let page = ctx.page(image.page);
    let max_distance = options.image_attach_distance * page.height;

    // Nearest block above; the first one wins a tie
    let mut best: Option<(usize, f32)> = None;
    for (j, candidate) in blocks[..image_index].iter().enumerate() {
        if candidate.page != image.page || !is_text_target(candidate) {
            continue;
        }
        let bottom = candidate.bbox().y1;
        if bottom > image_box.y0 {
            continue;
        }
        let distance = image_box.y0 - bottom;
        if distance <= max_distance && best.map_or(true, |(_, d)| distance < d) {
            best = Some((j, distance));
        }
    }
    if let Some((j, _)) = best {
        return Some(j);
    }

    if image_box.y0 <= options.image_top_fraction * page.height {
        let previous = blocks[..image_index]
            .iter()
            .rposition(|b| b.page + 1 == image.page && is_text_target(b));
        if previous.is_some() {
            return previous;
        }
    }

    blocks[image_index + 1..]
        .iter()
        .position(|b| b.page == image.page && b.kind == BlockKind::Paragraph)
        .map(|offset| image_index + 1 + offset)
}
