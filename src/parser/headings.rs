//! Heading level assignment.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::model::Block;

use super::patterns;

fn size_key(size: f32) -> i32 {
    (size * 10.0).round() as i32
}

/// Set `heading_level` on every heading.
///
/// Distinct heading font sizes ranked from largest give the base level; a
/// numeric prefix overrides it with its depth (`2.3` is level 2). Headings
/// that fit neither get level 1.
pub fn assign_heading_levels(blocks: &mut [Block]) {
    let sizes: BTreeSet<Reverse<i32>> = blocks
        .iter()
        .filter(|b| b.is_heading())
        .map(|b| Reverse(size_key(b.font_size())))
        .collect();
    let ranks: Vec<i32> = sizes.into_iter().map(|Reverse(k)| k).collect();

    for block in blocks.iter_mut().filter(|b| b.is_heading()) {
        let level = match patterns::numeric_prefix(&block.text) {
            Some(prefix) => prefix.depth(),
            None => ranks
                .iter()
                .position(|&k| k == size_key(block.font_size()))
                .map_or(1, |rank| u8::try_from(rank + 1).unwrap_or(u8::MAX)),
        };
        block.heading_level = Some(level.max(1));
    }

    log::debug!("Heading sizes ranked: {:?}", ranks);
}
