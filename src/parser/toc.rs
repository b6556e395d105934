//! Table-of-contents page detection.
//!
//! Early pages are split into visual lines. A line counts as a TOC entry if
//! it has a leader, ends in a page number, and carries a title or a
//! multi-level section number, or if it is a right-aligned bare page number
//! sitting on the same baseline as a title. A page whose share of entries
//! reaches the configured ratio is a TOC page.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{PageInfo, Span};

use super::patterns;
use super::{ChunkerOptions, LayoutContext};

/// Vertical tolerance when grouping spans into lines (points).
const LINE_TOLERANCE: f32 = 2.0;
/// Bare page numbers must start right of this fraction of the page width.
const RIGHT_ALIGN_FRACTION: f32 = 0.65;
/// Lines this close to the page top or bottom are ignored for bare numbers.
const EDGE_FRACTION: f32 = 0.05;

#[derive(Debug, Clone)]
struct VisualLine {
    block_no: usize,
    y: f32,
    x0: f32,
    text: String,
}

/// Detects and optionally removes TOC pages.
pub struct TocDetector<'a> {
    options: &'a ChunkerOptions,
}

impl<'a> TocDetector<'a> {
    pub fn new(options: &'a ChunkerOptions) -> Self {
        Self { options }
    }

    /// Page numbers classified as TOC.
    pub fn toc_pages(&self, spans: &[Span], ctx: &LayoutContext) -> BTreeSet<u32> {
        let mut by_page: BTreeMap<u32, Vec<&Span>> = BTreeMap::new();
        for span in spans
            .iter()
            .filter(|s| !s.is_image && s.page <= self.options.toc_max_page)
        {
            by_page.entry(span.page).or_default().push(span);
        }

        by_page
            .into_iter()
            .filter(|(page, spans)| self.is_toc_page(spans, &ctx.page(*page)))
            .map(|(page, _)| page)
            .collect()
    }

    /// Detect TOC pages and drop their spans unless TOC inclusion is on.
    pub fn filter(&self, spans: Vec<Span>, ctx: &LayoutContext) -> (Vec<Span>, BTreeSet<u32>) {
        let pages = self.toc_pages(&spans, ctx);
        if pages.is_empty() {
            return (spans, pages);
        }
        if self.options.include_toc {
            log::debug!("TOC pages {:?} kept", pages);
            return (spans, pages);
        }

        log::debug!("TOC pages {:?} removed", pages);
        let kept = spans
            .into_iter()
            .filter(|s| !pages.contains(&s.page))
            .collect();
        (kept, pages)
    }

    fn is_toc_page(&self, spans: &[&Span], page: &PageInfo) -> bool {
        let lines = visual_lines(spans);
        if lines.is_empty() {
            return false;
        }

        let matches = lines
            .iter()
            .filter(|line| is_leader_entry(line) || is_bare_number_entry(line, &lines, page))
            .count();

        matches as f32 / lines.len() as f32 >= self.options.toc_line_ratio
    }
}

/// Group spans into lines keyed by source block and rounded baseline.
fn visual_lines(spans: &[&Span]) -> Vec<VisualLine> {
    let mut sorted: Vec<&Span> = spans.to_vec();
    sorted.sort_by(|a, b| {
        a.block_no
            .cmp(&b.block_no)
            .then(a.bbox.center_y().total_cmp(&b.bbox.center_y()))
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut lines: Vec<(VisualLine, Vec<&Span>)> = Vec::new();
    for span in sorted {
        let y = span.bbox.center_y();
        match lines.last_mut() {
            Some((line, members))
                if line.block_no == span.block_no && (line.y - y).abs() <= LINE_TOLERANCE =>
            {
                members.push(span);
            }
            _ => lines.push((
                VisualLine {
                    block_no: span.block_no,
                    y,
                    x0: span.bbox.x0,
                    text: String::new(),
                },
                vec![span],
            )),
        }
    }

    lines
        .into_iter()
        .map(|(mut line, mut members)| {
            members.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
            line.x0 = members.first().map_or(line.x0, |s| s.bbox.x0);
            line.text = members
                .iter()
                .map(|s| s.text.trim())
                .collect::<Vec<_>>()
                .join(" ");
            line
        })
        .collect()
}

fn is_leader_entry(line: &VisualLine) -> bool {
    patterns::has_toc_leader(&line.text)
        && patterns::ends_with_number(&line.text)
        && (patterns::has_alphabetic_title(&line.text)
            || patterns::has_multilevel_prefix(&line.text))
}

fn is_bare_number_entry(line: &VisualLine, lines: &[VisualLine], page: &PageInfo) -> bool {
    if !patterns::is_bare_number(&line.text) || line.x0 <= RIGHT_ALIGN_FRACTION * page.width {
        return false;
    }
    let edge = EDGE_FRACTION * page.height;
    if line.y < edge || line.y > page.height - edge {
        return false;
    }
    lines.iter().any(|other| {
        !std::ptr::eq(other, line)
            && (other.y - line.y).abs() <= LINE_TOLERANCE
            && is_title_text(&other.text)
    })
}

fn is_title_text(text: &str) -> bool {
    text.chars().count() >= 4 && text.chars().any(char::is_alphabetic)
}
