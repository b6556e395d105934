//! Repeated header and footer removal.

use std::collections::{HashMap, HashSet};

use crate::model::Span;

use super::{ChunkerOptions, LayoutContext};

/// Identity of a span across pages: text with digit-only runs collapsed,
/// font size in tenths, and rounded left edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpanSignature {
    text: String,
    size_tenths: i32,
    x: i32,
}

impl SpanSignature {
    pub fn of(span: &Span) -> Self {
        let text = span.text.trim();
        let text = if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
            "#".to_string()
        } else {
            text.to_string()
        };
        Self {
            text,
            size_tenths: (span.font_size * 10.0).round() as i32,
            x: span.bbox.x0.round() as i32,
        }
    }
}

/// Drops spans that repeat across pages inside the top or bottom margin.
pub struct MarginFilter<'a> {
    options: &'a ChunkerOptions,
}

impl<'a> MarginFilter<'a> {
    pub fn new(options: &'a ChunkerOptions) -> Self {
        Self { options }
    }

    /// Filter `spans`, returning the survivors in their original order and
    /// the number dropped.
    pub fn filter(&self, spans: Vec<Span>, ctx: &LayoutContext) -> (Vec<Span>, usize) {
        if !self.options.remove_headers && !self.options.remove_footers {
            return (spans, 0);
        }

        let mut pages_by_signature: HashMap<SpanSignature, HashSet<u32>> = HashMap::new();
        for span in spans.iter().filter(|s| !s.is_image) {
            pages_by_signature
                .entry(SpanSignature::of(span))
                .or_default()
                .insert(span.page);
        }

        let repeated: HashSet<SpanSignature> = pages_by_signature
            .into_iter()
            .filter(|(_, pages)| pages.len() >= self.options.min_repeat_pages)
            .map(|(signature, _)| signature)
            .collect();

        let before = spans.len();
        let kept: Vec<Span> = spans
            .into_iter()
            .filter(|span| {
                span.is_image
                    || !repeated.contains(&SpanSignature::of(span))
                    || !self.in_margin(span, ctx)
            })
            .collect();

        let dropped = before - kept.len();
        log::debug!(
            "Margin filter: {} repeated signatures, {} spans dropped",
            repeated.len(),
            dropped
        );
        (kept, dropped)
    }

    fn in_margin(&self, span: &Span, ctx: &LayoutContext) -> bool {
        let height = ctx.page(span.page).height;
        if height <= 0.0 {
            return false;
        }
        let in_header = span.bbox.y0 / height <= self.options.header_zone;
        let in_footer = span.bbox.y1 / height >= 1.0 - self.options.footer_zone;
        (self.options.remove_headers && in_header) || (self.options.remove_footers && in_footer)
    }
}
