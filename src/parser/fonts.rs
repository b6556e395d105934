//! Font statistics and per-page layout context.

use std::collections::BTreeMap;

use crate::model::{PageInfo, Span};

/// Body size used when a page has no text.
pub const DEFAULT_BODY_SIZE: f32 = 12.0;

/// Font size histogram for one page.
#[derive(Debug, Clone, Default)]
pub struct FontStatistics {
    /// Body text font size (most common)
    pub body_size: f32,
    /// Mean size over all observations
    pub average_size: f32,
    /// Observed sizes keyed by tenths of a point
    pub size_histogram: BTreeMap<i32, usize>,
    total: f32,
    count: usize,
}

impl FontStatistics {
    /// Build statistics from the text spans of an iterator.
    pub fn from_spans<'a, I>(spans: I) -> Self
    where
        I: IntoIterator<Item = &'a Span>,
    {
        let mut stats = Self::default();
        for span in spans.into_iter().filter(|s| !s.is_image) {
            stats.add_size(span.font_size);
        }
        stats.analyze();
        stats
    }

    /// Add a font size observation.
    pub fn add_size(&mut self, size: f32) {
        let key = (size * 10.0).round() as i32; // 0.1 precision
        *self.size_histogram.entry(key).or_insert(0) += 1;
        self.total += size;
        self.count += 1;
    }

    /// Calculate body and average sizes.
    pub fn analyze(&mut self) {
        if self.count == 0 {
            self.body_size = DEFAULT_BODY_SIZE;
            self.average_size = DEFAULT_BODY_SIZE;
            return;
        }

        // Keys iterate ascending, so the smaller size wins a tie
        let mut best: Option<(i32, usize)> = None;
        for (&key, &count) in &self.size_histogram {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((key, count));
            }
        }
        self.body_size = best.map_or(DEFAULT_BODY_SIZE, |(key, _)| key as f32 / 10.0);
        self.average_size = self.total / self.count as f32;
    }

    /// Number of observations.
    pub fn samples(&self) -> usize {
        self.count
    }
}

/// Page geometry and font statistics for the layout stages.
#[derive(Debug, Clone, Default)]
pub struct LayoutContext {
    pages: BTreeMap<u32, PageInfo>,
    fonts: BTreeMap<u32, FontStatistics>,
}

impl LayoutContext {
    /// Context with page geometry only.
    pub fn new(pages: &[PageInfo]) -> Self {
        Self {
            pages: pages.iter().map(|p| (p.number, *p)).collect(),
            fonts: BTreeMap::new(),
        }
    }

    /// Compute per-page font statistics from the surviving spans.
    pub fn with_fonts(mut self, spans: &[Span]) -> Self {
        let mut by_page: BTreeMap<u32, Vec<&Span>> = BTreeMap::new();
        for span in spans {
            by_page.entry(span.page).or_default().push(span);
        }
        self.fonts = by_page
            .into_iter()
            .map(|(page, spans)| (page, FontStatistics::from_spans(spans)))
            .collect();
        self
    }

    /// Geometry of `page`, Letter when the source never described it.
    pub fn page(&self, page: u32) -> PageInfo {
        self.pages
            .get(&page)
            .copied()
            .unwrap_or_else(|| PageInfo::letter(page))
    }

    pub fn body_size(&self, page: u32) -> f32 {
        self.fonts
            .get(&page)
            .map_or(DEFAULT_BODY_SIZE, |f| f.body_size)
    }

    pub fn average_size(&self, page: u32) -> f32 {
        self.fonts
            .get(&page)
            .map_or(DEFAULT_BODY_SIZE, |f| f.average_size)
    }

    /// Known pages in ascending order.
    pub fn pages(&self) -> impl Iterator<Item = &PageInfo> {
        self.pages.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    fn span(size: f32, page: u32) -> Span {
        Span::text("x", size, false, BBox::default(), page, 0, 0)
    }

    #[test]
    fn test_body_size_is_most_frequent() {
        let spans = vec![span(10.0, 1), span(10.0, 1), span(14.0, 1)];
        let stats = FontStatistics::from_spans(&spans);
        assert_eq!(stats.body_size, 10.0);
        assert!((stats.average_size - 34.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_body_size_tie_prefers_smaller() {
        let spans = vec![span(14.0, 1), span(9.5, 1)];
        let stats = FontStatistics::from_spans(&spans);
        assert_eq!(stats.body_size, 9.5);
    }

    #[test]
    fn test_empty_page_uses_default() {
        let stats = FontStatistics::from_spans(&[]);
        assert_eq!(stats.body_size, DEFAULT_BODY_SIZE);
        assert_eq!(stats.samples(), 0);
    }

    #[test]
    fn test_image_spans_ignored() {
        let spans = vec![
            span(11.0, 1),
            Span::image(BBox::default(), 1, 1, None),
        ];
        let stats = FontStatistics::from_spans(&spans);
        assert_eq!(stats.samples(), 1);
        assert_eq!(stats.average_size, 11.0);
    }

    #[test]
    fn test_context_per_page() {
        let spans = vec![span(10.0, 1), span(8.0, 2), span(8.0, 2), span(12.0, 2)];
        let ctx = LayoutContext::new(&[PageInfo::new(1, 595.0, 842.0)]).with_fonts(&spans);
        assert_eq!(ctx.body_size(1), 10.0);
        assert_eq!(ctx.body_size(2), 8.0);
        assert_eq!(ctx.body_size(3), DEFAULT_BODY_SIZE);
        assert_eq!(ctx.page(1).width, 595.0);
        assert_eq!(ctx.page(9).height, 792.0);
    }
}
