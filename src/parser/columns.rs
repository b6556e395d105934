//! Column clustering by horizontal midpoint gaps.

use std::collections::BTreeMap;

use crate::model::Span;

/// Assign `column_id` per page: spans sorted by horizontal center start a
/// new column whenever the gap to the previous center exceeds `gap`.
///
/// Returns the highest column count seen on any page.
pub fn assign_columns(spans: &mut [Span], gap: f32) -> usize {
    let mut by_page: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (index, span) in spans.iter().enumerate() {
        by_page.entry(span.page).or_default().push(index);
    }

    let mut max_columns = 0;
    for indices in by_page.into_values() {
        let mut order = indices;
        order.sort_by(|&a, &b| {
            spans[a]
                .bbox
                .center_x()
                .total_cmp(&spans[b].bbox.center_x())
                .then(a.cmp(&b))
        });

        let mut column = 0;
        let mut previous: Option<f32> = None;
        for index in order {
            let center = spans[index].bbox.center_x();
            if previous.is_some_and(|p| center - p > gap) {
                column += 1;
            }
            spans[index].column_id = column;
            previous = Some(center);
        }
        max_columns = max_columns.max(column + 1);
    }

    max_columns
}
