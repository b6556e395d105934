//! Initial block classification.
//!
//! Rules are tried in order; the first match decides the kind and anything
//! unmatched is a paragraph.

use std::collections::BTreeSet;

use crate::model::{BlockKind, Span};

use super::patterns;
use super::ChunkerOptions;

/// A grouped block awaiting classification.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Joined, normalized text
    pub text: &'a str,
    pub spans: &'a [Span],
    /// Body font size of the block's page
    pub body_size: f32,
}

impl Candidate<'_> {
    pub fn all_bold(&self) -> bool {
        !self.spans.is_empty() && self.spans.iter().all(|s| s.bold)
    }

    pub fn font_size(&self) -> f32 {
        if self.spans.is_empty() {
            return 0.0;
        }
        self.spans.iter().map(|s| s.font_size).sum::<f32>() / self.spans.len() as f32
    }

    pub fn line_count(&self) -> usize {
        self.spans
            .iter()
            .map(|s| s.line_no)
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn source_blocks(&self) -> usize {
        self.spans
            .iter()
            .map(|s| (s.page, s.block_no))
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// A classification rule.
pub type Rule = fn(&Candidate<'_>, &ChunkerOptions) -> bool;

/// Ordered rule list.
pub const RULES: &[(&str, Rule, BlockKind)] = &[
    ("numbered_heading", is_numbered_heading, BlockKind::Heading),
    ("heading", is_heading, BlockKind::Heading),
    ("list_item", is_list_item, BlockKind::ListItem),
];

/// Classify a candidate block.
pub fn classify(candidate: &Candidate<'_>, options: &ChunkerOptions) -> BlockKind {
    RULES
        .iter()
        .find(|(_, rule, _)| rule(candidate, options))
        .map_or(BlockKind::Paragraph, |(_, _, kind)| *kind)
}

fn is_compact(candidate: &Candidate<'_>) -> bool {
    candidate.line_count() <= 2 && candidate.source_blocks() == 1
}

/// `3.2 Title` style heading.
fn is_numbered_heading(candidate: &Candidate<'_>, options: &ChunkerOptions) -> bool {
    let Some(prefix) = patterns::numeric_prefix(candidate.text) else {
        return false;
    };
    let remainder = prefix.remainder.trim_end();
    is_compact(candidate)
        && patterns::word_count(remainder) <= options.heading_max_words
        && !remainder.ends_with(['.', ';'])
        && (candidate.all_bold() || patterns::matches_heading_pattern(remainder))
}

/// Short emphasized line: pattern match, all bold, or enlarged type.
fn is_heading(candidate: &Candidate<'_>, options: &ChunkerOptions) -> bool {
    let text = candidate.text;
    let emphasized = patterns::matches_heading_pattern(text)
        || candidate.all_bold()
        || candidate.font_size() > options.heading_size_ratio * candidate.body_size;

    emphasized
        && is_compact(candidate)
        && patterns::word_count(text) <= options.heading_max_words
        && text.chars().count() <= options.heading_max_chars
        && text.chars().any(char::is_alphabetic)
        && !patterns::ends_with_terminal_punctuation(text)
        && !patterns::starts_with_bullet(text)
}

fn is_list_item(candidate: &Candidate<'_>, _options: &ChunkerOptions) -> bool {
    patterns::is_list_start(candidate.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    fn spans(size: f32, bold: bool, lines: usize) -> Vec<Span> {
        (0..lines)
            .map(|line| Span::text("x", size, bold, BBox::default(), 1, 0, line))
            .collect()
    }

    fn kind(text: &str, spans: &[Span]) -> BlockKind {
        let options = ChunkerOptions::default();
        classify(
            &Candidate {
                text,
                spans,
                body_size: 10.0,
            },
            &options,
        )
    }

    #[test]
    fn test_numbered_bold_heading() {
        assert_eq!(kind("1 Introduction", &spans(10.0, true, 1)), BlockKind::Heading);
        assert_eq!(kind("2.1 Installation", &spans(10.0, true, 1)), BlockKind::Heading);
    }

    #[test]
    fn test_numbered_uppercase_heading() {
        assert_eq!(kind("3 SAFETY NOTES", &spans(10.0, false, 1)), BlockKind::Heading);
    }

    #[test]
    fn test_numbered_sentence_is_list_item() {
        assert_eq!(
            kind("1. Install the package.", &spans(10.0, false, 1)),
            BlockKind::ListItem
        );
    }

    #[test]
    fn test_large_font_heading() {
        assert_eq!(kind("System Overview", &spans(14.0, false, 1)), BlockKind::Heading);
    }

    #[test]
    fn test_body_sized_text_is_paragraph() {
        assert_eq!(
            kind("The pump delivers water to the tank", &spans(10.0, false, 1)),
            BlockKind::Paragraph
        );
    }

    #[test]
    fn test_bold_sentence_is_paragraph() {
        assert_eq!(
            kind("Always wear gloves.", &spans(10.0, true, 1)),
            BlockKind::Paragraph
        );
    }

    #[test]
    fn test_long_bold_text_is_paragraph() {
        let text = "one two three four five six seven eight nine ten eleven twelve thirteen";
        assert_eq!(kind(text, &spans(10.0, true, 1)), BlockKind::Paragraph);
    }

    #[test]
    fn test_three_lines_not_heading() {
        assert_eq!(kind("OVERVIEW", &spans(14.0, true, 3)), BlockKind::Paragraph);
    }

    #[test]
    fn test_bullet_list_item() {
        assert_eq!(kind("• Check the seals", &spans(10.0, true, 1)), BlockKind::ListItem);
    }

    #[test]
    fn test_candidate_metrics() {
        let mut s = spans(10.0, true, 2);
        s.push(Span::text("y", 14.0, false, BBox::default(), 1, 1, 0));
        let c = Candidate {
            text: "x",
            spans: &s,
            body_size: 10.0,
        };
        assert!(!c.all_bold());
        assert_eq!(c.line_count(), 2);
        assert_eq!(c.source_blocks(), 2);
        assert!((c.font_size() - 34.0 / 3.0).abs() < 1e-4);
    }
}
