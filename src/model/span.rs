//! Flattened spans produced by the extraction stage.

use serde::{Deserialize, Serialize};

use super::BBox;

/// Smallest extracted unit: one text run or one image marker.
///
/// Image spans carry empty text and a zero font size. Text spans always have
/// non-empty text and a non-negative font size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub font_size: f32,
    pub bold: bool,
    pub bbox: BBox,
    /// Page number (1-indexed)
    pub page: u32,
    /// Index of the source primitive on its page
    pub block_no: usize,
    /// Index of the line inside the source primitive
    pub line_no: usize,
    /// Column assigned by the column clusterer (0 until then)
    #[serde(default)]
    pub column_id: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_image: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

impl Span {
    /// Create a text span.
    pub fn text(
        text: impl Into<String>,
        font_size: f32,
        bold: bool,
        bbox: BBox,
        page: u32,
        block_no: usize,
        line_no: usize,
    ) -> Self {
        Self {
            text: text.into(),
            font_size: font_size.max(0.0),
            bold,
            bbox,
            page,
            block_no,
            line_no,
            column_id: 0,
            is_image: false,
            image_path: None,
        }
    }

    /// Create an image marker span.
    pub fn image(bbox: BBox, page: u32, block_no: usize, image_path: Option<String>) -> Self {
        Self {
            text: String::new(),
            font_size: 0.0,
            bold: false,
            bbox,
            page,
            block_no,
            line_no: 0,
            column_id: 0,
            is_image: true,
            image_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_span_clamps_negative_size() {
        let span = Span::text("x", -3.0, false, BBox::default(), 1, 0, 0);
        assert_eq!(span.font_size, 0.0);
        assert!(!span.is_image);
    }

    #[test]
    fn test_image_span_has_empty_text() {
        let span = Span::image(BBox::default(), 2, 4, Some("img.jpg".to_string()));
        assert!(span.text.is_empty());
        assert!(span.is_image);
        assert_eq!(span.block_no, 4);
    }

    #[test]
    fn test_text_span_json_omits_image_fields() {
        let span = Span::text("Body", 10.0, false, BBox::default(), 1, 0, 0);
        let json = serde_json::to_string(&span).unwrap();
        assert!(!json.contains("is_image"));
        assert!(!json.contains("image_path"));
    }
}
