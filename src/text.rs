//! Text normalization for block and chunk text.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Normalizes extracted text before it is stored on blocks and chunks.
///
/// Applies NFC, expands typographic ligatures, drops replacement characters
/// and soft hyphens, collapses horizontal whitespace inside each line, and
/// removes blank lines.
pub struct TextNormalizer {
    spaces: Regex,
    ligature_map: Vec<(&'static str, &'static str)>,
}

impl TextNormalizer {
    /// Create a normalizer.
    pub fn new() -> Self {
        Self {
            spaces: Regex::new(r"[ \t\u{00A0}\u{2007}\u{202F}]+").unwrap(),
            ligature_map: vec![
                ("\u{FB00}", "ff"),  // ﬀ
                ("\u{FB01}", "fi"),  // ﬁ
                ("\u{FB02}", "fl"),  // ﬂ
                ("\u{FB03}", "ffi"), // ﬃ
                ("\u{FB04}", "ffl"), // ﬄ
                ("\u{FB05}", "st"),  // ﬅ
                ("\u{FB06}", "st"),  // ﬆ
            ],
        }
    }

    /// Normalize `text`, keeping line structure.
    pub fn normalize(&self, text: &str) -> String {
        let mut result: String = text.nfc().collect();

        for (ligature, replacement) in &self.ligature_map {
            if result.contains(ligature) {
                result = result.replace(ligature, replacement);
            }
        }

        result = result.replace(['\u{FFFD}', '\u{00AD}'], "");
        result = result.replace("\r\n", "\n").replace('\r', "\n");

        result
            .lines()
            .map(|line| self.spaces.replace_all(line, " ").trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Normalize and flatten to a single line.
    pub fn normalize_inline(&self, text: &str) -> String {
        self.normalize(text).replace('\n', " ")
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
