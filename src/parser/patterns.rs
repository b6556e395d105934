//! Lexical patterns shared by the layout stages.

use std::sync::OnceLock;

use regex::Regex;

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).unwrap())
        }
    };
}

static_regex!(numeric_prefix_re, r"(?s)^\s*(\d{1,3}(?:\.\d{1,3})*)\.?\s+(\S.*)$");
static_regex!(
    heading_re,
    r"(?x)
    ^\s*(?i:chapter|section|part|appendix|annex|kapitel|abschnitt|teil|anhang)\s+[0-9IVXLCivxlc]+\b
    | ^\s*[IVXLC]+\.\s+\p{Lu}
    | ^[^\p{Ll}]*\p{Lu}[^\p{Ll}]*\p{Lu}[^\p{Ll}]*$"
);
static_regex!(
    list_re,
    r"^\s*(?:[•●○◦▪▫■□‣∙·►▸➤✓\-–—*+]\s+|\(?\d{1,3}[.)]\s+|\(?[a-zA-Z][.)]\s+)"
);
static_regex!(bullet_re, r"^\s*[•●○◦▪▫■□‣∙·►▸➤✓\-–—*+]\s+");
static_regex!(step_re, r"(?i)^\s*(?:step\s+\d+\s*[:.)]|\d+\.(?:\s|$))");
static_regex!(
    caption_re,
    r"(?i)^\s*(?:fig(?:ure)?|tab(?:le)?|abb(?:ildung)?|tabelle|chart|diagram|exhibit|illustration)\.?\s*\d+(?:[.\-]\d+)*"
);
static_regex!(
    leader_re,
    r"(?:\.{3,}|(?:\.\s){3,}|…+|·{3,}|-{3,}|_{3,}|–{2,}|—{2,})"
);
static_regex!(trailing_number_re, r"\d+\s*$");
static_regex!(alpha_re, r"\p{L}{2,}");
static_regex!(multilevel_prefix_re, r"^\s*\d+(?:\.\d+)+");
static_regex!(bare_number_re, r"^\s*\d{1,4}\s*$");

/// A leading section number such as `3` or `3.2.` and the text after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericPrefix<'a> {
    /// Digits and inner dots, without a trailing dot
    pub prefix: &'a str,
    pub remainder: &'a str,
}

impl NumericPrefix<'_> {
    /// Hierarchy depth implied by the prefix: dots + 1.
    pub fn depth(&self) -> u8 {
        let dots = self.prefix.matches('.').count();
        u8::try_from(dots + 1).unwrap_or(u8::MAX)
    }
}

/// Split off a leading numeric prefix.
pub fn numeric_prefix(text: &str) -> Option<NumericPrefix<'_>> {
    let caps = numeric_prefix_re().captures(text)?;
    Some(NumericPrefix {
        prefix: caps.get(1)?.as_str(),
        remainder: caps.get(2)?.as_str(),
    })
}

/// Uppercase or structurally labelled heading text.
pub fn matches_heading_pattern(text: &str) -> bool {
    heading_re().is_match(text)
}

/// Bullet or numbered list marker at the start.
pub fn is_list_start(text: &str) -> bool {
    list_re().is_match(text)
}

/// Bullet glyph at the start.
pub fn starts_with_bullet(text: &str) -> bool {
    bullet_re().is_match(text)
}

/// `Step N:` or `N.` at the start.
pub fn is_process_step(text: &str) -> bool {
    step_re().is_match(text)
}

/// Figure or table caption label at the start.
pub fn is_caption_text(text: &str) -> bool {
    caption_re().is_match(text)
}

/// Dotted, dashed, or other long punctuation leader.
pub fn has_toc_leader(text: &str) -> bool {
    leader_re().is_match(text)
}

pub fn ends_with_number(text: &str) -> bool {
    trailing_number_re().is_match(text)
}

/// At least one run of two letters.
pub fn has_alphabetic_title(text: &str) -> bool {
    alpha_re().is_match(text)
}

/// `2.1`, `3.4.1` style prefix.
pub fn has_multilevel_prefix(text: &str) -> bool {
    multilevel_prefix_re().is_match(text)
}

pub fn is_bare_number(text: &str) -> bool {
    bare_number_re().is_match(text)
}

/// Ends with sentence punctuation that rules out a heading.
pub fn ends_with_terminal_punctuation(text: &str) -> bool {
    matches!(
        text.trim_end().chars().last(),
        Some('.' | ';' | ',' | '!' | '?')
    )
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
