//! Highlight computation for fuzzy matches
//!
//! Tantivy's snippet generator only knows about exact query terms, so the
//! spans are recomputed here: every token of a stored field is compared to the
//! query terms with the same edit distance the fuzzy query used.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tantivy::tokenizer::{TextAnalyzer, TokenStream};

use crate::search::config::{SNIPPET_LEADING_CONTEXT, SNIPPET_MAX_LEN};

/// A normalized query term and the edit distance it tolerates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    pub text: String,
    pub distance: u8,
}

impl QueryTerm {
    pub fn new(text: impl Into<String>, distance: u8) -> Self {
        Self {
            text: text.into(),
            distance,
        }
    }

    /// The same term for matching against record numbers.
    ///
    /// The distance is capped at one less than the term length, so `2` only
    /// finds record 2 rather than every one or two digit number.
    pub fn numeric(&self) -> Self {
        let len = self.text.chars().count();
        let cap = len.saturating_sub(1).min(u8::MAX as usize) as u8;
        Self {
            text: self.text.clone(),
            distance: self.distance.min(cap),
        }
    }

    pub fn matches(&self, token: &str) -> bool {
        within_distance(&self.text, token, self.distance as usize)
    }
}

/// Highlighted matches within one field of a hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldHighlight {
    pub field: String,
    /// Byte ranges of matched tokens within the full field text
    pub spans: Vec<Range<usize>>,
    /// HTML-escaped excerpt with matches wrapped in `<b>`
    pub fragment: String,
}

/// Optimal string alignment distance: insertions, deletions, substitutions
/// and adjacent transpositions each cost one
pub fn osa_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let width = b.len() + 1;
    let mut matrix = vec![0usize; (a.len() + 1) * width];
    for (j, cell) in matrix.iter_mut().take(width).enumerate() {
        *cell = j;
    }
    for i in 0..=a.len() {
        matrix[i * width] = i;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (matrix[(i - 1) * width + j] + 1)
                .min(matrix[i * width + j - 1] + 1)
                .min(matrix[(i - 1) * width + j - 1] + cost);

            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(matrix[(i - 2) * width + j - 2] + 1);
            }
            matrix[i * width + j] = best;
        }
    }

    matrix[a.len() * width + b.len()]
}

/// Whether `a` and `b` are within `max` edits of each other
pub fn within_distance(a: &str, b: &str, max: usize) -> bool {
    if a == b {
        return true;
    }
    let (len_a, len_b) = (a.chars().count(), b.chars().count());
    if len_a.abs_diff(len_b) > max {
        return false;
    }
    max > 0 && osa_distance(a, b) <= max
}

/// Byte spans of the tokens in `text` that match any of `terms`
pub fn match_spans(analyzer: &mut TextAnalyzer, text: &str, terms: &[QueryTerm]) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut stream = analyzer.token_stream(text);
    while stream.advance() {
        let token = stream.token();
        if terms.iter().any(|term| term.matches(&token.text)) {
            spans.push(token.offset_from..token.offset_to);
        }
    }
    spans
}

fn escape_html(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Render the part of `text` around the first span, at most `max_len` bytes
/// (plus ellipses), with every span inside the window marked
pub fn render_fragment(text: &str, spans: &[Range<usize>], max_len: usize) -> String {
    let Some(first) = spans.first() else {
        return String::new();
    };

    let (start, end) = if text.len() <= max_len {
        (0, text.len())
    } else {
        let start = floor_char_boundary(text, first.start.saturating_sub(SNIPPET_LEADING_CONTEXT));
        let end = floor_char_boundary(text, start + max_len).max(ceil_char_boundary(text, first.end));
        (start, end)
    };

    let mut fragment = String::new();
    if start > 0 {
        fragment.push('…');
    }

    let mut cursor = start;
    for span in spans {
        if span.start < cursor || span.end > end {
            continue;
        }
        escape_html(&text[cursor..span.start], &mut fragment);
        fragment.push_str("<b>");
        escape_html(&text[span.clone()], &mut fragment);
        fragment.push_str("</b>");
        cursor = span.end;
    }
    escape_html(&text[cursor..end], &mut fragment);

    if end < text.len() {
        fragment.push('…');
    }
    fragment
}

/// Compute the highlight for one field, or `None` when nothing matched
pub fn highlight_field(
    analyzer: &mut TextAnalyzer,
    field: &str,
    text: &str,
    terms: &[QueryTerm],
) -> Option<FieldHighlight> {
    let spans = match_spans(analyzer, text, terms);
    if spans.is_empty() {
        return None;
    }
    let fragment = render_fragment(text, &spans, SNIPPET_MAX_LEN);
    Some(FieldHighlight {
        field: field.to_string(),
        spans,
        fragment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer};

    fn analyzer() -> TextAnalyzer {
        TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(40))
            .filter(LowerCaser)
            .build()
    }

    #[test]
    fn test_osa_distance() {
        assert_eq!(osa_distance("markdown", "markdown"), 0);
        assert_eq!(osa_distance("markdown", "markdwon"), 1);
        assert_eq!(osa_distance("markdown", "markdoqn"), 1);
        assert_eq!(osa_distance("markdown", "markdow"), 1);
        assert_eq!(osa_distance("kitten", "sitting"), 3);
        assert_eq!(osa_distance("", "abc"), 3);
        assert_eq!(osa_distance("ca", "abc"), 3);
        assert_eq!(osa_distance("café", "cafe"), 1);
    }

    #[test]
    fn test_text_terms_keep_configured_distance() {
        assert_eq!(QueryTerm::new("c", 1).distance, 1);
        assert!(QueryTerm::new("c", 1).matches("b"));
        assert_eq!(QueryTerm::new("markdown", 2).distance, 2);
    }

    #[test]
    fn test_numeric_terms_get_smaller_distance() {
        assert_eq!(QueryTerm::new("2", 1).numeric().distance, 0);
        assert_eq!(QueryTerm::new("12", 2).numeric().distance, 1);
        assert_eq!(QueryTerm::new("1234", 1).numeric().distance, 1);
        assert!(!QueryTerm::new("2", 1).numeric().matches("3"));
        assert!(QueryTerm::new("2", 1).numeric().matches("2"));
    }

    #[test]
    fn test_within_distance() {
        assert!(within_distance("rust", "rust", 0));
        assert!(!within_distance("rust", "bust", 0));
        assert!(within_distance("rust", "bust", 1));
        assert!(!within_distance("rust", "rustacean", 2));
    }

    #[test]
    fn test_match_spans_use_original_offsets() {
        let terms = vec![QueryTerm::new("markdwon", 1)];
        let text = "We decided to use Markdown for records.";
        let spans = match_spans(&mut analyzer(), text, &terms);
        assert_eq!(spans, vec![18..26]);
        assert_eq!(&text[18..26], "Markdown");
    }

    #[test]
    fn test_highlight_field_renders_fragment() {
        let terms = vec![QueryTerm::new("markdown", 1)];
        let highlight =
            highlight_field(&mut analyzer(), "body", "Use <Markdown> & more", &terms).unwrap();
        assert_eq!(highlight.field, "body");
        assert_eq!(highlight.fragment, "Use &lt;<b>Markdown</b>&gt; &amp; more");
    }

    #[test]
    fn test_highlight_field_without_match() {
        let terms = vec![QueryTerm::new("postgres", 1)];
        assert!(highlight_field(&mut analyzer(), "title", "Use Markdown", &terms).is_none());
    }

    #[test]
    fn test_long_fragment_is_windowed() {
        let text = format!("{}needle {}", "hay ".repeat(100), "stack ".repeat(100));
        let spans = vec![400..406];
        assert_eq!(&text[400..406], "needle");

        let fragment = render_fragment(&text, &spans, 60);
        assert!(fragment.starts_with('…'));
        assert!(fragment.ends_with('…'));
        assert!(fragment.contains("<b>needle</b>"));
        assert!(fragment.len() < 80);
    }

    #[test]
    fn test_fragment_window_respects_char_boundaries() {
        let text = format!("{}needle{}", "é".repeat(60), "ü".repeat(60));
        let start = text.find("needle").unwrap();
        let fragment = render_fragment(&text, &[start..start + 6], 31);
        assert!(fragment.contains("<b>needle</b>"));
    }
}
