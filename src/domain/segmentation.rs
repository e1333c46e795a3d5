use serde::{Deserialize, Serialize};

/// Byte-offset range of one sentence in the input text.
///
/// Spans are produced in order, never overlap, lie on char boundaries, and
/// carry no leading or trailing whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceSpan {
    pub start: usize,
    pub end: usize,
}

impl SentenceSpan {
    /// Resolve the span against the text it was produced from.
    ///
    /// Returns `None` if the span does not fit the given text.
    pub fn resolve<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of segmenting one text.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentationResult {
    /// Identifier of the model that produced the spans.
    pub model: String,
    pub spans: Vec<SentenceSpan>,
    /// Segmentation duration in milliseconds.
    pub duration_ms: u64,
}

impl SegmentationResult {
    /// Resolve every span against the input text, skipping any that no
    /// longer fit (only possible if the caller passes a different text).
    pub fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.spans.iter().filter_map(|s| s.resolve(text)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_resolve() {
        let text = "One. Two.";
        let span = SentenceSpan { start: 5, end: 9 };
        assert_eq!(span.resolve(text), Some("Two."));
        assert_eq!(span.len(), 4);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_span_resolve_out_of_bounds() {
        let span = SentenceSpan { start: 2, end: 50 };
        assert_eq!(span.resolve("short"), None);
    }

    #[test]
    fn test_result_sentences() {
        let text = "One. Two.";
        let result = SegmentationResult {
            model: "en-small".to_string(),
            spans: vec![
                SentenceSpan { start: 0, end: 4 },
                SentenceSpan { start: 5, end: 9 },
            ],
            duration_ms: 0,
        };
        assert_eq!(result.sentences(text), vec!["One.", "Two."]);
    }
}
