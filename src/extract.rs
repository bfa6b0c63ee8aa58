use anyhow::Context;
use regex::Regex;

/// Sentences on each side of a matching sentence that are kept for context.
pub const CONTEXT_WINDOW: usize = 1;

/// Finds course codes like BU111, CP104, MA103 in free text.
pub struct CourseExtractor {
    pattern: Regex,
}

impl CourseExtractor {
    pub fn new() -> anyhow::Result<Self> {
        let pattern = Regex::new(r"\b[A-Z]{2,4}[0-9]{3,4}\b")
            .context("course code pattern failed to compile")?;
        Ok(CourseExtractor { pattern })
    }

    /// Distinct course codes in `text`, in order of first appearance.
    /// Runs on the original text; case matters.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut codes = Vec::new();
        for m in self.pattern.find_iter(text) {
            if seen.insert(m.as_str().to_string()) {
                codes.push(m.as_str().to_string());
            }
        }
        codes
    }
}

/// Splits text on sentence terminators and locates the sentences around a
/// course code. The `[.!?]+` split is the primary contract, not a fallback
/// for a missing tokenizer.
pub struct SentenceLocator {
    boundary: Regex,
}

impl SentenceLocator {
    pub fn new() -> anyhow::Result<Self> {
        let boundary =
            Regex::new(r"[.!?]+").context("sentence boundary pattern failed to compile")?;
        Ok(SentenceLocator { boundary })
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.boundary
            .split(text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Sentences where `code` appears as an exact token, plus `window`
    /// neighbors on each side. Deduplicated, returned in text order.
    pub fn locate(&self, text: &str, code: &str, window: usize) -> Vec<String> {
        let sentences = self.split(text);
        let mut keep = std::collections::BTreeSet::new();
        for (i, sentence) in sentences.iter().enumerate() {
            if contains_token(sentence, code) {
                let start = i.saturating_sub(window);
                let end = (i + window).min(sentences.len().saturating_sub(1));
                for j in start..=end {
                    keep.insert(j);
                }
            }
        }
        keep.into_iter().map(|i| sentences[i].clone()).collect()
    }
}

/// Whether `token` occurs in `text` delimited by non-alphanumeric characters,
/// so CP104 does not match inside CP1045.
pub fn contains_token(text: &str, token: &str) -> bool {
    count_token_occurrences(text, token) > 0
}

/// Boundary-checked occurrence count. `token` may contain spaces; interior
/// whitespace is matched literally.
pub fn count_token_occurrences(text: &str, token: &str) -> u32 {
    if token.is_empty() {
        return 0;
    }
    let bytes = text.as_bytes();
    let mut count = 0;
    let mut start = 0;
    while let Some(pos) = text[start..].find(token) {
        let begin = start + pos;
        let end = begin + token.len();
        let before_ok = begin == 0 || !bytes[begin - 1].is_ascii_alphanumeric();
        let after_ok = end >= bytes.len() || !bytes[end].is_ascii_alphanumeric();
        if before_ok && after_ok {
            count += 1;
            start = end;
        } else {
            start = begin + 1;
        }
    }
    count
}

/// First run of digits in a course code, or 0 if there is none.
pub fn course_level(code: &str) -> u32 {
    let digits: String = code
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_codes_in_first_seen_order() {
        let extractor = CourseExtractor::new().unwrap();
        let codes = extractor.extract("Took CP104 and BU111, then CP104 again.");
        assert_eq!(codes, vec!["CP104".to_string(), "BU111".to_string()]);
    }

    #[test]
    fn ignores_lowercase_and_embedded_runs() {
        let extractor = CourseExtractor::new().unwrap();
        assert!(extractor.extract("cp104 is lowercase").is_empty());
        assert!(extractor.extract("XCP104 is one token").is_empty());
        assert!(extractor.extract("CP1045X should not match").is_empty());
    }

    #[test]
    fn extracts_four_letter_and_four_digit_codes() {
        let extractor = CourseExtractor::new().unwrap();
        let codes = extractor.extract("ANTH1001 and MA103.");
        assert_eq!(codes, vec!["ANTH1001".to_string(), "MA103".to_string()]);
    }

    #[test]
    fn locator_includes_neighbor_sentences() {
        let locator = SentenceLocator::new().unwrap();
        let text = "I took CP104. It was great. MA103 was hard. Avoid it.";
        let found = locator.locate(text, "CP104", 1);
        assert_eq!(found, vec!["I took CP104".to_string(), "It was great".to_string()]);

        let found = locator.locate(text, "MA103", 1);
        assert_eq!(
            found,
            vec![
                "It was great".to_string(),
                "MA103 was hard".to_string(),
                "Avoid it".to_string()
            ]
        );
    }

    #[test]
    fn locator_requires_exact_token() {
        let locator = SentenceLocator::new().unwrap();
        assert!(locator.locate("CP1045 is a different course.", "CP104", 1).is_empty());
    }

    #[test]
    fn locator_deduplicates_overlapping_windows() {
        let locator = SentenceLocator::new().unwrap();
        let text = "CP104 intro. CP104 again. Done.";
        let found = locator.locate(text, "CP104", 1);
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn token_counting_respects_boundaries() {
        assert_eq!(count_token_occurrences("bird bird birdhouse", "bird"), 2);
        assert_eq!(count_token_occurrences("easy, easy!", "easy"), 2);
        assert_eq!(count_token_occurrences("gpa booster here", "gpa booster"), 1);
        assert_eq!(count_token_occurrences("", "bird"), 0);
    }

    #[test]
    fn course_level_parses_first_digit_run() {
        assert_eq!(course_level("CP104"), 104);
        assert_eq!(course_level("ANTH1001"), 1001);
        assert_eq!(course_level("NOPE"), 0);
    }
}
