use anyhow::Context;
use regex::Regex;

use crate::extract::{contains_token, CourseExtractor, SentenceLocator, CONTEXT_WINDOW};
use crate::lexicon::Lexicon;
use crate::models::{CourseMention, Thread, ThreadAnalysis};
use crate::polarity::PolarityAnalyzer;

/// Share of the bird-term score blended into per-sentence compound.
const BIRD_TERM_BLEND: f64 = 0.3;
/// Compound multiplier when the course code appears in the thread title.
const TITLE_BOOST: f64 = 1.25;
/// Thread score that saturates the social weight factor at its 1.2 cap.
const SOCIAL_SCALE: f64 = 150.0;
const SOCIAL_CAP: f64 = 1.2;

const SENTENCE_CODE_WEIGHT: f64 = 1.5;
const INTENSIFIER_WEIGHT: f64 = 1.3;
const INTENSIFIERS: [&str; 5] = ["highly", "very", "really", "definitely", "absolutely"];

/// How per-sentence scores are averaged into a mention record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceWeighting {
    /// Plain mean across supporting sentences.
    Uniform,
    /// Sentences carrying the code itself or an intensifier count more.
    Emphasis,
}

pub struct ThreadAnalyzer {
    lexicon: Lexicon,
    polarity: PolarityAnalyzer,
    extractor: CourseExtractor,
    locator: SentenceLocator,
    url_pattern: Regex,
    punct_pattern: Regex,
    weighting: SentenceWeighting,
}

impl ThreadAnalyzer {
    pub fn new(lexicon: Lexicon, weighting: SentenceWeighting) -> anyhow::Result<Self> {
        let polarity = PolarityAnalyzer::with_overlay(&lexicon.polarity_overlay);
        Ok(ThreadAnalyzer {
            polarity,
            extractor: CourseExtractor::new()?,
            locator: SentenceLocator::new()?,
            url_pattern: Regex::new(r"http\S+").context("url pattern failed to compile")?,
            punct_pattern: Regex::new(r"[^\w\s]")
                .context("punctuation pattern failed to compile")?,
            lexicon,
            weighting,
        })
    }

    pub fn analyze(&self, thread: &Thread) -> ThreadAnalysis {
        let full_text = format!("{} {}", thread.title, thread.selftext);
        // Extraction runs on the original text; preprocessing would destroy
        // the uppercase codes.
        let codes = self.extractor.extract(&full_text);

        let processed = self.preprocess(&full_text, &codes);
        let sentiment = self.polarity.polarity_scores(&processed);

        let courses = codes
            .iter()
            .map(|code| self.analyze_course(thread, &full_text, code))
            .collect();

        ThreadAnalysis {
            thread: thread.clone(),
            sentiment,
            courses,
        }
    }

    fn analyze_course(&self, thread: &Thread, full_text: &str, code: &str) -> CourseMention {
        let sentences = self.locator.locate(full_text, code, CONTEXT_WINDOW);
        let mentions = sentences.len();

        let mut record = CourseMention {
            code: code.to_string(),
            department: code.chars().take(2).collect(),
            compound: 0.0,
            pos: 0.0,
            neu: 0.0,
            neg: 0.0,
            mentions,
            bird_terms: Default::default(),
            title_mention: false,
        };

        let mut total_weight = 0.0;
        for sentence in &sentences {
            let local_codes = self.extractor.extract(sentence);
            let processed = self.preprocess(sentence, &local_codes);

            let scores = self.polarity.polarity_scores(&processed);
            let terms = self.lexicon.detect_terms(&processed);
            let bird_term_score = terms.weighted_score(&self.lexicon);
            let compound =
                (scores.compound + bird_term_score * BIRD_TERM_BLEND).clamp(-1.0, 1.0);

            let weight = self.sentence_weight(sentence, &processed, code);
            record.compound += compound * weight;
            record.pos += scores.pos * weight;
            record.neu += scores.neu * weight;
            record.neg += scores.neg * weight;
            record.bird_terms.merge(&terms);
            total_weight += weight;
        }

        if total_weight > 0.0 {
            record.compound /= total_weight;
            record.pos /= total_weight;
            record.neu /= total_weight;
            record.neg /= total_weight;
        }

        if contains_token(&thread.title, code) {
            record.title_mention = true;
            record.compound = (record.compound * TITLE_BOOST).clamp(-1.0, 1.0);
        }

        // Negative priors only pull down positive compounds; they never
        // deepen an already negative one. Positive priors apply always.
        let adjustment = self.lexicon.department_adjustment(&record.department);
        if adjustment < 0.0 && record.compound > 0.0 {
            record.compound = (record.compound + adjustment).max(-1.0);
        } else if adjustment > 0.0 {
            record.compound = (record.compound + adjustment).min(1.0);
        }

        if record.compound > 0.0 {
            let factor = (1.0 + thread.score as f64 / SOCIAL_SCALE).clamp(1.0, SOCIAL_CAP);
            record.compound = (record.compound * factor).min(1.0);
        }

        record
    }

    fn sentence_weight(&self, raw: &str, processed: &str, code: &str) -> f64 {
        match self.weighting {
            SentenceWeighting::Uniform => 1.0,
            SentenceWeighting::Emphasis => {
                let mut weight = 1.0;
                if raw.contains(code) {
                    weight *= SENTENCE_CODE_WEIGHT;
                }
                if INTENSIFIERS.iter().any(|i| contains_token(processed, i)) {
                    weight *= INTENSIFIER_WEIGHT;
                }
                weight
            }
        }
    }

    /// Lowercase, drop URLs, strip punctuation, then re-append any course
    /// code that punctuation stripping fused into a neighboring token.
    fn preprocess(&self, text: &str, codes: &[String]) -> String {
        let lowered = text.to_lowercase();
        let no_urls = self.url_pattern.replace_all(&lowered, " ");
        let mut processed = self.punct_pattern.replace_all(&no_urls, "").into_owned();
        for code in codes {
            let lowered_code = code.to_lowercase();
            if !contains_token(&processed, &lowered_code) {
                processed.push(' ');
                processed.push_str(&lowered_code);
            }
        }
        processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::TermKind;

    fn analyzer(weighting: SentenceWeighting) -> ThreadAnalyzer {
        ThreadAnalyzer::new(Lexicon::default(), weighting).unwrap()
    }

    fn thread(title: &str, selftext: &str, score: i64) -> Thread {
        Thread {
            id: "t3_abc".to_string(),
            title: title.to_string(),
            selftext: selftext.to_string(),
            score,
            num_comments: Some(5),
            created: None,
            url: "https://reddit.com/r/wlu/abc".to_string(),
        }
    }

    #[test]
    fn bird_course_thread_scores_positive() {
        let analyzer = analyzer(SentenceWeighting::Uniform);
        let analysis =
            analyzer.analyze(&thread("CP104 is such a bird course, so easy!", "", 50));

        assert_eq!(analysis.courses.len(), 1);
        let mention = &analysis.courses[0];
        assert_eq!(mention.code, "CP104");
        assert_eq!(mention.department, "CP");
        assert_eq!(mention.mentions, 1);
        assert!(mention.title_mention);
        assert!(mention.bird_terms.get(TermKind::Bird, "bird") >= 1);
        assert!(mention.bird_terms.get(TermKind::Bird, "easy") >= 1);
        // CP carries a negative prior, but the base compound is strongly
        // positive, so the prior reduces without flipping the sign.
        assert!(mention.compound > 0.0);
        assert!(mention.compound <= 1.0);
    }

    #[test]
    fn two_codes_get_independent_sentence_context() {
        let analyzer = analyzer(SentenceWeighting::Uniform);
        let body = "CP104 was a total breeze and so easy. Nothing to add here. \
                    Nothing at all to add. MA240 was brutal and I hated the labs.";
        let analysis = analyzer.analyze(&thread("Course opinions", body, 10));

        assert_eq!(analysis.courses.len(), 2);
        let cp = &analysis.courses[0];
        let ma = &analysis.courses[1];
        assert_eq!(cp.code, "CP104");
        assert_eq!(ma.code, "MA240");
        assert!(cp.compound > 0.0);
        assert!(ma.compound < 0.0);
        assert!(!cp.title_mention);
    }

    #[test]
    fn title_mention_set_when_code_only_in_title() {
        let analyzer = analyzer(SentenceWeighting::Uniform);
        let analysis = analyzer.analyze(&thread("Thoughts on EM202?", "It was fine.", 1));
        let mention = &analysis.courses[0];
        assert!(mention.title_mention);
    }

    #[test]
    fn fused_alphanumeric_runs_are_not_codes() {
        let analyzer = analyzer(SentenceWeighting::Uniform);
        // Both candidate codes are fused into longer alphanumeric runs, so
        // extraction finds nothing and no records are emitted.
        let analysis = analyzer.analyze(&thread(
            "Random chatter",
            "See this: inline CP1045X text mentioning BU111only partially",
            3,
        ));
        assert!(analysis.courses.is_empty());
    }

    #[test]
    fn negative_department_prior_skipped_for_negative_compound() {
        let analyzer = analyzer(SentenceWeighting::Uniform);
        let negative =
            analyzer.analyze(&thread("MA240 is brutal", "MA240 is brutal and I failed.", 2));
        let mention = &negative.courses[0];
        // MA's prior is negative; with a negative compound it must not be
        // applied, so the compound stays above compound + adjustment.
        assert!(mention.compound < 0.0);
        assert!(mention.compound >= -1.0);
    }

    #[test]
    fn emphasis_weighting_boosts_code_bearing_sentences() {
        let body = "GG102 was very easy. The textbook was boring.";
        let uniform = analyzer(SentenceWeighting::Uniform)
            .analyze(&thread("opinions", body, 0));
        let emphasis = analyzer(SentenceWeighting::Emphasis)
            .analyze(&thread("opinions", body, 0));

        let u = &uniform.courses[0];
        let e = &emphasis.courses[0];
        // The positive code-bearing sentence dominates under emphasis.
        assert!(e.compound > u.compound);
        assert_eq!(u.mentions, e.mentions);
    }

    #[test]
    fn preprocess_reappends_codes_lost_to_stripping() {
        let analyzer = analyzer(SentenceWeighting::Uniform);
        let processed = analyzer.preprocess("loved.CP104 this term", &["CP104".to_string()]);
        assert!(contains_token(&processed, "cp104"));
    }

    #[test]
    fn analysis_is_deterministic() {
        let analyzer = analyzer(SentenceWeighting::Emphasis);
        let t = thread("CP104 or BU111?", "CP104 is easy. BU111 is hard.", 12);
        let first = analyzer.analyze(&t);
        let second = analyzer.analyze(&t);
        assert_eq!(first.courses, second.courses);
    }
}
