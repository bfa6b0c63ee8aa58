use crate::models::CourseAggregate;

/// A named bird-score formula. Finalized aggregate fields go in, one scalar
/// comes out. Keeping each historical formula behind this trait lets them be
/// tested independently instead of silently picking the latest.
pub trait ScoreStrategy {
    fn name(&self) -> &'static str;
    fn score(&self, aggregate: &CourseAggregate) -> f64;
}

/// The documented baseline weighting.
pub struct Baseline;

impl ScoreStrategy for Baseline {
    fn name(&self) -> &'static str {
        "baseline"
    }

    fn score(&self, a: &CourseAggregate) -> f64 {
        a.compound * 2.5
            + (a.mentions as f64 / 5.0).min(1.5)
            + a.pos * 2.0
            - a.neg * 3.0
            + a.bird_term_score * 1.5
            + (a.score as f64 / 50.0).min(0.8)
            + a.title_bonus
            + a.dept_adjustment
            + a.comment_factor
            + a.level_adjustment
    }
}

/// Re-tuned constants from the later pass: negativity weighs more, bird
/// terms and raw popularity weigh less.
pub struct Advanced;

impl ScoreStrategy for Advanced {
    fn name(&self) -> &'static str {
        "advanced"
    }

    fn score(&self, a: &CourseAggregate) -> f64 {
        a.compound * 2.0
            + (a.mentions as f64 / 5.0).min(1.2)
            + a.pos * 1.5
            - a.neg * 4.0
            + a.bird_term_score * 1.0
            + (a.score as f64 / 50.0).min(0.6)
            + a.title_bonus
            + a.dept_adjustment
            + a.comment_factor
            + a.level_adjustment
    }
}

/// Round to two decimals for display and storage.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn preset(name: &str) -> Option<Box<dyn ScoreStrategy>> {
    match name {
        "baseline" => Some(Box::new(Baseline)),
        "advanced" => Some(Box::new(Advanced)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_aggregate() -> CourseAggregate {
        let mut a = CourseAggregate::new("CP104", "CP");
        a.mentions = 10;
        a.score = 100;
        a.compound = 0.4;
        a.pos = 0.3;
        a.neg = 0.1;
        a.bird_term_score = 0.5;
        a.title_bonus = 0.6;
        a.dept_adjustment = -0.2;
        a.comment_factor = 0.1;
        a.level_adjustment = 0.0;
        a
    }

    #[test]
    fn baseline_matches_documented_formula() {
        let a = sample_aggregate();
        let expected = 0.4 * 2.5 + 1.5 + 0.3 * 2.0 - 0.1 * 3.0 + 0.5 * 1.5 + 0.8 + 0.6 - 0.2
            + 0.1
            + 0.0;
        assert!((Baseline.score(&a) - expected).abs() < 1e-9);
    }

    #[test]
    fn advanced_caps_mentions_and_score_lower() {
        let a = sample_aggregate();
        let expected = 0.4 * 2.0 + 1.2 + 0.3 * 1.5 - 0.1 * 4.0 + 0.5 * 1.0 + 0.6 + 0.6 - 0.2
            + 0.1
            + 0.0;
        assert!((Advanced.score(&a) - expected).abs() < 1e-9);
    }

    #[test]
    fn presets_resolve_by_name() {
        assert_eq!(preset("baseline").unwrap().name(), "baseline");
        assert_eq!(preset("advanced").unwrap().name(), "advanced");
        assert!(preset("latest").is_none());
    }

    #[test]
    fn round2_rounds_half_up_magnitudes() {
        assert_eq!(round2(3.456), 3.46);
        assert_eq!(round2(3.454), 3.45);
        assert_eq!(round2(-0.125), -0.13);
    }

    #[test]
    fn negative_thread_score_is_not_floored() {
        let mut a = sample_aggregate();
        a.score = -100;
        let penalized = Baseline.score(&a);
        a.score = 0;
        let neutral = Baseline.score(&a);
        assert!(penalized < neutral);
    }
}
