use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::extract::count_token_occurrences;

/// Whether a term counts toward or against birdness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    Bird,
    AntiBird,
}

/// A lexicon entry with a signed weight. Anti-bird weights are negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermEntry {
    pub kind: TermKind,
    pub term: String,
    pub weight: f64,
}

impl TermEntry {
    fn new(kind: TermKind, term: &str, weight: f64) -> Self {
        TermEntry {
            kind,
            term: term.to_string(),
            weight,
        }
    }
}

/// Occurrence counts keyed by kind and term. Keeping the kind in the key
/// means a bird term can never overwrite an anti-bird term of the same name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermCounts {
    counts: BTreeMap<(TermKind, String), u32>,
}

impl TermCounts {
    pub fn record(&mut self, kind: TermKind, term: &str, n: u32) {
        if n == 0 {
            return;
        }
        *self.counts.entry((kind, term.to_string())).or_insert(0) += n;
    }

    pub fn get(&self, kind: TermKind, term: &str) -> u32 {
        self.counts
            .get(&(kind, term.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn merge(&mut self, other: &TermCounts) {
        for ((kind, term), n) in &other.counts {
            *self.counts.entry((*kind, term.clone())).or_insert(0) += n;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermKind, &str, u32)> {
        self.counts
            .iter()
            .map(|((kind, term), n)| (*kind, term.as_str(), *n))
    }

    /// Sum of `weight * count` over all recorded terms. Terms missing from
    /// the lexicon contribute nothing.
    pub fn weighted_score(&self, lexicon: &Lexicon) -> f64 {
        self.iter()
            .map(|(kind, term, n)| lexicon.weight(kind, term) * f64::from(n))
            .sum()
    }

    /// Occurrences of terms whose text mentions failing, across both kinds.
    pub fn failure_mentions(&self) -> u32 {
        self.iter()
            .filter(|(_, term, _)| term.contains("fail"))
            .map(|(_, _, n)| n)
            .sum()
    }
}

// Serialized as a flat map with anti-bird terms prefixed, matching the
// stored rankings format ("bird": 2, "anti:hard": 1).
impl Serialize for TermCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (kind, term, n) in self.iter() {
            match kind {
                TermKind::Bird => map.serialize_entry(term, &n)?,
                TermKind::AntiBird => map.serialize_entry(&format!("anti:{term}"), &n)?,
            }
        }
        map.end()
    }
}

/// The full heuristic configuration: term tables, department priors, and the
/// overlay merged into the polarity lexicon. Deserializable so deployments
/// can swap tables without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    pub terms: Vec<TermEntry>,
    pub department_adjustments: BTreeMap<String, f64>,
    pub polarity_overlay: BTreeMap<String, f64>,
}

impl Lexicon {
    pub fn weight(&self, kind: TermKind, term: &str) -> f64 {
        self.terms
            .iter()
            .find(|e| e.kind == kind && e.term == term)
            .map(|e| e.weight)
            .unwrap_or(0.0)
    }

    pub fn department_adjustment(&self, department: &str) -> f64 {
        self.department_adjustments
            .get(department)
            .copied()
            .unwrap_or(0.0)
    }

    /// Count every lexicon term appearing in `text` (expected lowercased).
    pub fn detect_terms(&self, text: &str) -> TermCounts {
        let mut counts = TermCounts::default();
        for entry in &self.terms {
            let n = count_token_occurrences(text, &entry.term);
            counts.record(entry.kind, &entry.term, n);
        }
        counts
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        use TermKind::{AntiBird, Bird};

        let terms = vec![
            TermEntry::new(Bird, "bird", 1.0),
            TermEntry::new(Bird, "easy", 0.8),
            TermEntry::new(Bird, "gpa booster", 0.9),
            TermEntry::new(Bird, "breeze", 0.6),
            TermEntry::new(Bird, "chill", 0.5),
            TermEntry::new(Bird, "simple", 0.5),
            TermEntry::new(Bird, "straightforward", 0.5),
            TermEntry::new(Bird, "manageable", 0.4),
            TermEntry::new(Bird, "doable", 0.4),
            TermEntry::new(Bird, "light", 0.3),
            TermEntry::new(Bird, "joke", 0.4),
            TermEntry::new(AntiBird, "hard", -0.8),
            TermEntry::new(AntiBird, "difficult", -0.8),
            TermEntry::new(AntiBird, "tough", -0.6),
            TermEntry::new(AntiBird, "brutal", -0.9),
            TermEntry::new(AntiBird, "impossible", -0.9),
            TermEntry::new(AntiBird, "fail", -1.0),
            TermEntry::new(AntiBird, "failed", -1.0),
            TermEntry::new(AntiBird, "failing", -1.0),
            TermEntry::new(AntiBird, "struggling", -0.6),
            TermEntry::new(AntiBird, "stressful", -0.5),
            TermEntry::new(AntiBird, "heavy", -0.4),
            TermEntry::new(AntiBird, "grind", -0.4),
        ];

        let department_adjustments = BTreeMap::from(
            [
                ("BU", -0.2),
                ("CP", -0.2),
                ("MA", -0.4),
                ("PC", -0.3),
                ("CH", -0.2),
                ("ST", -0.2),
                ("EC", -0.1),
                ("AN", 0.1),
                ("GG", 0.1),
                ("ES", 0.2),
                ("EM", 0.2),
                ("MU", 0.2),
                ("RE", 0.3),
            ]
            .map(|(k, v)| (k.to_string(), v)),
        );

        let polarity_overlay = BTreeMap::from(
            [
                ("bird", 2.5),
                ("birdiest", 2.5),
                ("easy", 2.0),
                ("breeze", 2.0),
                ("chill", 1.5),
                ("booster", 1.5),
                ("gpa", 1.0),
                ("doable", 1.2),
                ("manageable", 1.2),
                ("hard", -2.0),
                ("difficult", -2.0),
                ("tough", -1.8),
                ("brutal", -2.5),
                ("impossible", -2.2),
                ("fail", -2.5),
                ("failed", -2.5),
                ("failing", -2.5),
                ("struggling", -1.8),
            ]
            .map(|(k, v)| (k.to_string(), v)),
        );

        Lexicon {
            terms,
            department_adjustments,
            polarity_overlay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_term_under_both_kinds_keeps_separate_slots() {
        let mut counts = TermCounts::default();
        counts.record(TermKind::Bird, "light", 2);
        counts.record(TermKind::AntiBird, "light", 1);
        assert_eq!(counts.get(TermKind::Bird, "light"), 2);
        assert_eq!(counts.get(TermKind::AntiBird, "light"), 1);
    }

    #[test]
    fn weighted_score_uses_signed_weights() {
        let lexicon = Lexicon::default();
        let mut counts = TermCounts::default();
        counts.record(TermKind::Bird, "bird", 2);
        counts.record(TermKind::AntiBird, "hard", 1);
        let expected = 1.0 * 2.0 + (-0.8);
        assert!((counts.weighted_score(&lexicon) - expected).abs() < 1e-9);
    }

    #[test]
    fn detect_terms_counts_occurrences() {
        let lexicon = Lexicon::default();
        let counts = lexicon.detect_terms("such a bird course so easy and easy");
        assert_eq!(counts.get(TermKind::Bird, "bird"), 1);
        assert_eq!(counts.get(TermKind::Bird, "easy"), 2);
        assert_eq!(counts.get(TermKind::AntiBird, "hard"), 0);
    }

    #[test]
    fn anti_terms_serialize_with_prefix() {
        let mut counts = TermCounts::default();
        counts.record(TermKind::Bird, "bird", 1);
        counts.record(TermKind::AntiBird, "hard", 3);
        let json = serde_json::to_value(&counts).unwrap();
        assert_eq!(json["bird"], 1);
        assert_eq!(json["anti:hard"], 3);
    }

    #[test]
    fn default_department_adjustments_follow_policy_signs() {
        let lexicon = Lexicon::default();
        assert!(lexicon.department_adjustment("CP") < 0.0);
        assert!(lexicon.department_adjustment("RE") > 0.0);
        assert_eq!(lexicon.department_adjustment("ZZ"), 0.0);
    }

    #[test]
    fn failure_mentions_span_both_kinds() {
        let mut counts = TermCounts::default();
        counts.record(TermKind::AntiBird, "failed", 2);
        counts.record(TermKind::AntiBird, "failing", 1);
        counts.record(TermKind::Bird, "easy", 4);
        assert_eq!(counts.failure_mentions(), 3);
    }
}
