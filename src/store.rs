use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tracing::warn;

use crate::lexicon::Lexicon;
use crate::models::{CourseAggregate, Thread};
use crate::score::round2;

/// Rankings are stored on a 0-10 display scale.
const MAX_DISPLAY_SCORE: f64 = 10.0;

/// Decode a JSON array of threads, skipping records that are missing a
/// required field instead of failing the whole batch.
pub fn parse_threads(json: &str) -> anyhow::Result<Vec<Thread>> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(json).context("thread dump is not a JSON array")?;

    let mut threads = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<Thread>(value) {
            Ok(thread) => threads.push(thread),
            Err(err) => warn!(index, error = %err, "skipping malformed thread record"),
        }
    }
    Ok(threads)
}

pub fn load_threads(path: &Path) -> anyhow::Result<Vec<Thread>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read threads from {}", path.display()))?;
    parse_threads(&raw)
}

pub fn load_lexicon(path: Option<&Path>) -> anyhow::Result<Lexicon> {
    match path {
        None => Ok(Lexicon::default()),
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read lexicon from {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid lexicon file {}", path.display()))
        }
    }
}

pub fn save_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Clones with bird scores capped to the display scale and rounded to two
/// decimals, the form rankings are stored and shown in.
pub fn display_rankings(aggregates: &[CourseAggregate]) -> Vec<CourseAggregate> {
    aggregates
        .iter()
        .cloned()
        .map(|mut aggregate| {
            aggregate.bird_score = round2(aggregate.bird_score.min(MAX_DISPLAY_SCORE));
            aggregate
        })
        .collect()
}

pub fn save_rankings(path: &Path, aggregates: &[CourseAggregate]) -> anyhow::Result<()> {
    save_json(path, &display_rankings(aggregates))
}

/// Write one row per course; returns the number of rows written.
pub fn export_csv(path: &Path, aggregates: &[CourseAggregate]) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    writer.write_record(["code", "department", "bird_score", "mentions", "score", "threads"])?;

    let rankings = display_rankings(aggregates);
    for aggregate in &rankings {
        writer.write_record([
            aggregate.code.as_str(),
            aggregate.department.as_str(),
            &format!("{:.2}", aggregate.bird_score),
            &aggregate.mentions.to_string(),
            &aggregate.score.to_string(),
            &aggregate.threads.len().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(rankings.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_threads() {
        let json = r#"[
            {"id": "a", "title": "CP104", "selftext": "", "score": 3,
             "num_comments": 7, "url": "https://example.com/a"}
        ]"#;
        let threads = parse_threads(json).unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].id, "a");
        assert_eq!(threads[0].num_comments, Some(7));
        assert_eq!(threads[0].created, None);
    }

    #[test]
    fn skips_malformed_records_and_keeps_the_rest() {
        let json = r#"[
            {"id": "good", "title": "BU111", "selftext": "fine", "score": 1},
            {"id": "no-score", "title": "MA103", "selftext": "missing"},
            {"id": "no-title", "selftext": "missing", "score": 2}
        ]"#;
        let threads = parse_threads(json).unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].id, "good");
    }

    #[test]
    fn rejects_non_array_input() {
        assert!(parse_threads(r#"{"title": "not a list"}"#).is_err());
    }

    #[test]
    fn display_rankings_cap_and_round() {
        let mut high = CourseAggregate::new("AA101", "AA");
        high.bird_score = 14.278;
        let mut low = CourseAggregate::new("BB101", "BB");
        low.bird_score = 3.14159;

        let display = display_rankings(&[high, low]);
        assert_eq!(display[0].bird_score, 10.0);
        assert_eq!(display[1].bird_score, 3.14);
    }

    #[test]
    fn csv_export_writes_one_row_per_course() {
        let mut a = CourseAggregate::new("AA101", "AA");
        a.bird_score = 4.5;
        a.mentions = 3;
        let b = CourseAggregate::new("BB202", "BB");

        let path = std::env::temp_dir().join(format!(
            "birdwatch-export-test-{}.csv",
            std::process::id()
        ));
        let written = export_csv(&path, &[a, b]).unwrap();
        assert_eq!(written, 2);

        let contents = fs::read_to_string(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert!(contents.starts_with("code,department,bird_score"));
        assert!(contents.contains("AA101,AA,4.50,3,0,0"));
    }
}
