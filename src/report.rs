use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::lexicon::{TermCounts, TermKind};
use crate::models::{CourseAggregate, Thread};
use crate::store::display_rankings;

pub fn build_report(
    preset_name: &str,
    aggregates: &[CourseAggregate],
    threads: &[Thread],
) -> String {
    let rankings = display_rankings(aggregates);
    let mut output = String::new();

    let _ = writeln!(output, "# Bird Course Report");
    let _ = writeln!(
        output,
        "Generated {} from {} threads ({} preset)",
        Utc::now().date_naive(),
        threads.len(),
        preset_name
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Bird Courses");

    if rankings.is_empty() {
        let _ = writeln!(output, "No course codes found in this corpus.");
    } else {
        for aggregate in rankings.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}) bird score {:.2}/10 across {} mentions in {} threads",
                aggregate.code,
                aggregate.department,
                aggregate.bird_score,
                aggregate.mentions,
                aggregate.threads.len()
            );
        }
    }

    let mut terms = TermCounts::default();
    for aggregate in &rankings {
        terms.merge(&aggregate.bird_terms);
    }
    let mut term_rows: Vec<(TermKind, String, u32)> = terms
        .iter()
        .map(|(kind, term, n)| (kind, term.to_string(), n))
        .collect();
    term_rows.sort_by(|a, b| b.2.cmp(&a.2));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Term Mix");

    if term_rows.is_empty() {
        let _ = writeln!(output, "No bird or anti-bird terms detected.");
    } else {
        for (kind, term, count) in term_rows.iter().take(8) {
            let label = match kind {
                TermKind::Bird => "bird",
                TermKind::AntiBird => "anti-bird",
            };
            let _ = writeln!(output, "- {term} ({label}): {count}");
        }
    }

    let mut recent: Vec<&Thread> = threads.iter().collect();
    recent.sort_by(|a, b| parsed_date(b).cmp(&parsed_date(a)));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Threads");

    if recent.is_empty() {
        let _ = writeln!(output, "No threads in this corpus.");
    } else {
        for thread in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} (score {}, {} comments)",
                thread.title,
                thread.score,
                thread.num_comments.unwrap_or(0)
            );
        }
    }

    output
}

fn parsed_date(thread: &Thread) -> Option<DateTime<Utc>> {
    thread
        .created
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|date| date.with_timezone(&Utc))
}
