use std::collections::HashMap;

use crate::extract::course_level;
use crate::lexicon::Lexicon;
use crate::models::{CourseAggregate, ThreadAnalysis, ThreadRef};
use crate::score::ScoreStrategy;

const TITLE_BONUS_PER_THREAD: f64 = 0.3;
// Comment counts near this average are neutral; busier threads trend the
// factor negative, quieter ones positive, both capped at +/-0.5.
const COMMENT_PIVOT: f64 = 10.0;
const COMMENT_SLOPE: f64 = -20.0;

/// Fold analyzed threads into one aggregate per course, finalize each, and
/// sort by bird score descending. Ties keep first-mention order; the sort is
/// stable and aggregates are created in encounter order.
pub fn rank(
    analyses: &[ThreadAnalysis],
    lexicon: &Lexicon,
    strategy: &dyn ScoreStrategy,
) -> Vec<CourseAggregate> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut aggregates: Vec<CourseAggregate> = Vec::new();

    for analysis in analyses {
        for mention in &analysis.courses {
            let slot = match index.get(&mention.code) {
                Some(&i) => i,
                None => {
                    index.insert(mention.code.clone(), aggregates.len());
                    aggregates.push(CourseAggregate::new(&mention.code, &mention.department));
                    aggregates.len() - 1
                }
            };
            let aggregate = &mut aggregates[slot];

            let weight = mention.mentions as f64;
            aggregate.mentions += mention.mentions;
            aggregate.compound += mention.compound * weight;
            aggregate.pos += mention.pos * weight;
            aggregate.neu += mention.neu * weight;
            aggregate.neg += mention.neg * weight;
            // Full thread-score credit per course, even when one thread
            // mentions several courses.
            aggregate.score += analysis.thread.score;
            aggregate.comment_total += analysis.thread.num_comments.unwrap_or(0);
            aggregate.bird_terms.merge(&mention.bird_terms);
            aggregate.threads.push(ThreadRef {
                id: analysis.thread.id.clone(),
                title: analysis.thread.title.clone(),
                url: analysis.thread.url.clone(),
                score: analysis.thread.score,
                sentiment: mention.compound,
                title_mention: mention.title_mention,
            });
        }
    }

    for aggregate in &mut aggregates {
        finalize(aggregate, lexicon, strategy);
    }

    aggregates.sort_by(|a, b| {
        b.bird_score
            .partial_cmp(&a.bird_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    aggregates
}

fn finalize(aggregate: &mut CourseAggregate, lexicon: &Lexicon, strategy: &dyn ScoreStrategy) {
    if aggregate.mentions > 0 {
        let mentions = aggregate.mentions as f64;
        aggregate.compound /= mentions;
        aggregate.pos /= mentions;
        aggregate.neu /= mentions;
        aggregate.neg /= mentions;
    }

    aggregate.bird_term_score = aggregate.bird_terms.weighted_score(lexicon);
    if aggregate.mentions > 0 {
        aggregate.bird_term_score /= aggregate.mentions as f64;
    }

    let title_threads = aggregate
        .threads
        .iter()
        .filter(|t| t.title_mention)
        .count();
    aggregate.title_bonus = title_threads as f64 * TITLE_BONUS_PER_THREAD;

    aggregate.dept_adjustment = lexicon.department_adjustment(&aggregate.department);
    aggregate.comment_factor = comment_factor(aggregate.comment_total, aggregate.threads.len());
    aggregate.level_adjustment = level_adjustment(&aggregate.code);
    aggregate.bird_score = strategy.score(aggregate);
}

pub fn comment_factor(comment_total: i64, thread_count: usize) -> f64 {
    if thread_count == 0 {
        return 0.0;
    }
    let avg = comment_total as f64 / thread_count as f64;
    ((avg - COMMENT_PIVOT) / COMMENT_SLOPE).clamp(-0.5, 0.5)
}

pub fn level_adjustment(code: &str) -> f64 {
    let level = course_level(code);
    if level >= 300 {
        -0.5
    } else if level >= 200 {
        -0.3
    } else {
        0.0
    }
}
