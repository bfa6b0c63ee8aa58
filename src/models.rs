use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::lexicon::TermCounts;

/// A Reddit thread as delivered by the fetch layer. Immutable input; the
/// engine only reads it and emits annotated copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub selftext: String,
    pub score: i64,
    #[serde(default)]
    pub num_comments: Option<i64>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub url: String,
}

/// Polarity tuple from the lexicon scorer. `compound` is in [-1, 1];
/// `pos`/`neu`/`neg` are proportions in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PolarityScores {
    pub compound: f64,
    pub pos: f64,
    pub neu: f64,
    pub neg: f64,
}

/// Sentiment record for one (thread, course code) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseMention {
    pub code: String,
    pub department: String,
    pub compound: f64,
    pub pos: f64,
    pub neu: f64,
    pub neg: f64,
    pub mentions: usize,
    pub bird_terms: TermCounts,
    pub title_mention: bool,
}

/// A thread annotated with overall sentiment and per-course mention records.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadAnalysis {
    #[serde(flatten)]
    pub thread: Thread,
    pub sentiment: PolarityScores,
    pub courses: Vec<CourseMention>,
}

/// Lightweight reference back to a supporting thread.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadRef {
    pub id: String,
    pub title: String,
    pub url: String,
    pub score: i64,
    pub sentiment: f64,
    pub title_mention: bool,
}

/// One course across the whole corpus. Accumulated additively during the
/// fold phase, finalized once, then sorted by `bird_score` descending.
#[derive(Debug, Clone, Serialize)]
pub struct CourseAggregate {
    pub code: String,
    pub department: String,
    pub mentions: usize,
    pub score: i64,
    pub compound: f64,
    pub pos: f64,
    pub neu: f64,
    pub neg: f64,
    pub bird_terms: TermCounts,
    pub bird_score: f64,
    pub bird_term_score: f64,
    pub title_bonus: f64,
    pub dept_adjustment: f64,
    pub comment_factor: f64,
    pub level_adjustment: f64,
    pub threads: Vec<ThreadRef>,
    #[serde(skip)]
    pub comment_total: i64,
}

impl CourseAggregate {
    pub fn new(code: &str, department: &str) -> Self {
        CourseAggregate {
            code: code.to_string(),
            department: department.to_string(),
            mentions: 0,
            score: 0,
            compound: 0.0,
            pos: 0.0,
            neu: 0.0,
            neg: 0.0,
            bird_terms: TermCounts::default(),
            bird_score: 0.0,
            bird_term_score: 0.0,
            title_bonus: 0.0,
            dept_adjustment: 0.0,
            comment_factor: 0.0,
            level_adjustment: 0.0,
            threads: Vec::new(),
            comment_total: 0,
        }
    }
}

/// Discussion-topic mention counters for the course-detail report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscussionTopics {
    pub difficulty: u32,
    pub workload: u32,
    pub bird_course: u32,
    pub content: u32,
    pub structure: u32,
    pub grading: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExamMentions {
    pub midterm: u32,
    #[serde(rename = "final")]
    pub final_exam: u32,
    pub total: u32,
    pub weight_mentioned: bool,
    pub difficulty_mentioned: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AssignmentMentions {
    pub count: u32,
    pub papers: u32,
    pub total: u32,
    pub weight_mentioned: bool,
    pub difficulty_mentioned: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AssessmentMentions {
    pub quizzes: u32,
    pub labs: u32,
    pub attendance: u32,
    pub participation: u32,
    pub presentations: u32,
    pub projects: u32,
    pub group_work: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CourseComponents {
    pub exams: ExamMentions,
    pub assignments: AssignmentMentions,
    pub assessments: AssessmentMentions,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SentimentSummary {
    pub positive_aspects: BTreeMap<String, u32>,
    pub negative_aspects: BTreeMap<String, u32>,
    pub overall_sentiment: f64,
    pub compound: f64,
    pub pos: f64,
    pub neu: f64,
    pub neg: f64,
    pub bird_terms: TermCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextClues {
    pub terms: Vec<(String, u32)>,
    pub year_level_appropriate: bool,
    pub pre_requisites_mentioned: bool,
}

impl Default for ContextClues {
    fn default() -> Self {
        ContextClues {
            terms: Vec::new(),
            year_level_appropriate: true,
            pre_requisites_mentioned: false,
        }
    }
}

/// Detailed single-course report built from a pre-filtered thread subset.
/// Uses its own scoring profile; never mixed with `CourseAggregate`.
#[derive(Debug, Clone, Serialize)]
pub struct CourseDetails {
    pub code: String,
    pub department: String,
    pub specific_mentions: usize,
    pub avg_thread_score: f64,
    pub recent_mentions: usize,
    pub oldest_thread_date: Option<String>,
    pub newest_thread_date: Option<String>,
    pub is_online_available: bool,
    pub bird_score: f64,
    pub topics: DiscussionTopics,
    pub components: CourseComponents,
    pub sentiment: SentimentSummary,
    pub context: ContextClues,
    pub bird_term_score: f64,
    pub dept_adjustment: f64,
    pub comment_factor: f64,
    pub level_adjustment: f64,
    pub topic_adjustment: f64,
    pub assessment_penalty: f64,
    pub failure_penalty: f64,
    pub title_sentiment_penalty: f64,
    pub threads: Vec<ThreadRef>,
}
