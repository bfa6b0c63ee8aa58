use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::collections::HashMap;

use crate::aggregate::{comment_factor, level_adjustment};
use crate::extract::{contains_token, course_level, CourseExtractor};
use crate::lexicon::{Lexicon, TermCounts};
use crate::models::{CourseDetails, Thread, ThreadRef};
use crate::polarity::PolarityAnalyzer;
use crate::score::round2;

const RECENT_WINDOW_DAYS: i64 = 365;
const TITLE_BONUS_PER_THREAD: f64 = 0.3;
const NEGATIVE_TITLE_TERMS: [&str; 6] =
    ["fail", "hard", "difficult", "tough", "help", "struggling"];

const STOP_WORDS: [&str; 52] = [
    "about", "after", "again", "also", "because", "before", "being", "between", "both", "course",
    "could", "does", "doing", "during", "each", "even", "every", "from", "have", "having", "here",
    "just", "like", "more", "most", "much", "need", "only", "other", "really", "some", "such",
    "take", "takes", "taking", "than", "that", "their", "them", "then", "there", "these", "they",
    "this", "through", "very", "what", "when", "where", "which", "while", "with",
];

struct TopicPatterns {
    online: Regex,
    difficulty: Regex,
    workload: Regex,
    bird_course: Regex,
    content: Regex,
    structure: Regex,
    grading: Regex,
    midterm: Regex,
    final_exam: Regex,
    assignment: Regex,
    paper: Regex,
    quiz: Regex,
    lab: Regex,
    attendance: Regex,
    participation: Regex,
    presentation: Regex,
    project: Regex,
    group: Regex,
    fair: Regex,
    interesting: Regex,
    helpful: Regex,
    organized: Regex,
    boring: Regex,
    useless: Regex,
    confusing: Regex,
    stressful: Regex,
    weight: Regex,
    prerequisite: Regex,
    word: Regex,
}

fn re(pattern: &str) -> anyhow::Result<Regex> {
    Regex::new(&format!("(?i){pattern}"))
        .with_context(|| format!("topic pattern failed to compile: {pattern}"))
}

impl TopicPatterns {
    fn new() -> anyhow::Result<Self> {
        Ok(TopicPatterns {
            online: re(r"\b(?:online|OC|distance|remote)\b")?,
            difficulty: re(
                r"\b(?:difficult|hard|easy|tough|straightforward|challenging|simple|doable)\b",
            )?,
            workload: re(
                r"\b(?:workload|lot of work|little work|time-consuming|minimal work|effort|hours|weekly)\b",
            )?,
            bird_course: re(
                r"\b(?:bird course|bird|gpa booster|grade booster|easy course|easy 12|easy A|easy mark)\b",
            )?,
            content: re(
                r"\b(?:content|material|lectures|readings|textbook|interesting|boring|enjoyable|concepts)\b",
            )?,
            structure: re(
                r"\b(?:structure|organized|format|syllabus|outline|schedule|weekly|lecture|teaching style)\b",
            )?,
            grading: re(
                r"\b(?:grading|grades|marking|curve|bell curve|scaled|fair|harsh|lenient|easy grader|tough grader)\b",
            )?,
            midterm: re(r"\b(?:midterm|midterms|mid-term|mid term)\b")?,
            final_exam: re(r"\b(?:final|finals|final exam|exam)\b")?,
            assignment: re(r"\b(?:assignment|assignments|homework)\b")?,
            paper: re(r"\b(?:paper|papers|essay|essays|report|reports|writing)\b")?,
            quiz: re(r"\b(?:quiz|quizzes|test|tests)\b")?,
            lab: re(r"\b(?:lab|labs|laboratory|practical)\b")?,
            attendance: re(r"\b(?:attendance|attend|attending|show up|present)\b")?,
            participation: re(
                r"\b(?:participation|participate|class discussion|discussion|contributing)\b",
            )?,
            presentation: re(r"\b(?:presentation|presentations|present|presenting|slides)\b")?,
            project: re(r"\b(?:project|projects|assignment|term project)\b")?,
            group: re(r"\b(?:group|team|partner|group work|group project|group assignment)\b")?,
            fair: re(r"\b(?:fair|reasonable|manageable|balanced)\b")?,
            interesting: re(r"\b(?:interesting|engaging|fascinating|enjoyed|enjoyable|fun)\b")?,
            helpful: re(r"\b(?:helpful|useful|practical|valuable|worth it|worth taking)\b")?,
            organized: re(
                r"\b(?:organized|well-structured|clear|straightforward|well planned)\b",
            )?,
            boring: re(r"\b(?:boring|dull|dry|tedious|monotonous|not interesting)\b")?,
            useless: re(r"\b(?:useless|pointless|waste|not worth|worthless)\b")?,
            confusing: re(
                r"\b(?:confusing|unclear|disorganized|messy|all over the place|no structure)\b",
            )?,
            stressful: re(r"\b(?:stressful|stress|anxiety|overwhelming|too much|excessive)\b")?,
            weight: re(r"\b(?:weight|worth|percentage|percent|\d+%|portion|counts for)\b")?,
            prerequisite: re(
                r"\b(?:prerequisite|prereq|required|requirement|needed for|need to take|before taking)\b",
            )?,
            word: re(r"\b[a-z]{4,}\b")?,
        })
    }
}

/// Detail profile over a pre-filtered set of threads already known to be
/// about one course. Computes its own bird score with penalty terms; the
/// output is never folded back into the primary aggregates.
pub struct DetailAnalyzer {
    lexicon: Lexicon,
    polarity: PolarityAnalyzer,
    extractor: CourseExtractor,
    patterns: TopicPatterns,
}

impl DetailAnalyzer {
    pub fn new(lexicon: Lexicon) -> anyhow::Result<Self> {
        let polarity = PolarityAnalyzer::with_overlay(&lexicon.polarity_overlay);
        Ok(DetailAnalyzer {
            polarity,
            extractor: CourseExtractor::new()?,
            patterns: TopicPatterns::new()?,
            lexicon,
        })
    }

    /// Returns None when the subset is empty or no course code appears in
    /// any title.
    pub fn analyze(&self, threads: &[Thread]) -> Option<CourseDetails> {
        if threads.is_empty() {
            return None;
        }
        let code = self.dominant_title_code(threads)?;
        let department: String = code.chars().take(2).collect();

        let mut details = CourseDetails {
            code: code.clone(),
            department,
            specific_mentions: threads.len(),
            avg_thread_score: 0.0,
            recent_mentions: 0,
            oldest_thread_date: None,
            newest_thread_date: None,
            is_online_available: false,
            bird_score: 0.0,
            topics: Default::default(),
            components: Default::default(),
            sentiment: Default::default(),
            context: Default::default(),
            bird_term_score: 0.0,
            dept_adjustment: 0.0,
            comment_factor: 0.0,
            level_adjustment: 0.0,
            topic_adjustment: 0.0,
            assessment_penalty: 0.0,
            failure_penalty: 0.0,
            title_sentiment_penalty: 0.0,
            threads: Vec::new(),
        };

        let recent_cutoff = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);
        let mut post_dates: Vec<DateTime<Utc>> = Vec::new();
        let mut total_score = 0i64;
        let mut comment_total = 0i64;
        let mut bird_terms = TermCounts::default();
        let mut compound_sum = 0.0;
        let mut pos_sum = 0.0;
        let mut neu_sum = 0.0;
        let mut neg_sum = 0.0;

        for thread in threads {
            let full_text = format!("{} {}", thread.title, thread.selftext);
            total_score += thread.score;
            comment_total += thread.num_comments.unwrap_or(0);

            // Date parse failures just drop the thread from the recency
            // computation; they are never an error.
            if let Some(created) = &thread.created {
                if let Ok(date) = DateTime::parse_from_rfc3339(created) {
                    let date = date.with_timezone(&Utc);
                    if date > recent_cutoff {
                        details.recent_mentions += 1;
                    }
                    post_dates.push(date);
                }
            }

            if self.patterns.online.is_match(&full_text) {
                details.is_online_available = true;
            }
            self.tally_topics(&full_text, &mut details);
            self.tally_components(&full_text, &mut details);
            self.tally_aspects(&full_text, &mut details);

            if self.patterns.prerequisite.is_match(&full_text) {
                details.context.pre_requisites_mentioned = true;
            }

            let scores = self.polarity.polarity_scores(&full_text);
            compound_sum += scores.compound;
            pos_sum += scores.pos;
            neu_sum += scores.neu;
            neg_sum += scores.neg;
            bird_terms.merge(&self.lexicon.detect_terms(&full_text.to_lowercase()));

            details.threads.push(ThreadRef {
                id: thread.id.clone(),
                title: thread.title.clone(),
                url: thread.url.clone(),
                score: thread.score,
                sentiment: scores.compound,
                title_mention: contains_token(&thread.title, &code),
            });
        }

        let count = threads.len() as f64;
        details.avg_thread_score = total_score as f64 / count;
        if let Some(oldest) = post_dates.iter().min() {
            details.oldest_thread_date = Some(oldest.to_rfc3339());
        }
        if let Some(newest) = post_dates.iter().max() {
            details.newest_thread_date = Some(newest.to_rfc3339());
        }

        // Senior-level courses should have real difficulty discussion; if
        // they do not, the subset is probably off-topic.
        if course_level(&code) >= 300 && details.topics.difficulty < 2 {
            details.context.year_level_appropriate = false;
        }

        let positive_signal = f64::from(details.topics.bird_course) * 2.0
            + details
                .sentiment
                .positive_aspects
                .values()
                .map(|&n| f64::from(n))
                .sum::<f64>();
        let negative_signal = details
            .sentiment
            .negative_aspects
            .values()
            .map(|&n| f64::from(n))
            .sum::<f64>()
            * 1.5
            + if details.topics.difficulty >= 3 {
                f64::from(details.topics.difficulty)
            } else {
                0.0
            };
        details.sentiment.overall_sentiment =
            ((positive_signal - negative_signal) / count * 5.0).clamp(-10.0, 10.0);

        details.sentiment.compound = compound_sum / count;
        details.sentiment.pos = pos_sum / count;
        details.sentiment.neu = neu_sum / count;
        details.sentiment.neg = neg_sum / count;
        details.sentiment.bird_terms = bird_terms;

        details.context.terms = self.common_terms(threads);

        details.bird_term_score =
            details.sentiment.bird_terms.weighted_score(&self.lexicon) / count;
        let title_mentions = details.threads.iter().filter(|t| t.title_mention).count();
        let title_bonus = title_mentions as f64 * TITLE_BONUS_PER_THREAD;
        details.dept_adjustment = self.lexicon.department_adjustment(&details.department);
        details.comment_factor = comment_factor(comment_total, threads.len());
        details.level_adjustment = level_adjustment(&code);

        details.topic_adjustment = f64::from(details.topics.bird_course) * 0.4
            - f64::from(details.topics.difficulty) * 0.25
            - f64::from(details.topics.workload) * 0.15;

        let exam_mentions =
            details.components.exams.midterm + details.components.exams.final_exam;
        details.assessment_penalty = if details.components.exams.difficulty_mentioned {
            -(f64::from(exam_mentions)) * 0.15
        } else {
            -(f64::from(exam_mentions)) * 0.05
        };

        details.failure_penalty =
            -0.4 * f64::from(details.sentiment.bird_terms.failure_mentions()) / count.max(1.0);

        details.title_sentiment_penalty = threads
            .iter()
            .filter(|t| contains_token(&t.title, &code))
            .filter(|t| {
                let lowered = t.title.to_lowercase();
                NEGATIVE_TITLE_TERMS.iter().any(|term| lowered.contains(term))
            })
            .count() as f64
            * -0.2;

        let avg_score = details.avg_thread_score;
        let bird_score = details.sentiment.compound * 2.0
            + (details.specific_mentions as f64 / 5.0).min(1.2)
            + details.sentiment.pos * 1.5
            - details.sentiment.neg * 4.0
            + details.bird_term_score * 1.0
            + (avg_score / 50.0).min(0.6)
            + title_bonus
            + details.dept_adjustment
            + details.comment_factor
            + details.level_adjustment
            + details.topic_adjustment
            + details.assessment_penalty
            + details.failure_penalty
            + details.title_sentiment_penalty;
        details.bird_score = round2(bird_score.clamp(0.0, 10.0));

        Some(details)
    }

    /// Most frequent course code across titles; first-seen wins ties.
    fn dominant_title_code(&self, threads: &[Thread]) -> Option<String> {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, u32> = HashMap::new();
        for thread in threads {
            for code in self.extractor.extract(&thread.title) {
                if !counts.contains_key(&code) {
                    order.push(code.clone());
                }
                *counts.entry(code).or_insert(0) += 1;
            }
        }
        let mut best: Option<(String, u32)> = None;
        for code in order {
            let n = counts.get(&code).copied().unwrap_or(0);
            if best.as_ref().map_or(true, |(_, top)| n > *top) {
                best = Some((code, n));
            }
        }
        best.map(|(code, _)| code)
    }

    fn tally_topics(&self, text: &str, details: &mut CourseDetails) {
        let topics = &mut details.topics;
        for (pattern, counter) in [
            (&self.patterns.difficulty, &mut topics.difficulty),
            (&self.patterns.workload, &mut topics.workload),
            (&self.patterns.bird_course, &mut topics.bird_course),
            (&self.patterns.content, &mut topics.content),
            (&self.patterns.structure, &mut topics.structure),
            (&self.patterns.grading, &mut topics.grading),
        ] {
            if pattern.is_match(text) {
                *counter += 1;
            }
        }
    }

    fn tally_components(&self, text: &str, details: &mut CourseDetails) {
        let has_midterm = self.patterns.midterm.is_match(text);
        let has_final = self.patterns.final_exam.is_match(text);
        let has_assignment = self.patterns.assignment.is_match(text);
        let has_paper = self.patterns.paper.is_match(text);

        let exams = &mut details.components.exams;
        if has_midterm {
            exams.midterm += 1;
            exams.total += 1;
        }
        if has_final {
            exams.final_exam += 1;
            exams.total += 1;
        }

        let assignments = &mut details.components.assignments;
        if has_assignment {
            assignments.count += 1;
            assignments.total += 1;
        }
        if has_paper {
            assignments.papers += 1;
            assignments.total += 1;
        }

        let assessments = &mut details.components.assessments;
        for (pattern, counter) in [
            (&self.patterns.quiz, &mut assessments.quizzes),
            (&self.patterns.lab, &mut assessments.labs),
            (&self.patterns.attendance, &mut assessments.attendance),
            (&self.patterns.participation, &mut assessments.participation),
            (&self.patterns.presentation, &mut assessments.presentations),
            (&self.patterns.project, &mut assessments.projects),
            (&self.patterns.group, &mut assessments.group_work),
        ] {
            if pattern.is_match(text) {
                *counter += 1;
            }
        }

        if self.patterns.weight.is_match(text) {
            if has_midterm || has_final {
                details.components.exams.weight_mentioned = true;
            }
            if has_assignment || has_paper {
                details.components.assignments.weight_mentioned = true;
            }
        }
        if self.patterns.difficulty.is_match(text) {
            if has_midterm || has_final {
                details.components.exams.difficulty_mentioned = true;
            }
            if has_assignment || has_paper {
                details.components.assignments.difficulty_mentioned = true;
            }
        }
    }

    fn tally_aspects(&self, text: &str, details: &mut CourseDetails) {
        let sentiment = &mut details.sentiment;
        for (name, pattern) in [
            ("fair", &self.patterns.fair),
            ("interesting", &self.patterns.interesting),
            ("helpful", &self.patterns.helpful),
            ("organized", &self.patterns.organized),
        ] {
            if pattern.is_match(text) {
                *sentiment
                    .positive_aspects
                    .entry(name.to_string())
                    .or_insert(0) += 1;
            }
        }
        for (name, pattern) in [
            ("boring", &self.patterns.boring),
            ("useless", &self.patterns.useless),
            ("confusing", &self.patterns.confusing),
            ("stressful", &self.patterns.stressful),
        ] {
            if pattern.is_match(text) {
                *sentiment
                    .negative_aspects
                    .entry(name.to_string())
                    .or_insert(0) += 1;
            }
        }
    }

    /// Top terms by frequency across the subset, stop words removed.
    fn common_terms(&self, threads: &[Thread]) -> Vec<(String, u32)> {
        let all_text = threads
            .iter()
            .map(|t| format!("{} {}", t.title, t.selftext))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, u32> = HashMap::new();
        for m in self.patterns.word.find_iter(&all_text) {
            let word = m.as_str();
            if STOP_WORDS.contains(&word) {
                continue;
            }
            if !counts.contains_key(word) {
                order.push(word.to_string());
            }
            *counts.entry(word.to_string()).or_insert(0) += 1;
        }

        let mut terms: Vec<(String, u32)> = order
            .into_iter()
            .map(|word| {
                let n = counts.get(&word).copied().unwrap_or(0);
                (word, n)
            })
            .collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1));
        terms.truncate(10);
        terms
    }
}
