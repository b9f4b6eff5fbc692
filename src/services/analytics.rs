// src/services/analytics.rs

//! Aggregations behind the dashboard, analytics and recommendation views.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    models::{
        attempt::{Attempt, RowId},
        report::{
            BoxStats, ChartSeries, Insights, RecentAttempt, RecommendedTopic, RuleEvidence,
            StudentSummary, TopicPerformance,
        },
    },
    store::RuleTable,
};

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    correct: usize,
    total: usize,
}

impl Tally {
    fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

fn tally_by_topic<'a>(attempts: impl IntoIterator<Item = &'a Attempt>) -> BTreeMap<String, Tally> {
    let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();
    for attempt in attempts {
        let tally = tallies.entry(attempt.topic.clone()).or_default();
        tally.total += 1;
        if attempt.is_correct {
            tally.correct += 1;
        }
    }
    tallies
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn student_summary(attempts: &[&Attempt]) -> StudentSummary {
    let total_attempts = attempts.len();
    if total_attempts == 0 {
        return StudentSummary {
            total_score: 0,
            accuracy: 0.0,
            total_attempts: 0,
            avg_time_spent: 0.0,
        };
    }

    let correct = attempts.iter().filter(|a| a.is_correct).count();
    let total_score = attempts.iter().map(|a| u64::from(a.score)).sum();
    let total_time: f64 = attempts.iter().map(|a| a.time_spent).sum();

    StudentSummary {
        total_score,
        accuracy: correct as f64 / total_attempts as f64 * 100.0,
        total_attempts,
        avg_time_spent: total_time / total_attempts as f64,
    }
}

/// Accuracy and question count per topic, topics in name order.
pub fn topic_performance(attempts: &[&Attempt]) -> Vec<TopicPerformance> {
    tally_by_topic(attempts.iter().copied())
        .into_iter()
        .map(|(topic, tally)| TopicPerformance {
            topic,
            accuracy: round1(tally.accuracy() * 100.0),
            questions: tally.total,
        })
        .collect()
}

/// The last `limit` rows, newest first.
pub fn recent_attempts(rows: &[(RowId, &Attempt)], limit: usize) -> Vec<RecentAttempt> {
    rows.iter()
        .rev()
        .take(limit)
        .map(|(row_id, a)| RecentAttempt {
            row_id: *row_id,
            question_id: a.question_id.clone(),
            topic: a.topic.clone(),
            difficulty: a.difficulty.clone(),
            is_correct: a.is_correct,
            score: a.score,
            time_spent: a.time_spent,
        })
        .collect()
}

/// `1 - accuracy` per topic over every student.
pub fn error_rate_by_topic(attempts: &[Attempt]) -> ChartSeries {
    let tallies = tally_by_topic(attempts);
    ChartSeries {
        labels: tallies.keys().cloned().collect(),
        values: tallies.values().map(|t| 1.0 - t.accuracy()).collect(),
    }
}

/// Quantile of an ascending slice with linear interpolation between ranks.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}

pub fn time_by_difficulty(attempts: &[Attempt]) -> Vec<BoxStats> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for attempt in attempts {
        groups
            .entry(attempt.difficulty.as_str())
            .or_default()
            .push(attempt.time_spent);
    }

    groups
        .into_iter()
        .map(|(difficulty, mut times)| {
            times.sort_by(f64::total_cmp);
            BoxStats {
                difficulty: difficulty.to_string(),
                count: times.len(),
                min: times[0],
                q1: quantile(&times, 0.25),
                median: quantile(&times, 0.5),
                q3: quantile(&times, 0.75),
                max: times[times.len() - 1],
            }
        })
        .collect()
}

pub fn insights(attempts: &[Attempt]) -> Insights {
    let tallies = tally_by_topic(attempts);

    let mut worst: Option<(&String, f64)> = None;
    let mut best: Option<(&String, f64)> = None;
    for (topic, tally) in &tallies {
        let acc = tally.accuracy();
        if worst.is_none_or(|(_, w)| acc < w) {
            worst = Some((topic, acc));
        }
        if best.is_none_or(|(_, b)| acc > b) {
            best = Some((topic, acc));
        }
    }

    let overall_accuracy = if attempts.is_empty() {
        None
    } else {
        let correct = attempts.iter().filter(|a| a.is_correct).count();
        Some(correct as f64 / attempts.len() as f64 * 100.0)
    };

    Insights {
        most_challenging_topic: worst.map(|(t, _)| t.clone()),
        best_topic: best.map(|(t, _)| t.clone()),
        overall_accuracy,
    }
}

/// Recommended topics, ranked in name order, with the student's accuracy on
/// each and the rules that matched it.
pub fn recommended_topics(
    topics: &BTreeSet<String>,
    student_rows: &[&Attempt],
    rules: &RuleTable,
) -> Vec<RecommendedTopic> {
    let tallies = tally_by_topic(student_rows.iter().copied());
    topics
        .iter()
        .enumerate()
        .map(|(i, topic)| RecommendedTopic {
            rank: i + 1,
            topic: topic.clone(),
            accuracy: tallies.get(topic).map(|t| t.accuracy() * 100.0).unwrap_or(0.0),
            rules: rules.rules_for_topic(topic).map(RuleEvidence::from).collect(),
        })
        .collect()
}
