// src/models/report.rs

use serde::Serialize;

use crate::{models::attempt::RowId, store::rules::Rule};

/// Headline metrics of one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub total_score: u64,
    /// Percentage of correct attempts.
    pub accuracy: f64,
    pub total_attempts: usize,
    /// Seconds.
    pub avg_time_spent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicPerformance {
    pub topic: String,
    /// Percentage, rounded to one decimal.
    pub accuracy: f64,
    pub questions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentAttempt {
    pub row_id: RowId,
    pub question_id: String,
    pub topic: String,
    pub difficulty: String,
    pub is_correct: bool,
    pub score: u32,
    pub time_spent: f64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub student_id: String,
    pub summary: StudentSummary,
    pub topic_performance: Vec<TopicPerformance>,
    pub recent_attempts: Vec<RecentAttempt>,
}

/// One bar chart: `labels[i]` goes with `values[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Box-plot statistics of `time_spent` for one difficulty level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub difficulty: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub most_challenging_topic: Option<String>,
    pub best_topic: Option<String>,
    pub overall_accuracy: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub error_rate_by_topic: ChartSeries,
    pub time_by_difficulty: Vec<BoxStats>,
    pub insights: Insights,
}

/// A rule that put a topic on the recommendation list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleEvidence {
    pub antecedents: Vec<String>,
    pub consequents: Vec<String>,
    pub support: Option<f64>,
    pub confidence: Option<f64>,
    pub lift: Option<f64>,
}

impl From<&Rule> for RuleEvidence {
    fn from(rule: &Rule) -> Self {
        Self {
            antecedents: rule.antecedents.iter().cloned().collect(),
            consequents: rule.consequents.iter().cloned().collect(),
            support: rule.support,
            confidence: rule.confidence,
            lift: rule.lift,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedTopic {
    pub rank: usize,
    pub topic: String,
    /// The student's own accuracy on this topic, percent.
    pub accuracy: f64,
    pub rules: Vec<RuleEvidence>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub student_id: String,
    /// True when there is nothing to work on.
    pub all_clear: bool,
    pub topics: Vec<RecommendedTopic>,
}
