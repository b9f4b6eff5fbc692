// src/services/recommendation.rs

use std::collections::BTreeSet;

use crate::{models::attempt::Attempt, store::RuleTable};

/// Distinct topics the student answered incorrectly at least once.
pub fn weak_topics(student_id: &str, attempts: &[Attempt]) -> BTreeSet<String> {
    attempts
        .iter()
        .filter(|a| a.student_id == student_id && !a.is_correct)
        .map(|a| a.topic.clone())
        .collect()
}

/// Weak topics of `student_id` that appear in at least one rule antecedent.
///
/// An empty result means "no weak topics", callers fall back to the full
/// topic set. Unknown students simply have no weak topics.
pub fn recommend(student_id: &str, attempts: &[Attempt], rules: &RuleTable) -> BTreeSet<String> {
    weak_topics(student_id, attempts)
        .into_iter()
        .filter(|topic| rules.mentions_topic(topic))
        .collect()
}
