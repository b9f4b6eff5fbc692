// src/store/rules.rs

use std::{
    collections::{BTreeSet, HashSet},
    fmt,
    fs::File,
    path::Path,
    str::FromStr,
};

use csv::ReaderBuilder;
use serde::Deserialize;

use super::{StoreError, require_columns};

/// Prefix the rule miner puts in front of topic items.
pub const TOPIC_PREFIX: &str = "Topic_";

/// How a weak topic is tested against rule antecedents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleMatch {
    /// `Topic_<name>` must be one of the parsed antecedent items.
    #[default]
    Exact,
    /// Literal, case-sensitive `contains("Topic_<name>")` on the raw
    /// antecedent text. `Math` also matches `Topic_MathAdvanced`.
    Substring,
}

impl FromStr for RuleMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(RuleMatch::Exact),
            "substring" => Ok(RuleMatch::Substring),
            other => Err(format!("unknown rule match mode '{}'", other)),
        }
    }
}

impl fmt::Display for RuleMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleMatch::Exact => write!(f, "exact"),
            RuleMatch::Substring => write!(f, "substring"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRule {
    antecedents: String,
    #[serde(default)]
    consequents: Option<String>,
    #[serde(default)]
    support: Option<f64>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    lift: Option<f64>,
}

/// One mined association rule. Only `antecedents` drives recommendations;
/// the rest is reported next to each recommended topic.
#[derive(Debug, Clone)]
pub struct Rule {
    pub antecedents_raw: String,
    pub antecedents: BTreeSet<String>,
    pub consequents: BTreeSet<String>,
    pub support: Option<f64>,
    pub confidence: Option<f64>,
    pub lift: Option<f64>,
}

impl Rule {
    pub fn new(antecedents: &str) -> Self {
        Self {
            antecedents_raw: antecedents.to_string(),
            antecedents: parse_itemset(antecedents),
            consequents: BTreeSet::new(),
            support: None,
            confidence: None,
            lift: None,
        }
    }

    fn from_raw(raw: RawRule) -> Self {
        Self {
            antecedents: parse_itemset(&raw.antecedents),
            consequents: raw.consequents.as_deref().map(parse_itemset).unwrap_or_default(),
            antecedents_raw: raw.antecedents,
            support: raw.support,
            confidence: raw.confidence,
            lift: raw.lift,
        }
    }
}

/// Read-only rule table, loaded once at startup.
#[derive(Debug)]
pub struct RuleTable {
    rules: Vec<Rule>,
    antecedent_topics: HashSet<String>,
    mode: RuleMatch,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>, mode: RuleMatch) -> Self {
        let antecedent_topics = rules
            .iter()
            .flat_map(|r| r.antecedents.iter())
            .filter_map(|item| item.strip_prefix(TOPIC_PREFIX))
            .map(str::to_string)
            .collect();

        Self {
            rules,
            antecedent_topics,
            mode,
        }
    }

    /// Loads the rules CSV. Only the `antecedents` column is required.
    pub fn load(path: impl AsRef<Path>, mode: RuleMatch) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
        let mut reader = ReaderBuilder::new().from_reader(file);

        let headers = reader.headers().map_err(|e| StoreError::csv(path, e))?.clone();
        require_columns(path, &headers, &["antecedents"])?;

        let mut rules = Vec::new();
        for row in reader.deserialize::<RawRule>() {
            let raw = row.map_err(|e| StoreError::csv(path, e))?;
            rules.push(Rule::from_raw(raw));
        }

        let table = Self::new(rules, mode);
        tracing::info!(
            "Loaded {} rules from {} ({} antecedent topics, {} matching)",
            table.len(),
            path.display(),
            table.antecedent_topics.len(),
            mode
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn mode(&self) -> RuleMatch {
        self.mode
    }

    /// Whether any rule antecedent mentions `topic`.
    pub fn mentions_topic(&self, topic: &str) -> bool {
        match self.mode {
            RuleMatch::Exact => self.antecedent_topics.contains(topic),
            RuleMatch::Substring => self.rules_for_topic(topic).next().is_some(),
        }
    }

    /// Rules whose antecedent mentions `topic`, in file order.
    pub fn rules_for_topic<'a>(&'a self, topic: &str) -> impl Iterator<Item = &'a Rule> + 'a {
        let needle = format!("{}{}", TOPIC_PREFIX, topic);
        let mode = self.mode;
        self.rules.iter().filter(move |r| match mode {
            RuleMatch::Exact => r.antecedents.contains(&needle),
            RuleMatch::Substring => r.antecedents_raw.contains(&needle),
        })
    }
}

/// Parses an itemset as written by the rule miner.
///
/// Handles `frozenset({'a', 'b'})`, `{'a', 'b'}`, `('a',)` and bare `a, b`.
pub fn parse_itemset(raw: &str) -> BTreeSet<String> {
    let mut body = raw.trim();
    if let Some(inner) = body.strip_prefix("frozenset(").and_then(|s| s.strip_suffix(')')) {
        body = inner.trim();
    }
    for (open, close) in [('{', '}'), ('(', ')'), ('[', ']')] {
        if let Some(inner) = body.strip_prefix(open).and_then(|s| s.strip_suffix(close)) {
            body = inner.trim();
        }
    }

    body.split(',')
        .map(|item| item.trim().trim_matches(|c| c == '\'' || c == '"').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
