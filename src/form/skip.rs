//! Skip policy — which fields a session bypasses, derived from its answers.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::schema::{ACT_NO, DOC_CERT, DOC_EGRN, DOC_SKIP};
use super::session::{Answer, Answers};

/// Keys bypassed for a session. Recomputed on demand, never stored.
pub type SkipSet = BTreeSet<String>;

/// "When `when` holds `equals`, bypass `skip`."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRule {
    pub when: String,
    pub equals: String,
    pub skip: Vec<String>,
}

impl SkipRule {
    pub fn new(when: &str, equals: &str, skip: &[&str]) -> Self {
        Self {
            when: when.to_string(),
            equals: equals.to_string(),
            skip: skip.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn matches(&self, answers: &Answers) -> bool {
        matches!(answers.get(&self.when), Some(Answer::Text(v)) if *v == self.equals)
    }
}

/// Pure mapping from answers to the set of bypassed field keys.
#[derive(Debug, Clone, Default)]
pub struct SkipPolicy {
    rules: Vec<SkipRule>,
}

impl SkipPolicy {
    pub fn new(rules: Vec<SkipRule>) -> Self {
        Self { rules }
    }

    /// Document-right and act rules for the lease schema.
    pub fn lease() -> Self {
        Self::new(vec![
            SkipRule::new("doc_choice", DOC_EGRN, &["cert_series", "cert_number"]),
            SkipRule::new("doc_choice", DOC_CERT, &["obj_kadastr"]),
            SkipRule::new("doc_choice", DOC_SKIP, &["obj_kadastr", "cert_series", "cert_number"]),
            SkipRule::new(
                "act_make",
                ACT_NO,
                &[
                    "act_date",
                    "act_condition",
                    "act_keys",
                    "act_electricity",
                    "act_hot_water",
                    "act_cold_water",
                ],
            ),
        ])
    }

    /// Append deployment-specific rules.
    pub fn with_rules(mut self, extra: impl IntoIterator<Item = SkipRule>) -> Self {
        self.rules.extend(extra);
        self
    }

    pub fn skip_set(&self, answers: &Answers) -> SkipSet {
        self.rules
            .iter()
            .filter(|rule| rule.matches(answers))
            .flat_map(|rule| rule.skip.iter().cloned())
            .collect()
    }

    pub fn is_skipped(&self, answers: &Answers, key: &str) -> bool {
        self.skip_set(answers).contains(key)
    }
}
