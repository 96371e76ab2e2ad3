pub mod code;
pub mod lexicon;
pub mod rules;


use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::template::{AssembledResponse, ValidationStatus};

/// Stable identifier of a validation rule, e.g. `no-placeholder-tokens`.
/// Using a wrapper type keeps rule ids from being confused with section labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RuleId(pub &'static str);

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub rule: RuleId,
    /// The offending section, when the violation is local to one.
    pub section: Option<String>,
    pub detail: String,
}

impl Violation {
    pub fn new(rule: RuleId, section: Option<&str>, detail: impl Into<String>) -> Self {
        Self {
            rule,
            section: section.map(str::to_string),
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.section {
            Some(section) => write!(f, "[{}] {}: {}", self.rule, section, self.detail),
            None => write!(f, "[{}] {}", self.rule, self.detail),
        }
    }
}

/// A single absolute rule, checked against a fully assembled response.
pub trait Rule: Send + Sync {
    fn id(&self) -> RuleId;

    fn description(&self) -> &'static str;

    /// Every violation found; empty when the response complies.
    fn check(&self, response: &AssembledResponse) -> Vec<Violation>;
}

/// Post-assembly gate. A response leaves the router only once every
/// enabled rule passes.
#[derive(Clone)]
pub struct RuleValidator {
    rules: Vec<Arc<dyn Rule>>,
}

impl Default for RuleValidator {
    fn default() -> Self {
        Self::new(Self::default_rules())
    }
}

impl RuleValidator {
    pub fn new(rules: Vec<Arc<dyn Rule>>) -> Self {
        Self { rules }
    }

    pub fn default_rules() -> Vec<Arc<dyn Rule>> {
        vec![
            Arc::new(rules::NoPlaceholderTokens),
            Arc::new(rules::NoApologyPhrases),
            Arc::new(rules::TypedCodeRequired),
            Arc::new(rules::ExplicitErrorHandling),
            Arc::new(rules::RequiredSectionsPresent),
            Arc::new(rules::SectionOrderMatchesMode),
        ]
    }

    /// Drops rules whose id is listed, e.g. from settings.
    pub fn with_disabled(mut self, disabled: &HashSet<String>) -> Self {
        self.rules.retain(|rule| {
            let keep = !disabled.contains(rule.id().0);
            if !keep {
                tracing::info!(rule = %rule.id(), "Validation rule disabled by settings");
            }
            keep
        });
        self
    }

    pub fn rule_ids(&self) -> Vec<RuleId> {
        self.rules.iter().map(|rule| rule.id()).collect()
    }

    /// Violations in rule order, without touching the response.
    pub fn check(&self, response: &AssembledResponse) -> Vec<Violation> {
        self.rules
            .iter()
            .flat_map(|rule| rule.check(response))
            .collect()
    }

    /// Checks the response and records the outcome in its status.
    pub fn validate(&self, response: &mut AssembledResponse) -> Vec<Violation> {
        let violations = self.check(response);

        if violations.is_empty() {
            response.set_status(ValidationStatus::Valid);
        } else {
            for violation in &violations {
                tracing::debug!(%violation, "Validation rule violated");
            }
            response.set_status(ValidationStatus::Failed(violations.clone()));
        }

        violations
    }
}
