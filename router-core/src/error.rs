use thiserror::Error;

use crate::content::GenerationError;
use crate::registry::Mode;
use crate::validation::Violation;

#[derive(Error, Debug)]
pub enum RouterError {
    /// The registry could not be parsed or violates a structural invariant.
    /// Fatal at startup: no request can be routed against it.
    #[error("Malformed registry ({source_name}): {reason}")]
    MalformedRegistry { source_name: String, reason: String },

    #[error("Content provider returned no content for required section '{section}' ({persona}/{mode})")]
    MissingSectionContent {
        persona: String,
        mode: Mode,
        section: String,
    },

    #[error("Response failed validation after {attempts} attempt(s): {}", format_violations(.violations))]
    ValidationFailure {
        attempts: u32,
        violations: Vec<Violation>,
    },

    #[error("Content generation failed: {0}")]
    Generation(#[from] GenerationError),
}

impl RouterError {
    pub fn malformed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRegistry {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Rule ids responsible for a validation failure, deduplicated in report order.
    pub fn violated_rules(&self) -> Vec<&'static str> {
        let Self::ValidationFailure { violations, .. } = self else {
            return Vec::new();
        };
        let mut ids: Vec<&'static str> = Vec::new();
        for violation in violations {
            if !ids.contains(&violation.rule.0) {
                ids.push(violation.rule.0);
            }
        }
        ids
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
