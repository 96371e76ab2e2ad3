pub mod mode;
pub mod trigger;

#[cfg(test)]
mod tests;

use serde::Serialize;

use crate::registry::{Mode, Persona, PersonaRegistry};
use crate::request::Request;

pub use mode::ModeSelector;
pub use trigger::TriggerMatcher;

/// How the persona was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum PersonaDecision {
    /// An explicit alias such as `@QA`.
    Trigger { tie_broken: bool },
    /// No alias; a persona intent keyword such as `sprint`.
    Keyword { tie_broken: bool },
    /// Nothing matched; the registry default applies.
    Default,
}

/// Which mode heuristic decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum ModeDecision {
    ExplicitKeyword { tie_broken: bool },
    CodeReview,
    NarrowArtifact,
    BroadScope,
    PersonaDefault,
}

/// Result of routing one request: exactly one persona and one mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Routing {
    pub persona: String,
    pub mode: Mode,
    pub persona_decision: PersonaDecision,
    pub mode_decision: ModeDecision,
}

impl Routing {
    pub fn persona<'r>(&self, registry: &'r PersonaRegistry) -> Option<&'r Persona> {
        registry.get(&self.persona)
    }
}

/// Runs the trigger matcher and the mode selector. Pure and synchronous.
pub fn route(registry: &PersonaRegistry, request: &Request, direct_max_words: usize) -> Routing {
    let (persona, persona_decision) = TriggerMatcher::new(registry).resolve(request);
    let (mode, mode_decision) = ModeSelector::new(registry)
        .direct_max_words(direct_max_words)
        .select(request, persona);

    tracing::debug!(
        persona = %persona.id,
        %mode,
        ?persona_decision,
        ?mode_decision,
        "Routed request"
    );

    Routing {
        persona: persona.id.clone(),
        mode,
        persona_decision,
        mode_decision,
    }
}
