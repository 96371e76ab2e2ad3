use crate::registry::{Persona, PersonaRegistry};
use crate::request::Request;
use crate::routing::PersonaDecision;

/// A persona alias found in the request.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Hit<'a> {
    persona: &'a Persona,
    phrase: &'a str,
    position: usize,
    length: usize,
    registry_order: usize,
}

impl Hit<'_> {
    /// Earliest position first, then the longer phrase, then registry order.
    fn precedence_key(&self) -> (usize, std::cmp::Reverse<usize>, usize) {
        (self.position, std::cmp::Reverse(self.length), self.registry_order)
    }
}

/// Resolves the persona a request addresses.
///
/// Explicit trigger aliases are consulted first, then persona intent keywords,
/// then the registry's default persona. When several personas match at the
/// same stage the earliest match in the text wins.
pub struct TriggerMatcher<'a> {
    registry: &'a PersonaRegistry,
}

impl<'a> TriggerMatcher<'a> {
    pub fn new(registry: &'a PersonaRegistry) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, request: &Request) -> (&'a Persona, PersonaDecision) {
        let triggers = self.hits(request, |p| &p.triggers);
        if let Some((persona, tie_broken)) = self.pick(&triggers, "trigger") {
            return (persona, PersonaDecision::Trigger { tie_broken });
        }

        let keywords = self.hits(request, |p| &p.keywords);
        if let Some((persona, tie_broken)) = self.pick(&keywords, "keyword") {
            return (persona, PersonaDecision::Keyword { tie_broken });
        }

        let persona = self.registry.default_persona();
        tracing::debug!(persona = %persona.id, "No persona trigger matched, using default persona");
        (persona, PersonaDecision::Default)
    }

    fn hits(&self, request: &Request, aliases: impl Fn(&Persona) -> &Vec<String>) -> Vec<Hit<'a>> {
        let mut hits = Vec::new();

        for (registry_order, persona) in self.registry.personas().iter().enumerate() {
            for phrase in aliases(persona) {
                let Some(position) = request.find_phrase(phrase) else {
                    continue;
                };
                hits.push(Hit {
                    persona,
                    phrase,
                    position,
                    length: phrase.split_whitespace().count(),
                    registry_order,
                });
            }
        }

        hits
    }

    /// Returns the winning persona and whether distinct personas competed.
    fn pick(&self, hits: &[Hit<'a>], stage: &str) -> Option<(&'a Persona, bool)> {
        let winner = hits.iter().min_by_key(|hit| hit.precedence_key())?;

        let competing: Vec<&str> = hits
            .iter()
            .filter(|hit| hit.persona.id != winner.persona.id)
            .map(|hit| hit.persona.id.as_str())
            .collect();

        if !competing.is_empty() {
            tracing::warn!(
                stage,
                winner = %winner.persona.id,
                phrase = winner.phrase,
                ?competing,
                "Multiple personas matched; earliest match wins"
            );
        }

        Some((winner.persona, !competing.is_empty()))
    }
}
