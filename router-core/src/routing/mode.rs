use strum::VariantArray;

use crate::registry::{Mode, Persona, PersonaRegistry};
use crate::request::Request;
use crate::routing::ModeDecision;

pub const DEFAULT_DIRECT_MAX_WORDS: usize = 12;

/// Picks the response mode from the request's shape.
///
/// Heuristics, highest priority first:
/// 1. an explicit mode keyword from the registry
/// 2. code present together with a review intent selects critique
/// 3. a short request with a single deliverable selects direct
/// 4. a long or multi-deliverable request selects architect
///
/// The persona's default mode applies only when none of these fire.
pub struct ModeSelector<'a> {
    registry: &'a PersonaRegistry,
    direct_max_words: usize,
}

impl<'a> ModeSelector<'a> {
    pub fn new(registry: &'a PersonaRegistry) -> Self {
        Self {
            registry,
            direct_max_words: DEFAULT_DIRECT_MAX_WORDS,
        }
    }

    pub fn direct_max_words(mut self, words: usize) -> Self {
        self.direct_max_words = words;
        self
    }

    pub fn select(&self, request: &Request, persona: &Persona) -> (Mode, ModeDecision) {
        if let Some((mode, tie_broken)) = self.explicit_keyword(request) {
            return (mode, ModeDecision::ExplicitKeyword { tie_broken });
        }

        if request.has_code() && request.has_review_intent() {
            return (Mode::Critique, ModeDecision::CodeReview);
        }

        let is_short = request.word_count() <= self.direct_max_words;
        let single = !request.has_multiple_deliverables();

        if is_short && single && request.deliverable_count() == 1 {
            return (Mode::Direct, ModeDecision::NarrowArtifact);
        }

        if !is_short || !single {
            return (Mode::Architect, ModeDecision::BroadScope);
        }

        tracing::debug!(
            persona = %persona.id,
            mode = %persona.default_mode,
            "No mode heuristic fired, using persona default"
        );
        (persona.default_mode, ModeDecision::PersonaDefault)
    }

    /// Earliest keyword wins, then the longer keyword, then mode declaration order.
    fn explicit_keyword(&self, request: &Request) -> Option<(Mode, bool)> {
        let mut hits: Vec<(usize, std::cmp::Reverse<usize>, Mode)> = Vec::new();

        for mode in Mode::VARIANTS {
            for keyword in self.registry.mode_keywords(*mode) {
                if let Some(position) = request.find_phrase(keyword) {
                    let length = keyword.split_whitespace().count();
                    hits.push((position, std::cmp::Reverse(length), *mode));
                }
            }
        }

        let &(_, _, winner) = hits.iter().min()?;
        let competing: Vec<Mode> = hits
            .iter()
            .map(|&(_, _, mode)| mode)
            .filter(|&mode| mode != winner)
            .collect();

        if !competing.is_empty() {
            tracing::warn!(
                winner = %winner,
                ?competing,
                "Mode ambiguous: keywords for several modes present; earliest keyword wins"
            );
        }

        Some((winner, !competing.is_empty()))
    }
}
