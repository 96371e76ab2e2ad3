use std::sync::LazyLock;

use regex::Regex;

use crate::registry::SectionKind;
use crate::template::AssembledResponse;
use crate::validation::code::{self, error_handling_problem, untyped_signatures};
use crate::validation::lexicon::{APOLOGY_PHRASES, PLACEHOLDER_MARKERS, PLACEHOLDER_PHRASES};
use crate::validation::{Rule, RuleId, Violation};

/// Elisions inside code: a line that is only an ellipsis, a comment that
/// opens with one (`// ... existing logic`), a stub body after a `def` or
/// `class` header, and a `{ ... }` body. Spreads such as `...rest` are not
/// matched.
static CODE_ELISION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)(?:^\s*(?:\.\.\.|…)\s*$",
        r"|(?://+|#|/\*+|--|^\s*\*)\s*(?:\.\.\.|…)",
        r"|^\s*(?:async\s+)?(?:def|class)\b[^\n]*:\s*(?:\.\.\.|…)\s*(?:#[^\n]*)?$",
        r"|\{\s*(?:\.\.\.|…)\s*\})",
    ))
    .expect("valid elision regex")
});

static APOLOGY: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = APOLOGY_PHRASES
        .iter()
        .map(|phrase| regex::escape(phrase))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternatives})\b")).expect("valid apology regex")
});

/// Rejects content that stands in for content: TODO markers, stock
/// placeholder phrases and elisions.
pub struct NoPlaceholderTokens;

impl NoPlaceholderTokens {
    pub const ID: RuleId = RuleId("no-placeholder-tokens");

    fn findings(kind: SectionKind, content: &str) -> Vec<String> {
        let mut found: Vec<String> = PLACEHOLDER_MARKERS
            .iter()
            .filter(|marker| content.contains(*marker))
            .map(|marker| marker.to_string())
            .collect();

        let lowered = content.to_lowercase();
        found.extend(
            PLACEHOLDER_PHRASES
                .iter()
                .filter(|phrase| lowered.contains(*phrase))
                .map(|phrase| phrase.to_string()),
        );

        let elided = CODE_ELISION.is_match(content)
            || (kind != SectionKind::Code && {
                let prose = code::strip_fenced(content);
                prose.contains("...") || prose.contains('…')
            });
        if elided {
            found.push("...".to_string());
        }

        found
    }
}

impl Rule for NoPlaceholderTokens {
    fn id(&self) -> RuleId {
        Self::ID
    }

    fn description(&self) -> &'static str {
        "Content must be complete: no TODO/FIXME/TBD markers, placeholder phrases or elisions"
    }

    fn check(&self, response: &AssembledResponse) -> Vec<Violation> {
        response
            .sections()
            .iter()
            .filter_map(|section| {
                let found = Self::findings(section.kind, &section.content);
                (!found.is_empty()).then(|| {
                    let quoted: Vec<String> = found.iter().map(|f| format!("'{f}'")).collect();
                    Violation::new(
                        Self::ID,
                        Some(section.label.as_str()),
                        format!("contains {}", quoted.join(", ")),
                    )
                })
            })
            .collect()
    }
}

/// Rejects apologetic or self-referential filler in prose sections.
pub struct NoApologyPhrases;

impl NoApologyPhrases {
    pub const ID: RuleId = RuleId("no-apology-phrases");
}

impl Rule for NoApologyPhrases {
    fn id(&self) -> RuleId {
        Self::ID
    }

    fn description(&self) -> &'static str {
        "Prose must not apologize or talk about being an AI"
    }

    fn check(&self, response: &AssembledResponse) -> Vec<Violation> {
        let mut violations = Vec::new();

        for section in response.sections() {
            if section.kind == SectionKind::Code {
                continue;
            }
            let prose = code::strip_fenced(&section.content);
            for sentence in prose.split(['.', '!', '?', '\n']) {
                if let Some(phrase) = APOLOGY.find(sentence) {
                    violations.push(Violation::new(
                        Self::ID,
                        Some(section.label.as_str()),
                        format!("'{}' in \"{}\"", phrase.as_str(), sentence.trim()),
                    ));
                }
            }
        }

        violations
    }
}

/// Function signatures in code must carry type information.
pub struct TypedCodeRequired;

impl TypedCodeRequired {
    pub const ID: RuleId = RuleId("typed-code-required");
}

impl Rule for TypedCodeRequired {
    fn id(&self) -> RuleId {
        Self::ID
    }

    fn description(&self) -> &'static str {
        "Functions in code must declare parameter and return types where the language allows"
    }

    fn check(&self, response: &AssembledResponse) -> Vec<Violation> {
        response
            .sections()
            .iter()
            .flat_map(|section| {
                code::snippets(section)
                    .iter()
                    .flat_map(untyped_signatures)
                    .map(|problem| Violation::new(Self::ID, Some(section.label.as_str()), problem))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

/// Operations that can fail must have their failure handled, and errors
/// must never be swallowed.
pub struct ExplicitErrorHandling;

impl ExplicitErrorHandling {
    pub const ID: RuleId = RuleId("explicit-error-handling");
}

impl Rule for ExplicitErrorHandling {
    fn id(&self) -> RuleId {
        Self::ID
    }

    fn description(&self) -> &'static str {
        "Fallible operations in code must handle or propagate their errors"
    }

    fn check(&self, response: &AssembledResponse) -> Vec<Violation> {
        response
            .sections()
            .iter()
            .flat_map(|section| {
                code::snippets(section)
                    .iter()
                    .filter_map(error_handling_problem)
                    .map(|problem| Violation::new(Self::ID, Some(section.label.as_str()), problem))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

pub struct RequiredSectionsPresent;

impl RequiredSectionsPresent {
    pub const ID: RuleId = RuleId("required-sections-present");
}

impl Rule for RequiredSectionsPresent {
    fn id(&self) -> RuleId {
        Self::ID
    }

    fn description(&self) -> &'static str {
        "Every required section of the layout must be present and non-empty"
    }

    fn check(&self, response: &AssembledResponse) -> Vec<Violation> {
        response
            .skeleton()
            .slots
            .iter()
            .filter(|slot| slot.required)
            .filter(|slot| {
                response
                    .section(&slot.label)
                    .map_or(true, |section| section.content.trim().is_empty())
            })
            .map(|slot| Violation::new(Self::ID, Some(slot.label.as_str()), "required section is missing"))
            .collect()
    }
}

pub struct SectionOrderMatchesMode;

impl SectionOrderMatchesMode {
    pub const ID: RuleId = RuleId("section-order-matches-mode");
}

impl Rule for SectionOrderMatchesMode {
    fn id(&self) -> RuleId {
        Self::ID
    }

    fn description(&self) -> &'static str {
        "Sections must appear in the order the mode's layout prescribes"
    }

    fn check(&self, response: &AssembledResponse) -> Vec<Violation> {
        let skeleton = response.skeleton();
        let actual = response.labels();

        if let Some(unknown) = actual.iter().find(|label| skeleton.slot(label).is_none()) {
            return vec![Violation::new(
                Self::ID,
                None,
                format!("section '{unknown}' is not part of the {} layout", skeleton.mode),
            )];
        }

        let expected: Vec<&str> = skeleton
            .labels()
            .into_iter()
            .filter(|label| actual.contains(label))
            .collect();

        if expected == actual {
            return Vec::new();
        }

        vec![Violation::new(
            Self::ID,
            None,
            format!(
                "expected order [{}], found [{}]",
                expected.join(", "),
                actual.join(", ")
            ),
        )]
    }
}
