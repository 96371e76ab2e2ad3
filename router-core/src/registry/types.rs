use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The overall shape of a response.
///
/// Declaration order doubles as the final tie-break when two modes are
/// otherwise indistinguishable, so new variants go at the end.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    JsonSchema,
    strum::VariantArray,
)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Direct,
    Architect,
    Critique,
    SprintPlanning,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Architect => "architect",
            Self::Critique => "critique",
            Self::SprintPlanning => "sprint_planning",
        }
    }

    /// Accepts `sprint_planning`, `SPRINT_PLANNING` and `sprint-planning`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "direct" => Some(Self::Direct),
            "architect" => Some(Self::Architect),
            "critique" => Some(Self::Critique),
            "sprint_planning" => Some(Self::SprintPlanning),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name().to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Heading,
    Checklist,
    Code,
    Table,
}

/// One entry of a required section layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OutputSection {
    pub kind: SectionKind,
    pub label: String,
    /// A required section that comes back without content fails assembly.
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl OutputSection {
    pub fn new(kind: SectionKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Generic definition of a mode: its explicit keywords and the section
/// layout used by any persona without an override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ModeDefinition {
    /// Phrases that select this mode outright (highest priority heuristic).
    #[serde(default)]
    pub keywords: Vec<String>,
    pub sections: Vec<OutputSection>,
}

/// A validated persona. Built from a [`PersonaEntry`] at registry load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// Stable snake_case identifier, e.g. `chaos_engineer`.
    pub id: String,
    /// Display name, e.g. `Chaos Engineer`.
    pub name: String,
    pub description: Option<String>,
    /// Case-insensitive aliases in declaration order.
    pub triggers: Vec<String>,
    pub keywords: Vec<String>,
    pub default_mode: Mode,
    pub overrides: BTreeMap<Mode, Vec<OutputSection>>,
}

impl Persona {
    pub fn sections_override(&self, mode: Mode) -> Option<&[OutputSection]> {
        self.overrides.get(&mode).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PersonaEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Multi-word aliases match consecutive tokens.
    pub triggers: Vec<String>,
    /// Intent words used to infer this persona when no trigger is present.
    #[serde(default)]
    pub keywords: Vec<String>,
    pub default_mode: Mode,
    /// Keyed by mode name. Replaces the mode's generic layout for this persona.
    #[serde(default)]
    pub overrides: BTreeMap<String, Vec<OutputSection>>,
}

/// On-disk shape of a registry file (TOML, YAML or JSON).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegistryFile {
    pub version: u32,
    pub default_persona: String,
    /// Keyed by mode name; every mode must be present.
    pub modes: BTreeMap<String, ModeDefinition>,
    pub personas: Vec<PersonaEntry>,
}
