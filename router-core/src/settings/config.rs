use std::collections::HashSet;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::routing::mode::DEFAULT_DIRECT_MAX_WORDS;
use crate::template::DEFAULT_MAX_GENERATION_RETRIES;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Settings {
    /// Persona used when a request names none and matches no keyword.
    /// Overrides the registry's own `default_persona`.
    #[serde(default)]
    pub default_persona: Option<String>,

    /// Registry file to load instead of the workspace/home/builtin lookup.
    #[serde(default)]
    pub registry_path: Option<PathBuf>,

    /// How many times a response that fails validation is regenerated
    /// before the request fails.
    #[serde(default = "default_max_regeneration_attempts")]
    pub max_regeneration_attempts: u32,

    /// Retries for transient content provider failures, per generation.
    #[serde(default = "default_max_generation_retries")]
    pub max_generation_retries: u32,

    /// Requests up to this many words may be answered in DIRECT mode.
    #[serde(default = "default_direct_max_words")]
    pub direct_max_words: usize,

    /// Rule ids to skip, e.g. `no-apology-phrases`.
    #[serde(default)]
    pub disabled_rules: HashSet<String>,
}

fn default_max_regeneration_attempts() -> u32 {
    2
}

fn default_max_generation_retries() -> u32 {
    DEFAULT_MAX_GENERATION_RETRIES
}

fn default_direct_max_words() -> usize {
    DEFAULT_DIRECT_MAX_WORDS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_persona: None,
            registry_path: None,
            max_regeneration_attempts: default_max_regeneration_attempts(),
            max_generation_retries: default_max_generation_retries(),
            direct_max_words: default_direct_max_words(),
            disabled_rules: HashSet::new(),
        }
    }
}
