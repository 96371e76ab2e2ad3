pub mod mock;

use std::collections::HashMap;

use thiserror::Error;

use crate::registry::Mode;
use crate::template::SectionSlot;
use crate::validation::Violation;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Retryable error: {0}")]
    Retryable(anyhow::Error),

    #[error("Terminal error: {0}")]
    Terminal(anyhow::Error),
}

/// Everything a provider needs to write the requested sections.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub persona_id: String,
    pub persona_name: String,
    pub mode: Mode,
    pub request_text: String,
    /// Sections to fill, in layout order. On regeneration only the
    /// violating sections are listed.
    pub sections: Vec<SectionSlot>,
    /// Violations from the previous attempt; empty on the first attempt.
    pub feedback: Vec<Violation>,
    /// 0 for the first generation, incremented per regeneration.
    pub attempt: u32,
}

/// Section content keyed by section label. Order is irrelevant; the assembler
/// imposes the layout order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedContent {
    sections: HashMap<String, String>,
}

impl GeneratedContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, label: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(label, content);
        self
    }

    pub fn insert(&mut self, label: impl Into<String>, content: impl Into<String>) {
        self.sections.insert(label.into(), content.into());
    }

    /// Content for `label`, treating blank content as absent.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.sections
            .get(label)
            .map(String::as_str)
            .filter(|content| !content.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl FromIterator<(String, String)> for GeneratedContent {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            sections: iter.into_iter().collect(),
        }
    }
}

/// The external collaborator that writes section content, typically a
/// language model. Called once per (re)generation and awaited as one step.
#[async_trait::async_trait]
pub trait ContentProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, request: GenerationRequest)
        -> Result<GeneratedContent, GenerationError>;
}
