pub mod render;


use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::content::{ContentProvider, GeneratedContent, GenerationError, GenerationRequest};
use crate::error::RouterError;
use crate::registry::{Mode, OutputSection, Persona, PersonaRegistry, SectionKind};
use crate::request::Request;
use crate::validation::Violation;

pub const DEFAULT_MAX_GENERATION_RETRIES: u32 = 3;

const INITIAL_BACKOFF_MS: u64 = 100;
const MAX_BACKOFF_MS: u64 = 1000;
const BACKOFF_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSlot {
    pub kind: SectionKind,
    pub label: String,
    pub required: bool,
}

impl SectionSlot {
    pub fn new(kind: SectionKind, label: impl Into<String>, required: bool) -> Self {
        Self {
            kind,
            label: label.into(),
            required,
        }
    }
}

impl From<&OutputSection> for SectionSlot {
    fn from(section: &OutputSection) -> Self {
        Self::new(section.kind, section.label.clone(), section.required)
    }
}

/// The content-free, ordered layout of a response for one (persona, mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skeleton {
    pub persona_id: String,
    pub persona_name: String,
    pub mode: Mode,
    pub slots: Vec<SectionSlot>,
}

impl Skeleton {
    pub fn labels(&self) -> Vec<&str> {
        self.slots.iter().map(|slot| slot.label.as_str()).collect()
    }

    pub fn slot(&self, label: &str) -> Option<&SectionSlot> {
        self.slots.iter().find(|slot| slot.label == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilledSection {
    pub kind: SectionKind,
    pub label: String,
    pub content: String,
}

impl FilledSection {
    pub fn new(kind: SectionKind, label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "violations")]
pub enum ValidationStatus {
    Pending,
    Valid,
    Failed(Vec<Violation>),
}

/// Filled sections for one request plus the layout they must follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssembledResponse {
    skeleton: Skeleton,
    sections: Vec<FilledSection>,
    status: ValidationStatus,
}

impl AssembledResponse {
    /// A pending response. The assembler is the usual constructor; this exists
    /// so rules can be exercised against hand-built responses.
    pub fn from_parts(skeleton: Skeleton, sections: Vec<FilledSection>) -> Self {
        Self {
            skeleton,
            sections,
            status: ValidationStatus::Pending,
        }
    }

    pub fn persona_id(&self) -> &str {
        &self.skeleton.persona_id
    }

    pub fn mode(&self) -> Mode {
        self.skeleton.mode
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn sections(&self) -> &[FilledSection] {
        &self.sections
    }

    pub fn section(&self, label: &str) -> Option<&FilledSection> {
        self.sections.iter().find(|section| section.label == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.sections.iter().map(|section| section.label.as_str()).collect()
    }

    pub fn status(&self) -> &ValidationStatus {
        &self.status
    }

    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }

    pub(crate) fn set_status(&mut self, status: ValidationStatus) {
        self.status = status;
    }

    pub fn render_markdown(&self) -> String {
        self.sections
            .iter()
            .map(|section| render::render_section(section.kind, &section.label, &section.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builds skeletons from the registry and fills them through a
/// [`ContentProvider`].
pub struct TemplateAssembler<'a> {
    registry: &'a PersonaRegistry,
    max_generation_retries: u32,
}

impl<'a> TemplateAssembler<'a> {
    pub fn new(registry: &'a PersonaRegistry) -> Self {
        Self {
            registry,
            max_generation_retries: DEFAULT_MAX_GENERATION_RETRIES,
        }
    }

    pub fn max_generation_retries(mut self, retries: u32) -> Self {
        self.max_generation_retries = retries;
        self
    }

    /// Pure lookup: the persona's override for `mode`, else the mode's layout.
    pub fn skeleton(&self, persona: &Persona, mode: Mode) -> Skeleton {
        Skeleton {
            persona_id: persona.id.clone(),
            persona_name: persona.name.clone(),
            mode,
            slots: self
                .registry
                .sections_for(persona, mode)
                .iter()
                .map(SectionSlot::from)
                .collect(),
        }
    }

    /// Fills every slot with one provider call and assembles the sections in
    /// layout order.
    pub async fn assemble(
        &self,
        request: &Request,
        skeleton: Skeleton,
        provider: &dyn ContentProvider,
    ) -> Result<AssembledResponse, RouterError> {
        let generation = GenerationRequest {
            persona_id: skeleton.persona_id.clone(),
            persona_name: skeleton.persona_name.clone(),
            mode: skeleton.mode,
            request_text: request.raw().to_string(),
            sections: skeleton.slots.clone(),
            feedback: Vec::new(),
            attempt: 0,
        };
        let content = self.generate_with_retry(provider, generation).await?;

        let mut sections = Vec::with_capacity(skeleton.slots.len());
        for slot in &skeleton.slots {
            match content.get(&slot.label) {
                Some(text) => sections.push(FilledSection::new(slot.kind, &slot.label, text)),
                None if slot.required => return Err(missing(&skeleton, slot)),
                None => {}
            }
        }

        Ok(AssembledResponse::from_parts(skeleton, sections))
    }

    /// Asks the provider again for the sections named by `violations` and
    /// splices the new content in place. A violation not tied to a known
    /// section regenerates the whole response.
    pub async fn regenerate(
        &self,
        request: &Request,
        response: AssembledResponse,
        violations: &[Violation],
        attempt: u32,
        provider: &dyn ContentProvider,
    ) -> Result<AssembledResponse, RouterError> {
        let skeleton = response.skeleton;
        let targeted: Option<HashSet<&str>> = violations
            .iter()
            .map(|v| {
                v.section
                    .as_deref()
                    .filter(|label| skeleton.slot(label).is_some())
            })
            .collect();

        let slots: Vec<SectionSlot> = match &targeted {
            Some(labels) => skeleton
                .slots
                .iter()
                .filter(|slot| labels.contains(slot.label.as_str()))
                .cloned()
                .collect(),
            None => skeleton.slots.clone(),
        };

        let generation = GenerationRequest {
            persona_id: skeleton.persona_id.clone(),
            persona_name: skeleton.persona_name.clone(),
            mode: skeleton.mode,
            request_text: request.raw().to_string(),
            sections: slots.clone(),
            feedback: violations.to_vec(),
            attempt,
        };
        let content = self.generate_with_retry(provider, generation).await?;

        let mut sections = Vec::with_capacity(skeleton.slots.len());
        for slot in &skeleton.slots {
            let regenerated = slots.iter().any(|s| s.label == slot.label);
            let text = if regenerated {
                content.get(&slot.label).map(str::to_string)
            } else {
                response
                    .sections
                    .iter()
                    .find(|section| section.label == slot.label)
                    .map(|section| section.content.clone())
            };

            match text {
                Some(text) => sections.push(FilledSection::new(slot.kind, &slot.label, text)),
                None if slot.required => return Err(missing(&skeleton, slot)),
                None => {}
            }
        }

        Ok(AssembledResponse::from_parts(skeleton, sections))
    }

    async fn generate_with_retry(
        &self,
        provider: &dyn ContentProvider,
        request: GenerationRequest,
    ) -> Result<GeneratedContent, RouterError> {
        let mut attempt = 0;

        loop {
            match provider.generate(request.clone()).await {
                Ok(content) => {
                    if attempt > 0 {
                        info!("Generation succeeded after {} retries", attempt);
                    }
                    return Ok(content);
                }
                Err(GenerationError::Retryable(e)) if attempt < self.max_generation_retries => {
                    let backoff_ms = calculate_backoff(attempt);
                    warn!(
                        attempt,
                        backoff_ms,
                        provider = provider.name(),
                        "Retryable generation error: {e:?}"
                    );
                    sleep(Duration::from_millis(backoff_ms)).await;
                    attempt += 1;
                }
                Err(error) => {
                    warn!(
                        attempt,
                        provider = provider.name(),
                        "Generation failed: {error:?}"
                    );
                    return Err(error.into());
                }
            }
        }
    }
}

fn calculate_backoff(attempt: u32) -> u64 {
    let backoff = INITIAL_BACKOFF_MS as f64 * BACKOFF_MULTIPLIER.powi(attempt as i32);
    (backoff as u64).min(MAX_BACKOFF_MS)
}

fn missing(skeleton: &Skeleton, slot: &SectionSlot) -> RouterError {
    RouterError::MissingSectionContent {
        persona: skeleton.persona_id.clone(),
        mode: skeleton.mode,
        section: slot.label.clone(),
    }
}
