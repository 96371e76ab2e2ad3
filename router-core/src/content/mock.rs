use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::content::{ContentProvider, GeneratedContent, GenerationError, GenerationRequest};
use crate::registry::SectionKind;
use crate::template::SectionSlot;

pub const MOCK_HEADING: &str = "The change is limited to the request parser; callers keep their current API.";
pub const MOCK_CHECKLIST: &str = "- [ ] Reject inputs longer than 4 KiB before parsing\n- [x] Input is validated at the boundary";
pub const MOCK_TABLE: &str = "| Option | Cost | Risk |\n|---|---|---|\n| Inline parser | Low | Low |\n| Parser crate | Medium | Low |";
pub const MOCK_CODE: &str = "```rust\nfn parse_port(raw: &str) -> Result<u16, std::num::ParseIntError> {\n    raw.trim().parse::<u16>()\n}\n```";

/// Mock behavior for the mock provider
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MockBehavior {
    /// Fill every requested section with valid canned content
    #[default]
    Success,
    /// Canned content, except `label` gets `content`
    Override { label: String, content: String },
    /// Canned content with `label` missing
    Omit { label: String },
    /// Return a retryable error N times, then succeed
    RetryableErrorThenSuccess { remaining_errors: usize },
    /// Always return a retryable error
    AlwaysRetryableError,
    /// Always return a non-retryable error
    AlwaysTerminalError,
    /// One behavior per call, then `Success` once drained
    BehaviorQueue { behaviors: Vec<MockBehavior> },
}

/// Content provider for tests. Clones share behavior, call count and captured
/// requests.
#[derive(Clone)]
pub struct MockProvider {
    behavior: Arc<Mutex<MockBehavior>>,
    call_count: Arc<Mutex<usize>>,
    captured_requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            call_count: Arc::new(Mutex::new(0)),
            captured_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn pop_behavior_from_queue(behavior: &mut MockBehavior) -> MockBehavior {
        if let MockBehavior::BehaviorQueue { behaviors } = behavior {
            if behaviors.is_empty() {
                return MockBehavior::Success;
            }
            return behaviors.remove(0);
        }
        behavior.clone()
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_captured_requests(&self) -> Vec<GenerationRequest> {
        self.captured_requests.lock().unwrap().clone()
    }

    pub fn get_last_captured_request(&self) -> Option<GenerationRequest> {
        self.captured_requests.lock().unwrap().last().cloned()
    }

    /// The content `Success` produces for a section of this kind.
    pub fn canned_content(kind: SectionKind) -> &'static str {
        match kind {
            SectionKind::Heading => MOCK_HEADING,
            SectionKind::Checklist => MOCK_CHECKLIST,
            SectionKind::Table => MOCK_TABLE,
            SectionKind::Code => MOCK_CODE,
        }
    }

    fn canned(sections: &[SectionSlot]) -> HashMap<String, String> {
        sections
            .iter()
            .map(|slot| {
                (
                    slot.label.clone(),
                    Self::canned_content(slot.kind).to_string(),
                )
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ContentProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GeneratedContent, GenerationError> {
        {
            let mut requests = self.captured_requests.lock().unwrap();
            requests.push(request.clone());
        }

        {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
        }

        let effective = {
            let mut behavior = self.behavior.lock().unwrap();
            Self::pop_behavior_from_queue(&mut behavior)
        };

        let mut sections = Self::canned(&request.sections);

        match effective {
            MockBehavior::Success => {}
            MockBehavior::Override { label, content } => {
                if sections.contains_key(&label) {
                    sections.insert(label, content);
                }
            }
            MockBehavior::Omit { label } => {
                sections.remove(&label);
            }
            MockBehavior::RetryableErrorThenSuccess {
                mut remaining_errors,
            } => {
                if remaining_errors > 0 {
                    remaining_errors -= 1;
                    self.set_behavior(MockBehavior::RetryableErrorThenSuccess { remaining_errors });
                    return Err(GenerationError::Retryable(anyhow::anyhow!(
                        "Mock retryable error"
                    )));
                }
            }
            MockBehavior::AlwaysRetryableError => {
                return Err(GenerationError::Retryable(anyhow::anyhow!(
                    "Mock retryable error"
                )));
            }
            MockBehavior::AlwaysTerminalError => {
                return Err(GenerationError::Terminal(anyhow::anyhow!(
                    "Mock terminal error"
                )));
            }
            MockBehavior::BehaviorQueue { .. } => {}
        }

        Ok(sections.into_iter().collect())
    }
}
