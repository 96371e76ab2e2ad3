pub mod content;
pub mod error;
pub mod registry;
pub mod request;
pub mod router;
pub mod routing;
pub mod settings;
pub mod template;
pub mod validation;

// Public library API - the types an embedder needs to route and answer
// requests.
pub use content::{ContentProvider, GeneratedContent, GenerationError, GenerationRequest};
pub use error::RouterError;
pub use registry::{loader::RegistryLoader, Mode, Persona, PersonaRegistry, SectionKind};
pub use request::Request;
pub use router::Router;
pub use routing::{ModeDecision, PersonaDecision, Routing};
pub use settings::{Settings, SettingsManager};
pub use template::{AssembledResponse, Skeleton, ValidationStatus};
pub use validation::{Rule, RuleId, RuleValidator, Violation};
