use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::content::ContentProvider;
use crate::error::RouterError;
use crate::registry::loader::RegistryLoader;
use crate::registry::PersonaRegistry;
use crate::request::Request;
use crate::routing::{self, Routing};
use crate::settings::{Settings, SettingsManager};
use crate::template::{AssembledResponse, Skeleton, TemplateAssembler};
use crate::validation::RuleValidator;

/// The request pipeline: route, assemble, validate, and regenerate until the
/// response complies or the regeneration bound is reached.
///
/// Holds no per-request state, so one router serves any number of concurrent
/// requests.
#[derive(Clone)]
pub struct Router {
    registry: Arc<PersonaRegistry>,
    provider: Arc<dyn ContentProvider>,
    settings: Settings,
    validator: RuleValidator,
}

impl Router {
    pub fn new(
        registry: Arc<PersonaRegistry>,
        provider: Arc<dyn ContentProvider>,
        settings: Settings,
    ) -> Self {
        let validator = RuleValidator::default().with_disabled(&settings.disabled_rules);

        info!(
            registry = registry.source(),
            provider = provider.name(),
            rules = validator.rule_ids().len(),
            "Router ready"
        );

        Self {
            registry,
            provider,
            settings,
            validator,
        }
    }

    /// Loads the registry the settings point at (or the workspace, home or
    /// builtin one) and builds a router over it.
    pub fn load(
        settings: Settings,
        workspace_roots: Vec<PathBuf>,
        provider: Arc<dyn ContentProvider>,
    ) -> Result<Self, RouterError> {
        Self::with_loader(RegistryLoader::for_workspace(workspace_roots), settings, provider)
    }

    /// Builds a router from the manager's current settings. Later changes to
    /// the manager do not reach a router that already exists.
    pub fn from_settings(
        manager: &SettingsManager,
        loader: RegistryLoader,
        provider: Arc<dyn ContentProvider>,
    ) -> Result<Self, RouterError> {
        Self::with_loader(loader, manager.settings(), provider)
    }

    fn with_loader(
        loader: RegistryLoader,
        settings: Settings,
        provider: Arc<dyn ContentProvider>,
    ) -> Result<Self, RouterError> {
        let registry = loader
            .explicit_path(settings.registry_path.clone())
            .default_persona(settings.default_persona.clone())
            .load()?;

        Ok(Self::new(Arc::new(registry), provider, settings))
    }

    pub fn registry(&self) -> &PersonaRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn route(&self, text: &str) -> Routing {
        routing::route(
            &self.registry,
            &Request::new(text),
            self.settings.direct_max_words,
        )
    }

    /// The section layout `text` would be answered with, without generating.
    pub fn skeleton(&self, text: &str) -> Skeleton {
        let routing = self.route(text);
        self.skeleton_for(&routing)
    }

    fn skeleton_for(&self, routing: &Routing) -> Skeleton {
        let persona = routing
            .persona(&self.registry)
            .unwrap_or_else(|| self.registry.default_persona());
        TemplateAssembler::new(&self.registry).skeleton(persona, routing.mode)
    }

    pub async fn handle(&self, text: &str) -> Result<AssembledResponse, RouterError> {
        let request = Request::new(text);
        let routing = routing::route(&self.registry, &request, self.settings.direct_max_words);

        let span = info_span!(
            "handle",
            request_id = %Uuid::new_v4(),
            persona = %routing.persona,
            mode = %routing.mode,
        );

        self.run(request, routing).instrument(span).await
    }

    async fn run(
        &self,
        request: Request,
        routing: Routing,
    ) -> Result<AssembledResponse, RouterError> {
        let assembler = TemplateAssembler::new(&self.registry)
            .max_generation_retries(self.settings.max_generation_retries);
        let provider = self.provider.as_ref();

        let skeleton = self.skeleton_for(&routing);
        let mut response = assembler.assemble(&request, skeleton, provider).await?;
        let mut regenerations = 0;

        loop {
            let violations = self.validator.validate(&mut response);
            if violations.is_empty() {
                info!(regenerations, "Response passed validation");
                return Ok(response);
            }

            if regenerations >= self.settings.max_regeneration_attempts {
                let error = RouterError::ValidationFailure {
                    attempts: regenerations,
                    violations,
                };
                warn!(
                    regenerations,
                    rules = ?error.violated_rules(),
                    "Response still violates rules, giving up"
                );
                return Err(error);
            }

            regenerations += 1;
            info!(
                attempt = regenerations,
                violations = violations.len(),
                "Regenerating sections that violate rules"
            );
            response = assembler
                .regenerate(&request, response, &violations, regenerations, provider)
                .await?;
        }
    }
}
