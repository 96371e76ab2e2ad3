use std::path::{Path, PathBuf};

use crate::error::RouterError;
use crate::registry::PersonaRegistry;

/// Directory, relative to a workspace root or the home directory, searched for
/// `registry.toml` / `registry.yaml` / `registry.json`.
pub const CONFIG_DIR: &str = ".persona-router";

const REGISTRY_FILE_NAMES: &[&str] = &["registry.toml", "registry.yaml", "registry.yml", "registry.json"];

/// Resolves which registry to load.
///
/// Precedence, first hit wins:
/// 1. an explicit path (from settings); a missing file is an error here,
///    since the user asked for it by name
/// 2. `<workspace>/.persona-router/registry.*`, for each workspace root in order
/// 3. `~/.persona-router/registry.*`
/// 4. the built-in table
pub struct RegistryLoader {
    explicit_path: Option<PathBuf>,
    workspace_roots: Vec<PathBuf>,
    home_dir: Option<PathBuf>,
    default_persona: Option<String>,
}

impl RegistryLoader {
    pub fn new(workspace_roots: Vec<PathBuf>, home_dir: Option<PathBuf>) -> Self {
        Self {
            explicit_path: None,
            workspace_roots,
            home_dir,
            default_persona: None,
        }
    }

    /// Loader rooted at the user's real home directory.
    pub fn for_workspace(workspace_roots: Vec<PathBuf>) -> Self {
        Self::new(workspace_roots, dirs::home_dir())
    }

    pub fn explicit_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_path = path;
        self
    }

    pub fn default_persona(mut self, id: Option<String>) -> Self {
        self.default_persona = id;
        self
    }

    pub fn load(&self) -> Result<PersonaRegistry, RouterError> {
        let registry = self.load_source()?;

        match &self.default_persona {
            Some(id) => registry.with_default_persona(id),
            None => Ok(registry),
        }
    }

    fn load_source(&self) -> Result<PersonaRegistry, RouterError> {
        if let Some(path) = &self.explicit_path {
            tracing::info!("Loading persona registry from settings: {}", path.display());
            return PersonaRegistry::from_path(path);
        }

        for workspace in &self.workspace_roots {
            if let Some(path) = find_registry_file(&workspace.join(CONFIG_DIR)) {
                tracing::info!(
                    "Loading persona registry override from workspace: {}",
                    path.display()
                );
                return PersonaRegistry::from_path(&path);
            }
        }

        if let Some(home) = &self.home_dir {
            if let Some(path) = find_registry_file(&home.join(CONFIG_DIR)) {
                tracing::info!(
                    "Loading persona registry override from home: {}",
                    path.display()
                );
                return PersonaRegistry::from_path(&path);
            }
        }

        tracing::debug!("No registry override found, using builtin registry");
        PersonaRegistry::builtin()
    }
}

fn find_registry_file(dir: &Path) -> Option<PathBuf> {
    REGISTRY_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}
