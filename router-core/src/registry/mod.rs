pub mod defaults;
pub mod loader;
pub mod types;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use schemars::schema::RootSchema;
use strum::VariantArray;

use crate::error::RouterError;
use crate::request::tokenize;

pub use types::{
    Mode, ModeDefinition, OutputSection, Persona, PersonaEntry, RegistryFile, SectionKind,
};

/// The immutable persona and mode table every request is routed against.
///
/// Built once at startup (see [`loader::RegistryLoader`]) and shared behind an
/// `Arc`. Construction validates the whole table, so lookups afterwards cannot
/// fail for ids and modes the registry itself hands out.
#[derive(Debug, Clone)]
pub struct PersonaRegistry {
    version: u32,
    source: String,
    default_persona: usize,
    modes: BTreeMap<Mode, ModeDefinition>,
    personas: Vec<Persona>,
    index: HashMap<String, usize>,
}

impl PersonaRegistry {
    pub const SUPPORTED_VERSION: u32 = 1;

    pub fn builtin() -> Result<Self, RouterError> {
        Self::from_toml_str("builtin", defaults::BUILTIN_REGISTRY)
    }

    pub fn from_toml_str(source: &str, content: &str) -> Result<Self, RouterError> {
        let file: RegistryFile =
            toml::from_str(content).map_err(|e| RouterError::malformed(source, e.to_string()))?;
        Self::from_file(source, file)
    }

    pub fn from_yaml_str(source: &str, content: &str) -> Result<Self, RouterError> {
        let file: RegistryFile = serde_yaml::from_str(content)
            .map_err(|e| RouterError::malformed(source, e.to_string()))?;
        Self::from_file(source, file)
    }

    pub fn from_json_str(source: &str, content: &str) -> Result<Self, RouterError> {
        let file: RegistryFile = serde_json::from_str(content)
            .map_err(|e| RouterError::malformed(source, e.to_string()))?;
        Self::from_file(source, file)
    }

    /// Loads a registry file, picking the format from its extension.
    pub fn from_path(path: &Path) -> Result<Self, RouterError> {
        let source = path.display().to_string();
        let content = fs::read_to_string(path)
            .map_err(|e| RouterError::malformed(&source, format!("failed to read: {e:?}")))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&source, &content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&source, &content),
            Some("json") => Self::from_json_str(&source, &content),
            _ => Err(RouterError::malformed(
                &source,
                "unsupported registry format; expected .toml, .yaml, .yml or .json",
            )),
        }
    }

    pub fn from_file(source: &str, file: RegistryFile) -> Result<Self, RouterError> {
        if file.version != Self::SUPPORTED_VERSION {
            return Err(RouterError::malformed(
                source,
                format!(
                    "unsupported version {} (supported: {})",
                    file.version,
                    Self::SUPPORTED_VERSION
                ),
            ));
        }

        let modes = validate_modes(source, file.modes)?;

        if file.personas.is_empty() {
            return Err(RouterError::malformed(source, "no personas defined"));
        }

        let mut personas = Vec::with_capacity(file.personas.len());
        let mut index = HashMap::new();
        let mut trigger_owners: HashMap<Vec<String>, String> = HashMap::new();

        for entry in file.personas {
            let persona = validate_persona(source, entry)?;

            if index.contains_key(&persona.id) {
                return Err(RouterError::malformed(
                    source,
                    format!("duplicate persona id '{}'", persona.id),
                ));
            }

            for trigger in &persona.triggers {
                let normalized = tokenize(trigger)
                    .into_iter()
                    .map(|t| t.text)
                    .collect::<Vec<_>>();
                if normalized.is_empty() {
                    return Err(RouterError::malformed(
                        source,
                        format!("persona '{}' has a blank trigger", persona.id),
                    ));
                }
                if let Some(owner) = trigger_owners.get(&normalized) {
                    if owner != &persona.id {
                        return Err(RouterError::malformed(
                            source,
                            format!(
                                "trigger '{}' is claimed by both '{}' and '{}'",
                                trigger, owner, persona.id
                            ),
                        ));
                    }
                }
                trigger_owners.insert(normalized, persona.id.clone());
            }

            index.insert(persona.id.clone(), personas.len());
            personas.push(persona);
        }

        let Some(&default_persona) = index.get(&file.default_persona) else {
            return Err(RouterError::malformed(
                source,
                format!("default persona '{}' is not defined", file.default_persona),
            ));
        };

        tracing::debug!(
            source,
            personas = personas.len(),
            "Loaded persona registry"
        );

        Ok(Self {
            version: file.version,
            source: source.to_string(),
            default_persona,
            modes,
            personas,
            index,
        })
    }

    /// Replaces the fallback persona, e.g. from settings.
    pub fn with_default_persona(mut self, id: &str) -> Result<Self, RouterError> {
        let Some(&position) = self.index.get(id) else {
            return Err(RouterError::malformed(
                &self.source,
                format!("default persona override '{id}' is not defined"),
            ));
        };
        self.default_persona = position;
        Ok(self)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Where the registry was loaded from (a path, or `builtin`).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Personas in declaration order.
    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.index.get(id).map(|&i| &self.personas[i])
    }

    /// Position of a persona in declaration order, used as the last tie-break.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn default_persona(&self) -> &Persona {
        &self.personas[self.default_persona]
    }

    pub fn mode_definition(&self, mode: Mode) -> &ModeDefinition {
        // Every mode is checked for presence in validate_modes.
        &self.modes[&mode]
    }

    /// The mode's generic layout, ignoring persona overrides.
    pub fn mode_sections(&self, mode: Mode) -> &[OutputSection] {
        &self.mode_definition(mode).sections
    }

    pub fn mode_keywords(&self, mode: Mode) -> &[String] {
        &self.mode_definition(mode).keywords
    }

    /// The persona's override for `mode`, or the mode's generic layout.
    pub fn sections_for<'a>(&'a self, persona: &'a Persona, mode: Mode) -> &'a [OutputSection] {
        persona
            .sections_override(mode)
            .unwrap_or_else(|| self.mode_sections(mode))
    }

    /// Persona summary suitable for help output.
    pub fn describe(&self) -> String {
        self.personas
            .iter()
            .map(|p| {
                let mut line = format!(
                    "'{}' ({}) [{}] default {}",
                    p.id,
                    p.name,
                    p.triggers.join(", "),
                    p.default_mode
                );
                if let Some(description) = &p.description {
                    line.push_str(": ");
                    line.push_str(description);
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// JSON schema for authors of external registry files.
    pub fn json_schema() -> RootSchema {
        schemars::schema_for!(RegistryFile)
    }
}

fn validate_modes(
    source: &str,
    raw: BTreeMap<String, ModeDefinition>,
) -> Result<BTreeMap<Mode, ModeDefinition>, RouterError> {
    let mut modes = BTreeMap::new();

    for (name, definition) in raw {
        let Some(mode) = Mode::from_name(&name) else {
            return Err(RouterError::malformed(
                source,
                format!("unknown mode '{name}'"),
            ));
        };
        if modes.contains_key(&mode) {
            return Err(RouterError::malformed(
                source,
                format!("mode '{}' is defined more than once ('{name}')", mode.name()),
            ));
        }
        validate_sections(source, &format!("mode '{name}'"), &definition.sections)?;
        modes.insert(mode, definition);
    }

    for mode in Mode::VARIANTS {
        if !modes.contains_key(mode) {
            return Err(RouterError::malformed(
                source,
                format!("mode '{}' has no definition", mode.name()),
            ));
        }
    }

    Ok(modes)
}

fn validate_persona(source: &str, entry: PersonaEntry) -> Result<Persona, RouterError> {
    if entry.id.trim().is_empty() {
        return Err(RouterError::malformed(source, "persona with empty id"));
    }
    if entry.name.trim().is_empty() {
        return Err(RouterError::malformed(
            source,
            format!("persona '{}' has no name", entry.id),
        ));
    }
    if entry.triggers.is_empty() {
        return Err(RouterError::malformed(
            source,
            format!("persona '{}' has no triggers", entry.id),
        ));
    }

    let mut overrides = BTreeMap::new();
    for (name, sections) in entry.overrides {
        let Some(mode) = Mode::from_name(&name) else {
            return Err(RouterError::malformed(
                source,
                format!("persona '{}' overrides unknown mode '{name}'", entry.id),
            ));
        };
        if overrides.contains_key(&mode) {
            return Err(RouterError::malformed(
                source,
                format!(
                    "persona '{}' overrides mode '{}' more than once ('{name}')",
                    entry.id,
                    mode.name()
                ),
            ));
        }
        validate_sections(
            source,
            &format!("persona '{}' override for '{name}'", entry.id),
            &sections,
        )?;
        overrides.insert(mode, sections);
    }

    Ok(Persona {
        id: entry.id,
        name: entry.name,
        description: entry.description,
        triggers: entry.triggers,
        keywords: entry.keywords,
        default_mode: entry.default_mode,
        overrides,
    })
}

fn validate_sections(
    source: &str,
    owner: &str,
    sections: &[OutputSection],
) -> Result<(), RouterError> {
    if sections.is_empty() {
        return Err(RouterError::malformed(
            source,
            format!("{owner} has an empty section list"),
        ));
    }

    let mut seen = HashSet::new();
    for section in sections {
        let label = section.label.trim();
        if label.is_empty() {
            return Err(RouterError::malformed(
                source,
                format!("{owner} has a section with an empty label"),
            ));
        }
        if !seen.insert(label.to_ascii_lowercase()) {
            return Err(RouterError::malformed(
                source,
                format!("{owner} repeats section '{label}'"),
            ));
        }
    }

    Ok(())
}
