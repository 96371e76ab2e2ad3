use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::registry::loader::CONFIG_DIR;
use crate::settings::config::Settings;
use crate::validation::RuleValidator;

pub const SETTINGS_FILE: &str = "settings.toml";

/// Owns the router settings file. Changes made through the manager stay in
/// this process until saved; a saved file applies to every router built
/// afterwards.
#[derive(Clone)]
pub struct SettingsManager {
    path: PathBuf,
    current: Arc<Mutex<Settings>>,
}

impl SettingsManager {
    /// Settings at `~/.persona-router/settings.toml`.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Self::from_path(home.join(CONFIG_DIR).join(SETTINGS_FILE))
    }

    /// Settings at `path`. A missing file is written with defaults; a file
    /// that does not parse is moved to `<path>.backup` and replaced by
    /// defaults.
    pub fn from_path(path: PathBuf) -> Result<Self> {
        let settings = if path.exists() {
            read_or_reset(&path)?
        } else {
            let defaults = Settings::default();
            write_settings(&path, &defaults)?;
            info!(path = %path.display(), "Created default router settings");
            defaults
        };

        for rule in unknown_rules(&settings) {
            warn!(path = %path.display(), rule, "Disabled rule does not exist");
        }

        Ok(Self {
            path,
            current: Arc::new(Mutex::new(settings)),
        })
    }

    /// Snapshot of the in-memory settings, as handed to a new router.
    pub fn settings(&self) -> Settings {
        self.current.lock().unwrap().clone()
    }

    /// Changes the in-memory settings only; call `save` to persist.
    pub fn update_setting<F>(&self, updater: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut guard = self.current.lock().unwrap();
        updater(&mut *guard);
    }

    /// Turns off a validation rule for routers built from these settings.
    /// Only ids of existing rules are accepted.
    pub fn disable_rule(&self, rule: &str) -> Result<()> {
        let known = RuleValidator::default().rule_ids();
        if !known.iter().any(|id| id.0 == rule) {
            let known: Vec<&str> = known.iter().map(|id| id.0).collect();
            bail!("Unknown rule '{rule}'; expected one of {}", known.join(", "));
        }

        self.update_setting(|settings| {
            settings.disabled_rules.insert(rule.to_string());
        });
        Ok(())
    }

    /// Turns a rule back on. Returns whether it was disabled.
    pub fn enable_rule(&self, rule: &str) -> bool {
        let mut guard = self.current.lock().unwrap();
        guard.disabled_rules.remove(rule)
    }

    /// Persists `settings` and makes them the in-memory copy.
    pub fn save_settings(&self, settings: Settings) -> Result<()> {
        write_settings(&self.path, &settings)?;
        *self.current.lock().unwrap() = settings;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.save_settings(self.settings())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_or_reset(path: &Path) -> Result<Settings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {path:?}"))?;

    match toml::from_str(&contents) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            let backup = path.with_extension("toml.backup");
            warn!(
                path = %path.display(),
                backup = %backup.display(),
                error = %e,
                "Settings do not parse; restoring defaults"
            );
            fs::rename(path, &backup)
                .with_context(|| format!("Failed to back up settings to {backup:?}"))?;

            let defaults = Settings::default();
            write_settings(path, &defaults)?;
            Ok(defaults)
        }
    }
}

fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {parent:?}"))?;
    }
    let contents = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
    fs::write(path, contents).with_context(|| format!("Failed to write settings to {path:?}"))
}

fn unknown_rules(settings: &Settings) -> Vec<&str> {
    let known = RuleValidator::default().rule_ids();
    settings
        .disabled_rules
        .iter()
        .map(String::as_str)
        .filter(|rule| !known.iter().any(|id| id.0 == *rule))
        .collect()
}
