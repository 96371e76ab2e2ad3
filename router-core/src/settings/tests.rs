use crate::settings::manager::SettingsManager;
use crate::settings::Settings;
use tempfile::TempDir;

#[test]
fn test_missing_file_is_created_with_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("nested").join("settings.toml");

    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    assert!(settings_path.exists());
    assert_eq!(manager.settings(), Settings::default());
    assert_eq!(manager.path(), settings_path.as_path());
}

#[test]
fn test_defaults() {
    let settings = Settings::default();

    assert_eq!(settings.default_persona, None);
    assert_eq!(settings.registry_path, None);
    assert_eq!(settings.max_regeneration_attempts, 2);
    assert_eq!(settings.max_generation_retries, 3);
    assert_eq!(settings.direct_max_words, 12);
    assert!(settings.disabled_rules.is_empty());
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");
    std::fs::write(
        &settings_path,
        "default_persona = \"security_auditor\"\ndisabled_rules = [\"no-apology-phrases\"]\n",
    )
    .unwrap();

    let settings = SettingsManager::from_path(settings_path).unwrap().settings();

    assert_eq!(settings.default_persona.as_deref(), Some("security_auditor"));
    assert!(settings.disabled_rules.contains("no-apology-phrases"));
    assert_eq!(settings.max_regeneration_attempts, 2);
    assert_eq!(settings.direct_max_words, 12);
}

#[test]
fn test_corrupt_file_is_backed_up() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");
    std::fs::write(&settings_path, "max_regeneration_attempts = \"lots\"").unwrap();

    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    let backup = temp_dir.path().join("settings.toml.backup");
    assert!(backup.exists());
    assert_eq!(
        std::fs::read_to_string(backup).unwrap(),
        "max_regeneration_attempts = \"lots\""
    );
    assert_eq!(manager.settings(), Settings::default());

    let rewritten: Settings =
        toml::from_str(&std::fs::read_to_string(settings_path).unwrap()).unwrap();
    assert_eq!(rewritten, Settings::default());
}

#[test]
fn test_updates_stay_in_memory_until_saved() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("settings.toml");
    let manager = SettingsManager::from_path(settings_path.clone()).unwrap();

    manager.update_setting(|settings| settings.max_regeneration_attempts = 5);
    assert_eq!(manager.settings().max_regeneration_attempts, 5);

    let reloaded = SettingsManager::from_path(settings_path.clone()).unwrap();
    assert_eq!(reloaded.settings().max_regeneration_attempts, 2);

    manager.save().unwrap();
    let reloaded = SettingsManager::from_path(settings_path).unwrap();
    assert_eq!(reloaded.settings().max_regeneration_attempts, 5);
}

#[test]
fn test_save_settings_replaces_in_memory_copy() {
    let temp_dir = TempDir::new().unwrap();
    let manager = SettingsManager::from_path(temp_dir.path().join("settings.toml")).unwrap();

    let mut settings = manager.settings();
    settings.registry_path = Some(temp_dir.path().join("registry.yaml"));
    settings.disabled_rules.insert("typed-code-required".to_string());
    manager.save_settings(settings.clone()).unwrap();

    assert_eq!(manager.settings(), settings);
}

#[test]
fn test_disable_rule_accepts_only_known_rules() {
    let temp_dir = TempDir::new().unwrap();
    let manager = SettingsManager::from_path(temp_dir.path().join("settings.toml")).unwrap();

    manager.disable_rule("no-apology-phrases").unwrap();
    assert!(manager.settings().disabled_rules.contains("no-apology-phrases"));

    let error = manager.disable_rule("no-emoji").unwrap_err();
    assert!(error.to_string().contains("no-emoji"));
    assert_eq!(manager.settings().disabled_rules.len(), 1);

    assert!(manager.enable_rule("no-apology-phrases"));
    assert!(!manager.enable_rule("no-apology-phrases"));
}
