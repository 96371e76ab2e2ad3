use std::fs;
use std::path::Path;

use rstest::rstest;
use tempfile::TempDir;

use crate::error::RouterError;
use crate::registry::loader::{RegistryLoader, CONFIG_DIR};
use crate::registry::{Mode, PersonaRegistry, SectionKind};

const MODES_TOML: &str = r#"
[modes.direct]
sections = [{ kind = "code", label = "Implementation" }]

[modes.architect]
keywords = ["architecture"]
sections = [{ kind = "heading", label = "Decision" }, { kind = "code", label = "Implementation" }]

[modes.critique]
sections = [{ kind = "checklist", label = "Critical" }]

[modes.sprint_planning]
sections = [{ kind = "heading", label = "Sprint Goal" }]
"#;

fn minimal_toml(personas: &str) -> String {
    format!("version = 1\ndefault_persona = \"reviewer\"\n{MODES_TOML}\n{personas}")
}

const REVIEWER: &str = r#"
[[personas]]
id = "reviewer"
name = "Reviewer"
triggers = ["@REVIEW"]
default_mode = "critique"
"#;

fn write_registry(dir: &Path, file_name: &str, content: &str) {
    let config = dir.join(CONFIG_DIR);
    fs::create_dir_all(&config).unwrap();
    fs::write(config.join(file_name), content).unwrap();
}

fn reason(error: RouterError) -> String {
    match error {
        RouterError::MalformedRegistry { reason, .. } => reason,
        other => panic!("expected malformed registry, got {other:?}"),
    }
}

#[test]
fn test_builtin_registry_loads() {
    let registry = PersonaRegistry::builtin().unwrap();

    assert_eq!(registry.version(), 1);
    assert_eq!(registry.source(), "builtin");
    assert_eq!(registry.default_persona().id, "staff_engineer");
    assert_eq!(registry.personas().len(), 8);
    assert_eq!(registry.personas()[0].id, "staff_engineer");
    assert_eq!(registry.position("chaos_engineer"), Some(1));

    let qa = registry.get("chaos_engineer").unwrap();
    assert_eq!(qa.default_mode, Mode::Critique);
    assert!(qa.triggers.contains(&"@QA".to_string()));
    assert!(registry.get("nobody").is_none());
}

#[test]
fn test_sections_prefer_persona_override() {
    let registry = PersonaRegistry::builtin().unwrap();
    let backend = registry.get("backend_engineer").unwrap();
    let staff = registry.get("staff_engineer").unwrap();

    let labels = |persona, mode| {
        registry
            .sections_for(persona, mode)
            .iter()
            .map(|s| s.label.clone())
            .collect::<Vec<_>>()
    };

    assert_eq!(labels(backend, Mode::Direct), vec!["Implementation", "Failure Modes"]);
    assert_eq!(labels(staff, Mode::Direct), vec!["Implementation"]);
    assert_eq!(labels(backend, Mode::Critique), labels(staff, Mode::Critique));
    assert_eq!(registry.mode_sections(Mode::Direct).len(), 1);
    assert_eq!(registry.sections_for(backend, Mode::Critique), registry.mode_sections(Mode::Critique));
}

#[test]
fn test_optional_section_flag_is_read() {
    let registry = PersonaRegistry::builtin().unwrap();
    let legal = registry.get("legal_advisor").unwrap();
    let sections = registry.sections_for(legal, Mode::Direct);

    assert!(sections[0].required);
    assert!(!sections[1].required);
    assert_eq!(sections[1].kind, SectionKind::Heading);
}

#[test]
fn test_mode_keywords_come_from_registry() {
    let registry = PersonaRegistry::builtin().unwrap();
    assert!(registry.mode_keywords(Mode::Direct).contains(&"just the code".to_string()));
    assert!(registry.mode_keywords(Mode::SprintPlanning).contains(&"sprint".to_string()));
}

#[test]
fn test_parses_toml_yaml_and_json() {
    let toml = PersonaRegistry::from_toml_str("test.toml", &minimal_toml(REVIEWER)).unwrap();
    assert_eq!(toml.default_persona().id, "reviewer");

    let yaml = r#"
version: 1
default_persona: reviewer
modes:
  direct:
    sections: [{ kind: code, label: Implementation }]
  architect:
    sections: [{ kind: heading, label: Decision }]
  critique:
    sections: [{ kind: checklist, label: Critical }]
  sprint_planning:
    sections: [{ kind: heading, label: Sprint Goal }]
personas:
  - id: reviewer
    name: Reviewer
    triggers: ["@REVIEW"]
    default_mode: critique
    overrides:
      direct:
        - { kind: code, label: Patch }
        - { kind: checklist, label: Notes, required: false }
"#;
    let yaml = PersonaRegistry::from_yaml_str("test.yaml", yaml).unwrap();
    let reviewer = yaml.get("reviewer").unwrap();
    let direct = yaml.sections_for(reviewer, Mode::Direct);
    assert_eq!(direct.len(), 2);
    assert!(!direct[1].required);

    let json = serde_json::json!({
        "version": 1,
        "default_persona": "reviewer",
        "modes": {
            "direct": { "sections": [{ "kind": "code", "label": "Implementation" }] },
            "architect": { "sections": [{ "kind": "heading", "label": "Decision" }] },
            "critique": { "sections": [{ "kind": "checklist", "label": "Critical" }] },
            "sprint_planning": { "sections": [{ "kind": "heading", "label": "Sprint Goal" }] }
        },
        "personas": [
            { "id": "reviewer", "name": "Reviewer", "triggers": ["@REVIEW"], "default_mode": "critique" }
        ]
    });
    let json = PersonaRegistry::from_json_str("test.json", &json.to_string()).unwrap();
    assert_eq!(json.personas().len(), 1);
}

#[rstest]
#[case::unsupported_version(
    minimal_toml(REVIEWER).replace("version = 1", "version = 2"),
    "unsupported version"
)]
#[case::unknown_default(
    minimal_toml(REVIEWER).replace("default_persona = \"reviewer\"", "default_persona = \"ghost\""),
    "default persona 'ghost'"
)]
#[case::no_personas(minimal_toml(""), "personas")]
#[case::missing_mode(
    minimal_toml(REVIEWER).replace("[modes.sprint_planning]\nsections = [{ kind = \"heading\", label = \"Sprint Goal\" }]", ""),
    "mode 'sprint_planning' has no definition"
)]
#[case::unknown_mode(
    format!("{}\n[modes.brainstorm]\nsections = [{{ kind = \"heading\", label = \"Ideas\" }}]\n", minimal_toml(REVIEWER)),
    "unknown mode 'brainstorm'"
)]
#[case::empty_sections(
    minimal_toml(REVIEWER).replace("sections = [{ kind = \"checklist\", label = \"Critical\" }]", "sections = []"),
    "empty section list"
)]
#[case::duplicate_label(
    minimal_toml(REVIEWER).replace(
        "sections = [{ kind = \"checklist\", label = \"Critical\" }]",
        "sections = [{ kind = \"checklist\", label = \"Critical\" }, { kind = \"table\", label = \"critical\" }]"
    ),
    "repeats section"
)]
#[case::no_triggers(
    minimal_toml(&REVIEWER.replace("triggers = [\"@REVIEW\"]", "triggers = []")),
    "has no triggers"
)]
#[case::blank_trigger(
    minimal_toml(&REVIEWER.replace("triggers = [\"@REVIEW\"]", "triggers = [\"  \"]")),
    "blank trigger"
)]
#[case::duplicate_id(minimal_toml(&format!("{REVIEWER}{}", REVIEWER.replace("@REVIEW", "@AUDIT"))), "duplicate persona id")]
#[case::shared_trigger(
    minimal_toml(&format!("{REVIEWER}{}", REVIEWER.replace("\"reviewer\"", "\"auditor\""))),
    "claimed by both"
)]
#[case::override_unknown_mode(
    minimal_toml(&format!("{REVIEWER}\n[personas.overrides]\nbrainstorm = [{{ kind = \"heading\", label = \"Ideas\" }}]\n")),
    "overrides unknown mode"
)]
#[case::duplicate_mode(
    format!("{}\n[modes.DIRECT]\nsections = [{{ kind = \"code\", label = \"Patch\" }}]\n", minimal_toml(REVIEWER)),
    "mode 'direct' is defined more than once"
)]
#[case::duplicate_override(
    minimal_toml(&format!("{REVIEWER}\n[personas.overrides]\ndirect = [{{ kind = \"code\", label = \"Patch\" }}]\nDirect = [{{ kind = \"code\", label = \"Fix\" }}]\n")),
    "overrides mode 'direct' more than once"
)]
#[case::not_toml(String::from("version = "), "")]
fn test_malformed_registries_are_rejected(#[case] content: String, #[case] expected: &str) {
    let error = PersonaRegistry::from_toml_str("test.toml", &content).unwrap_err();
    let reason = reason(error);
    assert!(reason.contains(expected), "reason was: {reason}");
}

#[test]
fn test_triggers_collide_case_insensitively() {
    let second = r#"
[[personas]]
id = "auditor"
name = "Auditor"
triggers = ["@review"]
default_mode = "critique"
"#;
    let error =
        PersonaRegistry::from_toml_str("test.toml", &minimal_toml(&format!("{REVIEWER}{second}")))
            .unwrap_err();
    assert!(reason(error).contains("claimed by both"));
}

#[test]
fn test_with_default_persona() {
    let registry = PersonaRegistry::builtin()
        .unwrap()
        .with_default_persona("scrum_master")
        .unwrap();
    assert_eq!(registry.default_persona().id, "scrum_master");

    let error = PersonaRegistry::builtin()
        .unwrap()
        .with_default_persona("ghost")
        .unwrap_err();
    assert!(matches!(error, RouterError::MalformedRegistry { .. }));
}

#[test]
fn test_describe_lists_every_persona() {
    let registry = PersonaRegistry::builtin().unwrap();
    let description = registry.describe();

    assert_eq!(description.lines().count(), registry.personas().len());
    assert!(description.contains("'chaos_engineer' (Chaos Engineer) [@QA, QA, @CHAOS, chaos engineer] default CRITIQUE"));
}

#[test]
fn test_json_schema_describes_registry_file() {
    let schema = serde_json::to_value(PersonaRegistry::json_schema()).unwrap();
    let properties = &schema["properties"];

    for field in ["version", "default_persona", "modes", "personas"] {
        assert!(properties.get(field).is_some(), "missing {field}");
    }
}

#[test]
fn test_from_path_rejects_unknown_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("registry.ini");
    fs::write(&path, minimal_toml(REVIEWER)).unwrap();

    let error = PersonaRegistry::from_path(&path).unwrap_err();
    assert!(reason(error).contains("unsupported registry format"));
}

#[test]
fn test_loader_falls_back_to_builtin() {
    let workspace = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    let registry = RegistryLoader::new(
        vec![workspace.path().to_path_buf()],
        Some(home.path().to_path_buf()),
    )
    .load()
    .unwrap();

    assert_eq!(registry.source(), "builtin");
}

#[test]
fn test_loader_prefers_workspace_over_home() {
    let workspace = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    write_registry(workspace.path(), "registry.toml", &minimal_toml(REVIEWER));
    write_registry(home.path(), "registry.toml", crate::registry::defaults::BUILTIN_REGISTRY);

    let registry = RegistryLoader::new(
        vec![workspace.path().to_path_buf()],
        Some(home.path().to_path_buf()),
    )
    .load()
    .unwrap();

    assert_eq!(registry.default_persona().id, "reviewer");
    assert!(registry.source().starts_with(&workspace.path().display().to_string()));
}

#[test]
fn test_loader_uses_home_when_workspace_has_none() {
    let workspace = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    let yaml_source = serde_yaml::to_string(
        &toml::from_str::<crate::registry::RegistryFile>(&minimal_toml(REVIEWER)).unwrap(),
    )
    .unwrap();
    write_registry(home.path(), "registry.yaml", &yaml_source);

    let registry = RegistryLoader::new(
        vec![workspace.path().to_path_buf()],
        Some(home.path().to_path_buf()),
    )
    .load()
    .unwrap();

    assert_eq!(registry.personas().len(), 1);
    assert!(registry.source().ends_with("registry.yaml"));
}

#[test]
fn test_loader_explicit_path_wins() {
    let workspace = TempDir::new().unwrap();
    let explicit = TempDir::new().unwrap();
    write_registry(workspace.path(), "registry.toml", crate::registry::defaults::BUILTIN_REGISTRY);
    let path = explicit.path().join("custom.toml");
    fs::write(&path, minimal_toml(REVIEWER)).unwrap();

    let registry = RegistryLoader::new(vec![workspace.path().to_path_buf()], None)
        .explicit_path(Some(path))
        .load()
        .unwrap();
    assert_eq!(registry.default_persona().id, "reviewer");
}

#[test]
fn test_loader_explicit_path_must_exist() {
    let dir = TempDir::new().unwrap();
    let result = RegistryLoader::new(Vec::new(), None)
        .explicit_path(Some(dir.path().join("missing.toml")))
        .load();
    assert!(matches!(result, Err(RouterError::MalformedRegistry { .. })));
}

#[test]
fn test_loader_malformed_override_is_fatal() {
    let workspace = TempDir::new().unwrap();
    write_registry(workspace.path(), "registry.toml", "version = 1\npersonas = []");

    let result = RegistryLoader::new(vec![workspace.path().to_path_buf()], None).load();
    assert!(matches!(result, Err(RouterError::MalformedRegistry { .. })));
}

#[test]
fn test_loader_applies_default_persona() {
    let registry = RegistryLoader::new(Vec::new(), None)
        .default_persona(Some("security_auditor".to_string()))
        .load()
        .unwrap();
    assert_eq!(registry.default_persona().id, "security_auditor");
}
