use rstest::rstest;

use crate::registry::{Mode, PersonaRegistry};
use crate::request::Request;
use crate::routing::{route, ModeDecision, PersonaDecision, Routing};

fn route_builtin(text: &str) -> Routing {
    let registry = PersonaRegistry::builtin().unwrap();
    route(&registry, &Request::new(text), 12)
}

#[rstest]
#[case("@QA find the holes")]
#[case("@qa find the holes")]
#[case("hey @Qa")]
#[case("Please, @qA: look again")]
fn test_qa_trigger_in_any_case_selects_chaos_engineer(#[case] text: &str) {
    assert_eq!(route_builtin(text).persona, "chaos_engineer");
}

#[test]
fn test_act_as_qa_audit_routes_to_critique() {
    let routing = route_builtin("Act as QA, audit this: eval(input)");
    assert_eq!(routing.persona, "chaos_engineer");
    assert_eq!(routing.mode, Mode::Critique);
    assert_eq!(routing.mode_decision, ModeDecision::CodeReview);
}

#[test]
fn test_sprint_keyword_infers_scrum_master() {
    let routing = route_builtin("Plan our next sprint");
    assert_eq!(routing.persona, "scrum_master");
    assert_eq!(
        routing.persona_decision,
        PersonaDecision::Keyword { tie_broken: false }
    );
    assert_eq!(routing.mode, Mode::SprintPlanning);
}

#[rstest]
#[case("@QA @BACK review this", "chaos_engineer")]
#[case("@BACK @QA review this", "backend_engineer")]
fn test_earliest_trigger_wins(#[case] text: &str, #[case] expected: &str) {
    let routing = route_builtin(text);
    assert_eq!(routing.persona, expected);
    assert_eq!(
        routing.persona_decision,
        PersonaDecision::Trigger { tie_broken: true }
    );
}

#[test]
fn test_no_heuristic_falls_back_to_persona_default() {
    let routing = route_builtin("@QA @BACK review this");
    assert_eq!(routing.mode, Mode::Critique);
    assert_eq!(routing.mode_decision, ModeDecision::PersonaDefault);
}

#[test]
fn test_unmatched_request_uses_default_persona() {
    let routing = route_builtin("Hello there");
    assert_eq!(routing.persona, "staff_engineer");
    assert_eq!(routing.persona_decision, PersonaDecision::Default);
    assert_eq!(routing.mode, Mode::Architect);
    assert_eq!(routing.mode_decision, ModeDecision::PersonaDefault);
}

#[test]
fn test_multi_word_trigger() {
    let routing = route_builtin("As a chaos engineer, break my parser");
    assert_eq!(routing.persona, "chaos_engineer");
}

#[rstest]
#[case("Write a slugify function in Rust")]
#[case("@BACK fix the bug in config.toml loader")]
#[case("@BACK fix the v1.2 regression in src/lib.rs")]
fn test_short_single_deliverable_is_direct(#[case] text: &str) {
    let routing = route_builtin(text);
    assert_eq!(routing.mode, Mode::Direct);
    assert_eq!(routing.mode_decision, ModeDecision::NarrowArtifact);
}

#[test]
fn test_plural_suffix_with_review_word_is_not_code_review() {
    let routing = route_builtin("Review the vendor(s) we shortlisted for hosting");
    assert_ne!(routing.mode, Mode::Critique);
    assert_ne!(routing.mode_decision, ModeDecision::CodeReview);
}

#[test]
fn test_long_request_is_architect() {
    let routing = route_builtin(
        "We need to move the monolith to separate services while keeping billing consistent during the cutover window",
    );
    assert_eq!(routing.mode, Mode::Architect);
    assert_eq!(routing.mode_decision, ModeDecision::BroadScope);
}

#[test]
fn test_several_deliverables_is_architect() {
    let routing = route_builtin("Write a parser and add tests");
    assert_eq!(routing.mode, Mode::Architect);
}

#[test]
fn test_explicit_mode_keyword_beats_persona_default() {
    let routing = route_builtin("@SCRUM critique our process");
    assert_eq!(routing.persona, "scrum_master");
    assert_eq!(routing.mode, Mode::Critique);
}

#[test]
fn test_mode_keyword_tie_prefers_earliest() {
    let routing = route_builtin("Critique the architecture");
    assert_eq!(routing.mode, Mode::Critique);
    assert_eq!(
        routing.mode_decision,
        ModeDecision::ExplicitKeyword { tie_broken: true }
    );
}

#[test]
fn test_code_without_review_intent_is_not_critique() {
    let routing = route_builtin("Rename `getUser()` to `fetchUser()`");
    assert_eq!(routing.mode, Mode::Direct);
}

#[test]
fn test_direct_threshold_is_configurable() {
    let registry = PersonaRegistry::builtin().unwrap();
    let request = Request::new("Write a slugify function in Rust");
    assert_eq!(route(&registry, &request, 3).mode, Mode::Architect);
}
