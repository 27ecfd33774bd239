//! Integration coverage for undefined-variable reporting and
//! shorthand/longhand command equivalence, exercised through the full
//! loader -> resolver -> validator pipeline (`enbu_flow_core::parse_flow`)
//! rather than any single stage in isolation.

use std::collections::HashMap;

use enbu_flow_core::parse_flow;
use enbu_flow_types::command::CommandKind;
use enbu_flow_types::error::FlowError;
use enbu_flow_types::selector::InteractableSelector;

/// S3: an env document is present, but the referenced variable is not
/// defined anywhere (process env, dotenv, or the flow's own env map).
/// Validation must never run; the caller sees only the undefined-variable
/// error, naming the field it occurred in.
#[test]
fn s3_undefined_variable_reports_its_location_and_skips_validation() {
    let dotenv = HashMap::new();
    let yaml = "env:\n  BASE: https://a.example\n---\n- open: ${MISSING}\n";

    let err = parse_flow("s3", yaml, &dotenv).unwrap_err();

    match err {
        FlowError::UndefinedVariable { variable_name, location } => {
            assert_eq!(variable_name, "MISSING");
            assert_eq!(location, "step[0].url");
        }
        other => panic!("expected UndefinedVariable, got {:?}", other),
    }
}

/// S4: `click: "Go"` and `click: {interactableText: "Go"}` must validate to
/// exactly the same command.
#[test]
fn s4_click_shorthand_and_longhand_are_equal_flows() {
    let dotenv = HashMap::new();
    let shorthand = parse_flow("s4-short", "- click: Go\n", &dotenv).unwrap();
    let longhand =
        parse_flow("s4-long", "- click: {interactableText: Go}\n", &dotenv).unwrap();

    assert_eq!(shorthand.steps().len(), 1);
    assert_eq!(shorthand.steps()[0].kind, longhand.steps()[0].kind);
    assert!(matches!(
        &shorthand.steps()[0].kind,
        CommandKind::Click { selector: InteractableSelector::InteractableText(s) } if s == "Go"
    ));
}

/// Testable property #5: the chosen value for `${NAME}` is
/// `process[NAME] ?? dotenv[NAME] ?? flowEnv[NAME]`, the first defined
/// value wins, exercised here through the public `dotenv` parameter rather
/// than the resolver's internal `EnvLayers` type.
#[test]
fn dotenv_wins_over_flow_env_when_process_env_is_silent() {
    let mut dotenv = HashMap::new();
    dotenv.insert("BASE".to_string(), "https://dotenv.example".to_string());
    let yaml = "env:\n  BASE: https://flow.example\n---\n- open: ${BASE}\n";

    let flow = parse_flow("dotenv-precedence", yaml, &dotenv).unwrap();

    match &flow.steps()[0].kind {
        CommandKind::Open { url } => assert_eq!(url.as_str(), "https://dotenv.example"),
        other => panic!("expected Open, got {:?}", other),
    }
}
