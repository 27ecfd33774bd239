//! Command validator. Narrows each raw, env-substituted step to exactly one
//! `CommandKind` variant using a static registry of per-command parse
//! functions — a compile-time table rather than runtime reflection.

use enbu_flow_types::brand::{FilePath, JsExpression, KeyboardKey, Url};
use enbu_flow_types::command::{Command, CommandKind, LoadState, ScrollDirection, WaitFor};
use enbu_flow_types::error::{FlowError, Maybe};
use enbu_flow_types::selector::{AnySelector, InteractableSelector};
use serde_yaml::Value;

type ParseFn = fn(&Value) -> Result<CommandKind, String>;

/// One entry per command variant: the YAML key that selects it and the
/// function that validates and transforms its payload.
struct Schema {
    name: &'static str,
    parse: ParseFn,
}

/// The compile-time registry driving validation. Order is immaterial;
/// lookup is by exact key match.
const REGISTRY: &[Schema] = &[
    Schema { name: "open", parse: parse_open },
    Schema { name: "click", parse: parse_click },
    Schema { name: "dblclick", parse: parse_dblclick },
    Schema { name: "hover", parse: parse_hover },
    Schema { name: "focus", parse: parse_focus },
    Schema { name: "check", parse: parse_check },
    Schema { name: "uncheck", parse: parse_uncheck },
    Schema { name: "type", parse: parse_type },
    Schema { name: "fill", parse: parse_fill },
    Schema { name: "select", parse: parse_select },
    Schema { name: "press", parse: parse_press },
    Schema { name: "keydown", parse: parse_keydown },
    Schema { name: "keyup", parse: parse_keyup },
    Schema { name: "scroll", parse: parse_scroll },
    Schema { name: "scrollIntoView", parse: parse_scroll_into_view },
    Schema { name: "wait", parse: parse_wait },
    Schema { name: "screenshot", parse: parse_screenshot },
    Schema { name: "eval", parse: parse_eval },
    Schema { name: "assertVisible", parse: parse_assert_visible },
    Schema { name: "assertNotVisible", parse: parse_assert_not_visible },
    Schema { name: "assertEnabled", parse: parse_assert_enabled },
    Schema { name: "assertChecked", parse: parse_assert_checked },
];

/// Validates every raw step, in order, returning a non-empty `Vec<Command>`
/// or the first `InvalidCommand`/`BrandValidationError` encountered.
pub fn validate_steps(steps: &[Value]) -> Result<Vec<Command>, FlowError> {
    tracing::debug!(step_count = steps.len(), "validating flow steps against the command registry");
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| validate_step(index, step))
        .collect()
}

fn validate_step(index: usize, step: &Value) -> Result<Command, FlowError> {
    let mapping = step
        .as_mapping()
        .filter(|m| m.len() == 1)
        .ok_or_else(|| invalid_command(index, step, "step must be a single-key mapping"))?;
    let (key, value) = mapping.iter().next().expect("len == 1");
    let name = key
        .as_str()
        .ok_or_else(|| invalid_command(index, step, "command key must be a string"))?;

    let schema = REGISTRY
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| invalid_command(index, step, &format!("unknown command '{}'", name)))?;

    (schema.parse)(value)
        .map(Command::new)
        .map_err(|message| invalid_command(index, step, &message))
}

fn invalid_command(index: usize, raw: &Value, message: &str) -> FlowError {
    tracing::warn!(step_index = index, message, "invalid command");
    FlowError::InvalidCommand {
        step_index: index,
        message: message.to_string(),
        raw: serde_yaml::to_string(raw).unwrap_or_default().trim().to_string(),
    }
}

fn brand<T>(result: Result<T, FlowError>) -> Result<T, String> {
    result.map_err(|e| e.to_string())
}

// ---- selector parsing -------------------------------------------------

/// Parses a value into an `InteractableSelector`. Accepts the shorthand
/// (bare string => `interactableText`), the longhand mapping with `css`/
/// `xpath`/`interactableText`, and the ergonomic user-facing `text` key
/// which is rewritten to `interactableText` for the internal model.
fn parse_interactable_selector(value: &Value) -> Result<InteractableSelector, String> {
    if let Some(text) = value.as_str() {
        return Ok(InteractableSelector::InteractableText(text.to_string()));
    }
    let mapping = value.as_mapping().ok_or("selector must be a string or mapping")?;
    if mapping.len() != 1 {
        return Err("selector mapping must have exactly one key".to_string());
    }
    let (key, value) = mapping.iter().next().expect("len == 1");
    let key = key.as_str().ok_or("selector key must be a string")?;
    let value = value.as_str().ok_or("selector value must be a string")?.to_string();
    match key {
        "css" => Ok(InteractableSelector::Css(value)),
        "xpath" => Ok(InteractableSelector::Xpath(value)),
        "interactableText" | "text" => Ok(InteractableSelector::InteractableText(value)),
        other => Err(format!("unsupported selector key '{}' for an interactable selector", other)),
    }
}

/// As above, but for `AnySelector` — the `text` key rewrites to `anyText`.
fn parse_any_selector(value: &Value) -> Result<AnySelector, String> {
    if let Some(text) = value.as_str() {
        return Ok(AnySelector::AnyText(text.to_string()));
    }
    let mapping = value.as_mapping().ok_or("selector must be a string or mapping")?;
    if mapping.len() != 1 {
        return Err("selector mapping must have exactly one key".to_string());
    }
    let (key, value) = mapping.iter().next().expect("len == 1");
    let key = key.as_str().ok_or("selector key must be a string")?;
    let value = value.as_str().ok_or("selector value must be a string")?.to_string();
    match key {
        "css" => Ok(AnySelector::Css(value)),
        "xpath" => Ok(AnySelector::Xpath(value)),
        "anyText" | "text" => Ok(AnySelector::AnyText(value)),
        other => Err(format!("unsupported selector key '{}' for an any-selector", other)),
    }
}

fn object_field<'a>(mapping: &'a serde_yaml::Mapping, field: &str) -> Option<&'a Value> {
    mapping.get(Value::String(field.to_string()))
}

// ---- per-command parsers ----------------------------------------------

fn parse_open(value: &Value) -> Result<CommandKind, String> {
    let raw = value.as_str().ok_or("open requires a URL string")?;
    let url = brand(Url::parse(raw))?;
    Ok(CommandKind::Open { url })
}

fn parse_click(value: &Value) -> Result<CommandKind, String> {
    Ok(CommandKind::Click { selector: parse_interactable_selector(value)? })
}

fn parse_dblclick(value: &Value) -> Result<CommandKind, String> {
    Ok(CommandKind::DblClick { selector: parse_interactable_selector(value)? })
}

fn parse_hover(value: &Value) -> Result<CommandKind, String> {
    Ok(CommandKind::Hover { selector: parse_interactable_selector(value)? })
}

fn parse_focus(value: &Value) -> Result<CommandKind, String> {
    Ok(CommandKind::Focus { selector: parse_interactable_selector(value)? })
}

fn parse_check(value: &Value) -> Result<CommandKind, String> {
    Ok(CommandKind::Check { selector: parse_interactable_selector(value)? })
}

fn parse_uncheck(value: &Value) -> Result<CommandKind, String> {
    Ok(CommandKind::Uncheck { selector: parse_interactable_selector(value)? })
}

/// `type`/`fill` longhand is `{selector: <selector>, value: <string>}` (or
/// a shorthand selector key directly, e.g. `{css: "#x", value: "hi"}`).
fn parse_selector_and_value(value: &Value) -> Result<(InteractableSelector, String), String> {
    let mapping = value.as_mapping().ok_or("expected a mapping with a selector and a value")?;
    let text_value = object_field(mapping, "value")
        .and_then(Value::as_str)
        .ok_or("expected a string 'value' field")?
        .to_string();
    let selector = match object_field(mapping, "selector") {
        Some(selector_value) => parse_interactable_selector(selector_value)?,
        None => parse_interactable_selector(value)?,
    };
    Ok((selector, text_value))
}

fn parse_type(value: &Value) -> Result<CommandKind, String> {
    let (selector, value) = parse_selector_and_value(value)?;
    Ok(CommandKind::Type { selector, value })
}

fn parse_fill(value: &Value) -> Result<CommandKind, String> {
    let (selector, value) = parse_selector_and_value(value)?;
    Ok(CommandKind::Fill { selector, value })
}

fn parse_select(value: &Value) -> Result<CommandKind, String> {
    let mapping = value.as_mapping().ok_or("select requires a mapping with a selector and an option")?;
    let option = object_field(mapping, "option")
        .and_then(Value::as_str)
        .ok_or("expected a string 'option' field")?
        .to_string();
    let selector = match object_field(mapping, "selector") {
        Some(selector_value) => parse_interactable_selector(selector_value)?,
        None => parse_interactable_selector(value)?,
    };
    Ok(CommandKind::Select { selector, option })
}

fn parse_keyboard_key(value: &Value) -> Result<KeyboardKey, String> {
    let raw = value.as_str().ok_or("expected a keyboard key string")?;
    brand(KeyboardKey::parse(raw))
}

fn parse_press(value: &Value) -> Result<CommandKind, String> {
    Ok(CommandKind::Press { key: parse_keyboard_key(value)? })
}

fn parse_keydown(value: &Value) -> Result<CommandKind, String> {
    Ok(CommandKind::KeyDown { key: parse_keyboard_key(value)? })
}

fn parse_keyup(value: &Value) -> Result<CommandKind, String> {
    Ok(CommandKind::KeyUp { key: parse_keyboard_key(value)? })
}

fn parse_scroll(value: &Value) -> Result<CommandKind, String> {
    let mapping = value.as_mapping().ok_or("scroll requires a mapping with 'direction' and 'amount'")?;
    let direction = object_field(mapping, "direction")
        .and_then(Value::as_str)
        .ok_or("expected a string 'direction' field")?;
    let direction = match direction {
        "up" => ScrollDirection::Up,
        "down" => ScrollDirection::Down,
        "left" => ScrollDirection::Left,
        "right" => ScrollDirection::Right,
        other => return Err(format!("unknown scroll direction '{}'", other)),
    };
    let amount = object_field(mapping, "amount")
        .and_then(Value::as_u64)
        .ok_or("expected a non-negative integer 'amount' field")?;
    Ok(CommandKind::Scroll { direction, amount })
}

fn parse_scroll_into_view(value: &Value) -> Result<CommandKind, String> {
    Ok(CommandKind::ScrollIntoView { selector: parse_any_selector(value)? })
}

/// `wait` accepts the numeric-millisecond shorthand or a longhand mapping
/// carrying exactly one of the wait-condition alternatives.
fn parse_wait(value: &Value) -> Result<CommandKind, String> {
    if let Some(ms) = value.as_u64() {
        return Ok(CommandKind::Wait { condition: WaitFor::Ms(ms) });
    }
    let mapping = value.as_mapping().ok_or("wait requires a millisecond number or a mapping")?;
    if let Some(ms) = object_field(mapping, "ms").and_then(Value::as_u64) {
        return Ok(CommandKind::Wait { condition: WaitFor::Ms(ms) });
    }
    if let Some(css) = object_field(mapping, "css").and_then(Value::as_str) {
        return Ok(CommandKind::Wait { condition: WaitFor::Css(css.to_string()) });
    }
    if let Some(xpath) = object_field(mapping, "xpath").and_then(Value::as_str) {
        return Ok(CommandKind::Wait { condition: WaitFor::Xpath(xpath.to_string()) });
    }
    if let Some(text) = object_field(mapping, "anyText").and_then(Value::as_str) {
        return Ok(CommandKind::Wait { condition: WaitFor::AnyText(text.to_string()) });
    }
    if let Some(state) = object_field(mapping, "loadState").and_then(Value::as_str) {
        let state = match state {
            "load" => LoadState::Load,
            "domcontentloaded" => LoadState::DomContentLoaded,
            "networkidle" => LoadState::NetworkIdle,
            other => return Err(format!("unknown load state '{}'", other)),
        };
        return Ok(CommandKind::Wait { condition: WaitFor::LoadState(state) });
    }
    if let Some(pattern) = object_field(mapping, "url").and_then(Value::as_str) {
        return Ok(CommandKind::Wait { condition: WaitFor::UrlPattern(pattern.to_string()) });
    }
    if let Some(js) = object_field(mapping, "js").and_then(Value::as_str) {
        let expression = brand(JsExpression::parse(js))?;
        return Ok(CommandKind::Wait { condition: WaitFor::Js(expression) });
    }
    Err("wait requires exactly one of ms/css/xpath/anyText/loadState/url/js".to_string())
}

/// `screenshot` accepts the path-string shorthand or a longhand mapping
/// with `path` and an optional `full` boolean (absent => `Maybe::Unset`,
/// "use the adapter's default").
fn parse_screenshot(value: &Value) -> Result<CommandKind, String> {
    if let Some(path) = value.as_str() {
        let path = brand(FilePath::parse(path))?;
        return Ok(CommandKind::Screenshot { path, full_page: Maybe::Unset });
    }
    let mapping = value.as_mapping().ok_or("screenshot requires a path string or a mapping")?;
    let path = object_field(mapping, "path")
        .and_then(Value::as_str)
        .ok_or("expected a string 'path' field")?;
    let path = brand(FilePath::parse(path))?;
    let full_page = match object_field(mapping, "full") {
        Some(v) => {
            let full = v.as_bool().ok_or("'full' must be a boolean")?;
            Maybe::Set(full)
        }
        None => Maybe::Unset,
    };
    Ok(CommandKind::Screenshot { path, full_page })
}

fn parse_eval(value: &Value) -> Result<CommandKind, String> {
    let raw = value.as_str().ok_or("eval requires a JS expression string")?;
    let expression = brand(JsExpression::parse(raw))?;
    Ok(CommandKind::Eval { expression })
}

fn parse_assert_visible(value: &Value) -> Result<CommandKind, String> {
    Ok(CommandKind::AssertVisible { selector: parse_any_selector(value)? })
}

fn parse_assert_not_visible(value: &Value) -> Result<CommandKind, String> {
    Ok(CommandKind::AssertNotVisible { selector: parse_any_selector(value)? })
}

fn parse_assert_enabled(value: &Value) -> Result<CommandKind, String> {
    Ok(CommandKind::AssertEnabled { selector: parse_interactable_selector(value)? })
}

/// `assertChecked` accepts the shorthand selector (expected defaults to
/// `true`) or a longhand mapping with an optional `expected` boolean.
fn parse_assert_checked(value: &Value) -> Result<CommandKind, String> {
    let mapping = match value.as_mapping() {
        Some(m) if object_field(m, "selector").is_some() || object_field(m, "expected").is_some() => m,
        _ => {
            let selector = parse_interactable_selector(value)?;
            return Ok(CommandKind::AssertChecked { selector, expected: Maybe::Unset });
        }
    };
    let selector = match object_field(mapping, "selector") {
        Some(selector_value) => parse_interactable_selector(selector_value)?,
        None => return Err("assertChecked longhand requires a 'selector' field".to_string()),
    };
    let expected = match object_field(mapping, "expected") {
        Some(v) => Maybe::Set(v.as_bool().ok_or("'expected' must be a boolean")?),
        None => Maybe::Unset,
    };
    Ok(CommandKind::AssertChecked { selector, expected })
}
