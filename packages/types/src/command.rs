//! The validated command model. Every YAML step narrows to
//! exactly one of these variants; each variant's payload is fully typed
//! and branded.

use schemars::JsonSchema;
use serde::Serialize;

use crate::brand::{FilePath, JsExpression, KeyboardKey, Url};
use crate::error::Maybe;
use crate::selector::{AnySelector, InteractableSelector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub enum LoadState {
    Load,
    DomContentLoaded,
    NetworkIdle,
}

/// Exactly one of these is present on a `wait` command.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub enum WaitFor {
    Ms(u64),
    Css(String),
    Xpath(String),
    AnyText(String),
    LoadState(LoadState),
    UrlPattern(String),
    Js(JsExpression),
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Command {
    pub kind: CommandKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub enum CommandKind {
    Open { url: Url },
    Click { selector: InteractableSelector },
    DblClick { selector: InteractableSelector },
    Hover { selector: InteractableSelector },
    Focus { selector: InteractableSelector },
    Check { selector: InteractableSelector },
    Uncheck { selector: InteractableSelector },
    Type { selector: InteractableSelector, value: String },
    Fill { selector: InteractableSelector, value: String },
    Select { selector: InteractableSelector, option: String },
    Press { key: KeyboardKey },
    KeyDown { key: KeyboardKey },
    KeyUp { key: KeyboardKey },
    Scroll { direction: ScrollDirection, amount: u64 },
    ScrollIntoView { selector: AnySelector },
    Wait { condition: WaitFor },
    Screenshot { path: FilePath, full_page: Maybe<bool> },
    Eval { expression: JsExpression },
    AssertVisible { selector: AnySelector },
    AssertNotVisible { selector: AnySelector },
    AssertEnabled { selector: InteractableSelector },
    AssertChecked { selector: InteractableSelector, expected: Maybe<bool> },
}

impl CommandKind {
    /// The stable tag string for this variant, matching the YAML key
    /// used to author it (and the progress/error taxonomy's naming).
    pub fn tag(&self) -> &'static str {
        match self {
            CommandKind::Open { .. } => "open",
            CommandKind::Click { .. } => "click",
            CommandKind::DblClick { .. } => "dblclick",
            CommandKind::Hover { .. } => "hover",
            CommandKind::Focus { .. } => "focus",
            CommandKind::Check { .. } => "check",
            CommandKind::Uncheck { .. } => "uncheck",
            CommandKind::Type { .. } => "type",
            CommandKind::Fill { .. } => "fill",
            CommandKind::Select { .. } => "select",
            CommandKind::Press { .. } => "press",
            CommandKind::KeyDown { .. } => "keydown",
            CommandKind::KeyUp { .. } => "keyup",
            CommandKind::Scroll { .. } => "scroll",
            CommandKind::ScrollIntoView { .. } => "scrollIntoView",
            CommandKind::Wait { .. } => "wait",
            CommandKind::Screenshot { .. } => "screenshot",
            CommandKind::Eval { .. } => "eval",
            CommandKind::AssertVisible { .. } => "assertVisible",
            CommandKind::AssertNotVisible { .. } => "assertNotVisible",
            CommandKind::AssertEnabled { .. } => "assertEnabled",
            CommandKind::AssertChecked { .. } => "assertChecked",
        }
    }
}

impl Command {
    pub fn new(kind: CommandKind) -> Self {
        Command { kind }
    }

    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }
}
