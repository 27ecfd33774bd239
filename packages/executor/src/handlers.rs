//! Per-command dispatch. Each handler is responsible for its own selector
//! resolution and auto-wait policy; the step state machine in
//! [`crate::run`] only cares whether the handler returned `Ok` or one of
//! the error kinds in [`FlowError`].

use std::time::Duration;

use enbu_flow_adapter::BrowserAdapter;
use enbu_flow_types::command::{CommandKind, LoadState, ScrollDirection, WaitFor};
use enbu_flow_types::error::{FlowError, Maybe};
use enbu_flow_types::selector::{AnySelector, InteractableSelector, ToCliSelector};

use crate::context::ExecutionContext;
use crate::options::ExecuteOptions;

/// A CLI token already resolved against the execution context — either
/// the original selector's token or a cached ref.
struct ResolvedSelector(String);

impl ToCliSelector for ResolvedSelector {
    fn to_cli_token(&self) -> String {
        self.0.clone()
    }
}

/// What a handler hands back to the step state machine for a passed step.
#[derive(Debug, Default)]
pub struct HandlerOutcome {
    pub stdout: Option<serde_json::Value>,
}

impl HandlerOutcome {
    fn empty() -> Self {
        HandlerOutcome::default()
    }

    fn value(value: serde_json::Value) -> Self {
        HandlerOutcome { stdout: Some(value) }
    }
}

fn assertion_failed(message: impl Into<String>) -> FlowError {
    FlowError::AssertionFailed { message: message.into() }
}

/// Resolves `selector`'s token against `ctx`, runs `action`, then records
/// whatever ref the adapter reports back under the selector's *original*
/// token — so a later step that authors the same selector benefits from
/// it, without this step needing to know the token was substituted.
async fn resolve_and_run<'a, F, Fut>(
    ctx: &mut ExecutionContext,
    original_token: String,
    action: F,
) -> Result<(), FlowError>
where
    F: FnOnce(ResolvedSelector) -> Fut,
    Fut: std::future::Future<Output = Result<Option<String>, FlowError>>,
{
    let resolved = ctx.resolve(&original_token).into_owned();
    let ref_result = action(ResolvedSelector(resolved)).await?;
    ctx.record(&original_token, ref_result);
    Ok(())
}

fn scroll_direction_str(direction: ScrollDirection) -> &'static str {
    match direction {
        ScrollDirection::Up => "up",
        ScrollDirection::Down => "down",
        ScrollDirection::Left => "left",
        ScrollDirection::Right => "right",
    }
}

fn load_state_str(state: LoadState) -> &'static str {
    match state {
        LoadState::Load => "load",
        LoadState::DomContentLoaded => "domcontentloaded",
        LoadState::NetworkIdle => "networkidle",
    }
}

/// Dispatches one validated command against the adapter, applying each
/// command's auto-wait policy and selector resolution.
pub async fn dispatch(
    adapter: &BrowserAdapter,
    ctx: &mut ExecutionContext,
    options: &ExecuteOptions,
    command: &CommandKind,
) -> Result<HandlerOutcome, FlowError> {
    match command {
        CommandKind::Open { url } => {
            adapter.open(url.as_str()).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::Click { selector } => {
            interactable(ctx, selector, |s| async move { adapter.click(&s).await }).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::DblClick { selector } => {
            interactable(ctx, selector, |s| async move { adapter.dblclick(&s).await }).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::Hover { selector } => {
            interactable(ctx, selector, |s| async move { adapter.hover(&s).await }).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::Focus { selector } => {
            interactable(ctx, selector, |s| async move { adapter.focus(&s).await }).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::Check { selector } => {
            interactable(ctx, selector, |s| async move { adapter.check(&s).await }).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::Uncheck { selector } => {
            interactable(ctx, selector, |s| async move { adapter.uncheck(&s).await }).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::Type { selector, value } => {
            let value = value.clone();
            interactable(ctx, selector, |s| async move { adapter.type_text(&s, &value).await })
                .await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::Fill { selector, value } => {
            let value = value.clone();
            interactable(ctx, selector, |s| async move { adapter.fill(&s, &value).await }).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::Select { selector, option } => {
            let option = option.clone();
            interactable(ctx, selector, |s| async move { adapter.select(&s, &option).await })
                .await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::Press { key } => {
            adapter.press(key.as_str()).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::KeyDown { key } => {
            adapter.keydown(key.as_str()).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::KeyUp { key } => {
            adapter.keyup(key.as_str()).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::Scroll { direction, amount } => {
            adapter.scroll(scroll_direction_str(*direction), *amount).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::ScrollIntoView { selector } => {
            scroll_into_view(adapter, ctx, selector).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::Wait { condition } => {
            run_wait(adapter, ctx, options, condition).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::Screenshot { path, full_page } => {
            let full = match full_page {
                Maybe::Unset => None,
                Maybe::Set(v) => Some(*v),
            };
            let captured_path = adapter.screenshot(path.as_str(), full).await?;
            Ok(HandlerOutcome::value(serde_json::json!({ "path": captured_path })))
        }
        CommandKind::Eval { expression } => {
            let value = adapter.eval(expression.as_str()).await?;
            Ok(HandlerOutcome::value(value))
        }
        CommandKind::AssertVisible { selector } => {
            assert_visible(adapter, ctx, options, selector).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::AssertNotVisible { selector } => {
            assert_not_visible(adapter, ctx, options, selector).await?;
            Ok(HandlerOutcome::empty())
        }
        CommandKind::AssertEnabled { selector } => {
            let original = selector.to_cli_token();
            let resolved = ResolvedSelector(ctx.resolve(&original).into_owned());
            let enabled = adapter.is_enabled(&resolved).await?;
            if !enabled {
                return Err(assertion_failed(format!("element {:?} is not enabled", original)));
            }
            Ok(HandlerOutcome::empty())
        }
        CommandKind::AssertChecked { selector, expected } => {
            let expected = expected.clone().unwrap_or(true);
            let original = selector.to_cli_token();
            let resolved = ResolvedSelector(ctx.resolve(&original).into_owned());
            let checked = adapter.is_checked(&resolved).await?;
            if checked != expected {
                return Err(assertion_failed(format!(
                    "element {:?} checked={} but expected {}",
                    original, checked, expected
                )));
            }
            Ok(HandlerOutcome::empty())
        }
    }
}

async fn interactable<F, Fut>(
    ctx: &mut ExecutionContext,
    selector: &InteractableSelector,
    action: F,
) -> Result<(), FlowError>
where
    F: FnOnce(ResolvedSelector) -> Fut,
    Fut: std::future::Future<Output = Result<Option<String>, FlowError>>,
{
    let original = interactable_token(selector);
    resolve_and_run(ctx, original, action).await
}

fn interactable_token(selector: &InteractableSelector) -> String {
    match selector {
        InteractableSelector::Css(s) => s.clone(),
        InteractableSelector::Xpath(s) => format!("xpath={}", s),
        InteractableSelector::InteractableText(s) => format!("text={}", s),
    }
}

fn any_token(selector: &AnySelector) -> String {
    match selector {
        AnySelector::Css(s) => s.clone(),
        AnySelector::Xpath(s) => format!("xpath={}", s),
        AnySelector::AnyText(s) => format!("text={}", s),
    }
}

/// `scrollIntoView` with a `ref`-shaped selector uses `focus` instead of the
/// native scroll-into-view call, which has a known limitation for refs;
/// `focus` reliably scrolls the target into view. The check is against the
/// *resolved* token, since a selector authored as plain text may have
/// resolved to a cached ref by now.
async fn scroll_into_view(
    adapter: &BrowserAdapter,
    ctx: &mut ExecutionContext,
    selector: &AnySelector,
) -> Result<(), FlowError> {
    let original = any_token(selector);
    let resolved = ctx.resolve(&original).into_owned();
    let ref_result = if resolved.starts_with('@') {
        adapter.focus(&ResolvedSelector(resolved)).await?
    } else {
        adapter.scroll_into_view(&ResolvedSelector(resolved)).await?
    };
    ctx.record(&original, ref_result);
    Ok(())
}

async fn run_wait(
    adapter: &BrowserAdapter,
    ctx: &mut ExecutionContext,
    options: &ExecuteOptions,
    condition: &WaitFor,
) -> Result<(), FlowError> {
    match condition {
        WaitFor::Ms(ms) => adapter.wait_for_ms(*ms).await,
        WaitFor::Css(s) => {
            let original = s.clone();
            let resolved = ResolvedSelector(ctx.resolve(&original).into_owned());
            adapter.wait_for_selector(&resolved, options.command_timeout, None).await
        }
        WaitFor::Xpath(s) => {
            let original = format!("xpath={}", s);
            let resolved = ResolvedSelector(ctx.resolve(&original).into_owned());
            adapter.wait_for_selector(&resolved, options.command_timeout, None).await
        }
        WaitFor::AnyText(text) => adapter.wait_for_text(text, options.command_timeout, None).await,
        WaitFor::LoadState(state) => {
            adapter.wait_for_load(load_state_str(*state), options.command_timeout).await
        }
        WaitFor::UrlPattern(pattern) => {
            adapter.wait_for_url(pattern, options.command_timeout).await
        }
        WaitFor::Js(expression) => {
            adapter.wait_for_function(expression.as_str(), options.command_timeout).await
        }
    }
}

/// Auto-wait policy for `assertVisible`.
async fn assert_visible(
    adapter: &BrowserAdapter,
    ctx: &mut ExecutionContext,
    options: &ExecuteOptions,
    selector: &AnySelector,
) -> Result<(), FlowError> {
    let original = any_token(selector);
    let resolved = ResolvedSelector(ctx.resolve(&original).into_owned());
    match selector {
        AnySelector::Css(_) | AnySelector::Xpath(_) => {
            adapter
                .wait_for_selector(&resolved, options.auto_wait_timeout, Some(options.auto_wait_interval))
                .await?;
            let visible = adapter.is_visible(&resolved).await?;
            if !visible {
                return Err(assertion_failed(format!("element {:?} is not visible", original)));
            }
            Ok(())
        }
        AnySelector::AnyText(text) => {
            // The success of the wait *is* the positive assertion; no
            // separate is-visible call.
            adapter
                .wait_for_text(text, options.auto_wait_timeout, Some(options.auto_wait_interval))
                .await
        }
    }
}

/// Auto-wait policy for `assertNotVisible`.
async fn assert_not_visible(
    adapter: &BrowserAdapter,
    ctx: &mut ExecutionContext,
    options: &ExecuteOptions,
    selector: &AnySelector,
) -> Result<(), FlowError> {
    let original = any_token(selector);
    let resolved = ResolvedSelector(ctx.resolve(&original).into_owned());
    // A navigation-in-progress must settle first, so a transient absence
    // never falsely passes the assertion.
    adapter.wait_for_network_idle(options.auto_wait_timeout).await?;

    match selector {
        AnySelector::Css(_) | AnySelector::Xpath(_) => {
            let visible = adapter.is_visible(&resolved).await?;
            if visible {
                return Err(assertion_failed(format!("element {:?} is visible", original)));
            }
            Ok(())
        }
        AnySelector::AnyText(text) => {
            const SHORT_CEILING: Duration = Duration::from_secs(1);
            match adapter.wait_for_text(text, SHORT_CEILING, None).await {
                Ok(()) => Err(assertion_failed(format!("text {:?} is visible", text))),
                Err(FlowError::Timeout { .. }) => Ok(()),
                Err(other) => Err(other),
            }
        }
    }
}
