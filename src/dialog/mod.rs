//! Modal confirmation and alert dialogs.
//!
//! [`ModalDialogController::request`] renders a dialog fragment into a shared
//! container and hands back a [`PendingDialog`] future. The future completes
//! exactly once, after the user presses one of the dialog's controls (or
//! dismisses it), and by then the fragment is gone from the render tree.
//!
//! Each open dialog owns its fragment and its own one-shot outcome channel;
//! dialogs only share the container element.

mod guard;
mod markup;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::surface::{NewElement, ROOT_ID, RenderSurface};

pub use guard::{ConfirmPrompt, NativeAction, ProtectedAction, guard};
pub use markup::{DialogStyle, escape_html};

pub const CONTAINER_ID: &str = "custom-modals-container";

const DEFAULT_CONFIRM_LABEL: &str = "Accept";
const DEFAULT_CANCEL_LABEL: &str = "Cancel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogKind {
    Success,
    Error,
    Warning,
    Info,
    Confirm,
}

impl DialogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogKind::Success => "success",
            DialogKind::Error => "error",
            DialogKind::Warning => "warning",
            DialogKind::Info => "info",
            DialogKind::Confirm => "confirm",
        }
    }

    /// Only confirmation dialogs render a cancel control.
    pub fn has_cancel_path(&self) -> bool {
        matches!(self, DialogKind::Confirm)
    }
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied overrides; unset fields fall back to the kind's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DialogConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub confirm_label: Option<String>,
    #[serde(default)]
    pub cancel_label: Option<String>,
    /// Whether clicking outside the dialog closes it.
    #[serde(default)]
    pub dismiss_on_backdrop: bool,
}

impl DialogConfig {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = Some(label.into());
        self
    }

    pub fn cancel_label(mut self, label: impl Into<String>) -> Self {
        self.cancel_label = Some(label.into());
        self
    }

    pub fn dismiss_on_backdrop(mut self, enabled: bool) -> Self {
        self.dismiss_on_backdrop = enabled;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogRequest {
    pub kind: DialogKind,
    /// May contain simple markup; rendered as-is.
    pub message: String,
    pub config: DialogConfig,
    cancel_path: bool,
}

impl DialogRequest {
    pub fn new(kind: DialogKind, message: impl Into<String>, config: DialogConfig) -> Self {
        Self {
            kind,
            message: message.into(),
            config,
            cancel_path: kind.has_cancel_path(),
        }
    }

    /// Keeps the kind's styling but renders only the confirm control.
    pub fn without_cancel(mut self) -> Self {
        self.cancel_path = false;
        self
    }

    pub fn title(&self) -> &str {
        self.config
            .title
            .as_deref()
            .unwrap_or(self.kind.style().default_title)
    }

    pub fn confirm_label(&self) -> &str {
        self.config
            .confirm_label
            .as_deref()
            .unwrap_or(DEFAULT_CONFIRM_LABEL)
    }

    pub fn cancel_label(&self) -> &str {
        self.config
            .cancel_label
            .as_deref()
            .unwrap_or(DEFAULT_CANCEL_LABEL)
    }

    pub fn has_cancel_path(&self) -> bool {
        self.cancel_path
    }

    /// Outcome delivered for a given user action.
    fn outcome_for(&self, action: UserAction) -> bool {
        match action {
            UserAction::Confirm => true,
            UserAction::Cancel | UserAction::Dismiss | UserAction::Backdrop => {
                !self.has_cancel_path()
            }
        }
    }
}

/// Identity of one dialog instance and of the controls it renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialogId(Uuid);

impl DialogId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn fragment(&self) -> String {
        format!("custom-modal-{}", self.0.simple())
    }

    pub fn confirm_control(&self) -> String {
        format!("{}-confirm", self.fragment())
    }

    pub fn cancel_control(&self) -> String {
        format!("{}-cancel", self.fragment())
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fragment())
    }
}

/// Something the user did to an open dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Confirm,
    Cancel,
    /// Close control or an equivalent keyboard dismissal.
    Dismiss,
    /// Click outside the dialog.
    Backdrop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Created,
    Shown,
    ConfirmedByUser,
    CancelledByUser,
    DismissedWithoutChoice,
    Removed,
}

impl DialogState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DialogState::Created | DialogState::Shown)
    }
}

#[derive(Debug, Error)]
pub enum DialogError {
    #[error("dialog container `{0}` could not be attached")]
    ContainerUnavailable(String),
    #[error("failed to render dialog element `{0}`")]
    Render(String),
}

/// Per-instance lifecycle; the notifier is taken on the first terminal
/// transition so a second one finds nothing to send.
struct Lifecycle {
    state: DialogState,
    notifier: Option<oneshot::Sender<bool>>,
}

struct DialogInstance {
    id: DialogId,
    request: DialogRequest,
    lifecycle: Mutex<Lifecycle>,
}

impl DialogInstance {
    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn action_for(&self, element_id: &str) -> Option<UserAction> {
        if element_id == self.id.confirm_control() {
            Some(UserAction::Confirm)
        } else if self.request.has_cancel_path() && element_id == self.id.cancel_control() {
            Some(UserAction::Cancel)
        } else {
            None
        }
    }
}

/// Owns the dialog container and wires each dialog's controls to its outcome.
pub struct ModalDialogController<S> {
    surface: Arc<S>,
    container: OnceLock<()>,
    open: Mutex<HashMap<DialogId, Arc<DialogInstance>>>,
}

impl<S: RenderSurface> ModalDialogController<S> {
    pub fn new(surface: Arc<S>) -> Self {
        Self {
            surface,
            container: OnceLock::new(),
            open: Mutex::new(HashMap::new()),
        }
    }

    pub fn surface(&self) -> &Arc<S> {
        &self.surface
    }

    fn open_dialogs(&self) -> MutexGuard<'_, HashMap<DialogId, Arc<DialogInstance>>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates the container on first use; it is never torn down.
    fn ensure_container(&self) -> Result<(), DialogError> {
        if self.container.get().is_some() && self.surface.contains(CONTAINER_ID) {
            return Ok(());
        }

        if !self.surface.contains(CONTAINER_ID) {
            let container = NewElement::new(CONTAINER_ID)
                .attribute("aria-live", "polite")
                .attribute("aria-atomic", "true");
            if self.surface.append(ROOT_ID, container) {
                tracing::debug!(container = CONTAINER_ID, "Dialog container created");
            } else if !self.surface.contains(CONTAINER_ID) {
                return Err(DialogError::ContainerUnavailable(CONTAINER_ID.to_string()));
            }
        }

        let _ = self.container.set(());
        Ok(())
    }

    /// Shows a dialog and returns a future for the user's decision.
    pub fn request(
        &self,
        kind: DialogKind,
        message: impl Into<String>,
        config: DialogConfig,
    ) -> Result<PendingDialog, DialogError> {
        self.show(DialogRequest::new(kind, message, config))
    }

    #[tracing::instrument(name = "dialog_request", skip_all, fields(kind = %request.kind, dialog_id))]
    fn show(&self, request: DialogRequest) -> Result<PendingDialog, DialogError> {
        self.ensure_container()?;

        let id = DialogId::new();
        tracing::Span::current().record("dialog_id", tracing::field::display(id));

        let kind = request.kind;
        let fragment = NewElement::new(id.fragment())
            .class("modal")
            .attribute("role", "dialog")
            .attribute("aria-labelledby", format!("{}-label", id.fragment()))
            .attribute("data-kind", kind.as_str())
            .markup(markup::render_body(&id, &request));

        if !self.surface.append(CONTAINER_ID, fragment) {
            return Err(DialogError::Render(id.fragment()));
        }

        let mut controls = vec![id.confirm_control()];
        if request.has_cancel_path() {
            controls.push(id.cancel_control());
        }
        for control in &controls {
            if !self
                .surface
                .append(&id.fragment(), NewElement::new(control.clone()).class("btn"))
            {
                self.surface.remove(&id.fragment());
                return Err(DialogError::Render(control.clone()));
            }
        }

        let (tx, rx) = oneshot::channel();
        let instance = Arc::new(DialogInstance {
            id,
            request,
            lifecycle: Mutex::new(Lifecycle {
                state: DialogState::Created,
                notifier: Some(tx),
            }),
        });
        self.open_dialogs().insert(id, Arc::clone(&instance));

        self.surface.focus(&id.confirm_control());
        instance.lifecycle().state = DialogState::Shown;

        tracing::debug!(kind = %kind, "Dialog shown");

        Ok(PendingDialog { id, outcome: rx })
    }

    /// Message dialog without a cancel path; resolves `true` however it closes.
    pub fn alert(
        &self,
        kind: DialogKind,
        message: impl Into<String>,
        config: DialogConfig,
    ) -> Result<PendingDialog, DialogError> {
        self.show(DialogRequest::new(kind, message, config).without_cancel())
    }

    pub fn confirm(
        &self,
        message: impl Into<String>,
        config: DialogConfig,
    ) -> Result<PendingDialog, DialogError> {
        self.request(DialogKind::Confirm, message, config)
    }

    pub fn success(&self, message: impl Into<String>) -> Result<PendingDialog, DialogError> {
        self.alert(DialogKind::Success, message, DialogConfig::default())
    }

    pub fn error(&self, message: impl Into<String>) -> Result<PendingDialog, DialogError> {
        self.alert(DialogKind::Error, message, DialogConfig::default())
    }

    pub fn warning(&self, message: impl Into<String>) -> Result<PendingDialog, DialogError> {
        self.alert(DialogKind::Warning, message, DialogConfig::default())
    }

    pub fn info(&self, message: impl Into<String>) -> Result<PendingDialog, DialogError> {
        self.alert(DialogKind::Info, message, DialogConfig::default())
    }

    /// Delivers a click on a rendered element. Returns `false` when the
    /// element is not a live dialog control.
    pub fn press(&self, element_id: &str) -> bool {
        let target = self
            .open_dialogs()
            .values()
            .find_map(|instance| instance.action_for(element_id).map(|a| (instance.id, a)));

        match target {
            Some((id, action)) => self.respond(id, action),
            None => false,
        }
    }

    /// Applies a user action to one dialog. Only the first terminal action
    /// has any effect; later ones return `false`.
    pub fn respond(&self, id: DialogId, action: UserAction) -> bool {
        let Some(instance) = self.open_dialogs().get(&id).cloned() else {
            return false;
        };

        if action == UserAction::Backdrop && !instance.request.config.dismiss_on_backdrop {
            return false;
        }
        if action == UserAction::Cancel && !instance.request.has_cancel_path() {
            return false;
        }

        let notifier = {
            let mut lifecycle = instance.lifecycle();
            if lifecycle.state.is_terminal() {
                return false;
            }
            lifecycle.state = match action {
                UserAction::Confirm => DialogState::ConfirmedByUser,
                UserAction::Cancel => DialogState::CancelledByUser,
                UserAction::Dismiss | UserAction::Backdrop => DialogState::DismissedWithoutChoice,
            };
            lifecycle.notifier.take()
        };

        let outcome = instance.request.outcome_for(action);
        self.close(&instance);

        if let Some(notifier) = notifier
            && notifier.send(outcome).is_err()
        {
            tracing::debug!(
                dialog_id = %id,
                "Dialog outcome dropped: caller stopped waiting"
            );
        }

        tracing::debug!(
            dialog_id = %id,
            action = ?action,
            confirmed = outcome,
            "Dialog closed"
        );
        true
    }

    /// Removes the instance's own fragment and nothing else.
    fn close(&self, instance: &DialogInstance) {
        self.open_dialogs().remove(&instance.id);
        if !self.surface.remove(&instance.id.fragment()) {
            tracing::warn!(
                dialog_id = %instance.id,
                "Dialog fragment was already missing on close"
            );
        }
    }

    /// Lifecycle state of a dialog; any id that is no longer open here
    /// reports [`DialogState::Removed`].
    pub fn state(&self, id: DialogId) -> DialogState {
        self.open_dialogs()
            .get(&id)
            .map_or(DialogState::Removed, |instance| instance.lifecycle().state)
    }

    pub fn open_count(&self) -> usize {
        self.open_dialogs().len()
    }
}

/// Resolves to `true` when the user confirmed.
#[derive(Debug)]
#[must_use = "a dialog outcome does nothing unless awaited"]
pub struct PendingDialog {
    id: DialogId,
    outcome: oneshot::Receiver<bool>,
}

impl PendingDialog {
    pub fn id(&self) -> DialogId {
        self.id
    }
}

impl Future for PendingDialog {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        Pin::new(&mut self.outcome).poll(cx).map(|result| {
            result.unwrap_or_else(|_| {
                tracing::warn!(
                    dialog_id = %self.id,
                    "Dialog dropped before a decision; treating as not confirmed"
                );
                false
            })
        })
    }
}
