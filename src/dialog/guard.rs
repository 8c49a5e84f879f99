use std::collections::BTreeMap;

use super::{DialogConfig, DialogError, ModalDialogController};
use crate::surface::RenderSurface;

const CONFIRM_ATTR: &str = "data-confirm";
const TITLE_ATTR: &str = "data-confirm-title";
const CONFIRM_TEXT_ATTR: &str = "data-confirm-text";
const CANCEL_TEXT_ATTR: &str = "data-cancel-text";

const DEFAULT_TITLE: &str = "Confirmation";
const DEFAULT_CONFIRM_TEXT: &str = "Yes, continue";
const DEFAULT_CANCEL_TEXT: &str = "No, cancel";

/// What the browser would have done without interception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeAction {
    SubmitForm { form_id: String },
    Navigate { href: String },
}

/// A form, submit button or link together with its `data-*` attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedAction {
    pub attributes: BTreeMap<String, String>,
    pub action: NativeAction,
}

impl ProtectedAction {
    pub fn new(action: NativeAction) -> Self {
        Self {
            attributes: BTreeMap::new(),
            action,
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Confirmation text declared on an element through `data-confirm*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub message: String,
    pub title: String,
    pub confirm_text: String,
    pub cancel_text: String,
}

impl ConfirmPrompt {
    /// `None` when the element carries no `data-confirm` message.
    pub fn from_attributes(attributes: &BTreeMap<String, String>) -> Option<Self> {
        let message = attributes
            .get(CONFIRM_ATTR)
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())?;

        let read = |name: &str, fallback: &str| {
            attributes
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };

        Some(Self {
            message: message.to_string(),
            title: read(TITLE_ATTR, DEFAULT_TITLE),
            confirm_text: read(CONFIRM_TEXT_ATTR, DEFAULT_CONFIRM_TEXT),
            cancel_text: read(CANCEL_TEXT_ATTR, DEFAULT_CANCEL_TEXT),
        })
    }

    fn config(&self) -> DialogConfig {
        DialogConfig::default()
            .title(&self.title)
            .confirm_label(&self.confirm_text)
            .cancel_label(&self.cancel_text)
    }
}

/// Intercepts a protected action: asks for confirmation when the element
/// declares one and returns the native action only if the user agreed.
pub async fn guard<S: RenderSurface>(
    controller: &ModalDialogController<S>,
    target: ProtectedAction,
) -> Result<Option<NativeAction>, DialogError> {
    let Some(prompt) = ConfirmPrompt::from_attributes(&target.attributes) else {
        return Ok(Some(target.action));
    };

    let confirmed = controller.confirm(prompt.message.clone(), prompt.config())?.await;
    if confirmed {
        Ok(Some(target.action))
    } else {
        tracing::debug!(action = ?target.action, "Protected action cancelled by user");
        Ok(None)
    }
}
