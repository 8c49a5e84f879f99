//! Wires password-field input to the requirement checklist.
//!
//! Input events arrive as [`FormSnapshot`]s; the binding debounces them and
//! renders the latest snapshot's tri-state results onto the checklist items
//! of the page. Items missing from the page are skipped.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::AppConfig;
use crate::debounce::Debouncer;
use crate::policy::{self, IdentityFields, RuleState};
use crate::surface::RenderSurface;

/// Checklist item tracking whether the confirmation field matches.
pub const MATCH_ANCHOR: &str = "req-match";

const MET_CLASS: &str = "requirement-met";
const FAILED_CLASS: &str = "requirement-failed";

/// Field values at the moment of an input event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSnapshot {
    pub password: String,
    pub confirmation: String,
    pub identity: IdentityFields,
}

/// Sets the state classes of one checklist item. Returns `false` when the
/// item is not on the page.
pub fn apply_state<S: RenderSurface + ?Sized>(surface: &S, anchor: &str, state: RuleState) -> bool {
    if !surface.contains(anchor) {
        tracing::trace!(anchor, "Checklist item not present; skipping");
        return false;
    }
    surface.set_class(anchor, MET_CLASS, state == RuleState::Met);
    surface.set_class(anchor, FAILED_CLASS, state == RuleState::Failed);
    true
}

/// Renders a snapshot synchronously and returns how many items were updated.
pub fn render_snapshot<S: RenderSurface + ?Sized>(surface: &S, snapshot: &FormSnapshot) -> usize {
    let checklist = policy::checklist(&snapshot.password, Some(&snapshot.identity));

    let mut applied = checklist
        .items
        .iter()
        .filter(|item| apply_state(surface, item.rule.anchor_id(), item.state))
        .count();

    let confirmation = policy::confirmation_state(&snapshot.password, &snapshot.confirmation);
    if apply_state(surface, MATCH_ANCHOR, confirmation) {
        applied += 1;
    }
    applied
}

pub struct PasswordFieldBinding<S> {
    surface: Arc<S>,
    debouncer: Debouncer,
    evaluations: Arc<AtomicUsize>,
}

impl<S: RenderSurface + 'static> PasswordFieldBinding<S> {
    pub fn new(surface: Arc<S>, window: Duration) -> Self {
        Self {
            surface,
            debouncer: Debouncer::new(window),
            evaluations: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn from_config(surface: Arc<S>, config: &AppConfig) -> Self {
        Self::new(surface, config.debounce_window)
    }

    /// Schedules evaluation of `snapshot`, superseding any pending one.
    pub fn on_input(&self, snapshot: FormSnapshot) {
        let surface = Arc::clone(&self.surface);
        let evaluations = Arc::clone(&self.evaluations);
        self.debouncer.call(move || {
            let applied = render_snapshot(surface.as_ref(), &snapshot);
            evaluations.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(applied, "Password checklist refreshed");
        });
    }

    /// Number of evaluations that actually ran.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Rule;
    use crate::surface::{NewElement, ROOT_ID, RenderTree};

    fn page() -> Arc<RenderTree> {
        let tree = Arc::new(RenderTree::new());
        tree.append(ROOT_ID, NewElement::new("requirements"));
        for rule in Rule::ORDERED {
            tree.append("requirements", NewElement::new(rule.anchor_id()));
        }
        tree.append("requirements", NewElement::new(MATCH_ANCHOR));
        tree
    }

    fn snapshot(password: &str, confirmation: &str) -> FormSnapshot {
        FormSnapshot {
            password: password.to_string(),
            confirmation: confirmation.to_string(),
            identity: IdentityFields::with_username("jdoe"),
        }
    }

    #[test]
    fn test_render_marks_each_item() {
        let tree = page();
        let applied = render_snapshot(tree.as_ref(), &snapshot("passw0rd", "passw0rd"));
        assert_eq!(applied, 8);
        assert!(tree.has_class("req-length", MET_CLASS));
        assert!(tree.has_class("req-uppercase", FAILED_CLASS));
        assert!(!tree.has_class("req-uppercase", MET_CLASS));
        assert!(tree.has_class(MATCH_ANCHOR, MET_CLASS));
    }

    #[test]
    fn test_clearing_input_resets_to_neutral() {
        let tree = page();
        render_snapshot(tree.as_ref(), &snapshot("abc", "x"));
        assert!(tree.has_class("req-length", FAILED_CLASS));

        render_snapshot(tree.as_ref(), &snapshot("", ""));
        for rule in Rule::ORDERED {
            assert!(tree.classes(rule.anchor_id()).is_empty(), "{rule:?}");
        }
        assert!(tree.classes(MATCH_ANCHOR).is_empty());
    }

    #[test]
    fn test_missing_items_are_skipped() {
        let tree = Arc::new(RenderTree::new());
        tree.append(ROOT_ID, NewElement::new("req-length"));
        assert_eq!(render_snapshot(tree.as_ref(), &snapshot("Passw0rd!", "")), 1);
        assert!(tree.has_class("req-length", MET_CLASS));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_input_evaluates_once_with_last_value() {
        let tree = page();
        let binding = PasswordFieldBinding::from_config(Arc::clone(&tree), &AppConfig::default());

        for typed in ["P", "Pa", "Pas", "Pass", "Passw0rd!"] {
            binding.on_input(snapshot(typed, ""));
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(binding.evaluations(), 0);
        assert!(tree.classes("req-length").is_empty());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(binding.evaluations(), 1);
        assert!(tree.has_class("req-length", MET_CLASS));
        assert!(tree.has_class("req-special", MET_CLASS));
    }
}
