//! Invoice session – the single "state changed" entry point.
//!
//! A host (CLI, FFI caller, UI binding) owns one session, feeds it every new
//! form snapshot, and reads back the freshly rendered view.

use crate::error::FormError;
use crate::form::InvoiceFormState;
use crate::view::{render_view, InvoiceView};

#[derive(Debug, Clone)]
pub struct InvoiceSession {
    state: InvoiceFormState,
    view: InvoiceView,
}

impl InvoiceSession {
    /// Start a session; the initial render happens immediately.
    pub fn new(state: InvoiceFormState) -> Self {
        let view = render_view(&state);
        Self { state, view }
    }

    pub fn state(&self) -> &InvoiceFormState {
        &self.state
    }

    pub fn view(&self) -> &InvoiceView {
        &self.view
    }

    /// Replace the whole state and re-render.
    pub fn on_state_changed(&mut self, state: InvoiceFormState) -> &InvoiceView {
        self.state = state;
        self.refresh()
    }

    /// Edit the state in place, then re-render.
    pub fn update<F>(&mut self, edit: F) -> &InvoiceView
    where
        F: FnOnce(&mut InvoiceFormState),
    {
        let mut next = self.state.clone();
        edit(&mut next);
        self.on_state_changed(next)
    }

    /// Set one named field, as a single input event would.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<&InvoiceView, FormError> {
        let mut next = self.state.clone();
        next.set_field(name, value)?;
        Ok(self.on_state_changed(next))
    }

    /// Re-render from the current state.
    pub fn refresh(&mut self) -> &InvoiceView {
        self.view = render_view(&self.state);
        &self.view
    }
}

impl Default for InvoiceSession {
    fn default() -> Self {
        Self::new(InvoiceFormState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_render_happens_on_construction() {
        let session = InvoiceSession::default();
        assert_eq!(session.view().badge.text, "UNPAID");
        assert_eq!(session.view().total, "$0.00");
    }

    #[test]
    fn field_events_rerender() {
        let mut session = InvoiceSession::default();
        session.set_field("status", "PAID").unwrap();
        assert_eq!(session.view().badge.text, "PAID");

        session.update(|s| s.total_override = "99".to_string());
        assert_eq!(session.view().total, "$99.00");
        assert_eq!(session.state().status, "PAID");
    }

    #[test]
    fn failed_field_event_leaves_state_untouched() {
        let mut session = InvoiceSession::default();
        session.set_field("custName", "Ann").unwrap();
        assert!(session.set_field("bogus", "x").is_err());
        assert_eq!(session.view().customer.name, "Ann");
    }

    #[test]
    fn refresh_is_idempotent() {
        let mut session = InvoiceSession::default();
        session.update(|s| {
            s.deposit_shown = true;
            s.deposit_amount = "25".to_string();
        });
        let first = session.view().clone();
        let second = session.refresh().clone();
        assert_eq!(first, second);
    }
}
