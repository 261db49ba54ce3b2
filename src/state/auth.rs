//! Reactive authentication read model.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::net::types::User;

/// Lifecycle phase of the session state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthPhase {
    /// Process start, before the initial check has been scheduled.
    #[default]
    Unknown,
    /// Initial check in flight; a cached user may be shown optimistically.
    Verifying,
    Authenticated,
    Anonymous,
}

/// Authentication state distributed to consuming views.
#[derive(Clone, Debug, Default)]
pub struct AuthState {
    pub user: Option<User>,
    pub phase: AuthPhase,
}

impl AuthState {
    /// True during the `Unknown` and `Verifying` phases.
    #[must_use]
    pub fn loading(&self) -> bool {
        matches!(self.phase, AuthPhase::Unknown | AuthPhase::Verifying)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.phase == AuthPhase::Authenticated && self.user.is_some()
    }

    /// True when the route gate should bounce to the login page. Never
    /// true while the initial check is still loading, so a reload with a
    /// valid stored session shows no redirect flash.
    #[must_use]
    pub fn should_redirect(&self) -> bool {
        !self.loading() && !self.is_authenticated()
    }
}
