//! Explicit dependency handles for screens and services.
//!
//! Feature flags, the notifier and the session are passed around in an
//! [`AppContext`]. The builder refuses to produce a context with a handle
//! missing, so a forgotten provider fails at startup rather than on first
//! use.

use std::sync::Arc;

use betterangels_core::flags::FeatureFlags;

use crate::notifier::Notifier;
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("Missing provider: {0}")]
    MissingProvider(&'static str),
}

/// Shared handles. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppContext {
    flags: Arc<FeatureFlags>,
    notifier: Arc<Notifier>,
    session: Arc<Session>,
}

impl AppContext {
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::default()
    }

    pub fn flags(&self) -> &FeatureFlags {
        &self.flags
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

#[derive(Default)]
pub struct AppContextBuilder {
    flags: Option<Arc<FeatureFlags>>,
    notifier: Option<Arc<Notifier>>,
    session: Option<Arc<Session>>,
}

impl AppContextBuilder {
    pub fn flags(mut self, flags: FeatureFlags) -> Self {
        self.flags = Some(Arc::new(flags));
        self
    }

    pub fn notifier(mut self, notifier: Arc<Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn build(self) -> Result<AppContext, ContextError> {
        Ok(AppContext {
            flags: self.flags.ok_or(ContextError::MissingProvider("feature flags"))?,
            notifier: self.notifier.ok_or(ContextError::MissingProvider("notifier"))?,
            session: self.session.ok_or(ContextError::MissingProvider("session"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn complete_builder_succeeds() {
        let ctx = AppContext::builder()
            .flags(FeatureFlags::from_enabled(["hmis-services"]))
            .notifier(Arc::new(Notifier::default()))
            .session(Arc::new(Session::in_memory()))
            .build()
            .expect("all providers present");
        assert!(ctx.flags().is_enabled("hmis-services"));
        assert!(!ctx.session().is_authenticated());
    }

    #[test]
    fn missing_session_is_reported() {
        let result = AppContext::builder()
            .flags(FeatureFlags::new())
            .notifier(Arc::new(Notifier::default()))
            .build();
        assert_matches!(result, Err(ContextError::MissingProvider("session")));
    }

    #[test]
    fn missing_flags_is_reported_first() {
        let result = AppContext::builder().build();
        assert_matches!(result, Err(ContextError::MissingProvider("feature flags")));
    }
}
