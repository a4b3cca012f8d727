//! Session state: who is logged in, and whether an auth call is in flight.
//!
//! The store is a pure reducer over [`SessionEvent`]s behind a
//! `tokio::sync::watch` channel. It never touches credential storage; the
//! [`CredentialVault`](crate::auth::CredentialVault) owns that.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::error::ErrorInfo;
use crate::types::User;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticating,
    Authenticated,
}

impl Session {
    /// Initial state derived from persisted credentials: optimistically
    /// authenticated when a token exists, pending a current-user check.
    pub fn rehydrated(has_token: bool) -> Self {
        Self {
            is_authenticated: has_token,
            ..Self::default()
        }
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_authenticated {
            SessionStatus::Authenticated
        } else if self.is_loading {
            SessionStatus::Authenticating
        } else {
            SessionStatus::Anonymous
        }
    }
}

/// Lifecycle events of the auth operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LoginStarted,
    LoginSucceeded { user: Option<User> },
    LoginFailed { error: ErrorInfo },
    CurrentUserStarted,
    CurrentUserLoaded { user: User },
    /// The server rejected the stored token.
    CurrentUserFailed { error: ErrorInfo },
    /// The user fetch never got a response; credentials are left alone.
    CurrentUserUnreachable { error: ErrorInfo },
    LoggedOut,
}

/// Apply `event` to `session`.
pub fn reduce(session: &mut Session, event: SessionEvent) {
    match event {
        SessionEvent::LoginStarted | SessionEvent::CurrentUserStarted => {
            session.is_loading = true;
            session.error = None;
        }
        SessionEvent::LoginSucceeded { user } => {
            session.user = user;
            session.is_authenticated = true;
            session.is_loading = false;
            session.error = None;
        }
        SessionEvent::LoginFailed { error } => {
            session.error = Some(error);
            session.is_loading = false;
        }
        SessionEvent::CurrentUserLoaded { user } => {
            session.user = Some(user);
            session.is_authenticated = true;
            session.is_loading = false;
            session.error = None;
        }
        SessionEvent::CurrentUserFailed { error } => {
            session.user = None;
            session.is_authenticated = false;
            session.is_loading = false;
            session.error = Some(error);
        }
        SessionEvent::CurrentUserUnreachable { error } => {
            session.is_loading = false;
            session.error = Some(error);
        }
        SessionEvent::LoggedOut => {
            *session = Session::default();
        }
    }
}

/// Shared, subscribable session state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Session>>,
}

impl SessionStore {
    pub fn new(initial: Session) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn dispatch(&self, event: SessionEvent) {
        debug!(?event, "Session event");
        self.tx.send_modify(|session| reduce(session, event));
    }

    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Receive every subsequent state change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated
    }

    pub fn current_user(&self) -> Option<User> {
        self.tx.borrow().user.clone()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Session::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn user() -> User {
        serde_json::from_value(json!({"id": 7, "username": "baraka"})).unwrap()
    }

    fn error(status: u16) -> ErrorInfo {
        ErrorInfo::new(Some(status), json!({"detail": "nope"}))
    }

    #[test]
    fn login_lifecycle_moves_through_authenticating() {
        let store = SessionStore::default();
        assert_eq!(store.snapshot().status(), SessionStatus::Anonymous);

        store.dispatch(SessionEvent::LoginStarted);
        assert_eq!(store.snapshot().status(), SessionStatus::Authenticating);

        store.dispatch(SessionEvent::LoginSucceeded { user: Some(user()) });
        let session = store.snapshot();
        assert_eq!(session.status(), SessionStatus::Authenticated);
        assert!(!session.is_loading);
        assert_eq!(session.user, Some(user()));
    }

    #[test]
    fn login_failure_stays_anonymous_with_error() {
        let store = SessionStore::default();
        store.dispatch(SessionEvent::LoginStarted);
        store.dispatch(SessionEvent::LoginFailed { error: error(400) });

        let session = store.snapshot();
        assert_eq!(session.status(), SessionStatus::Anonymous);
        assert_eq!(session.error, Some(error(400)));
    }

    #[test]
    fn rejected_user_fetch_resets_optimistic_session() {
        let store = SessionStore::new(Session::rehydrated(true));
        assert!(store.is_authenticated());

        store.dispatch(SessionEvent::CurrentUserStarted);
        store.dispatch(SessionEvent::CurrentUserFailed { error: error(401) });

        assert!(!store.is_authenticated());
        assert!(store.current_user().is_none());
    }

    #[test]
    fn unreachable_user_fetch_keeps_auth_flag() {
        let store = SessionStore::new(Session::rehydrated(true));
        store.dispatch(SessionEvent::CurrentUserStarted);
        store.dispatch(SessionEvent::CurrentUserUnreachable {
            error: ErrorInfo::new(None, json!("connection refused")),
        });

        let session = store.snapshot();
        assert!(session.is_authenticated);
        assert!(!session.is_loading);
    }

    #[test]
    fn logout_is_idempotent() {
        let store = SessionStore::default();
        store.dispatch(SessionEvent::CurrentUserLoaded { user: user() });
        store.dispatch(SessionEvent::LoggedOut);
        store.dispatch(SessionEvent::LoggedOut);
        assert_eq!(store.snapshot(), Session::default());
    }

    #[tokio::test]
    async fn subscribers_observe_changes() {
        let store = SessionStore::default();
        let mut rx = store.subscribe();
        store.dispatch(SessionEvent::CurrentUserLoaded { user: user() });
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_authenticated);
    }
}
