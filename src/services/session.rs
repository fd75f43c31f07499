// src/services/session.rs
// DOCUMENTATION: Session state machine
// PURPOSE: Hold the current session as an explicit value and broadcast
// transitions as discrete events

use crate::models::UserProfile;
use tokio::sync::watch;

/// Current authentication state
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    SignedOut,
    SignedIn(UserProfile),
}

impl SessionState {
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            SessionState::SignedIn(user) => Some(user),
            SessionState::SignedOut => None,
        }
    }
}

/// Single owner of the session value; subscribers observe transitions
/// through a watch channel rather than reading ambient globals
pub struct SessionTracker {
    sender: watch::Sender<SessionState>,
}

impl SessionTracker {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SessionState::SignedOut);
        Self { sender }
    }

    /// Snapshot of the current state
    pub fn current(&self) -> SessionState {
        self.sender.borrow().clone()
    }

    /// New receiver that observes every subsequent transition
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.sender.subscribe()
    }

    pub fn signed_in(&self, user: UserProfile) {
        log::info!("Session established for user {}", user.id);
        let _ = self.sender.send(SessionState::SignedIn(user));
    }

    pub fn signed_out(&self) {
        log::info!("Session cleared");
        let _ = self.sender.send(SessionState::SignedOut);
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn profile() -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            username: "mara".to_string(),
            avatar_url: "https://picsum.photos/seed/mara/100/100".to_string(),
        }
    }

    #[test]
    fn test_starts_signed_out() {
        let tracker = SessionTracker::new();
        assert_eq!(tracker.current(), SessionState::SignedOut);
        assert!(tracker.current().user().is_none());
    }

    #[test]
    fn test_transitions_are_observable() {
        let tracker = SessionTracker::new();
        let mut receiver = tracker.subscribe();
        let user = profile();

        tracker.signed_in(user.clone());
        tokio_test::block_on(receiver.changed()).unwrap();
        assert_eq!(receiver.borrow().clone(), SessionState::SignedIn(user));

        tracker.signed_out();
        tokio_test::block_on(receiver.changed()).unwrap();
        assert_eq!(receiver.borrow().clone(), SessionState::SignedOut);
    }

    #[test]
    fn test_current_reflects_latest_transition() {
        let tracker = SessionTracker::new();
        let user = profile();
        tracker.signed_in(user.clone());
        assert_eq!(tracker.current().user(), Some(&user));
        tracker.signed_out();
        assert!(tracker.current().user().is_none());
    }
}
