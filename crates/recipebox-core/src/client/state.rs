//! Client-side state.

use serde::{Deserialize, Serialize};

use crate::api::RecipeName;

/// Session-scoped values a client keeps between interactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSession {
    /// Guest mode hides add/edit/delete. It carries no server-side meaning.
    #[serde(default)]
    pub guest_mode: bool,
    /// Recipe currently shown in the editor view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_recipe_id: Option<String>,
    /// Short-lived access token from the last login or refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl ClientSession {
    pub const fn is_signed_in(&self) -> bool {
        self.access_token.is_some()
    }
}

/// What the editor view is doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditorMode {
    /// Read-only display of the current recipe (or nothing).
    #[default]
    Viewing,
    /// Composing a new recipe.
    Adding,
    /// Modifying the current recipe.
    Editing,
}

/// The recipe text view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Editor {
    pub mode: EditorMode,
    pub text: String,
}

/// The call a controller is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Register,
    Login,
    Logout,
    Refresh,
    Names,
    Search,
    Create,
    Update,
    Delete,
    Download,
}

/// Complete client state threaded through [`step`](super::step).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientState {
    pub session: ClientSession,
    pub editor: Editor,
    pub recipe_names: Vec<RecipeName>,
    /// Interactive controls are disabled while a call is in flight.
    pub busy: bool,
    pub pending: Option<Pending>,
}

impl ClientState {
    pub fn new(session: ClientSession) -> Self {
        Self {
            session,
            ..Self::default()
        }
    }

    pub(crate) fn start(&mut self, pending: Pending) {
        self.busy = true;
        self.pending = Some(pending);
    }

    pub(crate) fn finish(&mut self) -> Option<Pending> {
        self.busy = false;
        self.pending.take()
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unset_fields_are_omitted() {
        let session = ClientSession {
            guest_mode: true,
            current_recipe_id: Some("r1".into()),
            access_token: None,
            username: None,
        };
        assert_eq!(
            serde_json::to_value(&session).unwrap(),
            serde_json::json!({"guest_mode": true, "current_recipe_id": "r1"})
        );
    }

    #[test]
    fn empty_object_is_a_fresh_session() {
        let session: ClientSession = serde_json::from_str("{}").unwrap();
        assert_eq!(session, ClientSession::default());
        assert!(!session.is_signed_in());
    }

    #[test]
    fn finish_clears_busy_and_pending() {
        let mut state = ClientState::default();
        state.start(Pending::Search);
        assert!(state.busy);
        assert_eq!(state.finish(), Some(Pending::Search));
        assert!(!state.busy);
        assert!(state.pending.is_none());
    }
}
