//! Runs the client reducer to completion.
//!
//! Each user action is fed through [`step`]; any [`Effect::Call`] is
//! executed by a [`Transport`] and its reply fed back in, until the reducer
//! settles on a notice, a display or nothing.
//!
//! User-facing output uses writeln! (this is a CLI binary, not debug output).

use std::future::Future;
use std::io::{self, Write};

use recipebox_core::client::{
    ApiCall, ApiReply, ClientSession, ClientState, Effect, Notice, NoticeLevel, UserAction, step,
};

/// Performs the HTTP side of an [`ApiCall`].
pub trait Transport {
    fn execute(
        &self,
        call: &ApiCall,
        session: &ClientSession,
    ) -> impl Future<Output = ApiReply> + Send;
}

/// Final state after an action settles.
#[derive(Debug)]
pub struct Outcome {
    pub state: ClientState,
    /// The action ended on an error notice.
    pub failed: bool,
}

/// Apply `action` and execute calls until the reducer settles, writing
/// notices and displays to `out`.
pub async fn drive<T, W>(
    transport: &T,
    state: ClientState,
    action: UserAction,
    out: &mut W,
) -> io::Result<Outcome>
where
    T: Transport,
    W: Write,
{
    let (mut state, mut effect) = step(state, action);
    loop {
        match effect {
            Effect::Call(call) => {
                let reply = transport.execute(&call, &state.session).await;
                (state, effect) = step(state, UserAction::Completed(reply));
            }
            Effect::Notify(notice) => {
                print_notice(out, &notice)?;
                let failed = notice.level == NoticeLevel::Error;
                return Ok(Outcome { state, failed });
            }
            Effect::Display(text) => {
                writeln!(out, "{text}")?;
                return Ok(Outcome {
                    state,
                    failed: false,
                });
            }
            Effect::None => {
                return Ok(Outcome {
                    state,
                    failed: false,
                });
            }
        }
    }
}

/// Apply an action that only prepares local state (entering add or edit
/// mode). Returns the error notice when the reducer refuses.
pub fn prepare(state: ClientState, action: UserAction) -> Result<ClientState, Notice> {
    match step(state, action) {
        (_, Effect::Notify(notice)) if notice.level == NoticeLevel::Error => Err(notice),
        (state, _) => Ok(state),
    }
}

pub fn print_notice<W: Write>(out: &mut W, notice: &Notice) -> io::Result<()> {
    match notice.level {
        NoticeLevel::Error => writeln!(out, "error: {}", notice.text),
        NoticeLevel::Info | NoticeLevel::Success => writeln!(out, "{}", notice.text),
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use recipebox_core::api::{Credentials, Recipe};
    use recipebox_core::client::EditorMode;

    use super::*;

    /// Answers calls from a scripted queue and records what was asked.
    #[derive(Default)]
    struct Scripted {
        replies: Mutex<VecDeque<ApiReply>>,
        calls: Mutex<Vec<ApiCall>>,
    }

    impl Scripted {
        fn new(replies: impl IntoIterator<Item = ApiReply>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                calls: Mutex::default(),
            }
        }

        fn calls(&self) -> Vec<ApiCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transport for Scripted {
        async fn execute(&self, call: &ApiCall, _session: &ClientSession) -> ApiReply {
            self.calls.lock().unwrap().push(call.clone());
            self.replies.lock().unwrap().pop_front().unwrap()
        }
    }

    fn soup() -> Recipe {
        Recipe {
            id: "r1".into(),
            name: "Soup".into(),
            ingredients: "water".into(),
            instructions: "boil".into(),
            created_by: None,
        }
    }

    fn signed_in() -> ClientState {
        ClientState::new(ClientSession {
            access_token: Some("at".into()),
            ..ClientSession::default()
        })
    }

    #[tokio::test]
    async fn login_runs_call_and_prints_notice() {
        let transport = Scripted::new([ApiReply::SignedIn {
            access_token: "at".into(),
            username: "alice".into(),
        }]);
        let mut out = Vec::new();

        let outcome = drive(
            &transport,
            ClientState::default(),
            UserAction::Login(Credentials::new("alice", "pw")),
            &mut out,
        )
        .await
        .unwrap();

        assert!(!outcome.failed);
        assert!(!outcome.state.busy);
        assert_eq!(outcome.state.session.username.as_deref(), Some("alice"));
        assert_eq!(String::from_utf8(out).unwrap(), "Login successful!\n");
    }

    #[tokio::test]
    async fn search_displays_recipe_text() {
        let transport = Scripted::new([ApiReply::Found(vec![soup()])]);
        let mut out = Vec::new();

        let outcome = drive(
            &transport,
            ClientState::default(),
            UserAction::Search {
                term: "soup".into(),
            },
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(outcome.state.session.current_recipe_id.as_deref(), Some("r1"));
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Recipe Name: Soup\n"));
    }

    #[tokio::test]
    async fn failures_are_reported_and_flagged() {
        let transport = Scripted::new([ApiReply::Failed {
            status: Some(404),
            message: "No recipes found matching your search".into(),
        }]);
        let mut out = Vec::new();

        let outcome = drive(
            &transport,
            ClientState::default(),
            UserAction::Search { term: "zz".into() },
            &mut out,
        )
        .await
        .unwrap();

        assert!(outcome.failed);
        assert!(!outcome.state.busy);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "error: No recipes found matching your search\n"
        );
    }

    #[tokio::test]
    async fn local_rejection_makes_no_call() {
        let transport = Scripted::default();
        let mut guest = ClientState::default();
        guest.session.guest_mode = true;
        guest.session.current_recipe_id = Some("r1".into());
        let mut out = Vec::new();

        let outcome = drive(
            &transport,
            guest,
            UserAction::Delete { confirmed: true },
            &mut out,
        )
        .await
        .unwrap();

        assert!(outcome.failed);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn add_then_submit_creates_recipe() {
        let transport = Scripted::new([ApiReply::Saved(soup())]);
        let state = prepare(signed_in(), UserAction::BeginAdd).unwrap();
        assert_eq!(state.editor.mode, EditorMode::Adding);

        let mut out = Vec::new();
        let text = "Recipe Name: Soup\nIngredients:\n- water\nInstructions:\n1. boil".to_string();
        let outcome = drive(
            &transport,
            state,
            UserAction::SubmitEditor { text },
            &mut out,
        )
        .await
        .unwrap();

        assert!(!outcome.failed);
        match &transport.calls()[..] {
            [ApiCall::Create(payload)] => {
                assert_eq!(payload.name, "Soup");
                assert_eq!(payload.ingredients, "water");
                assert_eq!(payload.instructions, "boil");
            }
            other => panic!("unexpected calls {other:?}"),
        }
        assert!(String::from_utf8(out).unwrap().contains("Recipe Saved!"));
    }

    #[test]
    fn prepare_refuses_guest_edits() {
        let mut guest = ClientState::default();
        guest.session.guest_mode = true;
        let notice = prepare(guest, UserAction::BeginAdd).unwrap_err();
        assert_eq!(notice.text, "Not available in guest mode");
    }
}
