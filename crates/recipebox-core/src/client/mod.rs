//! Client controllers.
//!
//! Every user interaction (login, register, logout, guest mode, search,
//! save, edit, delete, download) is a pure transition
//! `(ClientState, UserAction) -> (ClientState, Effect)`. Effects describe the
//! HTTP call or the notice a shell must carry out; the outcome of a call is
//! fed back as [`UserAction::Completed`]. No I/O happens here, so the whole
//! flow is unit-testable.

mod controller;
mod state;

pub use controller::{ApiCall, ApiReply, Effect, Notice, NoticeLevel, UserAction, step};
pub use state::{ClientSession, ClientState, Editor, EditorMode, Pending};
