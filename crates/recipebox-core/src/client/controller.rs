//! The client reducer.

use tracing::{debug, warn};

use super::state::{ClientSession, ClientState, Editor, EditorMode, Pending};
use crate::api::{Credentials, Recipe, RecipeName, RecipePayload, UserSummary};
use crate::recipe_text::{self, NEW_RECIPE_TEMPLATE};

/// Something the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Register(Credentials),
    Login(Credentials),
    Logout,
    EnterGuestMode,
    RefreshSession,
    LoadNames,
    Search { term: String },
    BeginAdd,
    BeginEdit,
    SubmitEditor { text: String },
    CancelEditor,
    Delete { confirmed: bool },
    Download,
    /// Outcome of the last [`Effect::Call`].
    Completed(ApiReply),
}

/// An HTTP call the shell must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Register(Credentials),
    Login(Credentials),
    Logout,
    Refresh,
    ListNames,
    Search { term: String },
    Create(RecipePayload),
    Update { id: String, payload: RecipePayload },
    Delete { id: String },
    Download { id: String },
}

impl ApiCall {
    /// Whether the call must carry `Authorization: Bearer <access token>`.
    pub const fn requires_auth(&self) -> bool {
        matches!(self, Self::Create(_) | Self::Update { .. } | Self::Delete { .. })
    }
}

/// What came back from an [`ApiCall`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiReply {
    Registered(UserSummary),
    SignedIn { access_token: String, username: String },
    SignedOut,
    Names(Vec<RecipeName>),
    Found(Vec<Recipe>),
    Saved(Recipe),
    Deleted,
    Downloaded { file_name: String },
    Failed { status: Option<u16>, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Status text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Call(ApiCall),
    Notify(Notice),
    /// Show this recipe text block in the editor view.
    Display(String),
}

const GUEST_DENIED: &str = "Not available in guest mode";

/// Apply one user action to the client state.
pub fn step(mut state: ClientState, action: UserAction) -> (ClientState, Effect) {
    if let UserAction::Completed(reply) = action {
        return complete(state, reply);
    }
    if state.busy {
        debug!(?action, "Ignoring action while a call is in flight");
        return (state, Effect::None);
    }

    let effect = match action {
        UserAction::Register(credentials) => {
            if credentials.is_complete() {
                state.start(Pending::Register);
                Effect::Call(ApiCall::Register(credentials))
            } else {
                Effect::Notify(Notice::error("Please enter both username and password"))
            }
        }
        UserAction::Login(credentials) => {
            if credentials.is_complete() {
                state.start(Pending::Login);
                Effect::Call(ApiCall::Login(credentials))
            } else {
                Effect::Notify(Notice::error("Please enter both fields"))
            }
        }
        UserAction::Logout => {
            state.start(Pending::Logout);
            Effect::Call(ApiCall::Logout)
        }
        UserAction::EnterGuestMode => {
            state.session.guest_mode = true;
            Effect::Notify(Notice::info("Browsing as guest"))
        }
        UserAction::RefreshSession => {
            state.start(Pending::Refresh);
            Effect::Call(ApiCall::Refresh)
        }
        UserAction::LoadNames => {
            state.start(Pending::Names);
            Effect::Call(ApiCall::ListNames)
        }
        UserAction::Search { term } => {
            let term = term.trim();
            if term.is_empty() {
                Effect::Notify(Notice::error("Please enter a search term"))
            } else {
                state.start(Pending::Search);
                Effect::Call(ApiCall::Search {
                    term: term.to_string(),
                })
            }
        }
        UserAction::BeginAdd => {
            if state.session.guest_mode {
                Effect::Notify(Notice::error(GUEST_DENIED))
            } else {
                state.editor = Editor {
                    mode: EditorMode::Adding,
                    text: NEW_RECIPE_TEMPLATE.to_string(),
                };
                Effect::Display(state.editor.text.clone())
            }
        }
        UserAction::BeginEdit => {
            if state.session.guest_mode {
                Effect::Notify(Notice::error(GUEST_DENIED))
            } else if state.session.current_recipe_id.is_none() {
                Effect::Notify(Notice::error("Please search for a recipe first"))
            } else {
                state.editor.mode = EditorMode::Editing;
                Effect::Display(state.editor.text.clone())
            }
        }
        UserAction::SubmitEditor { text } => submit_editor(&mut state, text),
        UserAction::CancelEditor => {
            if state.editor.mode == EditorMode::Adding {
                state.editor.text.clear();
            }
            state.editor.mode = EditorMode::Viewing;
            Effect::None
        }
        UserAction::Delete { confirmed } => {
            if state.session.guest_mode {
                Effect::Notify(Notice::error(GUEST_DENIED))
            } else if let Some(id) = state.session.current_recipe_id.clone() {
                if confirmed {
                    state.start(Pending::Delete);
                    Effect::Call(ApiCall::Delete { id })
                } else {
                    Effect::None
                }
            } else {
                Effect::Notify(Notice::error("No recipe selected"))
            }
        }
        UserAction::Download => {
            if let Some(id) = state.session.current_recipe_id.clone() {
                state.start(Pending::Download);
                Effect::Call(ApiCall::Download { id })
            } else {
                Effect::Notify(Notice::error(
                    "Please save or open a recipe before downloading.",
                ))
            }
        }
        UserAction::Completed(_) => Effect::None,
    };

    (state, effect)
}

fn submit_editor(state: &mut ClientState, text: String) -> Effect {
    let mode = state.editor.mode;
    if mode == EditorMode::Viewing {
        return Effect::Notify(Notice::error("Start adding or editing a recipe first"));
    }
    if state.session.guest_mode {
        return Effect::Notify(Notice::error(GUEST_DENIED));
    }

    let parsed = recipe_text::parse(&text);
    state.editor.text = text;
    let fields = match parsed {
        Ok(fields) => fields,
        Err(e) => return Effect::Notify(Notice::error(format!("Error: {e}"))),
    };

    match (mode, state.session.current_recipe_id.clone()) {
        (EditorMode::Editing, Some(id)) => {
            state.start(Pending::Update);
            Effect::Call(ApiCall::Update {
                id,
                payload: fields.into(),
            })
        }
        (EditorMode::Editing, None) => {
            Effect::Notify(Notice::error("Please search for a recipe first"))
        }
        _ => {
            state.start(Pending::Create);
            Effect::Call(ApiCall::Create(fields.into()))
        }
    }
}

fn complete(mut state: ClientState, reply: ApiReply) -> (ClientState, Effect) {
    let Some(pending) = state.finish() else {
        warn!("Reply arrived with no call in flight");
        return (state, Effect::None);
    };

    let effect = match (pending, reply) {
        (Pending::Register, ApiReply::Registered(user)) => Effect::Notify(Notice::success(
            format!("Registration successful! Welcome {}", user.username),
        )),
        (Pending::Login, ApiReply::SignedIn {
            access_token,
            username,
        }) => {
            state.session.access_token = Some(access_token);
            state.session.username = Some(username);
            state.session.guest_mode = false;
            Effect::Notify(Notice::success("Login successful!"))
        }
        (Pending::Refresh, ApiReply::SignedIn {
            access_token,
            username,
        }) => {
            state.session.access_token = Some(access_token);
            state.session.username = Some(username);
            Effect::Notify(Notice::success("Session refreshed"))
        }
        (Pending::Refresh, ApiReply::Failed { .. }) => {
            state.session.access_token = None;
            Effect::Notify(Notice::error("Session expired, please log in again"))
        }
        (Pending::Logout, ApiReply::SignedOut) => {
            state = ClientState::new(ClientSession::default());
            Effect::Notify(Notice::info("Logged out"))
        }
        (Pending::Logout, ApiReply::Failed { .. }) => {
            Effect::Notify(Notice::error("Logout failed - please try again"))
        }
        (Pending::Names, ApiReply::Names(names)) => {
            state.recipe_names = names;
            Effect::None
        }
        (Pending::Names, ApiReply::Failed { .. }) => {
            state.recipe_names.clear();
            Effect::Notify(Notice::error(
                "Error loading recipes. Please refresh the page.",
            ))
        }
        (Pending::Search, ApiReply::Found(recipes)) => match recipes.into_iter().next() {
            Some(recipe) => show_recipe(&mut state, &recipe),
            None => Effect::Notify(Notice::error("No recipes found matching your search")),
        },
        (Pending::Search, ApiReply::Failed {
            status: Some(404), ..
        }) => Effect::Notify(Notice::error("No recipes found matching your search")),
        (Pending::Search, ApiReply::Failed { message, .. }) => {
            Effect::Notify(Notice::error(format!("Search failed: {message}")))
        }
        (Pending::Create, ApiReply::Saved(recipe)) => {
            show_recipe(&mut state, &recipe);
            Effect::Notify(Notice::success("Recipe Saved!"))
        }
        (Pending::Update, ApiReply::Saved(recipe)) => {
            show_recipe(&mut state, &recipe);
            Effect::Notify(Notice::success("Changes saved!"))
        }
        (Pending::Create, ApiReply::Failed { message, .. }) => {
            Effect::Notify(Notice::error(format!("Error: {message}")))
        }
        (Pending::Update, ApiReply::Failed { message, .. }) => {
            Effect::Notify(Notice::error(format!("Error! Try Again: {message}")))
        }
        (Pending::Delete, ApiReply::Deleted) => {
            state.session.current_recipe_id = None;
            state.editor = Editor::default();
            Effect::Notify(Notice::success("Recipe deleted"))
        }
        (Pending::Delete, ApiReply::Failed { .. }) => {
            Effect::Notify(Notice::error("Failed to delete recipe"))
        }
        (Pending::Download, ApiReply::Downloaded { file_name }) => {
            Effect::Notify(Notice::success(format!("Downloaded {file_name}")))
        }
        (_, ApiReply::Failed { message, .. }) => Effect::Notify(Notice::error(message)),
        (pending, _) => {
            warn!(?pending, "Reply does not match the call in flight");
            Effect::None
        }
    };

    (state, effect)
}

fn show_recipe(state: &mut ClientState, recipe: &Recipe) -> Effect {
    state.session.current_recipe_id = Some(recipe.id.clone());
    state.editor = Editor {
        mode: EditorMode::Viewing,
        text: recipe_text::render(&recipe.fields()),
    };
    Effect::Display(state.editor.text.clone())
}
