//! `RecipeBox` CLI
//!
//! Browse, edit and download recipes from a `RecipeBox` server. Each
//! invocation runs one client action and persists the session afterwards.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use recipebox_core::api::Credentials;
use recipebox_core::client::{ClientState, UserAction};
use tracing::debug;

use recipebox_cli::api_client::ApiClient;
use recipebox_cli::driver::{self, Outcome};
use recipebox_cli::session::StoredSession;

#[derive(Parser)]
#[command(name = "recipebox")]
#[command(version, about = "RecipeBox CLI - browse, edit and download recipes", long_about = None)]
struct Cli {
    /// Server base URL.
    #[arg(
        long,
        env = "RECIPEBOX_SERVER",
        default_value = "http://localhost:3500",
        global = true
    )]
    server: String,

    /// Session file (default: ~/.recipebox/session.json).
    #[arg(long, env = "RECIPEBOX_SESSION", global = true)]
    session_file: Option<PathBuf>,

    /// Output logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account.
    Register(LoginArgs),
    /// Sign in and remember the session.
    Login(LoginArgs),
    /// Sign out and forget the session.
    Logout,
    /// Browse without signing in. Add, edit and delete are disabled.
    Guest,
    /// Exchange the stored refresh token for a new access token.
    Refresh,
    /// Show who is signed in and which recipe is selected.
    Status,
    /// List all recipe names.
    List,
    /// Find a recipe by name and make it the current recipe.
    Search {
        /// Part of the recipe name (case-insensitive).
        term: String,
    },
    /// Add a recipe from a text file. Without --file, print the blank template.
    Add {
        /// Recipe text file, or `-` for stdin.
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Replace the current recipe with the contents of a text file.
    Edit {
        /// Recipe text file, or `-` for stdin.
        #[arg(short, long)]
        file: String,
    },
    /// Delete the current recipe.
    Delete {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Download the current recipe as a PDF.
    Download {
        /// Directory to write the PDF into.
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(clap::Args)]
struct LoginArgs {
    /// Username.
    #[arg(short, long)]
    username: String,
    /// Password. Prompted for when omitted.
    #[arg(short, long, env = "RECIPEBOX_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl LoginArgs {
    fn credentials(self) -> anyhow::Result<Credentials> {
        let password = match self.password {
            Some(password) => password,
            None => dialoguer::Password::new()
                .with_prompt("Password")
                .interact()?,
        };
        Ok(Credentials::new(self.username, password))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    recipebox_core::tracing_init::init_tracing("recipebox=warn", cli.log_json);

    let session_path = match cli.session_file {
        Some(path) => path,
        None => StoredSession::default_path()
            .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?,
    };
    let stored = StoredSession::load(&session_path);
    debug!(session = ?stored, path = %session_path.display(), "Loaded session");

    let mut client = ApiClient::new(&cli.server, stored.refresh_token.clone())?;
    if let Command::Download { out_dir } = &cli.command {
        client = client.with_download_dir(out_dir);
    }

    let mut out = io::stdout();
    let state = ClientState::new(stored.client);
    let Some(outcome) = run(cli.command, &client, state, &mut out).await? else {
        return Ok(ExitCode::FAILURE);
    };

    let stored = StoredSession {
        client: outcome.state.session,
        refresh_token: client.refresh_token(),
    };
    stored.save(&session_path)?;

    Ok(if outcome.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Run one subcommand. `None` means it was refused before reaching the
/// controllers and nothing needs saving.
async fn run<W: Write>(
    command: Command,
    client: &ApiClient,
    state: ClientState,
    out: &mut W,
) -> anyhow::Result<Option<Outcome>> {
    let action = match command {
        Command::Register(args) => UserAction::Register(args.credentials()?),
        Command::Login(args) => UserAction::Login(args.credentials()?),
        Command::Logout => UserAction::Logout,
        Command::Guest => UserAction::EnterGuestMode,
        Command::Refresh => UserAction::RefreshSession,
        Command::Status => {
            status(&state, client.refresh_token().is_some(), out)?;
            return Ok(Some(Outcome {
                state,
                failed: false,
            }));
        }
        Command::List => {
            let outcome = driver::drive(client, state, UserAction::LoadNames, out).await?;
            if !outcome.failed {
                if outcome.state.recipe_names.is_empty() {
                    writeln!(out, "No recipes yet.")?;
                }
                for entry in &outcome.state.recipe_names {
                    writeln!(out, "{}  {}", entry.id, entry.name)?;
                }
            }
            return Ok(Some(outcome));
        }
        Command::Search { term } => UserAction::Search { term },
        Command::Add { file: None } => UserAction::BeginAdd,
        Command::Add { file: Some(file) } => {
            return submit(client, state, UserAction::BeginAdd, &file, out).await;
        }
        Command::Edit { file } => {
            return submit(client, state, UserAction::BeginEdit, &file, out).await;
        }
        Command::Delete { yes } => {
            let confirmed = yes
                || dialoguer::Confirm::new()
                    .with_prompt("Are you sure you want to delete this recipe?")
                    .default(false)
                    .interact()?;
            if !confirmed {
                writeln!(out, "Cancelled.")?;
            }
            UserAction::Delete { confirmed }
        }
        Command::Download { .. } => UserAction::Download,
    };

    Ok(Some(driver::drive(client, state, action, out).await?))
}

/// Open the editor in `begin` mode, then submit the text read from `file`.
async fn submit<W: Write>(
    client: &ApiClient,
    state: ClientState,
    begin: UserAction,
    file: &str,
    out: &mut W,
) -> anyhow::Result<Option<Outcome>> {
    let state = match driver::prepare(state, begin) {
        Ok(state) => state,
        Err(notice) => {
            driver::print_notice(out, &notice)?;
            return Ok(None);
        }
    };
    let text = read_recipe_text(file)?;
    Ok(Some(
        driver::drive(client, state, UserAction::SubmitEditor { text }, out).await?,
    ))
}

fn read_recipe_text(file: &str) -> anyhow::Result<String> {
    if file == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(Path::new(file))
        .map_err(|e| anyhow::anyhow!("Failed to read {file}: {e}"))
}

fn status<W: Write>(state: &ClientState, has_refresh: bool, out: &mut W) -> io::Result<()> {
    let session = &state.session;
    match (&session.username, session.is_signed_in()) {
        (Some(username), true) => writeln!(out, "Signed in as {username}")?,
        _ if session.guest_mode => writeln!(out, "Browsing as guest")?,
        _ => writeln!(out, "Not signed in")?,
    }
    if has_refresh && !session.is_signed_in() {
        writeln!(out, "A refresh token is stored; run `recipebox refresh`")?;
    }
    match &session.current_recipe_id {
        Some(id) => writeln!(out, "Current recipe: {id}"),
        None => writeln!(out, "No recipe selected"),
    }
}
