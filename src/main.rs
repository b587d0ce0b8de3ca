use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

mod handlers;

use ballot_client::models::config::AppConfig;
use ballot_client::services::api::HttpGateway;
use ballot_client::services::navigation::Navigator;
use ballot_client::services::session::SessionStore;
use ballot_client::utils::logging::init_logging;
use handlers::AppContext;

#[derive(Parser, Debug)]
#[command(name = "ballot", version, about = "Command-line client for the online voting service")]
struct Cli {
    /// Overrides `api.base_url` from the configuration
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the access token
    Login { email: String, password: String },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to the password
        #[arg(long)]
        confirm: Option<String>,
    },
    Logout,
    /// Welcome message and election statistics
    Home,
    /// Profile and candidacy status
    Profile,
    /// Replace the account's profile picture
    Picture { path: PathBuf },
    /// Apply, or re-apply, as a candidate
    Apply {
        #[arg(long)]
        name: Option<String>,
        /// Date of birth, yyyy-mm-dd
        #[arg(long)]
        dob: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        party: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        picture: Option<PathBuf>,
    },
    /// Withdraw the current candidacy
    Revoke,
    /// Follow the live vote count until interrupted
    Watch,
    /// List the ballot
    Candidates,
    /// Cast a vote
    Vote { candidate_id: i64 },
    Results,
    /// Wait for a sleeping server to come up
    WaitReady,
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }

    init_logging(&config.logging)?;
    info!("Starting ballot client v{}", env!("CARGO_PKG_VERSION"));
    if let Some(e) = load_error {
        warn!("Failed to load configuration, using defaults: {}", e);
    }

    let session = SessionStore::persistent(&config.session);
    let gateway = HttpGateway::new(&config.api, session.clone())?;
    let ctx = AppContext {
        api: Arc::new(gateway),
        session,
        navigator: Navigator::new(),
        config,
    };

    match cli.command {
        Command::Login { email, password } => handlers::login(&ctx, &email, &password).await,
        Command::Register {
            name,
            email,
            password,
            confirm,
        } => {
            let confirm = confirm.unwrap_or_else(|| password.clone());
            handlers::register(&ctx, name, email, password, confirm).await
        }
        Command::Logout => handlers::logout(&ctx),
        Command::Home => handlers::home(&ctx).await,
        Command::Profile => handlers::profile(&ctx).await,
        Command::Picture { path } => handlers::upload_picture(&ctx, path).await,
        Command::Apply {
            name,
            dob,
            gender,
            party,
            description,
            picture,
        } => {
            let edits = handlers::FormEdits {
                name,
                dob,
                gender,
                party,
                description,
            };
            handlers::apply(&ctx, edits, picture).await
        }
        Command::Revoke => handlers::revoke(&ctx).await,
        Command::Watch => handlers::watch(&ctx).await,
        Command::Candidates => handlers::candidates(&ctx).await,
        Command::Vote { candidate_id } => handlers::vote(&ctx, candidate_id).await,
        Command::Results => handlers::results(&ctx).await,
        Command::WaitReady => handlers::wait_ready(&ctx).await,
        Command::Config => handlers::show_config(&ctx),
    }
}
