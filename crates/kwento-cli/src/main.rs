//! Kwento CLI
//!
//! Replays scripted activity attempts, submits their results, and makes
//! authenticated calls against the Kwento API.

mod config;
mod error;
mod script;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use kwento_activity::ActivityResult;
use kwento_client::navigator::is_login_path;
use kwento_client::{
    ApiClient, CancellationToken, ClientError, CredentialProvider, ErrorHandler, FileTokenStore,
    HandleOptions, LoggingNavigator, Navigator, Notifier, StoredCredentials, TokenStore,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::CliError;
use crate::script::ActivityScript;

/// Kwento - Filipino reading activities
///
/// Replays learner activity scripts against the activity engine and talks to
/// the Kwento API with the stored login.
#[derive(Parser, Debug)]
#[command(name = "kwento")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: kwento.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Override the API base URL
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay an activity script and print the result
    Replay {
        /// Path to the activity script (JSON)
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Submit the result as an attempt on this activity
        #[arg(long, value_name = "ACTIVITY_ID")]
        submit: Option<String>,
    },

    /// GET an API path and print the response body
    Get {
        /// Path relative to the base URL, e.g. /stories
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Store an access token for later calls
    Login {
        /// The bearer token
        #[arg(value_name = "TOKEN")]
        token: String,
    },

    /// Forget every stored credential
    Logout,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    config.api.apply_env();
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }

    // Re-validate after overrides
    config.validate()?;
    tracing::debug!(base_url = %config.api.base_url, "API configuration");

    let credentials = Arc::new(StoredCredentials::new(FileTokenStore::new(
        config.credentials_path(),
    )));

    // Ctrl+C abandons whatever is in flight.
    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, cancelling");
            watcher.cancel();
        }
    });

    match args.command {
        Command::Replay { script, submit } => {
            let result = replay(&script, &config, &cancel).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if let Some(activity_id) = submit {
                let session = Session::new(&config, credentials)?;
                let receipt = session.submit(&activity_id, &result, &cancel).await?;
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            }
        }
        Command::Get { path } => {
            let session = Session::new(&config, credentials)?;
            let body = session.get(&path, &cancel).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Login { token } => {
            credentials.store().set("accessToken", token.trim());
            println!("Token saved to {}", credentials.store().path().display());
        }
        Command::Logout => {
            credentials.clear();
            println!("Logged out");
        }
    }

    Ok(())
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

async fn replay(
    path: &Path,
    config: &Config,
    cancel: &CancellationToken,
) -> anyhow::Result<ActivityResult> {
    let script = ActivityScript::load(path)?;
    tracing::info!(script = %path.display(), "Loaded activity script");

    tokio::select! {
        biased;
        () = cancel.cancelled() => anyhow::bail!("Replay interrupted"),
        result = script::replay(script, config.timing) => Ok(result?),
    }
}

/// Toasts go to stderr so stdout stays machine-readable.
#[derive(Debug, Clone, Copy, Default)]
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("! {message}");
    }
}

/// An authenticated API session for one command.
struct Session {
    client: ApiClient,
    handler: ErrorHandler,
    navigator: Arc<LoggingNavigator>,
    login_path: String,
}

impl Session {
    fn new(
        config: &Config,
        credentials: Arc<StoredCredentials<FileTokenStore>>,
    ) -> anyhow::Result<Self> {
        let navigator = Arc::new(LoggingNavigator::default());
        let client = ApiClient::from_config(config.api.clone(), credentials, navigator.clone())
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;
        let handler = ErrorHandler::new(
            Arc::new(StderrNotifier),
            navigator.clone(),
            config.api.login_path.clone(),
        );
        Ok(Self {
            client,
            handler,
            navigator,
            login_path: config.api.login_path.clone(),
        })
    }

    async fn get(&self, path: &str, cancel: &CancellationToken) -> Result<Value, CliError> {
        let call = self.client.get_with_cancel::<Value>(path, cancel);
        self.finish(self.handler.handle(call, &HandleOptions::default()).await)
    }

    async fn submit(
        &self,
        activity_id: &str,
        result: &ActivityResult,
        cancel: &CancellationToken,
    ) -> Result<Value, CliError> {
        let path = format!("/activities/{activity_id}/attempts");
        tracing::info!(
            activity_id,
            score = result.score,
            percentage = result.percentage,
            "Submitting attempt"
        );
        let call = self.client.post_with_cancel::<_, Value>(&path, result, cancel);
        self.finish(self.handler.handle(call, &HandleOptions::default()).await)
    }

    fn finish(&self, outcome: Result<Value, ClientError>) -> Result<Value, CliError> {
        let current = self.navigator.current_path();
        if is_login_path(&current, &self.login_path) {
            eprintln!("Your session has ended. Run `kwento login <TOKEN>` to sign in again.");
        }
        outcome.map_err(CliError::from)
    }
}
