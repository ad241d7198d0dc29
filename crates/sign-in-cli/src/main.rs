//! Sign-in binary entry point.
//!
//! Usage: sign-in [--email <email>] [--password <password>] [--print-session]
//!
//! Prompts on stdin for anything not given on the command line, including the
//! TOTP code when the account requires a second factor.

mod flow;

use anyhow::{Context, Result};
use clap::Parser;
use credential_sign_in::{SignInConfig, SignInController};
use flow::{run_sign_in, Prefill, Terminal};
use stack_auth_client::{StackAuthClient, StackAuthConfig, DEFAULT_API_URL};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

/// Sign in to a Stack Auth project with email, password and optional TOTP.
#[derive(Parser)]
#[command(name = "sign-in")]
#[command(about = "Email/password sign-in with TOTP second factor")]
#[command(version)]
struct Args {
    /// Account email. Prompted for when omitted.
    #[arg(long)]
    email: Option<String>,

    /// Account password. Prompted for when omitted.
    #[arg(long, env = "STACK_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Stack Auth API base URL.
    #[arg(long, env = "STACK_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Stack Auth project ID.
    #[arg(long, env = "STACK_PROJECT_ID")]
    project_id: String,

    /// Publishable client key of the project.
    #[arg(long, env = "STACK_PUBLISHABLE_CLIENT_KEY", hide_env_values = true)]
    publishable_client_key: String,

    /// Request timeout in seconds.
    #[arg(long, env = "STACK_REQUEST_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,

    /// Number of digits in the one-time code (defaults to SIGN_IN_OTP_LENGTH or 6).
    #[arg(long)]
    otp_length: Option<usize>,

    /// Print the issued session as JSON on stdout.
    #[arg(long)]
    print_session: bool,

    /// Log level for the log file (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log file path. Defaults to ~/.credential-sign-in/logs/sign-in.jsonl
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Also log to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    observability::init_with_config(observability::LogConfig {
        service_name: "sign-in".into(),
        default_level: args.log_level.clone(),
        log_path: args.log_file.clone(),
        stderr_level: args.verbose.then(|| "debug".to_string()),
    })
    .context("Failed to initialize logging")?;

    let mut config = SignInConfig::from_env()?;
    if let Some(otp_length) = args.otp_length {
        config = config.with_otp_length(otp_length)?;
    }

    let stack_config = StackAuthConfig::new(
        &args.api_url,
        args.project_id.clone(),
        args.publishable_client_key.clone(),
    )?
    .with_request_timeout(Duration::from_secs(args.timeout_secs));

    info!(
        api_url = %stack_config.api_url,
        project_id = %stack_config.project_id,
        otp_length = config.otp_length,
        "Configuration loaded"
    );

    let client = StackAuthClient::new(stack_config)?;
    let mut controller = SignInController::new(client, config);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut terminal = Terminal::new(stdin, std::io::stderr()).with_hidden_secrets();
    let prefill = Prefill {
        email: args.email,
        password: args.password,
    };

    let session = match run_sign_in(&mut controller, &mut terminal, prefill).await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "Sign-in failed");
            return Err(e);
        }
    };

    terminal.say(format!("Signed in as {}", session.user_id))?;
    if args.print_session {
        println!("{}", serde_json::to_string(&session)?);
    }

    Ok(())
}
