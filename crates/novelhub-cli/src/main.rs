//! Novel Hub command-line front end.
//!
//! Logs in against the Novel Hub server, inspects or clears the stored
//! session, and runs the data-store connection manager.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use novelhub_core::auth::{AuthContext, CookieJar, LoginFlow, Navigator};
use novelhub_core::store::{self, ConnectionManager, MongoDriver};
use novelhub_core::{ApiClient, Config, Settings};

const USAGE: &str = "\
Usage: novelhub <command>

Commands:
  login [--remember]   Log in; --remember keeps the session for one day
  whoami               Show the stored session
  logout               Remove the stored session
  serve                Connect to MONGODB_URI and hold the connection until interrupted";

/// Initialize the tracing subscriber for logging
fn init_tracing(default_level: &str) {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Navigation target for a terminal: just report where we would go
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: &str) {
        info!(route, "Navigating");
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str);

    init_tracing(if command == Some("serve") { "info" } else { "warn" });

    let settings = Settings::from_env();

    match command {
        Some("login") => {
            let remember_me = args[2..].iter().any(|a| a == "--remember");
            login(&settings, remember_me).await
        }
        Some("whoami") => whoami(&settings),
        Some("logout") => logout(&settings),
        Some("serve") => Ok(serve(&settings).await),
        _ => {
            eprintln!("{}", USAGE);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn open_context(settings: &Settings) -> Result<(Config, Arc<AuthContext>)> {
    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });
    let cache_dir = Config::cache_dir()?;
    let jar = CookieJar::open(&cache_dir).context("Failed to open session storage")?;
    let context = AuthContext::new(Arc::new(jar)).with_google_client_id(settings.google_client_id.clone());
    Ok((config, Arc::new(context)))
}

async fn login(settings: &Settings, remember_me: bool) -> Result<ExitCode> {
    let api = ApiClient::new(settings.api_url()?)?;
    let (mut config, context) = open_context(settings)?;

    let email = prompt_email(config.last_email.as_deref())?;
    let password = rpassword::prompt_password("Password: ")?;

    let flow = LoginFlow::new(api, context, Arc::new(TerminalNavigator));

    eprintln!("Logging in...");
    match flow.submit_credentials(&email, &password, remember_me).await {
        Ok(session) => {
            config.last_email = Some(email);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }

            println!("Logged in as user {}", session.user_id);
            if !remember_me {
                println!("Session ends when this process exits; use --remember to keep it for a day.");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn prompt_email(last_email: Option<&str>) -> Result<String> {
    match last_email {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match last_email {
        Some(last) if input.is_empty() => last.to_string(),
        _ => input.to_string(),
    })
}

fn whoami(settings: &Settings) -> Result<ExitCode> {
    let (_, context) = open_context(settings)?;
    match context.current() {
        Some(session) => println!("Logged in as user {}", session.user_id),
        None => println!("Not logged in"),
    }
    Ok(ExitCode::SUCCESS)
}

fn logout(settings: &Settings) -> Result<ExitCode> {
    let (_, context) = open_context(settings)?;
    context.logout()?;
    println!("Logged out");
    Ok(ExitCode::SUCCESS)
}

async fn serve(settings: &Settings) -> ExitCode {
    let uri = match settings.mongodb_uri() {
        Ok(uri) => uri,
        Err(e) => {
            error!(error = %e, "Error connecting to data store");
            return ExitCode::FAILURE;
        }
    };

    info!("Novel Hub data-store manager starting");
    let manager = ConnectionManager::new(MongoDriver::new().with_app_name("novel-hub"));
    store::run(manager, uri, wait_for_shutdown_signal()).await.into()
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to register signal handlers, falling back to Ctrl-C");
            }
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
