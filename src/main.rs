use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use nearby_core::auth::TokenAuthenticator;
use nearby_core::server::{self, AppState};
use nearby_core::store::SqliteStore;
use nearby_core::{Config, NearbyService};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "usage: nearby-server [issue-token <user_id> [display name]]";

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Environment misconfigured: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!("Opening database at {}", config.database_path.display());
    let store = match SqliteStore::new(&config.database_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to open database: {e}");
            return ExitCode::FAILURE;
        }
    };
    let authenticator = Arc::new(TokenAuthenticator::new(store.clone()));

    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [] => {}
        [command, user_id, name @ ..] if command == "issue-token" => {
            return issue_token(&store, &authenticator, user_id, &name.join(" "));
        }
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    }

    let service = NearbyService::new(store.clone(), store.clone(), store, config.nearby);
    let state = AppState::new(service, authenticator);

    info!("Starting server...");
    match server::serve(config.port, state).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn issue_token(
    store: &SqliteStore,
    authenticator: &TokenAuthenticator,
    user_id: &str,
    display_name: &str,
) -> ExitCode {
    if !display_name.is_empty() {
        if let Err(e) = store.save_user(user_id, display_name) {
            error!("Failed to save user: {e}");
            return ExitCode::FAILURE;
        }
    }

    match authenticator.issue_token(user_id) {
        Ok(token) => {
            println!("{}", token.as_str());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to issue token: {e}");
            ExitCode::FAILURE
        }
    }
}
