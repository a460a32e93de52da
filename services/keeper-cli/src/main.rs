//! Keeper command line client
//!
//! Single binary that:
//! 1. Loads the client registration from TOML (secret from env or file)
//! 2. Discovers the authorization realm from the Keeper API root
//! 3. Resumes the session persisted in `credentials_file`
//! 4. Runs one subcommand, persisting any refreshed credentials

mod command;
mod config;
mod store;

use anyhow::{Context, Result};
use keeper_client::{KeeperClient, KeeperSdk, SdkOptions};
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::command::{Command, SessionCommand};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let config_path = Config::resolve_path(command::config_flag(&args));
    let config = match command {
        Command::ApiInfo => Config::load_endpoint_only(&config_path),
        Command::Session(_) => Config::load(&config_path),
    }
    .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    // JSON logs on stderr, filter from LOG_LEVEL / RUST_LOG / config debug flag
    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    info!(
        path = %config_path.display(),
        endpoint = %config.endpoint,
        client_id = %config.client.client_id,
        offline = config.client.offline,
        "configuration loaded"
    );

    let sdk = KeeperSdk::new(SdkOptions {
        endpoint: config.endpoint.clone(),
    });

    let session = match command {
        Command::ApiInfo => {
            let api_info = sdk.api_info().await.context("failed to fetch API info")?;
            return print_json(&serde_json::to_value(api_info)?);
        }
        Command::Session(session) => session,
    };

    let client = build_client(&sdk, &config).await?;
    match run(&client, &config, session).await {
        Ok(output) => print_json(&output),
        Err(e) => {
            match e.downcast_ref::<keeper_client::Error>() {
                Some(sdk_error) if sdk_error.requires_reauthorization() => error!(
                    kind = sdk_error.kind(),
                    "session cannot be refreshed, run `keeper authorize-url` and `keeper exchange` again"
                ),
                _ => {}
            }
            Err(e)
        }
    }
}

/// Client resumed from the credentials file, persisting every new token set back to it.
async fn build_client(sdk: &KeeperSdk, config: &Config) -> Result<KeeperClient> {
    let stored = store::load(&config.credentials_file)?;
    if let Some(ref credentials) = stored {
        info!(display_name = %credentials.display_name, "resuming stored session");
    }

    let path = config.credentials_file.clone();
    let client = sdk
        .create_client(config.client_options(), stored)
        .await
        .context("failed to create Keeper client")?
        .with_refresh_callback(move |credentials| match store::save(&path, credentials) {
            Ok(()) => info!(path = %path.display(), "credentials persisted"),
            Err(e) => error!(path = %path.display(), error = %format!("{e:#}"), "failed to persist credentials"),
        });
    Ok(client)
}

async fn run(client: &KeeperClient, config: &Config, command: SessionCommand) -> Result<Value> {
    let redirect_uri = config.client.redirect_uri.as_str();
    let output = match command {
        SessionCommand::AuthorizeUrl { state } => {
            let state = state.unwrap_or_else(keeper_auth::generate_state);
            serde_json::json!({
                "url": client.authorize_url(redirect_uri, &state),
                "state": state,
            })
        }
        SessionCommand::Exchange { code } => {
            let credentials = client
                .exchange_code(redirect_uri, &code)
                .await
                .context("authorization code exchange failed")?;
            serde_json::json!({
                "display_name": credentials.display_name,
                "expires_in": credentials.expires_in,
            })
        }
        SessionCommand::Refresh => {
            let credentials = client.refresh().await.context("token refresh failed")?;
            serde_json::json!({
                "display_name": credentials.display_name,
                "expires_in": credentials.expires_in,
            })
        }
        SessionCommand::Profile => client.profile().get().await.context("failed to fetch profile")?,
        SessionCommand::DocumentGet { id } => client
            .documents()
            .get(&id)
            .await
            .with_context(|| format!("failed to fetch document {id}"))?,
        SessionCommand::DocumentCreate { body } => client
            .documents()
            .post(&body)
            .await
            .context("failed to create document")?,
        SessionCommand::DocumentUpdate { id, body } => client
            .documents()
            .update(&id, &body)
            .await
            .with_context(|| format!("failed to update document {id}"))?,
        SessionCommand::DocumentDelete { id } => client
            .documents()
            .remove(&id)
            .await
            .with_context(|| format!("failed to delete document {id}"))?,
    };
    Ok(output)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
