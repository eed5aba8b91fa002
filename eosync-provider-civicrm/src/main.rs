//! eosync-provider-civicrm - CiviCRM provider for eosync
//!
//! This binary implements the eosync provider protocol, communicating
//! with eosync via JSON over stdin/stdout and forwarding each command to
//! the CiviCRM APIv3 REST endpoint.
//!
//! Credentials are read from:
//!   ~/.config/eosync/providers/civicrm/credentials.toml

mod api;
mod commands;
mod constants;
mod convert;
mod credentials;
mod remote_config;

use anyhow::Result;
use eosync_core::remote::protocol::{Command, Request, Response};
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::io::{self, BufRead, Write};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read stdin");
                break;
            }
        };

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(request).await,
            Err(e) => Response::error(&format!("Failed to parse request: {}", e)),
        };

        writeln!(stdout, "{}", response)?;
        stdout.flush()?;
    }

    Ok(())
}

async fn handle_request(request: Request) -> String {
    use commands::*;

    tracing::debug!(command = ?request.command, "Handling request");

    let params = &request.params;
    match request.command {
        Command::CheckReady => respond(params, check_ready::handle).await,
        Command::ListEventTypes => respond(params, event_types::handle).await,
        Command::CreateEvent => respond(params, events::create).await,
        Command::UpdateEvent => respond(params, events::update).await,
        Command::GetEvent => respond(params, events::get).await,
        Command::DisableEvent => respond(params, events::disable).await,
        Command::DeleteEvent => respond(params, events::delete).await,
        Command::EnableRegistration => respond(params, registration::handle).await,
        Command::GetLocation => respond(params, locations::get).await,
        Command::FindEmail => respond(params, emails::find).await,
        Command::SaveEmail => respond(params, emails::save).await,
        Command::FindPhone => respond(params, phones::find).await,
        Command::SavePhone => respond(params, phones::save).await,
        Command::FindAddress => respond(params, addresses::find).await,
        Command::SaveAddress => respond(params, addresses::save).await,
        Command::SaveLocation => respond(params, locations::save).await,
        Command::DeleteLocation => respond(params, locations::delete).await,
    }
}

/// Decode the params into the command struct, run the handler and encode
/// its outcome as a response line.
async fn respond<C, T, F, Fut>(params: &serde_json::Value, handler: F) -> String
where
    C: DeserializeOwned,
    T: Serialize,
    F: FnOnce(C) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let cmd: C = match serde_json::from_value(params.clone()) {
        Ok(c) => c,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    match handler(cmd).await {
        Ok(data) => Response::success(data),
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "Command failed");
            Response::error(&format!("{:#}", e))
        }
    }
}

fn init_tracing() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("EOSYNC_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
