use anyhow::Result;
use eosync_core::remote::protocol::CheckReady;
use serde_json::json;

use crate::api::Client;

/// Succeeds when the endpoint answers and the keys can read events.
pub async fn handle(cmd: CheckReady) -> Result<()> {
    let client = Client::from_remote_config(&cmd.remote_config)?;
    client.call("Event", "getcount", json!({})).await?;
    Ok(())
}
