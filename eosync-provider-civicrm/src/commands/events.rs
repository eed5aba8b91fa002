//! Event record commands.
//!
//! Create and update both go through `Event.create` and then read the record
//! back, since the values the CRM echoes from a create are not normalized.
//! Once the write has gone through, a failed read back falls back to the
//! values that were sent.

use anyhow::{Context, Result};
use eosync_core::event::{EventRecord, RemoteRecord};
use eosync_core::ids::RemoteId;
use eosync_core::remote::protocol::{CreateEvent, DeleteEvent, DisableEvent, GetEvent, UpdateEvent};
use serde_json::json;

use crate::api::Client;
use crate::convert::{EVENT_FIELDS, event_params, record_from_sent, record_from_values};

pub async fn create(cmd: CreateEvent) -> Result<RemoteRecord> {
    let client = Client::from_remote_config(&cmd.remote_config)?;

    let params = event_params(&cmd.event)?;
    let id = client
        .create("Event", params)
        .await
        .with_context(|| format!("Failed to create event starting {}", cmd.event.start_date))?;

    Ok(read_back(&client, id, &cmd.event).await)
}

pub async fn update(cmd: UpdateEvent) -> Result<RemoteRecord> {
    let client = Client::from_remote_config(&cmd.remote_config)?;

    let mut params = event_params(&cmd.event)?;
    params["id"] = json!(cmd.id);
    client
        .create("Event", params)
        .await
        .with_context(|| format!("Failed to update event {}", cmd.id))?;

    Ok(read_back(&client, cmd.id, &cmd.event).await)
}

pub async fn get(cmd: GetEvent) -> Result<Option<RemoteRecord>> {
    let client = Client::from_remote_config(&cmd.remote_config)?;
    fetch(&client, cmd.id).await
}

pub async fn disable(cmd: DisableEvent) -> Result<()> {
    let client = Client::from_remote_config(&cmd.remote_config)?;
    client
        .create("Event", json!({ "id": cmd.id, "is_active": 0 }))
        .await
        .with_context(|| format!("Failed to disable event {}", cmd.id))?;
    Ok(())
}

pub async fn delete(cmd: DeleteEvent) -> Result<()> {
    let client = Client::from_remote_config(&cmd.remote_config)?;
    client
        .delete("Event", cmd.id)
        .await
        .with_context(|| format!("Failed to delete event {}", cmd.id))
}

async fn fetch(client: &Client, id: RemoteId) -> Result<Option<RemoteRecord>> {
    let row = client
        .first("Event", json!({ "id": id, "return": EVENT_FIELDS }))
        .await?;
    row.as_ref().map(record_from_values).transpose()
}

async fn read_back(client: &Client, id: RemoteId, sent: &EventRecord) -> RemoteRecord {
    match fetch(client, id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            tracing::warn!(event = %id, "Saved event not found on read back");
            record_from_sent(id, sent)
        }
        Err(e) => {
            tracing::warn!(event = %id, error = %format!("{:#}", e), "Saved event could not be read back");
            record_from_sent(id, sent)
        }
    }
}
