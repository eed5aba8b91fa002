//! Attach a registration profile (UF group) to an event record.
//!
//! The CRM links profiles through `UFJoin` rows; an event has at most one
//! at weight 1, which is updated in place rather than duplicated.

use anyhow::Result;
use eosync_core::remote::protocol::EnableRegistration;
use serde_json::json;

use crate::api::{Client, id_of};

pub async fn handle(cmd: EnableRegistration) -> Result<()> {
    let Some(profile) = cmd.profile else {
        tracing::debug!(event = %cmd.id, "No registration profile to attach");
        return Ok(());
    };

    let client = Client::from_remote_config(&cmd.remote_config)?;

    let mut params = json!({
        "module": "CiviEvent",
        "entity_table": "civicrm_event",
        "entity_id": cmd.id,
        "weight": 1,
    });

    let existing = client.first("UFJoin", params.clone()).await?;

    params["uf_group_id"] = json!(profile);
    params["is_active"] = json!(1);
    if let Some(id) = existing.as_ref().and_then(|row| id_of(row, "id")) {
        params["id"] = json!(id);
    }

    client.create("UFJoin", params).await?;
    Ok(())
}
