use anyhow::Result;
use eosync_core::event::EventType;
use eosync_core::remote::protocol::ListEventTypes;
use serde_json::json;

use crate::api::Client;
use crate::convert::event_type_from_values;

pub async fn handle(cmd: ListEventTypes) -> Result<Vec<EventType>> {
    let client = Client::from_remote_config(&cmd.remote_config)?;

    let rows = client
        .get(
            "OptionValue",
            json!({
                "option_group_id": "event_type",
                "is_active": 1,
                "options": { "limit": 0, "sort": "weight ASC" },
            }),
        )
        .await?;

    Ok(rows.iter().filter_map(event_type_from_values).collect())
}
