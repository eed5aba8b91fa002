use anyhow::{Context, Result};
use eosync_core::location::{Address, Lookup};
use eosync_core::remote::protocol::{FindAddress, SaveAddress};
use serde_json::json;

use crate::api::Client;
use crate::convert::{address_from_values, address_params, venue_scoped};

/// By key, every present field must match.
pub async fn find(cmd: FindAddress) -> Result<Option<Address>> {
    let client = Client::from_remote_config(&cmd.remote_config)?;

    let params = match &cmd.lookup {
        Lookup::Id(id) => json!({ "id": id }),
        Lookup::Key(fields) => venue_scoped(serde_json::to_value(fields)?),
    };

    let row = client.first("Address", params).await?;
    Ok(row.as_ref().and_then(address_from_values))
}

pub async fn save(cmd: SaveAddress) -> Result<Address> {
    let client = Client::from_remote_config(&cmd.remote_config)?;
    let Address { id, fields } = cmd.address;

    let mut params = address_params(&fields)?;
    params["id"] = json!(id);

    let id = client
        .create("Address", params)
        .await
        .with_context(|| format!("Failed to update address {}", id))?;

    Ok(Address { id, fields })
}
