//! Location block commands.
//!
//! `LocBlock.get` nests the block's email, phone and address when asked for
//! `return: all`. Older CRMs only return the `*_id` columns, in which case
//! each sub-record is fetched on its own.

use anyhow::{Context, Result};
use eosync_core::ids::RemoteId;
use eosync_core::location::Location;
use eosync_core::remote::protocol::{DeleteLocation, GetLocation, SaveLocation};
use serde_json::json;

use crate::api::{Client, Values, id_of};
use crate::convert::{
    address_from_values, email_from_values, loc_block_params, phone_from_values,
};

pub async fn get(cmd: GetLocation) -> Result<Option<Location>> {
    let client = Client::from_remote_config(&cmd.remote_config)?;
    fetch(&client, cmd.id).await
}

pub async fn save(cmd: SaveLocation) -> Result<Location> {
    let client = Client::from_remote_config(&cmd.remote_config)?;

    let id = client
        .create("LocBlock", loc_block_params(&cmd.location)?)
        .await
        .context("Failed to save location")?;

    fetch(&client, id)
        .await?
        .with_context(|| format!("Location {} was saved but could not be read back", id))
}

pub async fn delete(cmd: DeleteLocation) -> Result<()> {
    let client = Client::from_remote_config(&cmd.remote_config)?;
    client
        .delete("LocBlock", cmd.id)
        .await
        .with_context(|| format!("Failed to delete location {}", cmd.id))
}

async fn fetch(client: &Client, id: RemoteId) -> Result<Option<Location>> {
    let Some(row) = client
        .first("LocBlock", json!({ "id": id, "return": "all" }))
        .await?
    else {
        return Ok(None);
    };

    let email = sub_record(client, &row, "Email", "email").await?;
    let phone = sub_record(client, &row, "Phone", "phone").await?;
    let address = sub_record(client, &row, "Address", "address").await?;

    Ok(Some(Location {
        id,
        email: email.as_ref().and_then(email_from_values),
        phone: phone.as_ref().and_then(phone_from_values),
        address: address.as_ref().and_then(address_from_values),
    }))
}

/// The nested row for `key`, or the row referenced by `<key>_id`.
async fn sub_record(
    client: &Client,
    row: &Values,
    entity: &str,
    key: &str,
) -> Result<Option<Values>> {
    if let Some(nested) = row.get(key).and_then(|v| v.as_object()) {
        return Ok(Some(nested.clone()));
    }

    match id_of(row, &format!("{}_id", key)) {
        Some(id) => client.first(entity, json!({ "id": id })).await,
        None => Ok(None),
    }
}
