use anyhow::{Context, Result};
use eosync_core::location::{Lookup, Phone};
use eosync_core::remote::protocol::{FindPhone, SavePhone};
use serde_json::json;

use crate::api::Client;
use crate::convert::{phone_from_values, venue_scoped};

/// Phones are matched on their digits only.
pub async fn find(cmd: FindPhone) -> Result<Option<Phone>> {
    let client = Client::from_remote_config(&cmd.remote_config)?;

    let params = match &cmd.lookup {
        Lookup::Id(id) => json!({ "id": id }),
        Lookup::Key(numeric) => venue_scoped(json!({ "phone_numeric": numeric })),
    };

    let row = client.first("Phone", params).await?;
    Ok(row.as_ref().and_then(phone_from_values))
}

pub async fn save(cmd: SavePhone) -> Result<Phone> {
    let client = Client::from_remote_config(&cmd.remote_config)?;
    let Phone {
        id,
        phone,
        phone_numeric,
    } = cmd.phone;
    let phone_numeric =
        phone_numeric.unwrap_or_else(|| phone.chars().filter(char::is_ascii_digit).collect());

    let id = client
        .create(
            "Phone",
            json!({ "id": id, "phone": phone, "phone_numeric": phone_numeric }),
        )
        .await
        .with_context(|| format!("Failed to update phone {}", id))?;

    Ok(Phone {
        id,
        phone,
        phone_numeric: Some(phone_numeric),
    })
}
