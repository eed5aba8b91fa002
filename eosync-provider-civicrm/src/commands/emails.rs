use anyhow::{Context, Result};
use eosync_core::location::{Email, Lookup};
use eosync_core::remote::protocol::{FindEmail, SaveEmail};
use serde_json::json;

use crate::api::Client;
use crate::convert::{email_from_values, venue_scoped};

pub async fn find(cmd: FindEmail) -> Result<Option<Email>> {
    let client = Client::from_remote_config(&cmd.remote_config)?;

    let params = match &cmd.lookup {
        Lookup::Id(id) => json!({ "id": id }),
        Lookup::Key(email) => venue_scoped(json!({ "email": email, "is_primary": 0 })),
    };

    let row = client.first("Email", params).await?;
    Ok(row.as_ref().and_then(email_from_values))
}

pub async fn save(cmd: SaveEmail) -> Result<Email> {
    let client = Client::from_remote_config(&cmd.remote_config)?;
    let Email { id, email } = cmd.email;

    let id = client
        .create("Email", json!({ "id": id, "email": email }))
        .await
        .with_context(|| format!("Failed to update email {}", id))?;

    Ok(Email { id, email })
}
