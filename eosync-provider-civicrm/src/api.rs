//! Thin client for the CiviCRM APIv3 REST endpoint.
//!
//! Every call is a form POST of `entity`, `action`, the JSON-encoded params
//! and both keys. Results always come back `sequential`, so `values` is a
//! list of flat objects whose scalars are usually strings.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use eosync_core::ids::RemoteId;
use serde_json::{Value, json};

use crate::constants::CIVI_DATE_FORMAT;
use crate::credentials::Credentials;
use crate::remote_config::CivicrmRemoteConfig;

/// One API result row.
pub type Values = serde_json::Map<String, Value>;

pub struct Client {
    http: reqwest::Client,
    endpoint: String,
    credentials: Credentials,
}

/// The decoded body of a successful call.
#[derive(Debug, Default, PartialEq)]
pub struct ApiResult {
    pub count: u64,
    pub id: Option<RemoteId>,
    pub values: Vec<Values>,
}

impl Client {
    pub fn new(config: &CivicrmRemoteConfig, credentials: Credentials) -> Self {
        Client {
            http: reqwest::Client::new(),
            endpoint: config.endpoint(),
            credentials,
        }
    }

    /// Build a client from the remote config sent with a command.
    pub fn from_remote_config(params: &serde_json::Map<String, Value>) -> Result<Self> {
        let config = CivicrmRemoteConfig::try_from(params)?;
        let credentials = Credentials::load(&config.civicrm_site)?;
        Ok(Client::new(&config, credentials))
    }

    pub async fn call(&self, entity: &str, action: &str, mut params: Value) -> Result<ApiResult> {
        if let Some(map) = params.as_object_mut() {
            map.insert("sequential".into(), json!(1));
        }
        let encoded = serde_json::to_string(&params)?;

        tracing::debug!(entity, action, params = %encoded, "CiviCRM API call");

        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Requested-With", "XMLHttpRequest")
            .form(&[
                ("entity", entity),
                ("action", action),
                ("json", encoded.as_str()),
                ("api_key", self.credentials.api_key.as_str()),
                ("key", self.credentials.site_key.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("{}.{} failed with HTTP {}", entity, action, status);
        }

        let body: Value = response
            .json()
            .await
            .with_context(|| format!("{}.{} returned invalid JSON", entity, action))?;

        parse_result(body).with_context(|| format!("{}.{} failed", entity, action))
    }

    pub async fn get(&self, entity: &str, params: Value) -> Result<Vec<Values>> {
        Ok(self.call(entity, "get", params).await?.values)
    }

    /// The first matching row, if any.
    pub async fn first(&self, entity: &str, params: Value) -> Result<Option<Values>> {
        Ok(self.get(entity, params).await?.into_iter().next())
    }

    /// Create (or update, when params carry an `id`) and return the id.
    pub async fn create(&self, entity: &str, params: Value) -> Result<RemoteId> {
        let result = self.call(entity, "create", params).await?;
        result
            .id
            .or_else(|| result.values.first().and_then(|v| id_of(v, "id")))
            .with_context(|| format!("{}.create returned no id", entity))
    }

    pub async fn delete(&self, entity: &str, id: RemoteId) -> Result<()> {
        self.call(entity, "delete", json!({ "id": id })).await?;
        Ok(())
    }
}

/// Decode an API body, turning `is_error` into an `Err`.
pub fn parse_result(body: Value) -> Result<ApiResult> {
    let Some(map) = body.as_object() else {
        anyhow::bail!("Unexpected response: {}", body);
    };

    if map.get("is_error").is_some_and(truthy) {
        let message = map
            .get("error_message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        anyhow::bail!("CiviCRM error: {}", message);
    }

    let values = match map.get("values") {
        Some(Value::Array(rows)) => rows.iter().filter_map(|r| r.as_object().cloned()).collect(),
        Some(Value::Object(rows)) => rows.values().filter_map(|r| r.as_object().cloned()).collect(),
        _ => Vec::new(),
    };

    Ok(ApiResult {
        count: map.get("count").and_then(number).unwrap_or(values.len() as u64),
        id: map.get("id").and_then(number).map(RemoteId),
        values,
    })
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_u64().is_some_and(|n| n != 0),
        Value::String(s) => s == "1" || s == "true",
        _ => false,
    }
}

fn number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn u64_of(values: &Values, key: &str) -> Option<u64> {
    values.get(key).and_then(number)
}

pub fn id_of(values: &Values, key: &str) -> Option<RemoteId> {
    u64_of(values, key).filter(|&id| id != 0).map(RemoteId)
}

/// A non-empty string value.
pub fn str_of(values: &Values, key: &str) -> Option<String> {
    match values.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn bool_of(values: &Values, key: &str) -> Option<bool> {
    values.get(key).map(truthy)
}

pub fn date_of(values: &Values, key: &str) -> Option<NaiveDateTime> {
    let raw = str_of(values, key)?;
    NaiveDateTime::parse_from_str(&raw, CIVI_DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M%S"))
        .ok()
}

pub fn format_date(date: &NaiveDateTime) -> String {
    date.format(CIVI_DATE_FORMAT).to_string()
}
