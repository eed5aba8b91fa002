//! The CRM side of a sync.
//!
//! `EventRecords` and `LocationRecords` are the capabilities the reconcilers
//! need. `Remote` implements both by forwarding each call to a provider
//! binary (see [`provider`]).

pub mod protocol;
pub mod provider;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, RemoteError, RemoteResult};
use crate::event::{EventRecord, EventType, RemoteRecord};
use crate::ids::RemoteId;
use crate::location::{Address, AddressFields, Email, Location, LocationPayload, Lookup, Phone};
use crate::remote::protocol::{
    CheckReady, CreateEvent, DeleteEvent, DeleteLocation, DisableEvent, EnableRegistration,
    FindAddress, FindEmail, FindPhone, GetEvent, GetLocation, ListEventTypes, SaveAddress,
    SaveEmail, SaveLocation, SavePhone, UpdateEvent,
};
use crate::remote::provider::{PROVIDER_TIMEOUT, Provider};

/// Readiness of the backing system, checked once before any reconciliation.
#[async_trait]
pub trait RemoteSystem: Send + Sync {
    async fn check_ready(&self) -> RemoteResult<()>;
}

/// CRM event records.
#[async_trait]
pub trait EventRecords: RemoteSystem {
    async fn event_types(&self) -> RemoteResult<Vec<EventType>>;

    async fn create_event(&self, record: &EventRecord) -> RemoteResult<RemoteRecord>;

    async fn update_event(&self, id: RemoteId, record: &EventRecord) -> RemoteResult<RemoteRecord>;

    async fn get_event(&self, id: RemoteId) -> RemoteResult<RemoteRecord>;

    /// Mark a record inactive without deleting it.
    async fn disable_event(&self, id: RemoteId) -> RemoteResult<()>;

    async fn delete_event(&self, id: RemoteId) -> RemoteResult<()>;

    /// Attach (or refresh) the online registration form on a record.
    async fn enable_registration(&self, id: RemoteId, profile: Option<u64>) -> RemoteResult<()>;
}

/// CRM location blocks and their email/phone/address records.
#[async_trait]
pub trait LocationRecords: RemoteSystem {
    async fn get_location(&self, id: RemoteId) -> RemoteResult<Option<Location>>;

    async fn find_email(&self, lookup: &Lookup<String>) -> RemoteResult<Option<Email>>;

    async fn save_email(&self, email: &Email) -> RemoteResult<Email>;

    /// Phones are looked up by their digits-only form.
    async fn find_phone(&self, lookup: &Lookup<String>) -> RemoteResult<Option<Phone>>;

    async fn save_phone(&self, phone: &Phone) -> RemoteResult<Phone>;

    async fn find_address(&self, lookup: &Lookup<AddressFields>) -> RemoteResult<Option<Address>>;

    async fn save_address(&self, address: &Address) -> RemoteResult<Address>;

    async fn save_location(&self, payload: &LocationPayload) -> RemoteResult<Location>;

    async fn delete_location(&self, id: RemoteId) -> RemoteResult<()>;
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RemoteConfig(pub HashMap<String, toml::Value>);

impl From<&RemoteConfig> for serde_json::Map<String, serde_json::Value> {
    fn from(config: &RemoteConfig) -> Self {
        config
            .0
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
            .collect()
    }
}

/// Remote provider configuration (e.g. CiviCRM site settings)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Remote {
    pub provider: Provider,
    #[serde(flatten)]
    pub config: RemoteConfig,
    #[serde(skip, default = "default_timeout")]
    timeout: Duration,
}

fn default_timeout() -> Duration {
    PROVIDER_TIMEOUT
}

impl Remote {
    pub fn new(provider: Provider, config: RemoteConfig) -> Self {
        Remote {
            provider,
            config,
            timeout: PROVIDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn remote_config(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::from(&self.config)
    }
}

/// Provider transport failures mean the CRM could not be reached; anything the
/// provider itself reports back is a rejection of that particular call.
fn to_remote_error(error: CoreError) -> RemoteError {
    match error {
        CoreError::Provider(message) => RemoteError::Rejected(message),
        other => RemoteError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl RemoteSystem for Remote {
    async fn check_ready(&self) -> RemoteResult<()> {
        self.provider
            .call(
                CheckReady {
                    remote_config: self.remote_config(),
                },
                self.timeout,
            )
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl EventRecords for Remote {
    async fn event_types(&self) -> RemoteResult<Vec<EventType>> {
        self.provider
            .call(
                ListEventTypes {
                    remote_config: self.remote_config(),
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)
    }

    async fn create_event(&self, record: &EventRecord) -> RemoteResult<RemoteRecord> {
        self.provider
            .call(
                CreateEvent {
                    remote_config: self.remote_config(),
                    event: record.clone(),
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)
    }

    async fn update_event(&self, id: RemoteId, record: &EventRecord) -> RemoteResult<RemoteRecord> {
        self.provider
            .call(
                UpdateEvent {
                    remote_config: self.remote_config(),
                    id,
                    event: record.clone(),
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)
    }

    async fn get_event(&self, id: RemoteId) -> RemoteResult<RemoteRecord> {
        self.provider
            .call(
                GetEvent {
                    remote_config: self.remote_config(),
                    id,
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)?
            .ok_or(RemoteError::NotFound(id))
    }

    async fn disable_event(&self, id: RemoteId) -> RemoteResult<()> {
        self.provider
            .call(
                DisableEvent {
                    remote_config: self.remote_config(),
                    id,
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)
    }

    async fn delete_event(&self, id: RemoteId) -> RemoteResult<()> {
        self.provider
            .call(
                DeleteEvent {
                    remote_config: self.remote_config(),
                    id,
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)
    }

    async fn enable_registration(&self, id: RemoteId, profile: Option<u64>) -> RemoteResult<()> {
        self.provider
            .call(
                EnableRegistration {
                    remote_config: self.remote_config(),
                    id,
                    profile,
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)
    }
}

#[async_trait]
impl LocationRecords for Remote {
    async fn get_location(&self, id: RemoteId) -> RemoteResult<Option<Location>> {
        self.provider
            .call(
                GetLocation {
                    remote_config: self.remote_config(),
                    id,
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)
    }

    async fn find_email(&self, lookup: &Lookup<String>) -> RemoteResult<Option<Email>> {
        self.provider
            .call(
                FindEmail {
                    remote_config: self.remote_config(),
                    lookup: lookup.clone(),
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)
    }

    async fn save_email(&self, email: &Email) -> RemoteResult<Email> {
        self.provider
            .call(
                SaveEmail {
                    remote_config: self.remote_config(),
                    email: email.clone(),
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)
    }

    async fn find_phone(&self, lookup: &Lookup<String>) -> RemoteResult<Option<Phone>> {
        self.provider
            .call(
                FindPhone {
                    remote_config: self.remote_config(),
                    lookup: lookup.clone(),
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)
    }

    async fn save_phone(&self, phone: &Phone) -> RemoteResult<Phone> {
        self.provider
            .call(
                SavePhone {
                    remote_config: self.remote_config(),
                    phone: phone.clone(),
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)
    }

    async fn find_address(&self, lookup: &Lookup<AddressFields>) -> RemoteResult<Option<Address>> {
        self.provider
            .call(
                FindAddress {
                    remote_config: self.remote_config(),
                    lookup: lookup.clone(),
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)
    }

    async fn save_address(&self, address: &Address) -> RemoteResult<Address> {
        self.provider
            .call(
                SaveAddress {
                    remote_config: self.remote_config(),
                    address: address.clone(),
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)
    }

    async fn save_location(&self, payload: &LocationPayload) -> RemoteResult<Location> {
        self.provider
            .call(
                SaveLocation {
                    remote_config: self.remote_config(),
                    location: payload.clone(),
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)
    }

    async fn delete_location(&self, id: RemoteId) -> RemoteResult<()> {
        self.provider
            .call(
                DeleteLocation {
                    remote_config: self.remote_config(),
                    id,
                },
                self.timeout,
            )
            .await
            .map_err(to_remote_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_config_flattens_into_provider_params() {
        let remote: Remote = toml::from_str(
            r#"
provider = "civicrm"
civicrm_url = "https://crm.example.org"
civicrm_site = "main"
"#,
        )
        .unwrap();

        assert_eq!(remote.provider.name(), "civicrm");
        let params = remote.remote_config();
        assert_eq!(params["civicrm_url"], "https://crm.example.org");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn provider_messages_become_rejections() {
        let err = to_remote_error(CoreError::Provider("Mandatory key(s) missing".into()));
        assert_eq!(err, RemoteError::Rejected("Mandatory key(s) missing".into()));

        let err = to_remote_error(CoreError::ProviderTimeout(10));
        assert!(matches!(err, RemoteError::Unavailable(_)));
    }
}
