//! Defines the JSON protocol used for communication between eosync
//! and provider binaries over stdin/stdout.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::event::{EventRecord, EventType, RemoteRecord};
use crate::ids::RemoteId;
use crate::location::{Address, AddressFields, Email, Location, LocationPayload, Lookup, Phone};

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    CheckReady,
    ListEventTypes,
    CreateEvent,
    UpdateEvent,
    GetEvent,
    DisableEvent,
    DeleteEvent,
    EnableRegistration,
    GetLocation,
    FindEmail,
    SaveEmail,
    FindPhone,
    SavePhone,
    FindAddress,
    SaveAddress,
    SaveLocation,
    DeleteLocation,
}

/// Request sent from eosync to provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from provider to eosync.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data }).unwrap_or_else(|e| {
            Response::<()>::error(&format!("Failed to serialize response: {e}"))
        })
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> String {
        let error = serde_json::Value::String(msg.to_string());
        format!(r#"{{"status":"error","error":{error}}}"#)
    }
}

type RemoteParams = serde_json::Map<String, serde_json::Value>;

macro_rules! command {
    ($(#[$meta:meta])* $name:ident => $response:ty { $($field:ident: $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Serialize, Deserialize)]
        pub struct $name {
            /// Provider-specific config (e.g., civicrm_url, civicrm_site)
            #[serde(flatten)]
            pub remote_config: RemoteParams,
            $(pub $field: $ty,)*
        }

        impl ProviderCommand for $name {
            type Response = $response;
            fn command() -> Command {
                Command::$name
            }
        }
    };
}

command!(
    /// Verify the CRM is reachable and the credentials work.
    CheckReady => () {}
);

command!(
    /// List the CRM's event type options.
    ListEventTypes => Vec<EventType> {}
);

command!(CreateEvent => RemoteRecord { event: EventRecord });

command!(UpdateEvent => RemoteRecord { id: RemoteId, event: EventRecord });

command!(
    /// Fetch one record. `None` when the CRM has no record with that id.
    GetEvent => Option<RemoteRecord> { id: RemoteId }
);

command!(DisableEvent => () { id: RemoteId });

command!(DeleteEvent => () { id: RemoteId });

command!(
    /// Attach the online registration form (profile) to a record.
    EnableRegistration => () { id: RemoteId, profile: Option<u64> }
);

command!(GetLocation => Option<Location> { id: RemoteId });

command!(FindEmail => Option<Email> { lookup: Lookup<String> });

command!(SaveEmail => Email { email: Email });

command!(FindPhone => Option<Phone> { lookup: Lookup<String> });

command!(SavePhone => Phone { phone: Phone });

command!(FindAddress => Option<Address> { lookup: Lookup<AddressFields> });

command!(SaveAddress => Address { address: Address });

command!(
    /// Create (no id) or update a location block.
    SaveLocation => Location { location: LocationPayload }
);

command!(DeleteLocation => () { id: RemoteId });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_flattens_remote_config_into_params() {
        let mut remote_config = RemoteParams::new();
        remote_config.insert("civicrm_url".into(), "https://crm.example.org".into());

        let params = serde_json::to_value(GetEvent {
            remote_config,
            id: RemoteId(12),
        })
        .unwrap();
        let request = Request {
            command: GetEvent::command(),
            params,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["command"], "get_event");
        assert_eq!(json["params"]["id"], 12);
        assert_eq!(json["params"]["civicrm_url"], "https://crm.example.org");
    }

    #[test]
    fn responses_are_tagged_by_status() {
        let ok: Response<Option<u64>> = serde_json::from_str(&Response::success(Some(3))).unwrap();
        assert!(matches!(ok, Response::Success { data: Some(3) }));

        let err: Response<()> =
            serde_json::from_str(&Response::error("bad \"api\" key")).unwrap();
        match err {
            Response::Error { error } => assert_eq!(error, "bad \"api\" key"),
            Response::Success { .. } => panic!("expected error"),
        }
    }
}
