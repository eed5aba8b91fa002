//! Venues and their CRM locations.
//!
//! A local venue maps 1:1 onto a CRM location block, which in turn owns at
//! most one email, one phone and one address record.

mod reconciler;

pub use reconciler::{LocationReconciler, is_address_changed};

use serde::{Deserialize, Serialize};

use crate::ids::{RemoteId, VenueId};

/// A local venue.
///
/// Every field is always present on the local side; an unset value is an
/// empty string rather than a missing key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub lng: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// The CRM location this venue is synced to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub civi_id: Option<RemoteId>,
}

impl Venue {
    pub fn has_address(&self) -> bool {
        [
            &self.address,
            &self.city,
            &self.postcode,
            &self.lat,
            &self.lng,
        ]
        .iter()
        .any(|field| !field.is_empty())
    }

    /// The phone number with everything but digits removed.
    pub fn phone_numeric(&self) -> String {
        self.phone.chars().filter(char::is_ascii_digit).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub id: RemoteId,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phone {
    pub id: RemoteId,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_numeric: Option<String>,
}

/// A CRM address. Fields the CRM has no value for are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: RemoteId,
    #[serde(flatten)]
    pub fields: AddressFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_code_1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_code_2: Option<String>,
}

impl AddressFields {
    /// The venue's non-empty address fields.
    pub fn from_venue(venue: &Venue) -> Self {
        let present = |s: &str| (!s.is_empty()).then(|| s.to_string());
        AddressFields {
            street_address: present(&venue.address),
            city: present(&venue.city),
            postal_code: present(&venue.postcode),
            geo_code_1: present(&venue.lat),
            geo_code_2: present(&venue.lng),
        }
    }

    /// Every venue field, empty ones included, so an update can clear values.
    pub fn replacing_with(venue: &Venue) -> Self {
        AddressFields {
            street_address: Some(venue.address.clone()),
            city: Some(venue.city.clone()),
            postal_code: Some(venue.postcode.clone()),
            geo_code_1: Some(venue.lat.clone()),
            geo_code_2: Some(venue.lng.clone()),
        }
    }
}

/// A CRM location block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: RemoteId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Phone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

/// How a sub-record is located on the remote side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lookup<K> {
    /// By a previously stored record id.
    Id(RemoteId),
    /// By natural key (email string, digits-only phone, address fields).
    Key(K),
}

/// A sub-record reference inside a location payload: either an existing
/// record by id, or raw values created together with the location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubRecord<T> {
    Existing(RemoteId),
    New(T),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmail {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPhone {
    pub phone: String,
    pub phone_numeric: String,
}

/// Payload for creating (no `id`) or updating a location block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RemoteId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<SubRecord<NewEmail>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<SubRecord<NewPhone>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<SubRecord<AddressFields>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numeric_keeps_digits_only() {
        let venue = Venue {
            phone: "+44 (0)20 7946-0958".into(),
            ..Default::default()
        };
        assert_eq!(venue.phone_numeric(), "4402079460958");
    }

    #[test]
    fn address_presence_considers_geocodes() {
        let mut venue = Venue::default();
        assert!(!venue.has_address());

        venue.lat = "51.5".into();
        assert!(venue.has_address());
    }

    #[test]
    fn address_fields_from_venue_skip_empty_values() {
        let venue = Venue {
            address: "1 Main St".into(),
            city: "Springfield".into(),
            ..Default::default()
        };

        let fields = AddressFields::from_venue(&venue);
        assert_eq!(fields.street_address.as_deref(), Some("1 Main St"));
        assert_eq!(fields.postal_code, None);

        let json = serde_json::to_value(&fields).unwrap();
        assert!(json.get("postal_code").is_none());
    }

    #[test]
    fn sub_record_serializes_externally_tagged() {
        let existing: SubRecord<NewEmail> = SubRecord::Existing(RemoteId(5));
        assert_eq!(serde_json::to_string(&existing).unwrap(), r#"{"existing":5}"#);
    }
}
