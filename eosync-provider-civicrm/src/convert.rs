//! Conversion between CRM API rows and eosync-core types.

use anyhow::{Context, Result};
use eosync_core::event::{EventRecord, EventType, RemoteRecord};
use eosync_core::ids::RemoteId;
use eosync_core::location::{
    Address, AddressFields, Email, LocationPayload, NewEmail, NewPhone, Phone, SubRecord,
};
use serde_json::{Value, json};

use crate::api::{Values, bool_of, date_of, format_date, id_of, str_of, u64_of};
use crate::constants::LOCATION_TYPE_ID;

/// Fields requested when reading an event record.
pub const EVENT_FIELDS: &[&str] = &[
    "id",
    "title",
    "start_date",
    "end_date",
    "is_active",
    "is_online_registration",
    "registration_start_date",
    "registration_end_date",
];

pub fn record_from_values(values: &Values) -> Result<RemoteRecord> {
    Ok(RemoteRecord {
        id: id_of(values, "id").context("Event has no id")?,
        start_date: date_of(values, "start_date").context("Event has no start_date")?,
        end_date: date_of(values, "end_date"),
        title: str_of(values, "title"),
        is_active: bool_of(values, "is_active").unwrap_or(true),
        is_online_registration: bool_of(values, "is_online_registration").unwrap_or(false),
        registration_start_date: date_of(values, "registration_start_date"),
        registration_end_date: date_of(values, "registration_end_date"),
    })
}

/// The record as it was sent, for when the CRM can't be asked for it.
pub fn record_from_sent(id: RemoteId, sent: &EventRecord) -> RemoteRecord {
    RemoteRecord {
        id,
        start_date: sent.start_date,
        end_date: Some(sent.end_date),
        title: Some(sent.template.title.clone()),
        is_active: sent.template.is_active,
        is_online_registration: sent.template.is_online_registration,
        registration_start_date: None,
        registration_end_date: None,
    }
}

/// API params for creating or updating one event record.
pub fn event_params(record: &EventRecord) -> Result<Value> {
    let mut params = serde_json::to_value(record)?;
    let map = params
        .as_object_mut()
        .context("Event record did not serialize to an object")?;

    map.insert("start_date".into(), json!(format_date(&record.start_date)));
    map.insert("end_date".into(), json!(format_date(&record.end_date)));

    Ok(params)
}

pub fn event_type_from_values(values: &Values) -> Option<EventType> {
    Some(EventType {
        value: u64_of(values, "value")?,
        label: str_of(values, "label").unwrap_or_default(),
    })
}

pub fn email_from_values(values: &Values) -> Option<Email> {
    Some(Email {
        id: id_of(values, "id")?,
        email: str_of(values, "email").unwrap_or_default(),
    })
}

pub fn phone_from_values(values: &Values) -> Option<Phone> {
    Some(Phone {
        id: id_of(values, "id")?,
        phone: str_of(values, "phone").unwrap_or_default(),
        phone_numeric: str_of(values, "phone_numeric"),
    })
}

pub fn address_from_values(values: &Values) -> Option<Address> {
    Some(Address {
        id: id_of(values, "id")?,
        fields: AddressFields {
            street_address: str_of(values, "street_address"),
            city: str_of(values, "city"),
            postal_code: str_of(values, "postal_code"),
            geo_code_1: str_of(values, "geo_code_1"),
            geo_code_2: str_of(values, "geo_code_2"),
        },
    })
}

/// Restrict a lookup to contactless records of the venue location type.
pub fn venue_scoped(mut params: Value) -> Value {
    if let Some(map) = params.as_object_mut() {
        map.insert("contact_id".into(), json!({ "IS NULL": 1 }));
        map.insert("location_type_id".into(), json!(LOCATION_TYPE_ID));
    }
    params
}

pub fn address_params(fields: &AddressFields) -> Result<Value> {
    let mut params = serde_json::to_value(fields)?;
    if let Some(map) = params.as_object_mut() {
        map.insert("location_type_id".into(), json!(LOCATION_TYPE_ID));
    }
    Ok(params)
}

/// API params for `LocBlock.create`. New sub-records are nested and created
/// with the block; existing ones are referenced by id.
pub fn loc_block_params(payload: &LocationPayload) -> Result<Value> {
    let mut params = serde_json::Map::new();

    if let Some(id) = payload.id {
        params.insert("id".into(), json!(id));
    }

    match &payload.email {
        Some(SubRecord::Existing(id)) => {
            params.insert("email_id".into(), json!(id));
        }
        Some(SubRecord::New(NewEmail { email })) => {
            params.insert(
                "email".into(),
                json!({ "location_type_id": LOCATION_TYPE_ID, "email": email }),
            );
        }
        None => {}
    }

    match &payload.phone {
        Some(SubRecord::Existing(id)) => {
            params.insert("phone_id".into(), json!(id));
        }
        Some(SubRecord::New(NewPhone {
            phone,
            phone_numeric,
        })) => {
            params.insert(
                "phone".into(),
                json!({
                    "location_type_id": LOCATION_TYPE_ID,
                    "phone": phone,
                    "phone_numeric": phone_numeric,
                }),
            );
        }
        None => {}
    }

    match &payload.address {
        Some(SubRecord::Existing(id)) => {
            params.insert("address_id".into(), json!(id));
        }
        Some(SubRecord::New(fields)) => {
            params.insert("address".into(), address_params(fields)?);
        }
        None => {}
    }

    Ok(Value::Object(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use eosync_core::event::EventTemplate;

    fn values(value: Value) -> Values {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn reads_event_row() {
        let record = record_from_values(&values(json!({
            "id": "31",
            "title": "Repair cafe",
            "start_date": "2024-06-01 10:00:00",
            "end_date": "2024-06-01 13:00:00",
            "is_active": "1",
            "is_online_registration": "0"
        })))
        .unwrap();

        assert_eq!(record.id, RemoteId(31));
        assert_eq!(record.title.as_deref(), Some("Repair cafe"));
        assert!(record.is_active);
        assert!(!record.is_online_registration);
        assert_eq!(record.registration_end_date, None);
    }

    #[test]
    fn event_row_without_start_is_rejected() {
        assert!(record_from_values(&values(json!({"id": "2"}))).is_err());
    }

    fn sent_record() -> EventRecord {
        let template = EventTemplate {
            title: "Repair cafe".into(),
            description: String::new(),
            summary: String::new(),
            is_public: true,
            is_active: true,
            event_type_id: 2,
            default_role_id: Some(1),
            loc_block_id: None,
            is_map: false,
            is_online_registration: false,
            registration_profile: None,
        };
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        EventRecord {
            template,
            start_date: day.and_hms_opt(10, 0, 0).unwrap(),
            end_date: day.and_hms_opt(13, 0, 0).unwrap(),
        }
    }

    #[test]
    fn event_params_use_crm_date_format() {
        let params = event_params(&sent_record()).unwrap();

        assert_eq!(params["start_date"], "2024-06-01 10:00:00");
        assert_eq!(params["end_date"], "2024-06-01 13:00:00");
        assert_eq!(params["event_type_id"], 2);
        assert!(params.get("loc_block_id").is_none());
    }

    #[test]
    fn sent_record_stands_in_for_a_failed_read_back() {
        let sent = sent_record();
        let record = record_from_sent(RemoteId(88), &sent);

        assert_eq!(record.id, RemoteId(88));
        assert_eq!(record.start_date, sent.start_date);
        assert_eq!(record.end_date, Some(sent.end_date));
        assert_eq!(record.title.as_deref(), Some("Repair cafe"));
        assert!(record.is_active);
    }

    #[test]
    fn loc_block_params_nest_new_and_reference_existing() {
        let payload = LocationPayload {
            id: Some(RemoteId(7)),
            email: Some(SubRecord::Existing(RemoteId(40))),
            phone: Some(SubRecord::New(NewPhone {
                phone: "01632 960123".into(),
                phone_numeric: "01632960123".into(),
            })),
            address: None,
        };

        let params = loc_block_params(&payload).unwrap();

        assert_eq!(params["id"], 7);
        assert_eq!(params["email_id"], 40);
        assert!(params.get("email").is_none());
        assert_eq!(params["phone"]["phone_numeric"], "01632960123");
        assert_eq!(params["phone"]["location_type_id"], LOCATION_TYPE_ID);
        assert!(params.get("address").is_none());
        assert!(params.get("address_id").is_none());
    }

    #[test]
    fn venue_scope_excludes_contact_records() {
        let params = venue_scoped(json!({"email": "hall@example.org"}));
        assert_eq!(params["contact_id"]["IS NULL"], 1);
        assert_eq!(params["email"], "hall@example.org");
    }

    #[test]
    fn address_row_drops_empty_fields() {
        let address = address_from_values(&values(json!({
            "id": "12",
            "street_address": "1 Church Lane",
            "city": "",
            "geo_code_1": "51.5"
        })))
        .unwrap();

        assert_eq!(address.fields.city, None);
        assert_eq!(address.fields.geo_code_1.as_deref(), Some("51.5"));
    }
}
