use crate::error::{CoreError, CoreResult, Operation, RemoteFailure};
use crate::location::{
    Address, AddressFields, Email, Location, LocationPayload, Lookup, NewEmail, NewPhone, Phone,
    SubRecord, Venue,
};
use crate::remote::LocationRecords;

/// Keeps one CRM location block in step with each local venue.
pub struct LocationReconciler<'a, R: LocationRecords + ?Sized> {
    remote: &'a R,
}

impl<'a, R: LocationRecords + ?Sized> LocationReconciler<'a, R> {
    /// Check the remote once; nothing is touched when it isn't ready.
    pub async fn connect(remote: &'a R) -> CoreResult<Self> {
        remote
            .check_ready()
            .await
            .map_err(|e| CoreError::RemoteUnavailable(e.to_string()))?;
        Ok(LocationReconciler { remote })
    }

    /// Create or update the venue's location, fetching the stored one first.
    ///
    /// A stored location id the CRM no longer knows is dropped and a new
    /// location is created in its place.
    pub async fn sync_venue(&self, venue: &Venue) -> Result<Location, RemoteFailure> {
        let Some(id) = venue.civi_id else {
            return self.reconcile_location(venue, None).await;
        };

        let existing = self
            .remote
            .get_location(id)
            .await
            .map_err(|e| RemoteFailure::new(Operation::Fetch, e).remote(id))?;

        match existing {
            Some(location) => self.reconcile_location(venue, Some(&location)).await,
            None => {
                tracing::info!(venue = %venue.id, location = %id, "stored location is gone, creating a new one");
                let detached = Venue {
                    civi_id: None,
                    ..venue.clone()
                };
                self.reconcile_location(&detached, None).await
            }
        }
    }

    /// Resolve the email, phone and address sub-records, then save the
    /// location. The location is updated when the venue carries a remote id
    /// and created otherwise.
    pub async fn reconcile_location(
        &self,
        venue: &Venue,
        existing: Option<&Location>,
    ) -> Result<Location, RemoteFailure> {
        let updating = venue.civi_id.is_some();

        let payload = LocationPayload {
            id: venue.civi_id,
            email: self.resolve_email(venue, existing, updating).await?,
            phone: self.resolve_phone(venue, existing, updating).await?,
            address: self.resolve_address(venue, existing, updating).await?,
        };

        let location = self
            .remote
            .save_location(&payload)
            .await
            .map_err(|e| {
                let failure = RemoteFailure::new(Operation::SaveLocation, e).payload(&payload);
                match venue.civi_id {
                    Some(id) => failure.remote(id),
                    None => failure,
                }
            })?;

        tracing::debug!(venue = %venue.id, location = %location.id, updating, "location saved");
        Ok(location)
    }

    /// Delete the venue's location. Returns false when it never had one.
    pub async fn delete_venue_location(&self, venue: &Venue) -> Result<bool, RemoteFailure> {
        let Some(id) = venue.civi_id else {
            return Ok(false);
        };

        self.remote
            .delete_location(id)
            .await
            .map_err(|e| RemoteFailure::new(Operation::DeleteLocation, e).remote(id))?;
        Ok(true)
    }

    async fn resolve_email(
        &self,
        venue: &Venue,
        existing: Option<&Location>,
        updating: bool,
    ) -> Result<Option<SubRecord<NewEmail>>, RemoteFailure> {
        if venue.email.is_empty() {
            return Ok(None);
        }

        let lookup = match existing.and_then(|l| l.email.as_ref()) {
            Some(email) => Lookup::Id(email.id),
            None => Lookup::Key(venue.email.clone()),
        };
        let found = self
            .remote
            .find_email(&lookup)
            .await
            .map_err(|e| RemoteFailure::new(Operation::Fetch, e).payload(&lookup))?;

        let Some(found) = found else {
            return Ok(Some(SubRecord::New(NewEmail {
                email: venue.email.clone(),
            })));
        };

        if updating && found.email != venue.email {
            let email = Email {
                id: found.id,
                email: venue.email.clone(),
            };
            self.remote.save_email(&email).await.map_err(|e| {
                RemoteFailure::new(Operation::SaveEmail, e)
                    .remote(found.id)
                    .payload(&email)
            })?;
        }

        Ok(Some(SubRecord::Existing(found.id)))
    }

    async fn resolve_phone(
        &self,
        venue: &Venue,
        existing: Option<&Location>,
        updating: bool,
    ) -> Result<Option<SubRecord<NewPhone>>, RemoteFailure> {
        if venue.phone.is_empty() {
            return Ok(None);
        }

        let lookup = match existing.and_then(|l| l.phone.as_ref()) {
            Some(phone) => Lookup::Id(phone.id),
            None => Lookup::Key(venue.phone_numeric()),
        };
        let found = self
            .remote
            .find_phone(&lookup)
            .await
            .map_err(|e| RemoteFailure::new(Operation::Fetch, e).payload(&lookup))?;

        let Some(found) = found else {
            return Ok(Some(SubRecord::New(NewPhone {
                phone: venue.phone.clone(),
                phone_numeric: venue.phone_numeric(),
            })));
        };

        if updating && found.phone != venue.phone {
            let phone = Phone {
                id: found.id,
                phone: venue.phone.clone(),
                phone_numeric: Some(venue.phone_numeric()),
            };
            self.remote.save_phone(&phone).await.map_err(|e| {
                RemoteFailure::new(Operation::SavePhone, e)
                    .remote(found.id)
                    .payload(&phone)
            })?;
        }

        Ok(Some(SubRecord::Existing(found.id)))
    }

    async fn resolve_address(
        &self,
        venue: &Venue,
        existing: Option<&Location>,
        updating: bool,
    ) -> Result<Option<SubRecord<AddressFields>>, RemoteFailure> {
        if !venue.has_address() {
            return Ok(None);
        }

        let lookup = match existing.and_then(|l| l.address.as_ref()) {
            Some(address) => Lookup::Id(address.id),
            None => Lookup::Key(AddressFields::from_venue(venue)),
        };
        let found = self
            .remote
            .find_address(&lookup)
            .await
            .map_err(|e| RemoteFailure::new(Operation::Fetch, e).payload(&lookup))?;

        let Some(found) = found else {
            return Ok(Some(SubRecord::New(AddressFields::from_venue(venue))));
        };

        if updating && is_address_changed(&found, venue) {
            let address = Address {
                id: found.id,
                fields: AddressFields::replacing_with(venue),
            };
            self.remote.save_address(&address).await.map_err(|e| {
                RemoteFailure::new(Operation::SaveAddress, e)
                    .remote(found.id)
                    .payload(&address)
            })?;
        }

        Ok(Some(SubRecord::Existing(found.id)))
    }
}

/// Whether the venue's address differs from the CRM's.
///
/// A field the CRM has no value for compares equal to an empty venue field.
pub fn is_address_changed(existing: &Address, venue: &Venue) -> bool {
    let fields = &existing.fields;
    [
        (&fields.street_address, &venue.address),
        (&fields.city, &venue.city),
        (&fields.postal_code, &venue.postcode),
        (&fields.geo_code_1, &venue.lat),
        (&fields.geo_code_2, &venue.lng),
    ]
    .into_iter()
    .any(|(remote, local)| remote.as_deref().unwrap_or("") != local)
}
