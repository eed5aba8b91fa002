//! Identifier newtypes.
//!
//! Both sides hand out numeric ids. Keeping them as distinct types stops an
//! occurrence id from ever being sent where a CRM record id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map($name)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                $name(id)
            }
        }
    };
}

numeric_id!(
    /// A local (content-management) event.
    LocalEventId
);

numeric_id!(
    /// One scheduled instance of a local event.
    OccurrenceId
);

numeric_id!(
    /// A record id on the CRM side (event, location, email, phone or address).
    RemoteId
);

numeric_id!(
    /// A local venue.
    VenueId
);
