pub const PROVIDER_NAME: &str = "civicrm";

/// Location type the CRM uses for venue sub-records ("Home").
pub const LOCATION_TYPE_ID: u64 = 1;

/// Format the CRM uses for dates in API values.
pub const CIVI_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
