//! Date/time utilities for Filedrop.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC 3339 with second precision.
///
/// # Returns
///
/// RFC3339 formatted string (e.g., "2024-01-15T10:30:00Z")
pub fn to_rfc3339(datetime: &DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::Secs, true)
}
