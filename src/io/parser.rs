//! Extraction of the embedded JSON blobs from the populartimes page
//!
//! The page is HTML/JS text containing two assignment statements whose
//! right-hand sides are JSON literals:
//!
//! ```text
//! const locations = {...};
//! const live_validations = {...};
//! ```
//!
//! Both are required; a page missing either marker means the source
//! format changed (or the response was empty) and the whole refresh
//! fails. A single malformed location record is logged and skipped so
//! one bad entry cannot take down the rest of the data.

use crate::domain::location::Location;
use crate::domain::snapshot::OccupancySnapshot;
use crate::io::client::ApiError;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

const LOCATIONS_MARKER: &str = "const locations = ";
const VALIDATIONS_MARKER: &str = "const live_validations = ";

/// Extract the JSON payload of a `const <name> = <json>;` assignment.
///
/// The payload is scanned with delimiter balancing (string-aware), so a
/// `;` inside a name cannot cut it short and a second assignment on the
/// same line is not swallowed.
fn extract_assignment<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let start = text.find(marker)? + marker.len();
    let rest = text[start..].trim_start();
    let bytes = rest.as_bytes();

    let (open, close) = match bytes.first()? {
        b'{' => (b'{', b'}'),
        b'[' => (b'[', b']'),
        // Bare literal such as `null`; runs to the terminating `;`
        _ => return Some(rest[..rest.find(';')?].trim_end()),
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        if b == b'"' {
            in_string = true;
        } else if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(&rest[..=i]);
            }
        }
    }
    None
}

/// Decode the raw page text into a snapshot.
pub fn parse_page(text: &str) -> Result<OccupancySnapshot, ApiError> {
    let locations_raw = extract_assignment(text, LOCATIONS_MARKER);
    let validations_raw = extract_assignment(text, VALIDATIONS_MARKER);
    let (Some(locations_raw), Some(validations_raw)) = (locations_raw, validations_raw) else {
        return Err(ApiError::Parse(
            "failed to locate locations or live_validations in page".to_string(),
        ));
    };

    let locations = parse_locations(locations_raw)?;
    let live_validations = parse_live_validations(validations_raw)?;
    debug!(
        locations = locations.len(),
        live_validations = live_validations.len(),
        "page_parsed"
    );

    Ok(OccupancySnapshot { locations, live_validations })
}

fn parse_locations(raw: &str) -> Result<HashMap<u32, Location>, ApiError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ApiError::Parse(format!("locations is not valid JSON: {e}")))?;
    let Value::Object(entries) = value else {
        return Err(ApiError::Parse("locations is not a JSON object".to_string()));
    };

    let mut locations = HashMap::with_capacity(entries.len());
    for (key, value) in entries {
        let Ok(id) = key.parse::<u32>() else {
            warn!(key = %key, "skipping_location_with_non_numeric_id");
            continue;
        };
        // One bad record must not abort the refresh; the rest of the
        // locations stay available.
        match serde_json::from_value::<Location>(value) {
            Ok(location) => {
                locations.insert(id, location);
            }
            Err(e) => {
                warn!(location_id = id, error = %e, "skipping_malformed_location");
            }
        }
    }
    Ok(locations)
}

fn parse_live_validations(raw: &str) -> Result<HashMap<u32, u32>, ApiError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ApiError::Parse(format!("live_validations is not valid JSON: {e}")))?;
    let entries = match value {
        Value::Object(entries) => entries,
        // The upstream serializer renders an empty map as [] or null
        Value::Array(ref items) if items.is_empty() => return Ok(HashMap::new()),
        Value::Null => return Ok(HashMap::new()),
        _ => {
            return Err(ApiError::Parse(
                "live_validations is not a JSON object".to_string(),
            ))
        }
    };

    let mut counts = HashMap::with_capacity(entries.len());
    for (key, value) in entries {
        let (Ok(id), Some(count)) = (key.parse::<u32>(), value.as_u64()) else {
            warn!(key = %key, value = %value, "skipping_malformed_live_validation");
            continue;
        };
        counts.insert(id, count as u32);
    }
    Ok(counts)
}
