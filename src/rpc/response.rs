//! Aura response decoding
//!
//! A response is a JSON document whose `actions[].returnValue.returnValue`
//! field is itself a JSON string; inside it, the procedure's results live
//! under the `IPResult` key. Decoding stops at a success flag and a result
//! list - the payload structure beyond that is not modeled.

use crate::{HarvestError, Result};
use serde_json::Value;

/// One provider row from a listing page
#[derive(Debug, Clone)]
pub struct ProviderRecord {
    /// Unique key, used as the dedup cache key
    pub provider_id: String,
    pub display_name: String,
    /// Untouched search-result fields
    pub raw: Value,
}

/// Decoded payload of one listing page
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub total_records: u64,
    pub records: Vec<ProviderRecord>,
    /// The full IPResult document, persisted as the raw artifact
    pub raw: Value,
}

impl ListingPage {
    /// Interprets an IPResult document as a listing page
    pub fn from_ip_result(value: Value) -> Self {
        let total_records = value
            .get("totalRecords")
            .and_then(Value::as_u64)
            .unwrap_or(0);

        let records = value
            .get("providerList")
            .and_then(Value::as_array)
            .map(|rows| rows.iter().filter_map(provider_from_row).collect())
            .unwrap_or_default();

        Self {
            total_records,
            records,
            raw: value,
        }
    }
}

fn provider_from_row(row: &Value) -> Option<ProviderRecord> {
    let provider_id = match row.get("ProviderId") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return None,
    };

    let display_name = row
        .get("providerFullName")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    Some(ProviderRecord {
        provider_id,
        display_name,
        raw: row.clone(),
    })
}

/// Extracts the IPResult payload from a raw response body
///
/// Walks `actions[]`, skipping entries that are not in the SUCCESS state,
/// and decodes the double-encoded return value of the first one that is.
///
/// # Returns
///
/// * `Ok(Value)` - The non-empty IPResult document
/// * `Err(HarvestError::Decode)` - Unexpected shape, no successful action,
///   or an empty result
pub fn decode_ip_result(body: &str) -> Result<Value> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| HarvestError::Decode(format!("response is not JSON: {}", e)))?;

    let actions = document
        .get("actions")
        .and_then(Value::as_array)
        .ok_or_else(|| HarvestError::Decode("no actions array in response".to_string()))?;

    for action in actions {
        if action.get("state").and_then(Value::as_str) != Some("SUCCESS") {
            continue;
        }

        let inner = match action
            .get("returnValue")
            .and_then(|rv| rv.get("returnValue"))
            .and_then(Value::as_str)
        {
            Some(inner) => inner,
            None => continue,
        };

        let payload: Value = serde_json::from_str(inner).map_err(|e| {
            HarvestError::Decode(format!("nested return value is not JSON: {}", e))
        })?;

        if let Some(result) = payload.get("IPResult") {
            if is_non_empty(result) {
                return Ok(result.clone());
            }
        }
    }

    Err(HarvestError::Decode(
        "no successful action carried an IPResult".to_string(),
    ))
}

/// Empty objects, empty arrays, and null all count as "no result"
fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Builds a response body the way the target wraps payloads
    fn wrap_payload(state: &str, payload: &Value) -> String {
        json!({
            "actions": [{
                "state": state,
                "returnValue": {
                    "returnValue": serde_json::to_string(&json!({ "IPResult": payload })).unwrap(),
                }
            }]
        })
        .to_string()
    }

    #[test]
    fn test_decode_successful_listing() {
        let payload = json!({
            "totalRecords": 120,
            "providerList": [
                { "ProviderId": "PRV-1", "providerFullName": "Dr. One" },
                { "ProviderId": 42, "providerFullName": "Dr. Two" },
            ]
        });

        let result = decode_ip_result(&wrap_payload("SUCCESS", &payload)).unwrap();
        let page = ListingPage::from_ip_result(result);

        assert_eq!(page.total_records, 120);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].provider_id, "PRV-1");
        assert_eq!(page.records[0].display_name, "Dr. One");
        assert_eq!(page.records[1].provider_id, "42");
    }

    #[test]
    fn test_decode_skips_failed_actions() {
        let body = wrap_payload("ERROR", &json!({ "totalRecords": 1 }));
        assert!(decode_ip_result(&body).is_err());
    }

    #[test]
    fn test_decode_rejects_empty_result() {
        let body = wrap_payload("SUCCESS", &json!({}));
        assert!(decode_ip_result(&body).is_err());
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(decode_ip_result("<html>Access Denied</html>").is_err());
    }

    #[test]
    fn test_decode_rejects_missing_actions() {
        assert!(decode_ip_result("{\"events\":[]}").is_err());
    }

    #[test]
    fn test_zero_records_page_still_decodes() {
        let payload = json!({ "totalRecords": 0, "providerList": [] });
        let result = decode_ip_result(&wrap_payload("SUCCESS", &payload)).unwrap();
        let page = ListingPage::from_ip_result(result);

        assert_eq!(page.total_records, 0);
        assert!(page.records.is_empty());
    }

    #[test]
    fn test_rows_without_provider_id_are_dropped() {
        let payload = json!({
            "totalRecords": 2,
            "providerList": [
                { "providerFullName": "No Id" },
                { "ProviderId": "PRV-2", "providerFullName": "Has Id" },
            ]
        });

        let page = ListingPage::from_ip_result(
            decode_ip_result(&wrap_payload("SUCCESS", &payload)).unwrap(),
        );
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].provider_id, "PRV-2");
    }
}
