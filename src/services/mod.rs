pub mod addresses;
pub mod carts;
pub mod categories;
pub mod coupons;
pub mod homepage;
pub mod offline_orders;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;

use sea_orm::JsonValue;
use serde_json::json;
use uuid::Uuid;

/// Reads a JSON array column into a string vector; anything malformed
/// collapses to empty.
pub(crate) fn json_strings(value: &JsonValue) -> Vec<String> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Reads a JSON array column into a uuid vector.
pub(crate) fn json_uuids(value: &JsonValue) -> Vec<Uuid> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

pub(crate) fn strings_json(values: &[String]) -> JsonValue {
    json!(values)
}

pub(crate) fn uuids_json(values: &[Uuid]) -> JsonValue {
    json!(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_vec_round_trips() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        assert_eq!(json_uuids(&uuids_json(&ids)), ids);

        let tags = vec!["organic".to_string(), "herbal".to_string()];
        assert_eq!(json_strings(&strings_json(&tags)), tags);
    }

    #[test]
    fn malformed_json_collapses_to_empty() {
        assert!(json_strings(&json!({"not": "an array"})).is_empty());
        assert!(json_uuids(&json!(["not-a-uuid"])).is_empty());
    }
}
