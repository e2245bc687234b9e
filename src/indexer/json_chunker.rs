//! Record-structured chunking for JSON documents

use serde_json::{Map, Value};

/// Keys per chunk for objects; only array grouping is configurable
pub const OBJECT_GROUP_SIZE: usize = 5;

/// Split a parsed JSON document into pretty-printed chunks
///
/// Objects with at most [`OBJECT_GROUP_SIZE`] keys, and any scalar, become
/// exactly one chunk. Larger objects are split into consecutive groups of
/// that many keys in file order. Arrays are grouped the same way by element
/// count, using `array_group_size`.
pub fn chunk_json_value(value: &Value, array_group_size: usize) -> Vec<String> {
    let array_group_size = array_group_size.max(1);

    match value {
        Value::Object(map) if map.len() > OBJECT_GROUP_SIZE => {
            let entries: Vec<(&String, &Value)> = map.iter().collect();
            entries
                .chunks(OBJECT_GROUP_SIZE)
                .map(|group| {
                    let sub: Map<String, Value> = group
                        .iter()
                        .map(|(k, v)| ((*k).clone(), (*v).clone()))
                        .collect();
                    pretty(&Value::Object(sub))
                })
                .collect()
        }
        Value::Array(items) if items.len() > array_group_size => items
            .chunks(array_group_size)
            .map(|group| pretty(&Value::Array(group.to_vec())))
            .collect(),
        other => vec![pretty(other)],
    }
}

fn pretty(value: &Value) -> String {
    // Serializing a Value cannot fail: all map keys are strings
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object_with_keys(n: usize) -> Value {
        let mut map = Map::new();
        for i in 0..n {
            map.insert(format!("key{:02}", i), json!(i));
        }
        Value::Object(map)
    }

    #[test]
    fn test_small_object_is_one_chunk() {
        let value = object_with_keys(5);
        let chunks = chunk_json_value(&value, 5);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].starts_with("{\n  \"key00\": 0,"));
    }

    #[test]
    fn test_twelve_keys_split_five_five_two() {
        let value = object_with_keys(12);
        let chunks = chunk_json_value(&value, 5);
        assert_eq!(chunks.len(), 3);

        let parsed: Vec<Map<String, Value>> = chunks
            .iter()
            .map(|c| serde_json::from_str::<Value>(c).unwrap())
            .map(|v| v.as_object().unwrap().clone())
            .collect();

        assert_eq!(parsed[0].len(), 5);
        assert_eq!(parsed[1].len(), 5);
        assert_eq!(parsed[2].len(), 2);

        let first_keys: Vec<&String> = parsed[0].keys().collect();
        assert_eq!(first_keys, vec!["key00", "key01", "key02", "key03", "key04"]);
        let last_keys: Vec<&String> = parsed[2].keys().collect();
        assert_eq!(last_keys, vec!["key10", "key11"]);
    }

    #[test]
    fn test_key_order_follows_file_order() {
        let value: Value =
            serde_json::from_str(r#"{"z": 1, "a": 2, "m": 3, "b": 4, "y": 5, "c": 6}"#).unwrap();
        let chunks = chunk_json_value(&value, 5);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].find("\"z\"").unwrap() < chunks[0].find("\"a\"").unwrap());
        assert!(chunks[1].contains("\"c\": 6"));
    }

    #[test]
    fn test_array_grouping() {
        let value = json!([1, 2, 3, 4, 5, 6, 7]);
        let chunks = chunk_json_value(&value, 5);
        assert_eq!(chunks.len(), 2);
        assert_eq!(
            serde_json::from_str::<Value>(&chunks[1]).unwrap(),
            json!([6, 7])
        );
    }

    #[test]
    fn test_custom_group_size() {
        let value = json!(["a", "b", "c", "d"]);
        assert_eq!(chunk_json_value(&value, 2).len(), 2);
        assert_eq!(chunk_json_value(&value, 10).len(), 1);
    }

    #[test]
    fn test_object_grouping_ignores_array_group_size() {
        let chunks = chunk_json_value(&object_with_keys(12), 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunk_json_value(&object_with_keys(6), 1).len(), 2);
    }

    #[test]
    fn test_empty_containers_are_one_chunk() {
        assert_eq!(chunk_json_value(&json!([]), 5), vec!["[]"]);
        assert_eq!(chunk_json_value(&json!({}), 5), vec!["{}"]);
    }

    #[test]
    fn test_scalar_is_one_chunk() {
        assert_eq!(chunk_json_value(&json!("hello"), 5), vec!["\"hello\""]);
        assert_eq!(chunk_json_value(&json!(42), 5), vec!["42"]);
        assert_eq!(chunk_json_value(&json!(null), 5), vec!["null"]);
    }

    #[test]
    fn test_zero_group_size_is_clamped() {
        let value = json!([1, 2]);
        assert_eq!(chunk_json_value(&value, 0).len(), 2);
    }
}
