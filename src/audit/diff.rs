//! Diff generation for audit logging

use serde_json::Value;

/// Fields that change on every write and would only add noise
const IGNORED_FIELDS: &[&str] = &["updated_at"];

/// Generate a human-readable diff between two JSON values
///
/// Only top-level fields are compared. Returns `None` when nothing relevant
/// changed.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            let mut changes = Vec::new();

            for (key, before_val) in before_obj {
                if IGNORED_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                match after_obj.get(key) {
                    Some(after_val) if after_val != before_val => changes.push(format!(
                        "{}: {} -> {}",
                        key,
                        format_value(before_val),
                        format_value(after_val)
                    )),
                    Some(_) => {}
                    None => changes.push(format!(
                        "{}: {} -> (removed)",
                        key,
                        format_value(before_val)
                    )),
                }
            }

            for (key, after_val) in after_obj {
                if !before_obj.contains_key(key) && !IGNORED_FIELDS.contains(&key.as_str()) {
                    changes.push(format!("{}: (added) -> {}", key, format_value(after_val)));
                }
            }

            if changes.is_empty() {
                None
            } else {
                Some(changes.join(", "))
            }
        }
        _ if before != after => Some(format!(
            "{} -> {}",
            format_value(before),
            format_value(after)
        )),
        _ => None,
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            // Count chars, descriptions are often accented
            if s.chars().count() > 50 {
                let head: String = s.chars().take(47).collect();
                format!("\"{}...\"", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_changes() {
        let value = json!({"amount": 1500});
        assert_eq!(generate_diff(&value, &value), None);
    }

    #[test]
    fn test_updated_at_ignored() {
        let before = json!({"amount": 1500, "updated_at": "2025-01-01T00:00:00Z"});
        let after = json!({"amount": 1500, "updated_at": "2025-01-02T00:00:00Z"});
        assert_eq!(generate_diff(&before, &after), None);
    }

    #[test]
    fn test_field_changes() {
        let before = json!({"category": "Food", "recurring": false});
        let after = json!({"category": "Home", "notes": "rent"});

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("category: \"Food\" -> \"Home\""));
        assert!(diff.contains("recurring: false -> (removed)"));
        assert!(diff.contains("notes: (added) -> \"rent\""));
    }

    #[test]
    fn test_long_accented_string_truncated() {
        let long = "ação ".repeat(20);
        let formatted = format_value(&json!(long));
        assert!(formatted.ends_with("...\""));
    }
}
