use regex::Regex;
use serde_json::Value;

/// Finds the JSON object in a model reply: the whole reply, a fenced ```json block, or the
/// outermost `{...}` span. `None` when nothing decodes to an object.
pub fn locate_json_object(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Some(value) = as_object(trimmed) {
        return Some(value);
    }

    if let Ok(fence) = Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```") {
        if let Some(value) = fence
            .captures(trimmed)
            .and_then(|c| c.get(1))
            .and_then(|m| as_object(m.as_str()))
        {
            return Some(value);
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    as_object(&trimmed[start..=end])
}

fn as_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

/// String field, trimmed; `None` if absent, not a string, or blank.
pub fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Numeric field; numbers encoded as strings (`"0.8"`) are accepted.
pub fn f32_field(value: &Value, key: &str) -> Option<f32> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Array of strings; non-string entries and blanks are dropped.
pub fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json() {
        let v = locate_json_object(r#" {"verdict": "True"} "#).expect("object");
        assert_eq!(str_field(&v, "verdict"), Some("True"));
    }

    #[test]
    fn fenced_json_with_chatter() {
        let raw = "Here you go:\n```json\n{\"confidence\": 0.7}\n```\nThanks";
        let v = locate_json_object(raw).expect("object");
        assert_eq!(f32_field(&v, "confidence"), Some(0.7));
    }

    #[test]
    fn embedded_braces() {
        let raw = "Result => {\"a\": {\"b\": 1}} done";
        let v = locate_json_object(raw).expect("object");
        assert_eq!(v["a"]["b"], 1);
    }

    #[test]
    fn garbage_and_non_objects_are_rejected() {
        assert!(locate_json_object("no json here").is_none());
        assert!(locate_json_object("[1, 2, 3]").is_none());
        assert!(locate_json_object("} {").is_none());
    }

    #[test]
    fn string_encoded_numbers_are_accepted() {
        let v = locate_json_object(r#"{"confidence": "0.25"}"#).expect("object");
        assert_eq!(f32_field(&v, "confidence"), Some(0.25));
    }
}
