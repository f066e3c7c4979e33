//! Reduce an engine response to its primary translated text.

use crate::engine::EngineOutput;
use serde_json::{Map, Value};

/// Field holding the translated text in engine records.
pub const TRANSLATION_FIELD: &str = "translation_text";

/// Extract the translated string from any response shape.
///
/// - `Records`: the first record (an empty list yields an empty string)
/// - `Record`: the `translation_text` field, or the JSON rendering of the record
///   when that field is missing or not a string
/// - `Text`: unchanged
pub fn normalize(output: EngineOutput) -> String {
    match output {
        EngineOutput::Text(text) => text,
        EngineOutput::Record(record) => from_record(record),
        EngineOutput::Records(records) => records
            .into_iter()
            .next()
            .map(from_record)
            .unwrap_or_default(),
    }
}

fn from_record(mut record: Map<String, Value>) -> String {
    match record.remove(TRANSLATION_FIELD) {
        Some(Value::String(text)) => text,
        Some(other) => {
            record.insert(TRANSLATION_FIELD.to_string(), other);
            Value::Object(record).to_string()
        }
        None => Value::Object(record).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_all_shapes_yield_same_text() {
        let shapes = vec![
            EngineOutput::Text("Bonjour".to_string()),
            EngineOutput::Record(record(json!({"translation_text": "Bonjour"}))),
            EngineOutput::Records(vec![record(json!({"translation_text": "Bonjour"}))]),
        ];

        for shape in shapes {
            assert_eq!(normalize(shape), "Bonjour");
        }
    }

    #[test]
    fn test_records_takes_first_candidate() {
        let output = EngineOutput::Records(vec![
            record(json!({"translation_text": "Bonjour"})),
            record(json!({"translation_text": "Salut"})),
        ]);
        assert_eq!(normalize(output), "Bonjour");
    }

    #[test]
    fn test_empty_records_is_empty_string() {
        assert_eq!(normalize(EngineOutput::Records(vec![])), "");
    }

    #[test]
    fn test_record_without_field_renders_record() {
        let output = EngineOutput::Record(record(json!({"generated_text": "Hola"})));
        let text = normalize(output);
        assert!(text.contains("generated_text"));
        assert!(text.contains("Hola"));
    }

    #[test]
    fn test_record_with_non_string_field_renders_record() {
        let output = EngineOutput::Record(record(json!({"translation_text": ["a", "b"]})));
        let text = normalize(output);
        assert!(text.contains("translation_text"));
    }
}
