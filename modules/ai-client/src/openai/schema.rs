use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Types that can be requested as OpenAI strict structured output.
///
/// Blanket-implemented for anything that is `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// OpenAI-compatible JSON schema for this type.
    ///
    /// Strict mode requires every object to carry `additionalProperties: false`,
    /// every property to be listed in `required` (nullable ones included), and
    /// no `$ref` indirection. Numeric `format` hints such as `uint32` are
    /// rejected by the endpoint, so they are dropped.
    fn openai_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        let definitions = match &mut value {
            Value::Object(map) => {
                map.remove("$schema");
                map.remove("definitions")
            }
            _ => None,
        };

        if let Some(Value::Object(defs)) = definitions {
            inline_refs(&mut value, &defs);
        }
        tighten(&mut value);

        value
    }

    /// Schema name accepted by the `json_schema.name` field (`[A-Za-z0-9_-]`, max 64).
    fn schema_label() -> String {
        let label: String = <Self as JsonSchema>::schema_name()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .take(64)
            .collect();
        if label.is_empty() {
            "structured_response".to_string()
        } else {
            label
        }
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn inline_refs(value: &mut Value, definitions: &Map<String, Value>) {
    match value {
        Value::Object(map) => {
            let target = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix("#/definitions/"))
                .and_then(|name| definitions.get(name))
                .cloned();
            if let Some(def) = target {
                *value = def;
                inline_refs(value, definitions);
                return;
            }

            // schemars wraps documented field refs as `allOf: [{$ref}]`
            let single_all_of = match map.get("allOf") {
                Some(Value::Array(items)) if items.len() == 1 => Some(items[0].clone()),
                _ => None,
            };
            if let Some(inner) = single_all_of {
                map.remove("allOf");
                if let Value::Object(inner_map) = inner {
                    for (k, v) in inner_map {
                        map.entry(k).or_insert(v);
                    }
                }
                inline_refs(value, definitions);
                return;
            }

            for v in map.values_mut() {
                inline_refs(v, definitions);
            }
        }
        Value::Array(items) => {
            for item in items {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}

fn tighten(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if is_type(map, "object") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
                let keys: Option<Vec<Value>> = match map.get("properties") {
                    Some(Value::Object(props)) => {
                        Some(props.keys().cloned().map(Value::String).collect())
                    }
                    _ => None,
                };
                if let Some(keys) = keys {
                    map.insert("required".to_string(), Value::Array(keys));
                }
            }

            if is_type(map, "integer") || is_type(map, "number") {
                map.remove("format");
            }

            for v in map.values_mut() {
                tighten(v);
            }
        }
        Value::Array(items) => {
            for item in items {
                tighten(item);
            }
        }
        _ => {}
    }
}

/// `type` may be a string or a `[type, "null"]` pair for optional fields.
fn is_type(map: &Map<String, Value>, wanted: &str) -> bool {
    match map.get("type") {
        Some(Value::String(t)) => t == wanted,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(wanted)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct Mention {
        topic: String,
        count: u32,
        note: Option<String>,
    }

    #[derive(Deserialize, JsonSchema)]
    struct Report {
        /// Mentions grouped by topic.
        mentions: Vec<Mention>,
        primary: Mention,
        score: f64,
    }

    #[test]
    fn top_level_is_strict_object() {
        let schema = Report::openai_schema();
        let obj = schema.as_object().unwrap();
        assert_eq!(obj.get("additionalProperties"), Some(&Value::Bool(false)));
        assert!(!obj.contains_key("definitions"));
        assert!(!obj.contains_key("$schema"));
    }

    #[test]
    fn optional_fields_are_required() {
        let schema = Mention::openai_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(required.contains(&"topic"));
        assert!(required.contains(&"count"));
        assert!(required.contains(&"note"));
    }

    #[test]
    fn nested_refs_are_inlined() {
        let schema = Report::openai_schema();
        let rendered = serde_json::to_string(&schema).unwrap();
        assert!(!rendered.contains("$ref"));
        assert!(!rendered.contains("allOf"));

        let primary = &schema["properties"]["primary"];
        assert_eq!(primary["type"], "object");
        assert_eq!(primary["additionalProperties"], Value::Bool(false));

        let item = &schema["properties"]["mentions"]["items"];
        assert_eq!(item["type"], "object");
    }

    #[test]
    fn integer_formats_are_dropped() {
        let schema = Mention::openai_schema();
        assert!(schema["properties"]["count"].get("format").is_none());
    }

    #[test]
    fn schema_label_is_endpoint_safe() {
        assert_eq!(Report::schema_label(), "Report");
        assert_eq!(<Vec<Mention>>::schema_label(), "Array_of_Mention");
    }
}
