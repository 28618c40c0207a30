use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Types usable as OpenAI strict structured output.
///
/// Blanket-implemented for anything `JsonSchema + DeserializeOwned`. Strict
/// mode requires `additionalProperties: false` on every object, every
/// property listed in `required` (nullable or not), and no `$ref`s.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    fn openai_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        let definitions = value.get("definitions").cloned();
        if let Some(defs) = definitions {
            inline_refs(&mut value, &defs);
        }
        close_objects(&mut value);

        if let Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
        }

        value
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn close_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));

                let keys: Option<Vec<Value>> = map
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| props.keys().cloned().map(Value::String).collect());
                if let Some(keys) = keys {
                    map.insert("required".to_string(), Value::Array(keys));
                }
            }

            for (_, v) in map.iter_mut() {
                close_objects(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(close_objects),
        _ => {}
    }
}

fn inline_refs(value: &mut Value, definitions: &Value) {
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

            // schemars wraps a single referenced type in `allOf: [{$ref}]`
            let single = match map.get("allOf") {
                Some(Value::Array(all_of)) if all_of.len() == 1 => all_of.first().cloned(),
                _ => None,
            };
            if let Some(inner) = single {
                *value = inner;
                inline_refs(value, definitions);
                return;
            }

            for (_, v) in map.iter_mut() {
                inline_refs(v, definitions);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct LinkList {
        urls: Vec<String>,
    }

    #[test]
    fn test_schema_is_closed_object() {
        let schema = LinkList::openai_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], Value::Bool(false));
        assert_eq!(schema["properties"]["urls"]["type"], "array");
        assert!(schema.get("$schema").is_none());
    }

    #[test]
    fn test_all_properties_required() {
        #[derive(Deserialize, JsonSchema)]
        struct Page {
            title: Option<String>,
            canonical: Option<String>,
            body: String,
        }

        let schema = Page::openai_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .expect("should have required array")
            .iter()
            .filter_map(Value::as_str)
            .collect();

        assert!(required.contains(&"title"));
        assert!(required.contains(&"canonical"));
        assert!(required.contains(&"body"));
    }

    #[test]
    fn test_nested_struct_inlined() {
        #[derive(Deserialize, JsonSchema)]
        struct Anchor {
            href: String,
            text: Option<String>,
        }

        #[derive(Deserialize, JsonSchema)]
        struct Extracted {
            primary: Anchor,
            others: Vec<Anchor>,
        }

        let schema = Extracted::openai_schema();
        let obj = schema.as_object().unwrap();
        assert!(!obj.contains_key("definitions"));

        let primary = &schema["properties"]["primary"];
        assert!(primary.get("$ref").is_none());
        assert_eq!(primary["type"], "object");
        assert_eq!(primary["additionalProperties"], Value::Bool(false));

        let item = &schema["properties"]["others"]["items"];
        assert_eq!(item["type"], "object");
        assert_eq!(item["additionalProperties"], Value::Bool(false));
    }
}
