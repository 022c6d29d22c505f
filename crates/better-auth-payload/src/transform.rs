// Record transformation between better-auth's shape and Payload documents.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Value};

use better_auth_core::db::schema::FieldType;

use crate::naming::NameResolver;

/// Which write the input is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Create,
    Update,
}

/// better-auth record → Payload document data.
///
/// Renames fields, turns epoch-millisecond dates into RFC 3339 strings, and
/// coerces ids to the collection's id type. `id` is dropped on create unless
/// ids are preserved. Non-object input is returned unchanged.
pub fn transform_input(
    resolver: &NameResolver,
    model: &str,
    data: Value,
    action: InputAction,
) -> Value {
    let obj = match data {
        Value::Object(obj) => obj,
        other => return other,
    };

    let mut out = Map::with_capacity(obj.len());
    for (key, value) in obj {
        if key == "id" {
            if action == InputAction::Create && !resolver.preserve_ids() {
                continue;
            }
            out.insert(key, resolver.id_type().coerce(value));
            continue;
        }

        let field = resolver.field(model, &key);
        let value = match field {
            Some(f) if f.references.is_some() => resolver.id_type().coerce(value),
            Some(f) if f.field_type == FieldType::Date => date_input(value),
            _ => value,
        };
        out.insert(resolver.field_name(model, &key), value);
    }
    Value::Object(out)
}

/// Payload document → better-auth record.
///
/// Inverse field rename, populated relationships collapsed to their id, dates
/// normalized to RFC 3339 UTC, and `id` guaranteed present in the configured
/// id type. `None` and `null` propagate as `None`.
pub fn transform_output(resolver: &NameResolver, model: &str, doc: Option<Value>) -> Option<Value> {
    let obj = match doc? {
        Value::Object(obj) => obj,
        Value::Null => return None,
        other => return Some(other),
    };

    let mut out = Map::with_capacity(obj.len());
    let mut fallback_id = None;
    for (key, value) in obj {
        if key == "_id" {
            fallback_id = Some(value);
            continue;
        }
        if key == "id" {
            out.insert(key, resolver.id_type().coerce(value));
            continue;
        }

        let logical = resolver.logical_field_name(model, &key);
        let value = match resolver.field(model, &logical) {
            Some(f) if f.references.is_some() => {
                resolver.id_type().coerce(collapse_relationship(value))
            }
            Some(f) if f.field_type == FieldType::Date => date_output(value),
            _ => value,
        };
        out.insert(logical, value);
    }

    if !out.contains_key("id") {
        if let Some(id) = fallback_id {
            out.insert("id".to_string(), resolver.id_type().coerce(id));
        }
    }
    Some(Value::Object(out))
}

/// A populated relationship (`{ id, ... }`) becomes its id.
fn collapse_relationship(value: Value) -> Value {
    match value {
        Value::Object(mut obj) => obj.remove("id").unwrap_or(Value::Null),
        other => other,
    }
}

fn date_input(value: Value) -> Value {
    match value.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()) {
        Some(dt) => Value::String(format_date(dt)),
        None => value,
    }
}

fn date_output(value: Value) -> Value {
    match value.as_str().and_then(|s| DateTime::parse_from_rfc3339(s).ok()) {
        Some(dt) => Value::String(format_date(dt.with_timezone(&Utc))),
        None => value,
    }
}

fn format_date(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
