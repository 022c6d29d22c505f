// Payload collection config generation.
//
// Emits a TypeScript module declaring one `CollectionConfig` per auth model,
// ready to be spread into a Payload config's `collections` array.

use std::collections::HashSet;

use serde_json::Value;

use better_auth_core::db::adapter::SchemaFile;
use better_auth_core::db::schema::{AuthSchema, AuthTable, FieldType, SchemaField};

use crate::naming::NameResolver;

/// Default file the schema is written to.
pub const DEFAULT_SCHEMA_PATH: &str = "schema.ts";

/// Fields tried, in order, for the admin UI title.
const TITLE_CANDIDATES: [&str; 4] = ["email", "name", "identifier", "token"];

/// Generate the collection configs for every model of `schema`.
pub fn generate_schema(schema: &AuthSchema, resolver: &NameResolver) -> String {
    let mut code = String::from("import type { CollectionConfig } from \"payload\";\n");
    let mut exports = Vec::new();
    let mut taken = HashSet::new();

    for table in schema.ordered_tables() {
        let ident = unique_ident(collection_ident(slug_of(resolver, &table.model)), &mut taken);
        code.push('\n');
        code.push_str(&collection(table, &ident, resolver));
        exports.push(ident);
    }

    code.push_str(&format!(
        "\nexport const authCollections: CollectionConfig[] = [{}];\n",
        exports.join(", ")
    ));
    code
}

/// The generated schema as a file replacing any existing one.
pub fn schema_file(schema: &AuthSchema, resolver: &NameResolver, file: Option<&str>) -> SchemaFile {
    SchemaFile {
        path: file.unwrap_or(DEFAULT_SCHEMA_PATH).to_string(),
        code: generate_schema(schema, resolver),
        append: false,
        overwrite: true,
    }
}

fn slug_of<'a>(resolver: &'a NameResolver, model: &'a str) -> &'a str {
    resolver.collection_slug(model).unwrap_or(model)
}

fn collection(table: &AuthTable, ident: &str, resolver: &NameResolver) -> String {
    let model = table.model.as_str();
    let fields: Vec<(String, &SchemaField)> = table
        .sorted_fields()
        .into_iter()
        .filter(|(key, field)| key.as_str() != "id" && !field.is_automatic_timestamp())
        .map(|(key, field)| (resolver.field_name(model, key), field))
        .collect();

    let title = TITLE_CANDIDATES
        .iter()
        .find(|candidate| fields.iter().any(|(name, _)| name.as_str() == **candidate))
        .copied()
        .unwrap_or("id");

    let mut out = format!("export const {ident}: CollectionConfig = {{\n");
    out.push_str(&format!("  slug: {},\n", quote(slug_of(resolver, model))));
    out.push_str(&format!("  admin: {{\n    useAsTitle: {},\n  }},\n", quote(title)));
    out.push_str("  fields: [\n");
    for (name, field) in &fields {
        out.push_str(&field_config(name, field, resolver));
    }
    out.push_str("  ],\n");
    out.push_str("  timestamps: true,\n");
    out.push_str("};\n");
    out
}

fn field_config(name: &str, field: &SchemaField, resolver: &NameResolver) -> String {
    let mut props = vec![format!("name: {}", quote(name))];

    match &field.references {
        Some(reference) => {
            props.push("type: \"relationship\"".to_string());
            props.push(format!(
                "relationTo: {}",
                quote(slug_of(resolver, &reference.model))
            ));
        }
        None => {
            let (kind, has_many) = payload_type(field.field_type);
            props.push(format!("type: {}", quote(kind)));
            if has_many {
                props.push("hasMany: true".to_string());
            }
        }
    }

    if field.required {
        props.push("required: true".to_string());
    }
    if field.unique {
        props.push("unique: true".to_string());
    }
    if field.index {
        props.push("index: true".to_string());
    }
    if let Some(default) = &field.default_value {
        props.push(format!("defaultValue: {default}"));
    }
    // Payload's top-level `hidden` strips the field from API responses,
    // including the adapter's own reads.
    if !field.returned {
        props.push("admin: { hidden: true }".to_string());
    }

    let mut out = String::from("    {\n");
    for prop in props {
        out.push_str(&format!("      {prop},\n"));
    }
    out.push_str("    },\n");
    out
}

/// Payload field type for a schema type, and whether it holds many values.
fn payload_type(field_type: FieldType) -> (&'static str, bool) {
    match field_type {
        FieldType::String => ("text", false),
        FieldType::Number => ("number", false),
        FieldType::Boolean => ("checkbox", false),
        FieldType::Date => ("date", false),
        FieldType::StringArray => ("text", true),
        FieldType::NumberArray => ("number", true),
        FieldType::Json => ("json", false),
    }
}

/// TypeScript identifier for a collection slug (`org-members` → `OrgMembers`).
fn collection_ident(slug: &str) -> String {
    let ident: String = slug
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    match ident.chars().next() {
        None => "Collection".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{ident}"),
        Some(_) => ident,
    }
}

/// `ident`, suffixed with the first free number when already taken.
fn unique_ident(ident: String, taken: &mut HashSet<String>) -> String {
    let mut candidate = ident.clone();
    let mut n = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{ident}{n}");
        n += 1;
    }
    candidate
}

/// A double-quoted string literal.
fn quote(s: &str) -> String {
    Value::from(s).to_string()
}
