// Model and field name resolution.
//
// better-auth addresses models and fields by canonical names ("user",
// "emailVerified", "userId"). Payload collections may be renamed, pluralized,
// and declare foreign keys as relationship fields ("user"). The resolver
// captures every mapping once, from the auth schema and adapter config, so
// request handling only does table lookups.

use std::collections::HashMap;

use better_auth_core::db::schema::{AuthSchema, FieldType};

use crate::config::PayloadAdapterConfig;
use crate::id::IdType;

/// Resolved information about one logical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    /// Field name in the Payload collection.
    pub name: String,
    pub field_type: FieldType,
    /// Model the field references, for relationship fields.
    pub references: Option<String>,
}

#[derive(Debug, Clone)]
struct ResolvedModel {
    slug: String,
    fields: HashMap<String, ResolvedField>,
    /// Payload field name → logical field name.
    logical: HashMap<String, String>,
}

/// Immutable model/field name lookup built at adapter construction.
#[derive(Debug, Clone)]
pub struct NameResolver {
    models: HashMap<String, ResolvedModel>,
    /// Collection slug → model, so already-resolved slugs are accepted too.
    slugs: HashMap<String, String>,
    id_type: IdType,
    preserve_ids: bool,
}

impl NameResolver {
    pub fn new(schema: &AuthSchema, config: &PayloadAdapterConfig) -> Self {
        let mut models = HashMap::new();
        let mut slugs = HashMap::new();

        for (model, table) in &schema.tables {
            let slug = if table.name != table.model {
                table.name.clone()
            } else if config.use_plural {
                pluralize(&table.name)
            } else {
                table.name.clone()
            };

            let mut fields = HashMap::new();
            let mut logical = HashMap::new();
            for (key, field) in &table.fields {
                let references = field.references.as_ref().map(|r| r.model.clone());
                let name = match (&field.field_name, &references) {
                    (Some(custom), _) => custom.clone(),
                    (None, Some(_)) => relationship_field_name(key),
                    (None, None) => key.clone(),
                };
                logical.insert(name.clone(), key.clone());
                fields.insert(
                    key.clone(),
                    ResolvedField {
                        name,
                        field_type: field.field_type,
                        references,
                    },
                );
            }

            slugs.insert(slug.clone(), model.clone());
            models.insert(
                model.clone(),
                ResolvedModel {
                    slug,
                    fields,
                    logical,
                },
            );
        }

        Self {
            models,
            slugs,
            id_type: config.id_type,
            preserve_ids: config.preserve_ids,
        }
    }

    /// Canonical model name for a model or an already-resolved slug.
    pub fn model_name<'a>(&'a self, model: &'a str) -> Option<&'a str> {
        if self.models.contains_key(model) {
            Some(model)
        } else {
            self.slugs.get(model).map(String::as_str)
        }
    }

    /// Collection slug for a model. `None` when the model is unmapped.
    pub fn collection_slug(&self, model: &str) -> Option<&str> {
        let model = self.model_name(model)?;
        self.models.get(model).map(|m| m.slug.as_str())
    }

    /// Payload field name for a logical field. Unknown fields map to themselves.
    pub fn field_name(&self, model: &str, field: &str) -> String {
        self.field(model, field)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| field.to_string())
    }

    /// Logical field name for a Payload field name. Unknown fields map to themselves.
    pub fn logical_field_name(&self, model: &str, field: &str) -> String {
        self.model_name(model)
            .and_then(|m| self.models.get(m))
            .and_then(|m| m.logical.get(field))
            .cloned()
            .unwrap_or_else(|| field.to_string())
    }

    /// Resolved definition of a logical field.
    pub fn field(&self, model: &str, field: &str) -> Option<&ResolvedField> {
        let model = self.model_name(model)?;
        self.models.get(model)?.fields.get(field)
    }

    /// Whether the logical field holds a document id (`id` or a relationship).
    pub fn is_id_field(&self, model: &str, field: &str) -> bool {
        field == "id"
            || self
                .field(model, field)
                .is_some_and(|f| f.references.is_some())
    }

    pub fn id_type(&self) -> IdType {
        self.id_type
    }

    pub fn preserve_ids(&self) -> bool {
        self.preserve_ids
    }

    /// All resolved (model, slug) pairs.
    pub fn collections(&self) -> impl Iterator<Item = (&str, &str)> {
        self.models
            .iter()
            .map(|(model, resolved)| (model.as_str(), resolved.slug.as_str()))
    }
}

/// Relationship field name for a foreign key (`userId` → `user`).
pub fn relationship_field_name(field: &str) -> String {
    match field.strip_suffix("Id") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => field.to_string(),
    }
}

/// Pluralize a model name.
pub fn pluralize(name: &str) -> String {
    if name.ends_with('s') || name.ends_with("sh") || name.ends_with("ch") || name.ends_with('x') {
        format!("{name}es")
    } else if name.ends_with('y')
        && !name.ends_with("ay")
        && !name.ends_with("ey")
        && !name.ends_with("oy")
        && !name.ends_with("uy")
    {
        format!("{}ies", &name[..name.len() - 1])
    } else {
        format!("{name}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use better_auth_core::db::schema::{AuthTable, SchemaField};

    fn resolver(use_plural: bool) -> NameResolver {
        let schema = AuthSchema::core_schema().table(
            AuthTable::new("member")
                .with_name("org-members")
                .field("organizationId", SchemaField::required_string().with_reference("organization", "id"))
                .field("role", SchemaField::required_string().with_field_name("memberRole")),
        );
        NameResolver::new(
            &schema,
            &PayloadAdapterConfig {
                use_plural,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_collection_slug() {
        let r = resolver(false);
        assert_eq!(r.collection_slug("user"), Some("user"));
        assert_eq!(r.collection_slug("member"), Some("org-members"));
        assert_eq!(r.collection_slug("unknown"), None);
    }

    #[test]
    fn test_collection_slug_plural() {
        let r = resolver(true);
        assert_eq!(r.collection_slug("user"), Some("users"));
        assert_eq!(r.collection_slug("verification"), Some("verifications"));
        // Explicit renames are not pluralized
        assert_eq!(r.collection_slug("member"), Some("org-members"));
        // Already-resolved slugs resolve to themselves
        assert_eq!(r.collection_slug("users"), Some("users"));
    }

    #[test]
    fn test_field_names() {
        let r = resolver(false);
        assert_eq!(r.field_name("session", "userId"), "user");
        assert_eq!(r.field_name("member", "role"), "memberRole");
        assert_eq!(r.field_name("member", "organizationId"), "organization");
        assert_eq!(r.field_name("user", "email"), "email");
        assert_eq!(r.field_name("user", "nickname"), "nickname");
    }

    #[test]
    fn test_logical_field_names() {
        let r = resolver(true);
        assert_eq!(r.logical_field_name("session", "user"), "userId");
        assert_eq!(r.logical_field_name("sessions", "user"), "userId");
        assert_eq!(r.logical_field_name("member", "memberRole"), "role");
        assert_eq!(r.logical_field_name("user", "id"), "id");
    }

    #[test]
    fn test_is_id_field() {
        let r = resolver(false);
        assert!(r.is_id_field("session", "id"));
        assert!(r.is_id_field("session", "userId"));
        assert!(!r.is_id_field("session", "token"));
    }

    #[test]
    fn test_relationship_field_name() {
        assert_eq!(relationship_field_name("userId"), "user");
        assert_eq!(relationship_field_name("Id"), "Id");
        assert_eq!(relationship_field_name("owner"), "owner");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("passkey"), "passkeys");
        assert_eq!(pluralize("policy"), "policies");
    }
}
