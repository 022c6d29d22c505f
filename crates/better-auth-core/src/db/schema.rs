// Schema definition types: the DSL used to describe auth models and the
// fields plugins add to them. Backends read it to resolve physical names and
// to generate their own schema declarations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Field types supported by the schema system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "string[]")]
    StringArray,
    #[serde(rename = "number[]")]
    NumberArray,
    #[serde(rename = "json")]
    Json,
}

/// A single field definition within a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    /// The field's data type.
    pub field_type: FieldType,
    /// Whether the field is required (non-nullable).
    #[serde(default)]
    pub required: bool,
    /// Whether the field must be unique across records.
    #[serde(default)]
    pub unique: bool,
    /// Whether the backend should index the field.
    #[serde(default)]
    pub index: bool,
    /// Default value for the field (as JSON).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    /// If true, the field is auto-set to the current timestamp on create/update.
    #[serde(default)]
    pub auto_set_on_create: bool,
    #[serde(default)]
    pub auto_set_on_update: bool,
    /// Reference to another model (foreign key).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<FieldReference>,
    /// If true, this field should be included in API output. Default: true.
    #[serde(default = "default_true")]
    pub returned: bool,
    /// Custom physical field name override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

fn default_true() -> bool {
    true
}

impl SchemaField {
    /// Create a field of the given type with everything else defaulted.
    pub fn of(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            unique: false,
            index: false,
            default_value: None,
            auto_set_on_create: false,
            auto_set_on_update: false,
            references: None,
            returned: true,
            field_name: None,
        }
    }

    /// Create a required string field.
    pub fn required_string() -> Self {
        Self::of(FieldType::String).required()
    }

    /// Create an optional string field.
    pub fn optional_string() -> Self {
        Self::of(FieldType::String)
    }

    /// Create a boolean field with a default value.
    pub fn boolean(default: bool) -> Self {
        Self {
            default_value: Some(serde_json::Value::Bool(default)),
            ..Self::of(FieldType::Boolean)
        }
    }

    /// Create a date field.
    pub fn date(required: bool) -> Self {
        Self {
            required,
            ..Self::of(FieldType::Date)
        }
    }

    /// Create a required date field (auto-set on creation).
    pub fn created_at() -> Self {
        Self {
            auto_set_on_create: true,
            ..Self::date(true)
        }
    }

    /// Create a required date field (auto-set on creation and update).
    pub fn updated_at() -> Self {
        Self {
            auto_set_on_create: true,
            auto_set_on_update: true,
            ..Self::date(true)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_index(mut self) -> Self {
        self.index = true;
        self
    }

    pub fn with_reference(mut self, model: &str, field: &str) -> Self {
        self.references = Some(FieldReference {
            model: model.to_string(),
            field: field.to_string(),
            on_delete: None,
        });
        self
    }

    /// Override the physical field name.
    pub fn with_field_name(mut self, name: &str) -> Self {
        self.field_name = Some(name.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.returned = false;
        self
    }

    /// Whether the backend maintains this field on its own (timestamps).
    pub fn is_automatic_timestamp(&self) -> bool {
        self.field_type == FieldType::Date && self.auto_set_on_create
    }
}

/// Foreign key reference configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldReference {
    /// Logical model name (e.g. "user").
    pub model: String,
    /// Field name in the referenced model (usually "id").
    pub field: String,
    /// ON DELETE action (cascade, set null, etc.).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
}

/// A model definition within the auth schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTable {
    /// Canonical model name used by better-auth ("user").
    pub model: String,
    /// Physical name in the backend; equals `model` unless renamed.
    pub name: String,
    /// Map of logical field name → field definition.
    pub fields: HashMap<String, SchemaField>,
    /// Position of the model when emitting schema declarations.
    #[serde(default)]
    pub order: Option<i32>,
}

impl AuthTable {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            name: model.to_string(),
            fields: HashMap::new(),
            order: None,
        }
    }

    pub fn field(mut self, name: &str, schema_field: SchemaField) -> Self {
        self.fields.insert(name.to_string(), schema_field);
        self
    }

    /// Rename the model in the backend.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Fields sorted by name.
    pub fn sorted_fields(&self) -> Vec<(&String, &SchemaField)> {
        let mut fields: Vec<_> = self.fields.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        fields
    }
}

/// The complete auth database schema, keyed by canonical model name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSchema {
    pub tables: HashMap<String, AuthTable>,
}

impl AuthSchema {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Add a model. Fields of an already-registered model are merged, existing
    /// definitions winning.
    pub fn table(mut self, table: AuthTable) -> Self {
        match self.tables.get_mut(&table.model) {
            Some(existing) => {
                for (name, field) in table.fields {
                    existing.fields.entry(name).or_insert(field);
                }
            }
            None => {
                self.tables.insert(table.model.clone(), table);
            }
        }
        self
    }

    /// Models ordered by their `order`, then by name.
    pub fn ordered_tables(&self) -> Vec<&AuthTable> {
        let mut tables: Vec<&AuthTable> = self.tables.values().collect();
        tables.sort_by(|a, b| {
            a.order
                .unwrap_or(i32::MAX)
                .cmp(&b.order.unwrap_or(i32::MAX))
                .then_with(|| a.model.cmp(&b.model))
        });
        tables
    }

    /// Build the default core auth schema (user, session, account, verification).
    pub fn core_schema() -> Self {
        let user = AuthTable::new("user")
            .with_order(1)
            .field("id", SchemaField::required_string())
            .field("name", SchemaField::required_string())
            .field("email", SchemaField::required_string().with_unique())
            .field("emailVerified", SchemaField::boolean(false).required())
            .field("image", SchemaField::optional_string())
            .field("createdAt", SchemaField::created_at())
            .field("updatedAt", SchemaField::updated_at());

        let session = AuthTable::new("session")
            .with_order(2)
            .field("id", SchemaField::required_string())
            .field("token", SchemaField::required_string().with_unique())
            .field("expiresAt", SchemaField::date(true))
            .field("ipAddress", SchemaField::optional_string())
            .field("userAgent", SchemaField::optional_string())
            .field(
                "userId",
                SchemaField::required_string()
                    .with_reference("user", "id")
                    .with_index(),
            )
            .field("createdAt", SchemaField::created_at())
            .field("updatedAt", SchemaField::updated_at());

        let account = AuthTable::new("account")
            .with_order(3)
            .field("id", SchemaField::required_string())
            .field("accountId", SchemaField::required_string())
            .field("providerId", SchemaField::required_string())
            .field(
                "userId",
                SchemaField::required_string()
                    .with_reference("user", "id")
                    .with_index(),
            )
            .field("accessToken", SchemaField::optional_string())
            .field("refreshToken", SchemaField::optional_string())
            .field("idToken", SchemaField::optional_string())
            .field("accessTokenExpiresAt", SchemaField::date(false))
            .field("refreshTokenExpiresAt", SchemaField::date(false))
            .field("scope", SchemaField::optional_string())
            .field("password", SchemaField::optional_string().hidden())
            .field("createdAt", SchemaField::created_at())
            .field("updatedAt", SchemaField::updated_at());

        let verification = AuthTable::new("verification")
            .with_order(4)
            .field("id", SchemaField::required_string())
            .field("identifier", SchemaField::required_string().with_index())
            .field("value", SchemaField::required_string())
            .field("expiresAt", SchemaField::date(true))
            .field("createdAt", SchemaField::created_at())
            .field("updatedAt", SchemaField::updated_at());

        Self::new()
            .table(user)
            .table(session)
            .table(account)
            .table(verification)
    }
}
