// Where-clause translation: better-auth `WhereClause` lists into Payload's
// nested `and` / `or` filter tree.
//
// Clauses join with AND unless their connector is OR, in which case they are
// grouped with their predecessor:
//
//   a, b(OR), c(OR), d   →   and: [ or: [a, b, c], d ]

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use better_auth_core::db::adapter::{Operator, WhereClause};

use crate::error::{PayloadError, PayloadResult};
use crate::id::DocumentId;
use crate::naming::NameResolver;

/// Payload's field operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadOperator {
    Equals,
    NotEquals,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    In,
    NotIn,
    Contains,
    Like,
}

impl PayloadOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::LessThan => "less_than",
            Self::LessThanEqual => "less_than_equal",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanEqual => "greater_than_equal",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Contains => "contains",
            Self::Like => "like",
        }
    }
}

/// A single `{ field: { operator: value } }` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCondition {
    pub field: String,
    pub op: PayloadOperator,
    pub value: Value,
}

/// Payload's native filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadWhere {
    And(Vec<PayloadWhere>),
    Or(Vec<PayloadWhere>),
    Field(FieldCondition),
}

impl Default for PayloadWhere {
    fn default() -> Self {
        Self::And(Vec::new())
    }
}

impl PayloadWhere {
    pub fn field(field: impl Into<String>, op: PayloadOperator, value: impl Into<Value>) -> Self {
        Self::Field(FieldCondition {
            field: field.into(),
            op,
            value: value.into(),
        })
    }

    /// An empty tree matches every document.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::And(nodes) | Self::Or(nodes) if nodes.is_empty())
    }

    /// Payload's JSON where object.
    pub fn to_json(&self) -> Value {
        match self {
            Self::And(nodes) if nodes.is_empty() => Value::Object(Map::new()),
            Self::And(nodes) => {
                serde_json::json!({ "and": nodes.iter().map(Self::to_json).collect::<Vec<_>>() })
            }
            Self::Or(nodes) => {
                serde_json::json!({ "or": nodes.iter().map(Self::to_json).collect::<Vec<_>>() })
            }
            Self::Field(cond) => {
                let mut op = Map::new();
                op.insert(cond.op.as_str().to_string(), cond.value.clone());
                let mut field = Map::new();
                field.insert(cond.field.clone(), Value::Object(op));
                Value::Object(field)
            }
        }
    }

    /// Query-string pairs in Payload's bracket notation
    /// (`where[and][0][email][equals]=a@b.com`).
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        flatten_query("where", &self.to_json(), &mut pairs);
        pairs
    }
}

impl Serialize for PayloadWhere {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Flatten a JSON value into bracketed query pairs.
pub(crate) fn flatten_query(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                flatten_query(&format!("{prefix}[{key}]"), v, out);
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten_query(&format!("{prefix}[{i}]"), v, out);
            }
        }
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        Value::Null => out.push((prefix.to_string(), "null".to_string())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

/// Translate better-auth clauses for `model` into a Payload where tree.
pub fn convert_where(
    resolver: &NameResolver,
    model: &str,
    clauses: &[WhereClause],
) -> PayloadResult<PayloadWhere> {
    let mut groups: Vec<Vec<PayloadWhere>> = Vec::new();
    for clause in clauses {
        let node = convert_clause(resolver, model, clause)?;
        match groups.last_mut() {
            Some(group) if clause.is_or() => group.push(node),
            _ => groups.push(vec![node]),
        }
    }

    let mut nodes: Vec<PayloadWhere> = groups
        .into_iter()
        .map(|mut group| {
            if group.len() == 1 {
                group.remove(0)
            } else {
                PayloadWhere::Or(group)
            }
        })
        .collect();

    Ok(if nodes.len() == 1 {
        nodes.remove(0)
    } else {
        PayloadWhere::And(nodes)
    })
}

fn convert_clause(
    resolver: &NameResolver,
    model: &str,
    clause: &WhereClause,
) -> PayloadResult<PayloadWhere> {
    let field = resolver.field_name(model, &clause.field);
    let value = if resolver.is_id_field(model, &clause.field) {
        resolver.id_type().coerce(clause.value.clone())
    } else {
        clause.value.clone()
    };

    let (op, value) = match clause.operator {
        Operator::Eq => (PayloadOperator::Equals, value),
        Operator::Ne => (PayloadOperator::NotEquals, value),
        Operator::Lt => (PayloadOperator::LessThan, comparable(clause, value)?),
        Operator::Lte => (PayloadOperator::LessThanEqual, comparable(clause, value)?),
        Operator::Gt => (PayloadOperator::GreaterThan, comparable(clause, value)?),
        Operator::Gte => (PayloadOperator::GreaterThanEqual, comparable(clause, value)?),
        Operator::In => (PayloadOperator::In, list(clause, value)?),
        Operator::NotIn => (PayloadOperator::NotIn, list(clause, value)?),
        Operator::Contains => match value {
            Value::String(_) | Value::Array(_) => (PayloadOperator::Contains, value),
            other => {
                return Err(PayloadError::unsupported(
                    &clause.field,
                    clause.operator,
                    format!("expected a string or array, got {}", kind(&other)),
                ))
            }
        },
        Operator::StartsWith => (
            PayloadOperator::Like,
            Value::String(format!("{}%", text(clause, &value)?)),
        ),
        Operator::EndsWith => (
            PayloadOperator::Like,
            Value::String(format!("%{}", text(clause, &value)?)),
        ),
    };

    Ok(PayloadWhere::Field(FieldCondition { field, op, value }))
}

fn comparable(clause: &WhereClause, value: Value) -> PayloadResult<Value> {
    match value {
        Value::Number(_) | Value::String(_) => Ok(value),
        other => Err(PayloadError::unsupported(
            &clause.field,
            clause.operator,
            format!("expected a number, string or date, got {}", kind(&other)),
        )),
    }
}

fn list(clause: &WhereClause, value: Value) -> PayloadResult<Value> {
    match value {
        Value::Array(_) => Ok(value),
        other => Err(PayloadError::unsupported(
            &clause.field,
            clause.operator,
            format!("expected an array, got {}", kind(&other)),
        )),
    }
}

fn text<'a>(clause: &WhereClause, value: &'a Value) -> PayloadResult<&'a str> {
    value.as_str().ok_or_else(|| {
        PayloadError::unsupported(
            &clause.field,
            clause.operator,
            format!("expected a string, got {}", kind(value)),
        )
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The id of a tree that is exactly one `id equals <scalar>` condition.
pub fn single_id_query(filter: &PayloadWhere) -> Option<DocumentId> {
    match filter {
        PayloadWhere::Field(cond) if cond.field == "id" && cond.op == PayloadOperator::Equals => {
            DocumentId::from_value(&cond.value)
        }
        _ => None,
    }
}

/// The ids of a tree that is exactly one `id in [...]` condition.
pub fn multiple_ids_query(filter: &PayloadWhere) -> Option<Vec<DocumentId>> {
    match filter {
        PayloadWhere::Field(cond) if cond.field == "id" && cond.op == PayloadOperator::In => cond
            .value
            .as_array()
            .map(|ids| ids.iter().filter_map(DocumentId::from_value).collect()),
        _ => None,
    }
}
