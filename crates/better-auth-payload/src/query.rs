// Sort, selection and pagination translation.

use serde_json::{Map, Value};

use better_auth_core::db::adapter::{SortBy, SortDirection};

use crate::naming::NameResolver;

/// Payload's default page size.
pub const DEFAULT_LIMIT: u64 = 10;

/// Field projection: `{ field: true, ... }`.
pub type Select = Map<String, Value>;

/// Sort string for Payload: the field name, prefixed with `-` when descending.
pub fn convert_sort(resolver: &NameResolver, model: &str, sort_by: Option<&SortBy>) -> Option<String> {
    let sort = sort_by?;
    let field = resolver.field_name(model, &sort.field);
    Some(match sort.direction {
        SortDirection::Asc => field,
        SortDirection::Desc => format!("-{field}"),
    })
}

/// Projection for the selected logical fields. `None` or an empty list selects
/// every field.
pub fn convert_select(
    resolver: &NameResolver,
    model: &str,
    select: Option<&[String]>,
) -> Option<Select> {
    let fields = select.filter(|fields| !fields.is_empty())?;
    Some(
        fields
            .iter()
            .map(|f| (resolver.field_name(model, f), Value::Bool(true)))
            .collect(),
    )
}

/// One-based page holding `offset` for pages of `limit` documents.
pub fn page_for(offset: Option<u64>, limit: Option<u64>) -> u64 {
    match offset {
        Some(offset) if offset > 0 => offset / limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT) + 1,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use better_auth_core::db::schema::AuthSchema;
    use serde_json::json;

    use crate::config::PayloadAdapterConfig;

    fn resolver() -> NameResolver {
        NameResolver::new(&AuthSchema::core_schema(), &PayloadAdapterConfig::default())
    }

    #[test]
    fn test_convert_sort() {
        let r = resolver();
        assert_eq!(
            convert_sort(&r, "user", Some(&SortBy::asc("createdAt"))),
            Some("createdAt".to_string())
        );
        assert_eq!(
            convert_sort(&r, "session", Some(&SortBy::desc("userId"))),
            Some("-user".to_string())
        );
        assert_eq!(convert_sort(&r, "user", None), None);
    }

    #[test]
    fn test_convert_select() {
        let r = resolver();
        let fields = vec!["token".to_string(), "userId".to_string()];
        let select = convert_select(&r, "session", Some(&fields)).unwrap();
        assert_eq!(Value::Object(select), json!({ "token": true, "user": true }));
        assert_eq!(convert_select(&r, "session", Some(&[])), None);
        assert_eq!(convert_select(&r, "session", None), None);
    }

    #[test]
    fn test_page_for() {
        assert_eq!(page_for(None, Some(20)), 1);
        assert_eq!(page_for(Some(0), Some(20)), 1);
        assert_eq!(page_for(Some(20), Some(20)), 2);
        assert_eq!(page_for(Some(45), Some(20)), 3);
        assert_eq!(page_for(Some(25), None), 3);
        assert_eq!(page_for(Some(5), Some(0)), 1);
    }
}
