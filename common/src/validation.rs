use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::entities::Category;

static CYRILLIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[а-яА-Я]").expect("cyrillic regex to compile"));

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("category {id}: {reason}")]
    Category { id: i64, reason: &'static str },
}

/// Validates a category node the way the source's `SourceCategory` pydantic
/// schema does: a non-empty `query` must contain `=`, `url` must start with
/// `/` or `https://`, and neither `shard` nor `query` may contain cyrillic
/// letters or spaces.
pub fn validate_category(category: &Category) -> Result<(), ValidationError> {
    if !(category.url.starts_with('/') || category.url.starts_with("https://")) {
        return Err(ValidationError::Category {
            id: category.id,
            reason: "url must start with \"/\" or \"https://\"",
        });
    }

    if let Some(query) = &category.query
        && !query.is_empty()
        && !query.contains('=')
    {
        return Err(ValidationError::Category {
            id: category.id,
            reason: "query must contain \"=\"",
        });
    }

    for field in [category.shard.as_deref(), category.query.as_deref()]
        .into_iter()
        .flatten()
    {
        if CYRILLIC.is_match(field) {
            return Err(ValidationError::Category {
                id: category.id,
                reason: "shard/query must not contain cyrillic letters",
            });
        }

        if field.contains(' ') {
            return Err(ValidationError::Category {
                id: category.id,
                reason: "shard/query must not contain spaces",
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(url: &str, shard: Option<&str>, query: Option<&str>) -> Category {
        Category {
            id: 1,
            name: "test".into(),
            parent_id: None,
            url: url.into(),
            shard: shard.map(Into::into),
            query: query.map(Into::into),
        }
    }

    #[test]
    fn accepts_well_formed_category() {
        let category = category("/catalog/test", Some("women/clothes"), Some("xsubject=123"));
        assert!(validate_category(&category).is_ok());
    }

    #[test]
    fn rejects_url_without_recognized_prefix() {
        let category = category("catalog/test", None, None);
        assert!(validate_category(&category).is_err());
    }

    #[test]
    fn rejects_query_without_equals() {
        let category = category("/catalog/test", None, Some("xsubject123"));
        assert!(validate_category(&category).is_err());
    }

    #[test]
    fn rejects_cyrillic_shard() {
        let category = category("/catalog/test", Some("одежда"), None);
        assert!(validate_category(&category).is_err());
    }

    #[test]
    fn rejects_spaces_in_query() {
        let category = category("/catalog/test", None, Some("xsubject =123"));
        assert!(validate_category(&category).is_err());
    }
}
