//! Flat key references over key-value records
//!
//! Bare column/key names, with surrounding SQL-dialect quote characters
//! (double quotes, backticks, bracket pairs) stripped before lookup. The two
//! flat families differ only in what an absent key means: tabular sources
//! declare their whole column set up front, so an undeclared reference is a
//! rule-authoring bug; binding records have no fixed per-record schema, so
//! absence is an ordinary soft miss.

use crate::error::{Resolved, RmlError, RmlResult};
use crate::record::KeyValueRecord;

/// Strip one layer of SQL-dialect identifier quoting
pub fn strip_identifier_quotes(expression: &str) -> &str {
    let trimmed = expression.trim();
    for (open, close) in [('"', '"'), ('`', '`'), ('[', ']')] {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|s| s.strip_suffix(close))
        {
            if !inner.is_empty() {
                return inner;
            }
        }
    }
    trimmed
}

fn validate_key(expression: &str, key: &str) -> RmlResult<()> {
    if key.is_empty() {
        return Err(RmlError::InvalidReference(format!(
            "empty column reference `{expression}`"
        )));
    }
    Ok(())
}

/// Resolve a column reference against a header-fixed row (CSV, TSV, SQL).
///
/// An undeclared column is a hard error; a declared column holding a null
/// value is a soft miss.
pub fn resolve_tabular(expression: &str, row: &KeyValueRecord) -> RmlResult<Resolved<String>> {
    let key = strip_identifier_quotes(expression);
    validate_key(expression, key)?;

    match row.get(key) {
        None => Err(RmlError::InvalidReference(format!(
            "column `{key}` is not part of the source's declared column set"
        ))),
        Some(None) => Ok(Resolved::NotFound),
        Some(Some(value)) => Ok(Resolved::Found(value.clone())),
    }
}

/// Resolve a key reference against a schemaless binding record
/// (RDF pattern bindings, SPARQL results, paginated API pages).
///
/// Absent keys and null values are both soft misses.
pub fn resolve_key_value(expression: &str, row: &KeyValueRecord) -> RmlResult<Resolved<String>> {
    let key = strip_identifier_quotes(expression);
    validate_key(expression, key)?;

    match row.get(key) {
        None | Some(None) => Ok(Resolved::NotFound),
        Some(Some(value)) => Ok(Resolved::Found(value.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> KeyValueRecord {
        KeyValueRecord::from_pairs(vec![
            ("id".to_string(), Some("1".to_string())),
            ("name".to_string(), Some("Ann".to_string())),
            ("age".to_string(), Some("62".to_string())),
            ("email".to_string(), None),
        ])
    }

    #[test]
    fn test_strip_identifier_quotes() {
        assert_eq!(strip_identifier_quotes("name"), "name");
        assert_eq!(strip_identifier_quotes("\"name\""), "name");
        assert_eq!(strip_identifier_quotes("`name`"), "name");
        assert_eq!(strip_identifier_quotes("[name]"), "name");
        assert_eq!(strip_identifier_quotes("  name  "), "name");
        // Unbalanced quoting passes through unchanged.
        assert_eq!(strip_identifier_quotes("\"name"), "\"name");
    }

    #[test]
    fn test_tabular_declared_column() {
        let row = sample_row();
        assert_eq!(
            resolve_tabular("name", &row).unwrap(),
            Resolved::Found("Ann".to_string())
        );
        assert_eq!(
            resolve_tabular("\"name\"", &row).unwrap(),
            Resolved::Found("Ann".to_string())
        );
    }

    #[test]
    fn test_tabular_undeclared_column_is_hard() {
        let row = sample_row();
        assert!(matches!(
            resolve_tabular("title", &row),
            Err(RmlError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_tabular_null_value_is_soft() {
        let row = sample_row();
        assert_eq!(resolve_tabular("email", &row).unwrap(), Resolved::NotFound);
    }

    #[test]
    fn test_key_value_absence_is_soft() {
        let row = sample_row();
        assert_eq!(
            resolve_key_value("title", &row).unwrap(),
            Resolved::NotFound
        );
        assert_eq!(
            resolve_key_value("email", &row).unwrap(),
            Resolved::NotFound
        );
        assert_eq!(
            resolve_key_value("name", &row).unwrap(),
            Resolved::Found("Ann".to_string())
        );
    }

    #[test]
    fn test_empty_reference_is_hard() {
        let row = sample_row();
        assert!(matches!(
            resolve_tabular("", &row),
            Err(RmlError::InvalidReference(_))
        ));
        assert!(matches!(
            resolve_key_value("  ", &row),
            Err(RmlError::InvalidReference(_))
        ));
    }
}
