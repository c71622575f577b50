//! JSON document source
//!
//! Parses the whole document once, evaluates the declared iterator expression
//! against it, and streams the matched nodes as records. Zero matches is an
//! immediately exhausted source, not an error.

use std::fs;
use std::path::Path;
use std::vec::IntoIter;

use serde_json::Value;
use tracing::debug;

use crate::error::{RmlError, RmlResult};
use crate::formulation::ReferenceFormulation;
use crate::record::DataRecord;
use crate::resolver::json_path;
use crate::source::LogicalSource;

/// Streaming source over the iterator matches of one JSON document
pub struct JsonSource {
    matches: IntoIter<Value>,
}

impl JsonSource {
    /// Open a JSON file and evaluate the iterator expression.
    ///
    /// An unreadable path is `ResourceUnavailable`, a malformed document is
    /// `Validation`, and a malformed iterator expression is
    /// `InvalidReference`.
    pub fn open(path: impl AsRef<Path>, iterator: &str) -> RmlResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            RmlError::ResourceUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        let root: Value = serde_json::from_str(&text).map_err(|e| {
            RmlError::Validation(format!("{} is not valid JSON: {e}", path.display()))
        })?;
        let source = Self::from_value(&root, iterator)?;
        debug!(path = %path.display(), matches = source.matches.len(), "json source opened");
        Ok(source)
    }

    /// Evaluate the iterator against an already-parsed document
    pub fn from_value(root: &Value, iterator: &str) -> RmlResult<Self> {
        let matches = json_path::select_nodes(iterator, root)?;
        Ok(Self {
            matches: matches.into_iter(),
        })
    }
}

impl LogicalSource for JsonSource {
    fn next_record(&mut self) -> RmlResult<Option<DataRecord>> {
        Ok(self.matches.next().map(DataRecord::Json))
    }

    fn formulation(&self) -> ReferenceFormulation {
        ReferenceFormulation::JsonPath
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DOC: &str = r#"{"students":[{"id":"1","name":"Ann"},{"id":"2","name":"Bob"}]}"#;

    fn write_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_streams_iterator_matches() {
        let f = write_file(DOC);
        let mut source = JsonSource::open(f.path(), "$.students[*]").unwrap();

        let first = source.next_record().unwrap().unwrap();
        match first {
            DataRecord::Json(value) => assert_eq!(value["name"], "Ann"),
            other => panic!("expected json record, got {other:?}"),
        }
        assert!(source.next_record().unwrap().is_some());
        assert!(source.next_record().unwrap().is_none());
        assert!(source.next_record().unwrap().is_none());
    }

    #[test]
    fn test_zero_matches_is_exhausted() {
        let f = write_file(DOC);
        let mut source = JsonSource::open(f.path(), "$.teachers[*]").unwrap();
        assert!(source.next_record().unwrap().is_none());
    }

    #[test]
    fn test_malformed_document_is_validation() {
        let f = write_file("{not json");
        let err = JsonSource::open(f.path(), "$.students[*]").err().unwrap();
        assert!(matches!(err, RmlError::Validation(_)));
    }

    #[test]
    fn test_missing_file_is_resource_unavailable() {
        let err = JsonSource::open("/no/such/file.json", "$").err().unwrap();
        assert!(matches!(err, RmlError::ResourceUnavailable(_)));
    }

    #[test]
    fn test_malformed_iterator_is_invalid_reference() {
        let f = write_file(DOC);
        let err = JsonSource::open(f.path(), "$.students[").err().unwrap();
        assert!(matches!(err, RmlError::InvalidReference(_)));
    }
}
