//! Per-record reference resolution
//!
//! [`resolve_reference`] turns one reference expression and one record into a
//! scalar, dispatched by reference formulation. The outcome channel carries
//! the per-family distinctions: path dialects and non-tabular
//! key lookups miss softly ([`Resolved::NotFound`]), tabular lookups of an
//! undeclared column fail hard, and malformed expressions fail hard in every
//! family.

pub mod json_path;
pub mod key_value;
pub mod xml_path;

use crate::error::{Resolved, RmlError, RmlResult};
use crate::formulation::ReferenceFormulation;
use crate::record::DataRecord;

/// Resolve a reference expression against a record.
///
/// The record carrier must match the formulation family; a mismatch is a
/// configuration error (the upstream compiler guarantees agreement between a
/// source's formulation and the term maps driven by it).
pub fn resolve_reference(
    expression: &str,
    record: &DataRecord,
    formulation: ReferenceFormulation,
) -> RmlResult<Resolved<String>> {
    match (formulation, record) {
        (ReferenceFormulation::JsonPath, DataRecord::Json(value)) => {
            json_path::resolve_scalar(expression, value)
        }
        (ReferenceFormulation::XPath, DataRecord::Xml(node)) => {
            xml_path::resolve_scalar(expression, node)
        }
        (ReferenceFormulation::Tabular, DataRecord::Row(row)) => {
            key_value::resolve_tabular(expression, row)
        }
        (ReferenceFormulation::KeyValue, DataRecord::Row(row)) => {
            key_value::resolve_key_value(expression, row)
        }
        (formulation, record) => Err(RmlError::Configuration(format!(
            "{} reference `{}` cannot be applied to a {} record",
            formulation.name(),
            expression,
            record.kind()
        ))),
    }
}
