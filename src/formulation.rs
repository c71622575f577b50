//! Reference formulations
//!
//! A [`ReferenceFormulation`] identifies both the expression dialect of a
//! reference and its error-semantics family. The single most behaviorally
//! significant split is tabular vs non-tabular flat sources: a reference to
//! an undeclared column in a CSV/TSV/SQL record is a rule-authoring bug
//! (hard error), while the same miss against a binding record is an
//! ordinary recoverable absence.

use serde::{Deserialize, Serialize};

use crate::vocab::QL;

/// The expression dialect plus error-semantics family of a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceFormulation {
    /// Nested-path expressions over JSON documents (`ql:JSONPath`)
    JsonPath,
    /// Hierarchical-path expressions over XML documents (`ql:XPath`)
    XPath,
    /// Flat column references over a header-fixed schema (CSV, TSV, SQL rows)
    Tabular,
    /// Flat key references over schemaless binding records
    /// (RDF pattern bindings, SPARQL results, paginated API pages)
    KeyValue,
}

impl ReferenceFormulation {
    /// Parse a formulation from its `ql:` vocabulary IRI.
    ///
    /// `ql:CSV` maps to [`ReferenceFormulation::Tabular`]; the non-tabular
    /// flat family has no vocabulary IRI of its own; it is assigned by the
    /// sources that produce binding records.
    pub fn from_iri(iri: &str) -> Option<Self> {
        match iri {
            QL::JSON_PATH => Some(ReferenceFormulation::JsonPath),
            QL::XPATH => Some(ReferenceFormulation::XPath),
            QL::CSV => Some(ReferenceFormulation::Tabular),
            _ => None,
        }
    }

    /// Check whether this formulation addresses flat key-value records
    pub fn is_flat(&self) -> bool {
        matches!(
            self,
            ReferenceFormulation::Tabular | ReferenceFormulation::KeyValue
        )
    }

    /// Check whether an absent key is a hard error under this formulation
    ///
    /// True only for the tabular family, whose column set is statically
    /// declared up front.
    pub fn is_tabular(&self) -> bool {
        matches!(self, ReferenceFormulation::Tabular)
    }

    /// Human-readable name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            ReferenceFormulation::JsonPath => "JSONPath",
            ReferenceFormulation::XPath => "XPath",
            ReferenceFormulation::Tabular => "tabular",
            ReferenceFormulation::KeyValue => "key-value",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_iri() {
        assert_eq!(
            ReferenceFormulation::from_iri("http://semweb.mmlab.be/ns/ql#JSONPath"),
            Some(ReferenceFormulation::JsonPath)
        );
        assert_eq!(
            ReferenceFormulation::from_iri("http://semweb.mmlab.be/ns/ql#XPath"),
            Some(ReferenceFormulation::XPath)
        );
        assert_eq!(
            ReferenceFormulation::from_iri("http://semweb.mmlab.be/ns/ql#CSV"),
            Some(ReferenceFormulation::Tabular)
        );
        assert_eq!(ReferenceFormulation::from_iri("invalid"), None);
    }

    #[test]
    fn test_families() {
        assert!(ReferenceFormulation::Tabular.is_tabular());
        assert!(ReferenceFormulation::Tabular.is_flat());
        assert!(ReferenceFormulation::KeyValue.is_flat());
        assert!(!ReferenceFormulation::KeyValue.is_tabular());
        assert!(!ReferenceFormulation::JsonPath.is_flat());
        assert!(!ReferenceFormulation::XPath.is_flat());
    }
}
