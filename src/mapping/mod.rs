//! Mapping rule structures
//!
//! The runtime representation of canonicalized mapping rules: term maps and
//! the triples maps that drive them. The upstream compiler has already
//! rewritten shortcut forms, hoisted class and graph assignments, and turned
//! table names into queries before these objects are built.

mod term_map;
mod triples_map;

pub use term_map::{
    extract_placeholders, iri_escape, ObjectMap, PredicateMap, PredicateObjectMap, SubjectMap,
    TermKind, TermMap, TermType,
};
pub use triples_map::TriplesMap;
