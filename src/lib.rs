//! Streaming RML/R2RML mapping runtime
//!
//! This crate executes canonicalized RML mapping rules against heterogeneous
//! data sources and materializes the results as RDF triples. Mapping
//! compilation (shortcut expansion, table-name rewriting, class/graph
//! hoisting) belongs to an upstream collaborator; this runtime starts from
//! finished rule objects and owns the pull-based execution pipeline.
//!
//! # Key Features
//!
//! - **Logical source family**: delimited files (CSV/TSV), JSON and XML
//!   documents, SQL queries, serialized RDF graphs, remote SPARQL endpoints,
//!   Hydra-paginated collections, and DCAT-addressed downloads, all behind
//!   one lazy single-pass [`LogicalSource`] stream
//! - **Reference resolution**: per-record scalar extraction dispatched by
//!   reference formulation, with tabular and non-tabular missing-value
//!   semantics kept strictly apart
//! - **Term materialization**: constants, `{...}` templates with IRI-bound
//!   percent-encoding, and direct references, wrapped as IRIs, blank nodes,
//!   or literals with language tag or datatype
//! - **Deterministic orchestration**: [`TriplesMap::advance`] emits one
//!   record's worth of triples; [`LogicalTarget`] drains many maps
//!   round-robin for stable multi-map interleaving
//!
//! # Usage
//!
//! Construct a [`LogicalSource`] for each data source, bind it into a
//! [`TriplesMap`] together with its subject and predicate-object maps, and
//! either call [`TriplesMap::advance`] directly or register the maps with a
//! [`LogicalTarget`] and drain them into a [`TripleSink`].

pub mod error;
pub mod formulation;
pub mod mapping;
pub mod record;
pub mod resolver;
pub mod source;
pub mod target;
pub mod term;
pub mod vocab;

pub use error::{Resolved, RmlError, RmlResult};
pub use formulation::ReferenceFormulation;
pub use mapping::{
    ObjectMap, PredicateMap, PredicateObjectMap, SubjectMap, TermKind, TermMap, TermType,
    TriplesMap,
};
pub use record::{DataRecord, KeyValueRecord, XmlNode};
pub use resolver::resolve_reference;
pub use source::{
    CsvDialect, DcatSource, DelimitedSource, Encoding, HttpPageFetcher, HydraSource, JsonSource,
    LogicalSource, PageFetcher, PayloadKind, RdfGraphSource, RdfSyntax, SparqlResultFormat,
    SparqlSource, SqlSource, TrimMode, VecSource, XmlSource,
};
pub use target::{LogicalTarget, TripleSink, VecSink};
pub use term::{RdfTerm, Triple};
