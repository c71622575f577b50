//! RML/R2RML vocabulary constants
//!
//! IRI constants for the vocabularies the runtime interprets: the W3C R2RML
//! namespace (`rr:`), the RML extension namespace (`rml:`), the reference
//! formulation namespace (`ql:`), and the Hydra Core pagination vocabulary.

/// R2RML vocabulary namespace and constants
pub struct RR;

impl RR {
    /// R2RML namespace IRI
    pub const NS: &'static str = "http://www.w3.org/ns/r2rml#";

    /// rr:IRI - Term type for IRIs
    pub const IRI: &'static str = "http://www.w3.org/ns/r2rml#IRI";

    /// rr:BlankNode - Term type for blank nodes
    pub const BLANK_NODE: &'static str = "http://www.w3.org/ns/r2rml#BlankNode";

    /// rr:Literal - Term type for literals
    pub const LITERAL: &'static str = "http://www.w3.org/ns/r2rml#Literal";

    /// rr:defaultGraph - The default graph
    pub const DEFAULT_GRAPH: &'static str = "http://www.w3.org/ns/r2rml#defaultGraph";
}

/// RML extension vocabulary namespace and constants
pub struct RML;

impl RML {
    /// RML namespace IRI
    pub const NS: &'static str = "http://semweb.mmlab.be/ns/rml#";

    /// rml:logicalSource - Links a TriplesMap to its logical source
    pub const LOGICAL_SOURCE: &'static str = "http://semweb.mmlab.be/ns/rml#logicalSource";

    /// rml:reference - Specifies a reference expression for generating terms
    pub const REFERENCE: &'static str = "http://semweb.mmlab.be/ns/rml#reference";

    /// rml:iterator - Specifies the per-record iteration expression
    pub const ITERATOR: &'static str = "http://semweb.mmlab.be/ns/rml#iterator";

    /// rml:referenceFormulation - Specifies the reference expression dialect
    pub const REFERENCE_FORMULATION: &'static str =
        "http://semweb.mmlab.be/ns/rml#referenceFormulation";
}

/// Reference formulation vocabulary (`ql:`) constants
pub struct QL;

impl QL {
    /// QL namespace IRI
    pub const NS: &'static str = "http://semweb.mmlab.be/ns/ql#";

    /// ql:JSONPath - Nested-path references over JSON documents
    pub const JSON_PATH: &'static str = "http://semweb.mmlab.be/ns/ql#JSONPath";

    /// ql:XPath - Hierarchical-path references over XML documents
    pub const XPATH: &'static str = "http://semweb.mmlab.be/ns/ql#XPath";

    /// ql:CSV - Flat column references over delimited files
    pub const CSV: &'static str = "http://semweb.mmlab.be/ns/ql#CSV";
}

/// Hydra Core pagination vocabulary constants
pub struct HYDRA;

impl HYDRA {
    /// Hydra namespace IRI
    pub const NS: &'static str = "http://www.w3.org/ns/hydra/core#";

    /// hydra:view - Links a collection to its partial-view description
    pub const VIEW: &'static str = "http://www.w3.org/ns/hydra/core#view";

    /// hydra:next - Forward link to the next page of a paginated collection
    pub const NEXT: &'static str = "http://www.w3.org/ns/hydra/core#next";
}

/// XSD datatype IRIs used by literal generation
pub mod xsd {
    /// xsd:string
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    /// xsd:integer
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    /// xsd:boolean
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
}

/// RDF namespace IRIs
pub mod rdf {
    /// rdf:type
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    /// rdf:langString - Datatype of language-tagged strings
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
}
