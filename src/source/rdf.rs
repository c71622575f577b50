//! RDF graph-file source
//!
//! Parses one serialized graph, runs the fixed `?s ?p ?o` pattern over it,
//! and streams the statements as flat non-tabular binding records with
//! `subject`, `predicate`, `object`, and (for quads) `graph` keys. IRIs bind
//! their plain IRI string, blank nodes bind `_:label`, literals bind their
//! lexical form.
//!
//! Turtle, N-Triples, N-Quads, TriG, and Notation3 go through `oxttl`,
//! RDF/XML through `oxrdfxml`; JSON-LD (expanded or flattened node objects)
//! and TriX use purpose-built converters.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use oxrdf::{GraphName, Quad, Subject, Term, Triple};
use oxttl::n3::{N3Quad, N3Term};
use oxttl::{N3Parser, NQuadsParser, NTriplesParser, TriGParser, TurtleParser};
use serde_json::Value;
use tracing::debug;

use crate::error::{RmlError, RmlResult};
use crate::formulation::ReferenceFormulation;
use crate::record::{DataRecord, KeyValueRecord, XmlNode};
use crate::source::xml::parse_document;
use crate::source::LogicalSource;
use crate::vocab;

/// Serialization syntaxes accepted for graph payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfSyntax {
    Turtle,
    NTriples,
    NQuads,
    TriG,
    Notation3,
    RdfXml,
    JsonLd,
    TriX,
}

impl RdfSyntax {
    /// Guess a syntax from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ttl" => Some(Self::Turtle),
            "nt" => Some(Self::NTriples),
            "nq" => Some(Self::NQuads),
            "trig" => Some(Self::TriG),
            "n3" => Some(Self::Notation3),
            "rdf" | "xml" => Some(Self::RdfXml),
            "jsonld" | "json" => Some(Self::JsonLd),
            "trix" => Some(Self::TriX),
            _ => None,
        }
    }
}

/// Streaming source over the statements of one parsed graph
pub struct RdfGraphSource {
    statements: VecDeque<KeyValueRecord>,
}

impl RdfGraphSource {
    /// Open a graph file and parse it whole.
    ///
    /// An unreadable path is `ResourceUnavailable`; a malformed payload is
    /// `Validation`.
    pub fn open(path: impl AsRef<Path>, syntax: RdfSyntax) -> RmlResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            RmlError::ResourceUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        let source = Self::from_str(&text, syntax)?;
        debug!(path = %path.display(), statements = source.statements.len(), "rdf source opened");
        Ok(source)
    }

    /// Parse an in-memory graph payload
    pub fn from_str(text: &str, syntax: RdfSyntax) -> RmlResult<Self> {
        let statements = match syntax {
            RdfSyntax::Turtle => triples_of(TurtleParser::new().for_reader(text.as_bytes()))?,
            RdfSyntax::NTriples => triples_of(NTriplesParser::new().for_reader(text.as_bytes()))?,
            RdfSyntax::NQuads => quads_of(NQuadsParser::new().for_reader(text.as_bytes()))?,
            RdfSyntax::TriG => quads_of(TriGParser::new().for_reader(text.as_bytes()))?,
            RdfSyntax::Notation3 => n3_statements(text)?,
            RdfSyntax::RdfXml => triples_of(
                oxrdfxml::RdfXmlParser::new().for_reader(text.as_bytes()),
            )?,
            RdfSyntax::JsonLd => json_ld_statements(text)?,
            RdfSyntax::TriX => trix_statements(text)?,
        };
        Ok(Self {
            statements: statements.into(),
        })
    }
}

impl LogicalSource for RdfGraphSource {
    fn next_record(&mut self) -> RmlResult<Option<DataRecord>> {
        Ok(self.statements.pop_front().map(DataRecord::Row))
    }

    fn formulation(&self) -> ReferenceFormulation {
        ReferenceFormulation::KeyValue
    }
}

// ---------------------------------------------------------------------------
// Binding-record construction
// ---------------------------------------------------------------------------

fn binding(subject: String, predicate: String, object: String, graph: Option<String>) -> KeyValueRecord {
    let mut record = KeyValueRecord::new();
    record.insert("subject", Some(subject));
    record.insert("predicate", Some(predicate));
    record.insert("object", Some(object));
    if let Some(graph) = graph {
        record.insert("graph", Some(graph));
    }
    record
}

fn subject_string(subject: &Subject) -> String {
    match subject {
        Subject::NamedNode(n) => n.as_str().to_string(),
        Subject::BlankNode(b) => format!("_:{}", b.as_str()),
    }
}

fn term_string(term: &Term) -> String {
    match term {
        Term::NamedNode(n) => n.as_str().to_string(),
        Term::BlankNode(b) => format!("_:{}", b.as_str()),
        Term::Literal(l) => l.value().to_string(),
    }
}

fn triple_binding(triple: &Triple) -> KeyValueRecord {
    binding(
        subject_string(&triple.subject),
        triple.predicate.as_str().to_string(),
        term_string(&triple.object),
        None,
    )
}

fn quad_binding(quad: &Quad) -> KeyValueRecord {
    let graph = match &quad.graph_name {
        GraphName::DefaultGraph => None,
        GraphName::NamedNode(n) => Some(n.as_str().to_string()),
        GraphName::BlankNode(b) => Some(format!("_:{}", b.as_str())),
    };
    binding(
        subject_string(&quad.subject),
        quad.predicate.as_str().to_string(),
        term_string(&quad.object),
        graph,
    )
}

fn triples_of<E: std::fmt::Display>(
    parser: impl Iterator<Item = Result<Triple, E>>,
) -> RmlResult<Vec<KeyValueRecord>> {
    parser
        .map(|t| {
            t.map(|t| triple_binding(&t))
                .map_err(|e| RmlError::Validation(format!("malformed RDF payload: {e}")))
        })
        .collect()
}

fn quads_of<E: std::fmt::Display>(
    parser: impl Iterator<Item = Result<Quad, E>>,
) -> RmlResult<Vec<KeyValueRecord>> {
    parser
        .map(|q| {
            q.map(|q| quad_binding(&q))
                .map_err(|e| RmlError::Validation(format!("malformed RDF payload: {e}")))
        })
        .collect()
}

fn n3_term_string(term: &N3Term) -> RmlResult<String> {
    match term {
        N3Term::NamedNode(n) => Ok(n.as_str().to_string()),
        N3Term::BlankNode(b) => Ok(format!("_:{}", b.as_str())),
        N3Term::Literal(l) => Ok(l.value().to_string()),
        other => Err(RmlError::Validation(format!(
            "N3 construct not expressible as a graph statement: {other:?}"
        ))),
    }
}

fn n3_statements(text: &str) -> RmlResult<Vec<KeyValueRecord>> {
    let mut statements = Vec::new();
    for quad in N3Parser::new().for_reader(text.as_bytes()) {
        let N3Quad {
            subject,
            predicate,
            object,
            graph_name,
        } = quad.map_err(|e| RmlError::Validation(format!("malformed N3 payload: {e}")))?;
        let graph = match graph_name {
            GraphName::DefaultGraph => None,
            GraphName::NamedNode(n) => Some(n.as_str().to_string()),
            GraphName::BlankNode(b) => Some(format!("_:{}", b.as_str())),
        };
        statements.push(binding(
            n3_term_string(&subject)?,
            n3_term_string(&predicate)?,
            n3_term_string(&object)?,
            graph,
        ));
    }
    Ok(statements)
}

// ---------------------------------------------------------------------------
// JSON-LD (expanded / flattened node objects)
// ---------------------------------------------------------------------------

/// Convert expanded or flattened JSON-LD node objects.
///
/// Accepts a top-level array of node objects or an object carrying `@graph`.
/// Keyword coverage is the expanded-form core: `@id`, `@type`, `@value`,
/// `@language`, `@graph`. Context processing belongs to an upstream expander.
fn json_ld_statements(text: &str) -> RmlResult<Vec<KeyValueRecord>> {
    let document: Value = serde_json::from_str(text)
        .map_err(|e| RmlError::Validation(format!("malformed JSON-LD payload: {e}")))?;

    let nodes: Vec<&Value> = match &document {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("@graph") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(other) => {
                return Err(RmlError::Validation(format!(
                    "@graph must be an array, got {other}"
                )))
            }
            None => vec![&document],
        },
        other => {
            return Err(RmlError::Validation(format!(
                "JSON-LD document must be an object or array, got {other}"
            )))
        }
    };

    let mut statements = Vec::new();
    let mut blank_counter = 0usize;
    for node in nodes {
        node_statements(node, &mut statements, &mut blank_counter)?;
    }
    Ok(statements)
}

fn node_statements(
    node: &Value,
    out: &mut Vec<KeyValueRecord>,
    blank_counter: &mut usize,
) -> RmlResult<()> {
    let Value::Object(map) = node else {
        return Err(RmlError::Validation(format!(
            "JSON-LD node must be an object, got {node}"
        )));
    };

    let subject = match map.get("@id") {
        Some(Value::String(id)) => id.clone(),
        Some(other) => {
            return Err(RmlError::Validation(format!(
                "@id must be a string, got {other}"
            )))
        }
        None => {
            *blank_counter += 1;
            format!("_:b{blank_counter}")
        }
    };

    for (key, value) in map {
        match key.as_str() {
            "@id" | "@context" => {}
            "@type" => {
                for class in values_of(value) {
                    let Value::String(class) = class else {
                        return Err(RmlError::Validation(format!(
                            "@type must name IRIs, got {class}"
                        )));
                    };
                    out.push(binding(
                        subject.clone(),
                        vocab::rdf::TYPE.to_string(),
                        class.clone(),
                        None,
                    ));
                }
            }
            _ => {
                for object in values_of(value) {
                    out.push(binding(
                        subject.clone(),
                        key.clone(),
                        object_string(object, blank_counter)?,
                        None,
                    ));
                }
            }
        }
    }
    Ok(())
}

fn values_of(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn object_string(value: &Value, blank_counter: &mut usize) -> RmlResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Object(map) => {
            if let Some(Value::String(id)) = map.get("@id") {
                return Ok(id.clone());
            }
            match map.get("@value") {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(Value::Bool(b)) => Ok(b.to_string()),
                Some(Value::Number(n)) => Ok(n.to_string()),
                Some(other) => Err(RmlError::Validation(format!(
                    "unsupported @value: {other}"
                ))),
                None => {
                    *blank_counter += 1;
                    Ok(format!("_:b{blank_counter}"))
                }
            }
        }
        other => Err(RmlError::Validation(format!(
            "unsupported JSON-LD object: {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// TriX
// ---------------------------------------------------------------------------

fn trix_statements(text: &str) -> RmlResult<Vec<KeyValueRecord>> {
    let root = parse_document(text)?;
    let trix = root
        .children
        .iter()
        .find(|c| c.name == "TriX" || c.name == "trix")
        .ok_or_else(|| RmlError::Validation("missing TriX document element".to_string()))?;

    let mut statements = Vec::new();
    for graph in trix.children_named("graph") {
        // An initial <uri> child names the graph; triples follow.
        let graph_name = graph
            .children
            .first()
            .filter(|c| c.name == "uri")
            .map(|c| c.text.clone());
        for triple in graph.children_named("triple") {
            if triple.children.len() != 3 {
                return Err(RmlError::Validation(format!(
                    "TriX triple must have 3 terms, got {}",
                    triple.children.len()
                )));
            }
            statements.push(binding(
                trix_term(&triple.children[0])?,
                trix_term(&triple.children[1])?,
                trix_term(&triple.children[2])?,
                graph_name.clone(),
            ));
        }
    }
    Ok(statements)
}

fn trix_term(node: &XmlNode) -> RmlResult<String> {
    match node.name.as_str() {
        "uri" => Ok(node.text.clone()),
        "id" => Ok(format!("_:{}", node.text)),
        "plainLiteral" | "typedLiteral" => Ok(node.text.clone()),
        other => Err(RmlError::Validation(format!(
            "unknown TriX term element <{other}>"
        ))),
    }
}
