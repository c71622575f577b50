//! Remote SPARQL endpoint source
//!
//! Validates the query shape up front, then lazily issues one GET against
//! the endpoint on the first pull and streams the result bindings as flat
//! non-tabular records. A variable left unbound in a solution is an absent
//! key, which resolves as a soft miss downstream.

use std::vec::IntoIter;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{RmlError, RmlResult};
use crate::formulation::ReferenceFormulation;
use crate::record::{DataRecord, KeyValueRecord};
use crate::source::xml::parse_document;
use crate::source::LogicalSource;

/// Leading prologue (PREFIX/BASE declarations) followed by the SELECT keyword
static SELECT_QUERY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*(?:(?:prefix\s+\S*\s*<[^>]*>|base\s*<[^>]*>)\s*)*select\b").unwrap()
});

/// Projection clause between SELECT and the WHERE group
static PROJECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)select\s+(?:distinct\s+|reduced\s+)?(.*?)\s*(?:\bwhere\b|\{)").unwrap()
});

/// `(expr AS ?var)` aliases inside the projection
static ALIAS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\([^()]*\bas\s+[?$]([A-Za-z_][A-Za-z0-9_]*)\s*\)").unwrap());

static VARIABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?$]([A-Za-z_][A-Za-z0-9_]*)").unwrap());

/// Result serializations the endpoint may be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparqlResultFormat {
    Json,
    Xml,
}

impl SparqlResultFormat {
    /// Accept header value for this serialization
    pub fn accept(&self) -> &'static str {
        match self {
            SparqlResultFormat::Json => "application/sparql-results+json",
            SparqlResultFormat::Xml => "application/sparql-results+xml",
        }
    }
}

enum Results {
    Pending,
    Streaming(IntoIter<KeyValueRecord>),
    Done,
}

/// Streaming source over the solutions of one endpoint query
pub struct SparqlSource {
    endpoint: String,
    query: String,
    format: SparqlResultFormat,
    results: Results,
}

impl SparqlSource {
    /// Bind a validated query to an endpoint.
    ///
    /// The query must be a single `SELECT` with an explicit projection and
    /// no duplicate projected variables; anything else is `Validation`.
    /// Nothing is fetched until the first pull.
    pub fn new(
        endpoint: impl Into<String>,
        query: impl Into<String>,
        format: SparqlResultFormat,
    ) -> RmlResult<Self> {
        let query = query.into();
        validate_query(&query)?;
        Ok(Self {
            endpoint: endpoint.into(),
            query,
            format,
            results: Results::Pending,
        })
    }

    /// Parse an already-fetched result document, for tests and page adapters
    pub fn parse_results(body: &str, format: SparqlResultFormat) -> RmlResult<Vec<KeyValueRecord>> {
        match format {
            SparqlResultFormat::Json => parse_json_results(body),
            SparqlResultFormat::Xml => parse_xml_results(body),
        }
    }

    fn fetch(&self) -> RmlResult<Vec<KeyValueRecord>> {
        let client = reqwest::blocking::Client::new();
        let response = client
            .get(&self.endpoint)
            .query(&[("query", self.query.as_str())])
            .header(reqwest::header::ACCEPT, self.format.accept())
            .send()
            .map_err(|e| {
                RmlError::ResourceUnavailable(format!("endpoint {} unreachable: {e}", self.endpoint))
            })?;
        if !response.status().is_success() {
            return Err(RmlError::ResourceUnavailable(format!(
                "endpoint {} answered {}",
                self.endpoint,
                response.status()
            )));
        }
        let body = response.text().map_err(|e| {
            RmlError::ResourceUnavailable(format!("failed reading endpoint response: {e}"))
        })?;
        let bindings = Self::parse_results(&body, self.format)?;
        debug!(endpoint = %self.endpoint, solutions = bindings.len(), "sparql results fetched");
        Ok(bindings)
    }
}

impl LogicalSource for SparqlSource {
    fn next_record(&mut self) -> RmlResult<Option<DataRecord>> {
        if matches!(self.results, Results::Pending) {
            match self.fetch() {
                Ok(bindings) => self.results = Results::Streaming(bindings.into_iter()),
                Err(e) => {
                    // A failed fetch is fatal and never retried.
                    self.results = Results::Done;
                    return Err(e);
                }
            }
        }
        match &mut self.results {
            Results::Streaming(iter) => match iter.next() {
                Some(record) => Ok(Some(DataRecord::Row(record))),
                None => {
                    self.results = Results::Done;
                    Ok(None)
                }
            },
            _ => Ok(None),
        }
    }

    fn formulation(&self) -> ReferenceFormulation {
        ReferenceFormulation::KeyValue
    }
}

/// Reject anything but a single explicit-projection SELECT
fn validate_query(query: &str) -> RmlResult<()> {
    if !SELECT_QUERY_RE.is_match(query) {
        return Err(RmlError::Validation(
            "endpoint query must be a single SELECT".to_string(),
        ));
    }
    let projection = PROJECTION_RE
        .captures(query)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .ok_or_else(|| {
            RmlError::Validation("endpoint query has no projection clause".to_string())
        })?;
    if projection == "*" {
        return Err(RmlError::Validation(
            "endpoint query must project variables explicitly, not SELECT *".to_string(),
        ));
    }

    // Aliased projections bind the variable after AS; the expression's own
    // variables are not projected.
    let mut names: Vec<String> = ALIAS_RE
        .captures_iter(&projection)
        .map(|c| c[1].to_string())
        .collect();
    let without_aliases = ALIAS_RE.replace_all(&projection, " ");
    names.extend(
        VARIABLE_RE
            .captures_iter(&without_aliases)
            .map(|c| c[1].to_string()),
    );

    if names.is_empty() {
        return Err(RmlError::Validation(
            "endpoint query projects no variables".to_string(),
        ));
    }
    let mut seen = Vec::new();
    for name in names {
        if seen.contains(&name) {
            return Err(RmlError::Validation(format!(
                "duplicate projected variable ?{name}"
            )));
        }
        seen.push(name);
    }
    Ok(())
}

fn parse_json_results(body: &str) -> RmlResult<Vec<KeyValueRecord>> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| RmlError::Validation(format!("malformed result JSON: {e}")))?;
    let Some(solutions) = document["results"]["bindings"].as_array() else {
        return Err(RmlError::Validation(
            "result JSON has no results.bindings array".to_string(),
        ));
    };

    let mut records = Vec::with_capacity(solutions.len());
    for solution in solutions {
        let Value::Object(cells) = solution else {
            return Err(RmlError::Validation(format!(
                "result binding must be an object, got {solution}"
            )));
        };
        let mut record = KeyValueRecord::new();
        for (variable, cell) in cells {
            let Some(value) = cell["value"].as_str() else {
                return Err(RmlError::Validation(format!(
                    "binding for ?{variable} has no value"
                )));
            };
            let rendered = match cell["type"].as_str() {
                Some("bnode") => format!("_:{value}"),
                _ => value.to_string(),
            };
            record.insert(variable.clone(), Some(rendered));
        }
        records.push(record);
    }
    Ok(records)
}

fn parse_xml_results(body: &str) -> RmlResult<Vec<KeyValueRecord>> {
    let root = parse_document(body)?;
    let sparql = root
        .children
        .iter()
        .find(|c| c.name == "sparql")
        .ok_or_else(|| {
            RmlError::Validation("result XML has no <sparql> document element".to_string())
        })?;
    let Some(results) = sparql.children_named("results").next() else {
        return Err(RmlError::Validation(
            "result XML has no <results> element".to_string(),
        ));
    };

    let mut records = Vec::new();
    for result in results.children_named("result") {
        let mut record = KeyValueRecord::new();
        for cell in result.children_named("binding") {
            let Some(variable) = cell.attribute("name") else {
                return Err(RmlError::Validation(
                    "<binding> without a name attribute".to_string(),
                ));
            };
            let Some(term) = cell.children.first() else {
                return Err(RmlError::Validation(format!(
                    "<binding name=\"{variable}\"> has no term element"
                )));
            };
            let rendered = match term.name.as_str() {
                "bnode" => format!("_:{}", term.text),
                "uri" | "literal" => term.text.clone(),
                other => {
                    return Err(RmlError::Validation(format!(
                        "unknown term element <{other}> in result XML"
                    )))
                }
            };
            record.insert(variable.to_string(), Some(rendered));
        }
        records.push(record);
    }
    Ok(records)
}
