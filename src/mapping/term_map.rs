//! Term maps
//!
//! Term maps define how RDF terms are generated from record data. Every map
//! is a [`TermMap`] core ({expression, kind, formulation, term type, optional
//! language/datatype}); the Subject/Predicate/Object wrappers add the
//! position-specific rules: predicates are constant-only, subjects must not
//! be literals, and only objects carry language tags or datatypes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Resolved, RmlError, RmlResult};
use crate::formulation::ReferenceFormulation;
use crate::record::DataRecord;
use crate::resolver::resolve_reference;
use crate::term::RdfTerm;
use crate::vocab::RR;

/// How a term map derives its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermKind {
    /// Fixed value; no record access
    Constant,
    /// String template with `{reference}` placeholders
    Template,
    /// Single reference expression
    Reference,
}

/// What kind of RDF term a map emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TermType {
    /// Generate an IRI (default for subject and predicate maps)
    #[default]
    Iri,
    /// Generate a blank node
    BlankNode,
    /// Generate a literal (objects only)
    Literal,
}

impl TermType {
    /// Parse term type from its R2RML IRI
    pub fn from_iri(iri: &str) -> Option<Self> {
        match iri {
            RR::IRI => Some(TermType::Iri),
            RR::BLANK_NODE => Some(TermType::BlankNode),
            RR::LITERAL => Some(TermType::Literal),
            _ => None,
        }
    }
}

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]+?)\}").expect("valid regex"));

static LANGUAGE_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{1,8}(-[A-Za-z0-9]{1,8})*$").expect("valid regex"));

/// Extract the placeholder references of a template, in order of appearance
pub fn extract_placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER_RE
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// IRI-escape a string value for substitution into an IRI template.
///
/// Escapes characters that are not allowed in IRI path segments per RFC 3987.
pub fn iri_escape(value: &str) -> String {
    let mut result = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' | '_' | '~' => result.push(c),
            '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '=' => result.push(c),
            ':' | '@' => result.push(c),
            ' ' => result.push_str("%20"),
            _ => {
                for byte in c.to_string().as_bytes() {
                    result.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }

    result
}

/// One term map: expression + kind + formulation + emit shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermMap {
    /// Constant value, template string, or reference expression per `kind`
    pub expression: String,
    /// How the value is derived
    pub kind: TermKind,
    /// Reference dialect for `Template`/`Reference` kinds
    pub formulation: ReferenceFormulation,
    /// Kind of RDF term emitted
    pub term_type: TermType,
    /// Language tag for language-tagged literal objects
    pub language: Option<String>,
    /// Datatype IRI for typed literal objects
    pub datatype: Option<String>,
}

impl TermMap {
    /// Create a constant term map
    pub fn constant(expression: impl Into<String>, term_type: TermType) -> Self {
        Self {
            expression: expression.into(),
            kind: TermKind::Constant,
            // Constants never touch the record; the formulation is inert.
            formulation: ReferenceFormulation::KeyValue,
            term_type,
            language: None,
            datatype: None,
        }
    }

    /// Create a template term map
    pub fn template(
        expression: impl Into<String>,
        formulation: ReferenceFormulation,
        term_type: TermType,
    ) -> Self {
        Self {
            expression: expression.into(),
            kind: TermKind::Template,
            formulation,
            term_type,
            language: None,
            datatype: None,
        }
    }

    /// Create a reference term map
    pub fn reference(
        expression: impl Into<String>,
        formulation: ReferenceFormulation,
        term_type: TermType,
    ) -> Self {
        Self {
            expression: expression.into(),
            kind: TermKind::Reference,
            formulation,
            term_type,
            language: None,
            datatype: None,
        }
    }

    /// Set the language tag
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the datatype IRI
    pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = Some(datatype.into());
        self
    }

    /// Resolve this map against a record.
    ///
    /// Soft misses from the underlying references propagate as
    /// [`Resolved::NotFound`] for the caller to interpret; everything else
    /// that goes wrong is a hard error.
    pub fn resolve(&self, record: &DataRecord) -> RmlResult<Resolved<RdfTerm>> {
        self.check_literal_shape()?;

        match self.kind {
            TermKind::Constant => Ok(Resolved::Found(self.wrap(self.expression.clone()))),
            TermKind::Reference => {
                resolve_reference(&self.expression, record, self.formulation)?
                    .try_map(|value| Ok(self.wrap(value)))
            }
            TermKind::Template => self
                .expand_template(record)?
                .try_map(|value| Ok(self.wrap(value))),
        }
    }

    /// Expand the template expression against a record.
    ///
    /// Placeholder values are percent-encoded only when the emitted term is
    /// an IRI; literal-bound substitutions are verbatim. A soft miss on any
    /// placeholder makes the whole template a soft miss.
    fn expand_template(&self, record: &DataRecord) -> RmlResult<Resolved<String>> {
        let placeholders = extract_placeholders(&self.expression);
        if placeholders.is_empty() {
            return Err(RmlError::EmptyTemplate(self.expression.clone()));
        }

        let escape = self.term_type == TermType::Iri;
        let mut result = self.expression.clone();

        for reference in &placeholders {
            let value = match resolve_reference(reference, record, self.formulation)? {
                Resolved::Found(v) => v,
                Resolved::NotFound => return Ok(Resolved::NotFound),
            };
            let substituted = if escape { iri_escape(&value) } else { value };
            result = result.replace(&format!("{{{reference}}}"), &substituted);
        }

        Ok(Resolved::Found(result))
    }

    fn wrap(&self, value: String) -> RdfTerm {
        match self.term_type {
            TermType::Iri => RdfTerm::Iri(value),
            TermType::BlankNode => RdfTerm::BlankNode(value),
            TermType::Literal => {
                if let Some(ref lang) = self.language {
                    RdfTerm::lang_string(value, lang.clone())
                } else {
                    RdfTerm::Literal {
                        value,
                        datatype: self.datatype.clone(),
                        language: None,
                    }
                }
            }
        }
    }

    fn check_literal_shape(&self) -> RmlResult<()> {
        if self.language.is_some() && self.datatype.is_some() {
            return Err(RmlError::Configuration(format!(
                "term map `{}` sets both a language tag and a datatype",
                self.expression
            )));
        }
        if let Some(ref lang) = self.language {
            if !LANGUAGE_TAG_RE.is_match(lang) {
                return Err(RmlError::Configuration(format!(
                    "invalid language tag `{lang}`"
                )));
            }
        }
        Ok(())
    }
}

/// Subject map: IRI or blank node per record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectMap {
    pub term_map: TermMap,
}

impl SubjectMap {
    /// Wrap a term map as a subject map
    pub fn new(term_map: TermMap) -> Self {
        Self { term_map }
    }

    /// Resolve the subject for a record.
    ///
    /// RDF disallows literal subjects, so a literal-emitting subject map is
    /// a hard error at resolve time.
    pub fn resolve(&self, record: &DataRecord) -> RmlResult<Resolved<RdfTerm>> {
        if self.term_map.term_type == TermType::Literal {
            return Err(RmlError::Validation(format!(
                "subject map `{}` would emit a literal subject",
                self.term_map.expression
            )));
        }
        self.term_map.resolve(record)
    }
}

/// Predicate map: constant IRIs only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateMap {
    pub term_map: TermMap,
}

impl PredicateMap {
    /// Create a constant predicate map
    pub fn constant(iri: impl Into<String>) -> Self {
        Self {
            term_map: TermMap::constant(iri, TermType::Iri),
        }
    }

    /// Resolve the predicate for a record.
    ///
    /// Any non-constant kind is rejected here rather than at construction so
    /// that deserialized maps get the same treatment as built ones.
    pub fn resolve(&self, record: &DataRecord) -> RmlResult<Resolved<RdfTerm>> {
        if self.term_map.kind != TermKind::Constant {
            return Err(RmlError::UnsupportedTermKind(format!(
                "predicate map `{}` must be constant",
                self.term_map.expression
            )));
        }
        self.term_map.resolve(record)
    }
}

/// Object map: any kind, any term type, with literal shaping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMap {
    pub term_map: TermMap,
}

impl ObjectMap {
    /// Wrap a term map as an object map
    pub fn new(term_map: TermMap) -> Self {
        Self { term_map }
    }

    /// Resolve the object for a record
    pub fn resolve(&self, record: &DataRecord) -> RmlResult<Resolved<RdfTerm>> {
        self.term_map.resolve(record)
    }
}

/// A predicate-object pair with an optional named graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateObjectMap {
    pub predicate_map: PredicateMap,
    pub object_map: ObjectMap,
    /// Named graph IRI; `None` targets the default graph
    pub graph: Option<String>,
}

impl PredicateObjectMap {
    /// Create a pair targeting the default graph
    pub fn new(predicate_map: PredicateMap, object_map: ObjectMap) -> Self {
        Self {
            predicate_map,
            object_map,
            graph: None,
        }
    }

    /// Attach a named graph
    pub fn with_graph(mut self, graph: impl Into<String>) -> Self {
        self.graph = Some(graph.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KeyValueRecord;
    use serde_json::json;

    fn row(pairs: &[(&str, Option<&str>)]) -> DataRecord {
        DataRecord::Row(KeyValueRecord::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                .collect(),
        ))
    }

    #[test]
    fn test_constant_ignores_record() {
        let tm = TermMap::constant("http://example.com/Person", TermType::Iri);
        let a = tm.resolve(&row(&[("id", Some("1"))])).unwrap();
        let b = tm.resolve(&row(&[("other", Some("x"))])).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.found(),
            Some(RdfTerm::iri("http://example.com/Person"))
        );
    }

    #[test]
    fn test_reference_with_datatype() {
        let tm = TermMap::reference("age", ReferenceFormulation::Tabular, TermType::Literal)
            .with_datatype("http://www.w3.org/2001/XMLSchema#integer");
        let term = tm.resolve(&row(&[("age", Some("62"))])).unwrap();
        assert_eq!(
            term.found(),
            Some(RdfTerm::typed(
                "62",
                "http://www.w3.org/2001/XMLSchema#integer"
            ))
        );
    }

    #[test]
    fn test_reference_with_language() {
        let tm = TermMap::reference("label", ReferenceFormulation::KeyValue, TermType::Literal)
            .with_language("en-US");
        let term = tm.resolve(&row(&[("label", Some("cat"))])).unwrap();
        assert_eq!(term.found(), Some(RdfTerm::lang_string("cat", "en-US")));
    }

    #[test]
    fn test_language_and_datatype_exclusive() {
        let tm = TermMap::reference("label", ReferenceFormulation::KeyValue, TermType::Literal)
            .with_language("en")
            .with_datatype("http://www.w3.org/2001/XMLSchema#string");
        assert!(matches!(
            tm.resolve(&row(&[("label", Some("cat"))])),
            Err(RmlError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_language_tag() {
        let tm = TermMap::reference("label", ReferenceFormulation::KeyValue, TermType::Literal)
            .with_language("not a tag");
        assert!(matches!(
            tm.resolve(&row(&[("label", Some("cat"))])),
            Err(RmlError::Configuration(_))
        ));
    }

    #[test]
    fn test_template_round_trip() {
        let tm = TermMap::template(
            "http://example.com/{id}",
            ReferenceFormulation::KeyValue,
            TermType::Iri,
        );
        let record = row(&[("id", Some("7"))]);
        let first = tm.resolve(&record).unwrap().found();
        assert_eq!(first, Some(RdfTerm::iri("http://example.com/7")));
        // Re-resolving against the same record is deterministic.
        assert_eq!(tm.resolve(&record).unwrap().found(), first);
    }

    #[test]
    fn test_template_escapes_only_for_iris() {
        let record = row(&[("name", Some("hello world"))]);

        let iri = TermMap::template(
            "http://example.com/{name}",
            ReferenceFormulation::KeyValue,
            TermType::Iri,
        );
        assert_eq!(
            iri.resolve(&record).unwrap().found(),
            Some(RdfTerm::iri("http://example.com/hello%20world"))
        );

        let lit = TermMap::template(
            "greetings, {name}",
            ReferenceFormulation::KeyValue,
            TermType::Literal,
        );
        assert_eq!(
            lit.resolve(&record).unwrap().found(),
            Some(RdfTerm::string("greetings, hello world"))
        );
    }

    #[test]
    fn test_empty_template_is_hard() {
        let tm = TermMap::template(
            "http://example.com/",
            ReferenceFormulation::KeyValue,
            TermType::Iri,
        );
        assert!(matches!(
            tm.resolve(&row(&[("id", Some("7"))])),
            Err(RmlError::EmptyTemplate(_))
        ));
    }

    #[test]
    fn test_template_soft_miss_propagates() {
        let tm = TermMap::template(
            "http://example.com/{id}/{name}",
            ReferenceFormulation::KeyValue,
            TermType::Iri,
        );
        let out = tm.resolve(&row(&[("id", Some("7"))])).unwrap();
        assert!(out.is_not_found());
    }

    #[test]
    fn test_template_over_json_record() {
        let tm = TermMap::template(
            "http://example.com/{$.id}",
            ReferenceFormulation::JsonPath,
            TermType::Iri,
        );
        let record = DataRecord::Json(json!({"id": 7}));
        assert_eq!(
            tm.resolve(&record).unwrap().found(),
            Some(RdfTerm::iri("http://example.com/7"))
        );
    }

    #[test]
    fn test_predicate_map_rejects_non_constant() {
        let pm = PredicateMap {
            term_map: TermMap::reference("p", ReferenceFormulation::KeyValue, TermType::Iri),
        };
        assert!(matches!(
            pm.resolve(&row(&[("p", Some("x"))])),
            Err(RmlError::UnsupportedTermKind(_))
        ));
    }

    #[test]
    fn test_subject_map_rejects_literal() {
        let sm = SubjectMap::new(TermMap::reference(
            "id",
            ReferenceFormulation::KeyValue,
            TermType::Literal,
        ));
        assert!(matches!(
            sm.resolve(&row(&[("id", Some("1"))])),
            Err(RmlError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_node_subject() {
        let sm = SubjectMap::new(TermMap::template(
            "person{id}",
            ReferenceFormulation::KeyValue,
            TermType::BlankNode,
        ));
        assert_eq!(
            sm.resolve(&row(&[("id", Some("1"))])).unwrap().found(),
            Some(RdfTerm::blank_node("person1"))
        );
    }

    #[test]
    fn test_extract_placeholders_non_greedy() {
        assert_eq!(
            extract_placeholders("http://example.com/{a}/{b}"),
            vec!["a", "b"]
        );
        assert!(extract_placeholders("http://example.com/").is_empty());
    }

    #[test]
    fn test_iri_escape() {
        assert_eq!(iri_escape("simple"), "simple");
        assert_eq!(iri_escape("with space"), "with%20space");
        assert_eq!(iri_escape("test/path"), "test%2Fpath");
        assert_eq!(iri_escape("你好"), "%E4%BD%A0%E5%A5%BD");
    }
}
