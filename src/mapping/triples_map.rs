//! Triples maps
//!
//! A [`TriplesMap`] drives one logical source, one subject map, and an
//! ordered list of predicate-object maps. Each `advance()` consumes exactly
//! one record and returns that record's triples. The map owns its source for
//! its whole lifetime and is single-pass; a caller wanting to re-run a
//! mapping constructs a fresh map over a fresh source.

use tracing::trace;

use crate::error::{Resolved, RmlResult};
use crate::source::LogicalSource;
use crate::term::Triple;

use super::term_map::{PredicateObjectMap, SubjectMap};

/// One mapping rule bound to its record stream
pub struct TriplesMap {
    /// Diagnostic label (typically the rule's IRI)
    name: String,
    source: Box<dyn LogicalSource>,
    subject_map: SubjectMap,
    predicate_object_maps: Vec<PredicateObjectMap>,
}

impl TriplesMap {
    /// Bind a mapping rule to a logical source
    pub fn new(
        name: impl Into<String>,
        source: Box<dyn LogicalSource>,
        subject_map: SubjectMap,
        predicate_object_maps: Vec<PredicateObjectMap>,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            subject_map,
            predicate_object_maps,
        }
    }

    /// Diagnostic label
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pull one record and materialize its triples.
    ///
    /// `Ok(None)` signals source exhaustion. A soft subject miss consumes the
    /// record and yields an empty batch; a soft miss on a predicate-object
    /// pair skips only that pair. Hard errors propagate and abort the map.
    pub fn advance(&mut self) -> RmlResult<Option<Vec<Triple>>> {
        let Some(record) = self.source.next_record()? else {
            return Ok(None);
        };

        let subject = match self.subject_map.resolve(&record)? {
            Resolved::Found(term) => term,
            Resolved::NotFound => {
                trace!(map = %self.name, "subject unresolved, record yields no triples");
                return Ok(Some(Vec::new()));
            }
        };

        let mut triples = Vec::with_capacity(self.predicate_object_maps.len());
        for pom in &self.predicate_object_maps {
            let predicate = pom.predicate_map.resolve(&record)?;
            let object = pom.object_map.resolve(&record)?;
            match (predicate, object) {
                (Resolved::Found(p), Resolved::Found(o)) => {
                    triples.push(Triple {
                        subject: subject.clone(),
                        predicate: p,
                        object: o,
                        graph: pom.graph.clone(),
                    });
                }
                _ => {
                    trace!(map = %self.name, "predicate-object pair unresolved, skipped");
                }
            }
        }

        Ok(Some(triples))
    }
}
