//! Logical sources
//!
//! One adapter per physical format, all behind [`LogicalSource`]: a lazy,
//! single-pass, non-restartable record stream. Exhaustion is `Ok(None)`;
//! after it, every later call must keep returning `Ok(None)`. Each source
//! owns its external resource (file handle, connection, temp download) and
//! releases it exactly once: on exhaustion, on an unrecovered hard error,
//! or through `Drop` when a consumer abandons the source early.

mod dcat;
mod delimited;
mod hydra;
mod json;
mod rdf;
mod sparql;
mod sql;
mod xml;

pub use dcat::{DcatSource, PayloadKind};
pub use delimited::{CsvDialect, DelimitedSource, Encoding, TrimMode};
pub use hydra::{HttpPageFetcher, HydraSource, PageFetcher};
pub use json::JsonSource;
pub use rdf::{RdfGraphSource, RdfSyntax};
pub use sparql::{SparqlResultFormat, SparqlSource};
pub use sql::SqlSource;
pub use xml::XmlSource;

use crate::error::RmlResult;
use crate::formulation::ReferenceFormulation;
use crate::record::DataRecord;

/// A normalized record stream over one physical or remote data source
pub trait LogicalSource {
    /// Pull the next record, or `Ok(None)` once the source is exhausted
    fn next_record(&mut self) -> RmlResult<Option<DataRecord>>;

    /// The reference formulation this source's records are addressed with
    fn formulation(&self) -> ReferenceFormulation;
}

/// In-memory source over pre-built records, for tests and adapters
pub struct VecSource {
    formulation: ReferenceFormulation,
    records: std::vec::IntoIter<DataRecord>,
}

impl VecSource {
    /// Wrap a batch of records as a source
    pub fn new(formulation: ReferenceFormulation, records: Vec<DataRecord>) -> Self {
        Self {
            formulation,
            records: records.into_iter(),
        }
    }
}

impl LogicalSource for VecSource {
    fn next_record(&mut self) -> RmlResult<Option<DataRecord>> {
        Ok(self.records.next())
    }

    fn formulation(&self) -> ReferenceFormulation {
        self.formulation
    }
}
