//! DCAT-addressed remote resource source
//!
//! Fetches one dataset distribution over HTTP into a transient local copy,
//! then dispatches to the file source matching the declared payload kind.
//! The copy is deleted exactly once: on exhaustion, on a hard error, or on
//! drop when the consumer abandons the source early.

use std::io::Write;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{RmlError, RmlResult};
use crate::formulation::ReferenceFormulation;
use crate::record::DataRecord;
use crate::source::{
    CsvDialect, DelimitedSource, JsonSource, LogicalSource, RdfGraphSource, RdfSyntax, XmlSource,
};

/// What the downloaded payload contains and how to iterate it
#[derive(Debug, Clone)]
pub enum PayloadKind {
    Delimited(CsvDialect),
    Json { iterator: String },
    Xml { iterator: String },
    Rdf(RdfSyntax),
}

/// Streaming source over one downloaded distribution
pub struct DcatSource {
    inner: Box<dyn LogicalSource>,
    formulation: ReferenceFormulation,
    /// Deleting the temp file is tied to dropping this handle
    download: Option<NamedTempFile>,
}

impl DcatSource {
    /// Download a distribution and open it as the declared payload kind.
    ///
    /// Any fetch or download-write failure is `ResourceUnavailable`; the
    /// payload itself is then validated by the dispatched file source.
    pub fn open(url: &str, kind: PayloadKind) -> RmlResult<Self> {
        let response = reqwest::blocking::get(url).map_err(|e| {
            RmlError::ResourceUnavailable(format!("distribution {url} unreachable: {e}"))
        })?;
        if !response.status().is_success() {
            return Err(RmlError::ResourceUnavailable(format!(
                "distribution {url} answered {}",
                response.status()
            )));
        }
        let payload = response.bytes().map_err(|e| {
            RmlError::ResourceUnavailable(format!("failed reading distribution {url}: {e}"))
        })?;
        debug!(url, bytes = payload.len(), "dcat distribution downloaded");
        Self::from_payload(&payload, kind)
    }

    /// Open an already-fetched payload through a transient local copy
    pub fn from_payload(payload: &[u8], kind: PayloadKind) -> RmlResult<Self> {
        let mut download = NamedTempFile::new().map_err(|e| {
            RmlError::ResourceUnavailable(format!("cannot create transient copy: {e}"))
        })?;
        download.write_all(payload).map_err(|e| {
            RmlError::ResourceUnavailable(format!("cannot write transient copy: {e}"))
        })?;

        let path = download.path();
        let inner: Box<dyn LogicalSource> = match kind {
            PayloadKind::Delimited(dialect) => Box::new(DelimitedSource::open(path, dialect)?),
            PayloadKind::Json { iterator } => Box::new(JsonSource::open(path, &iterator)?),
            PayloadKind::Xml { iterator } => Box::new(XmlSource::open(path, &iterator)?),
            PayloadKind::Rdf(syntax) => Box::new(RdfGraphSource::open(path, syntax)?),
        };
        Ok(Self {
            formulation: inner.formulation(),
            inner,
            download: Some(download),
        })
    }

    fn release(&mut self) {
        if let Some(download) = self.download.take() {
            debug!(path = %download.path().display(), "transient copy released");
        }
    }
}

impl LogicalSource for DcatSource {
    fn next_record(&mut self) -> RmlResult<Option<DataRecord>> {
        match self.inner.next_record() {
            Ok(Some(record)) => Ok(Some(record)),
            Ok(None) => {
                self.release();
                Ok(None)
            }
            Err(e) => {
                self.release();
                Err(e)
            }
        }
    }

    fn formulation(&self) -> ReferenceFormulation {
        self.formulation
    }
}
