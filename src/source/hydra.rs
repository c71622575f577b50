//! Hydra-paginated collection source
//!
//! Walks a paginated Web API collection page by page. Page handling is an
//! explicit state machine so the boundary rule is testable in isolation:
//! when a page runs dry and carries a forward link, the next page is fetched
//! and the pull is retried against it before anything is returned, so no
//! record is ever lost at a page boundary. A fetch failure is fatal and
//! never retried.

use std::collections::VecDeque;

use serde_json::Value;
use tracing::debug;

use crate::error::{RmlError, RmlResult};
use crate::formulation::ReferenceFormulation;
use crate::record::{DataRecord, KeyValueRecord};
use crate::resolver::json_path;
use crate::source::LogicalSource;

/// Fetches one collection page as a parsed JSON document
pub trait PageFetcher {
    fn fetch(&mut self, url: &str) -> RmlResult<Value>;
}

/// Fetcher backed by a blocking HTTP client
#[derive(Default)]
pub struct HttpPageFetcher {
    client: reqwest::blocking::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch(&mut self, url: &str) -> RmlResult<Value> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/ld+json, application/json")
            .send()
            .map_err(|e| RmlError::ResourceUnavailable(format!("page {url} unreachable: {e}")))?;
        if !response.status().is_success() {
            return Err(RmlError::ResourceUnavailable(format!(
                "page {url} answered {}",
                response.status()
            )));
        }
        response
            .json()
            .map_err(|e| RmlError::ResourceUnavailable(format!("failed reading page {url}: {e}")))
    }
}

struct Page {
    records: VecDeque<KeyValueRecord>,
    next: Option<String>,
}

enum PageState {
    Fetching(String),
    Streaming(Page),
    Done,
}

/// Streaming source over every member of a paginated collection
pub struct HydraSource {
    iterator: String,
    fetcher: Box<dyn PageFetcher>,
    state: PageState,
}

impl HydraSource {
    /// Start a walk at the collection's first page.
    ///
    /// `iterator` addresses the member nodes within one page document,
    /// e.g. `$['hydra:member'][*]`.
    pub fn new(
        first_page: impl Into<String>,
        iterator: impl Into<String>,
        fetcher: Box<dyn PageFetcher>,
    ) -> Self {
        Self {
            iterator: iterator.into(),
            fetcher,
            state: PageState::Fetching(first_page.into()),
        }
    }

    fn load_page(&mut self, url: &str) -> RmlResult<Page> {
        let document = self.fetcher.fetch(url)?;
        let members = json_path::select_nodes(&self.iterator, &document)?;
        let records = members
            .iter()
            .map(flatten_member)
            .collect::<RmlResult<VecDeque<_>>>()?;
        let next = forward_link(&document);
        debug!(url, members = records.len(), has_next = next.is_some(), "hydra page loaded");
        Ok(Page { records, next })
    }
}

impl LogicalSource for HydraSource {
    fn next_record(&mut self) -> RmlResult<Option<DataRecord>> {
        loop {
            match &mut self.state {
                PageState::Fetching(url) => {
                    let url = url.clone();
                    match self.load_page(&url) {
                        Ok(page) => self.state = PageState::Streaming(page),
                        Err(e) => {
                            self.state = PageState::Done;
                            return Err(e);
                        }
                    }
                }
                PageState::Streaming(page) => {
                    if let Some(record) = page.records.pop_front() {
                        return Ok(Some(DataRecord::Row(record)));
                    }
                    match page.next.take() {
                        // Retry against the new page before answering the
                        // caller.
                        Some(next) => self.state = PageState::Fetching(next),
                        None => {
                            self.state = PageState::Done;
                            return Ok(None);
                        }
                    }
                }
                PageState::Done => return Ok(None),
            }
        }
    }

    fn formulation(&self) -> ReferenceFormulation {
        ReferenceFormulation::KeyValue
    }
}

/// Flatten one member node into a key-value record.
///
/// Scalars keep their string form, JSON null becomes a null cell, and
/// nested structures are carried as compact JSON text.
fn flatten_member(node: &Value) -> RmlResult<KeyValueRecord> {
    let Value::Object(fields) = node else {
        return Err(RmlError::Validation(format!(
            "collection member must be an object, got {node}"
        )));
    };
    let mut record = KeyValueRecord::new();
    for (key, value) in fields {
        let cell = match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            nested => Some(nested.to_string()),
        };
        record.insert(key.clone(), cell);
    }
    Ok(record)
}

/// Locate the page's forward link under the well-known Hydra keys
fn forward_link(document: &Value) -> Option<String> {
    for key in ["hydra:next", "next"] {
        if let Some(url) = link_value(document.get(key)) {
            return Some(url);
        }
    }
    for view_key in ["hydra:view", "view"] {
        if let Some(view) = document.get(view_key) {
            for key in ["hydra:next", "next"] {
                if let Some(url) = link_value(view.get(key)) {
                    return Some(url);
                }
            }
        }
    }
    None
}

fn link_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(url) => Some(url.clone()),
        Value::Object(map) => match map.get("@id") {
            Some(Value::String(url)) => Some(url.clone()),
            _ => None,
        },
        _ => None,
    }
}
