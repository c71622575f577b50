//! Data records
//!
//! A [`DataRecord`] is the opaque per-format carrier pulled from a logical
//! source: a JSON node for nested sources, an owned XML node for hierarchical
//! sources, and an ordered key-value row for flat sources. Only the reference
//! resolver interprets record contents.

use serde_json::Value;

/// Ordered key-value row with nullable cells.
///
/// Column order is preserved (it matters for deterministic diagnostics and
/// mirrors the physical column order of tabular sources). A cell holding
/// `None` is a present-but-null value, distinct from an absent key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueRecord {
    entries: Vec<(String, Option<String>)>,
}

impl KeyValueRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record from ordered `(key, value)` pairs
    pub fn from_pairs(pairs: Vec<(String, Option<String>)>) -> Self {
        Self { entries: pairs }
    }

    /// Append a key-value pair, preserving insertion order
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.entries.push((key.into(), value));
    }

    /// Look up a cell by key.
    ///
    /// `None` means the key is absent; `Some(None)` means the key is present
    /// with a null value.
    pub fn get(&self, key: &str) -> Option<&Option<String>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Check whether a key is present (even if its value is null)
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Iterate keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for an empty record
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Owned XML element node.
///
/// Built once per source from a `quick-xml` event stream; records and
/// reference resolution both operate on this owned tree, so no lifetimes
/// leak out of the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    /// Element name (local, prefix retained as written)
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Concatenated direct text content, trimmed
    pub text: String,
    /// Child elements in document order
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Create a node with the given element name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Look up an attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate child elements with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// One record pulled from a logical source
#[derive(Debug, Clone, PartialEq)]
pub enum DataRecord {
    /// Tree node from a nested JSON source
    Json(Value),
    /// Tree node from a hierarchical XML source
    Xml(XmlNode),
    /// Ordered key-value row from a flat source
    Row(KeyValueRecord),
}

impl DataRecord {
    /// Short carrier name for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            DataRecord::Json(_) => "JSON",
            DataRecord::Xml(_) => "XML",
            DataRecord::Row(_) => "row",
        }
    }
}
