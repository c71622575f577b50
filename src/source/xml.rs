//! XML document source
//!
//! Parses the whole document into an owned [`XmlNode`] tree with `quick-xml`,
//! evaluates the declared iterator path against it, and streams the matched
//! elements as records.

use std::fs;
use std::path::Path;
use std::vec::IntoIter;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::error::{RmlError, RmlResult};
use crate::formulation::ReferenceFormulation;
use crate::record::{DataRecord, XmlNode};
use crate::resolver::xml_path;
use crate::source::LogicalSource;

/// Streaming source over the iterator matches of one XML document
pub struct XmlSource {
    matches: IntoIter<XmlNode>,
}

impl XmlSource {
    /// Open an XML file and evaluate the iterator path.
    ///
    /// An unreadable path is `ResourceUnavailable`, malformed markup is
    /// `Validation`, and a malformed iterator path is `InvalidReference`.
    pub fn open(path: impl AsRef<Path>, iterator: &str) -> RmlResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            RmlError::ResourceUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        let source = Self::from_str(&text, iterator)?;
        debug!(path = %path.display(), matches = source.matches.len(), "xml source opened");
        Ok(source)
    }

    /// Evaluate the iterator against in-memory XML text
    pub fn from_str(text: &str, iterator: &str) -> RmlResult<Self> {
        let root = parse_document(text)?;
        let matches = xml_path::select_nodes(iterator, &root)?;
        Ok(Self {
            matches: matches.into_iter(),
        })
    }
}

impl LogicalSource for XmlSource {
    fn next_record(&mut self) -> RmlResult<Option<DataRecord>> {
        Ok(self.matches.next().map(DataRecord::Xml))
    }

    fn formulation(&self) -> ReferenceFormulation {
        ReferenceFormulation::XPath
    }
}

fn node_from_start(start: &BytesStart<'_>) -> RmlResult<XmlNode> {
    let mut node = XmlNode::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| RmlError::Validation(format!("malformed attribute: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| RmlError::Validation(format!("malformed attribute value: {e}")))?
            .into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

/// Parse a document into an owned tree under a synthetic root node.
///
/// The synthetic root lets absolute iterator paths name the document element
/// as their first step.
pub(crate) fn parse_document(text: &str) -> RmlResult<XmlNode> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    // The synthetic document root sits at the bottom of the stack.
    let mut stack = vec![XmlNode::new("")];
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(node_from_start(&start)?),
            Ok(Event::Empty(start)) => {
                let node = node_from_start(&start)?;
                // Stack is never empty; the synthetic root is not popped.
                stack.last_mut().unwrap().children.push(node);
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err(RmlError::Validation(
                        "unbalanced closing tag".to_string(),
                    ));
                }
                let node = stack.pop().unwrap();
                stack.last_mut().unwrap().children.push(node);
            }
            Ok(Event::Text(text)) => {
                let chunk = text
                    .unescape()
                    .map_err(|e| RmlError::Validation(format!("malformed text: {e}")))?;
                stack.last_mut().unwrap().text.push_str(chunk.trim());
            }
            Ok(Event::CData(cdata)) => {
                let chunk = String::from_utf8_lossy(&cdata).into_owned();
                stack.last_mut().unwrap().text.push_str(&chunk);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(RmlError::Validation(format!("malformed XML: {e}"))),
        }
    }

    if stack.len() != 1 {
        return Err(RmlError::Validation("unclosed element".to_string()));
    }
    Ok(stack.pop().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DOC: &str = r#"<students>
        <student id="1"><name>Ann</name></student>
        <student id="2"><name>Bob</name></student>
    </students>"#;

    #[test]
    fn test_streams_iterator_matches() {
        let f = {
            let mut f = NamedTempFile::new().unwrap();
            f.write_all(DOC.as_bytes()).unwrap();
            f
        };
        let mut source = XmlSource::open(f.path(), "/students/student").unwrap();

        let first = source.next_record().unwrap().unwrap();
        match first {
            DataRecord::Xml(node) => {
                assert_eq!(node.attribute("id"), Some("1"));
                assert_eq!(node.children_named("name").next().unwrap().text, "Ann");
            }
            other => panic!("expected xml record, got {other:?}"),
        }
        assert!(source.next_record().unwrap().is_some());
        assert!(source.next_record().unwrap().is_none());
        assert!(source.next_record().unwrap().is_none());
    }

    #[test]
    fn test_zero_matches_is_exhausted() {
        let mut source = XmlSource::from_str(DOC, "/students/teacher").unwrap();
        assert!(source.next_record().unwrap().is_none());
    }

    #[test]
    fn test_malformed_markup_is_validation() {
        let err = XmlSource::from_str("<a><b></a>", "/a").err().unwrap();
        assert!(matches!(err, RmlError::Validation(_)));
    }

    #[test]
    fn test_missing_file_is_resource_unavailable() {
        let err = XmlSource::open("/no/such/file.xml", "/a").err().unwrap();
        assert!(matches!(err, RmlError::ResourceUnavailable(_)));
    }

    #[test]
    fn test_self_closing_and_entities() {
        let root = parse_document(r#"<r><e flag="a&amp;b"/>x &lt; y</r>"#).unwrap();
        let r = &root.children[0];
        assert_eq!(r.children[0].attribute("flag"), Some("a&b"));
        assert_eq!(r.text, "x < y");
    }
}
