//! Hierarchical-path expressions over XML trees
//!
//! Slash-separated steps evaluated relative to the record node: `a/b`,
//! `a[2]/b` (1-based positional filter), `*` wildcards, with a terminal
//! `@attr` or `text()` selecting an attribute value or text content.
//! A leading `/` addresses the document from its synthetic root, which is
//! how iterator expressions are written. Malformed expressions are hard
//! errors; empty matches are soft.

use crate::error::{Resolved, RmlError, RmlResult};
use crate::record::XmlNode;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    /// Element step with optional 1-based positional filter
    Element { name: String, index: Option<usize> },
    /// Terminal attribute selection
    Attribute(String),
    /// Terminal text() selection
    Text,
}

fn parse_path(path: &str) -> RmlResult<Vec<Step>> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(RmlError::InvalidReference(
            "empty hierarchical path".to_string(),
        ));
    }

    // A leading slash only anchors the walk; both forms produce the same steps.
    let body = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let mut steps = Vec::new();
    let raw_steps: Vec<&str> = body.split('/').collect();

    for (pos, raw) in raw_steps.iter().enumerate() {
        let raw = raw.trim();
        let last = pos == raw_steps.len() - 1;
        if raw.is_empty() {
            return Err(RmlError::InvalidReference(format!(
                "empty step in path `{path}`"
            )));
        }

        if let Some(attr) = raw.strip_prefix('@') {
            if !last || attr.is_empty() {
                return Err(RmlError::InvalidReference(format!(
                    "attribute step must terminate the path `{path}`"
                )));
            }
            steps.push(Step::Attribute(attr.to_string()));
        } else if raw == "text()" {
            if !last {
                return Err(RmlError::InvalidReference(format!(
                    "text() must terminate the path `{path}`"
                )));
            }
            steps.push(Step::Text);
        } else {
            let (name, index) = parse_positional(raw, path)?;
            steps.push(Step::Element {
                name: name.to_string(),
                index,
            });
        }
    }

    Ok(steps)
}

fn parse_positional<'a>(raw: &'a str, path: &str) -> RmlResult<(&'a str, Option<usize>)> {
    let Some(open) = raw.find('[') else {
        return Ok((raw, None));
    };
    let close = raw.strip_suffix(']').map(|s| &s[open + 1..]).ok_or_else(|| {
        RmlError::InvalidReference(format!("missing `]` in path `{path}`"))
    })?;
    let index = close.trim().parse::<usize>().map_err(|_| {
        RmlError::InvalidReference(format!("invalid position `{close}` in path `{path}`"))
    })?;
    if index == 0 {
        return Err(RmlError::InvalidReference(format!(
            "positions are 1-based in path `{path}`"
        )));
    }
    Ok((&raw[..open], Some(index)))
}

/// Walk element steps, returning matched nodes in document order.
/// Terminal `@attr`/`text()` steps are handled by the callers.
fn select<'a>(root: &'a XmlNode, steps: &[Step]) -> Vec<&'a XmlNode> {
    let mut frontier = vec![root];

    for step in steps {
        let Step::Element { name, index } = step else {
            break;
        };
        let mut next = Vec::new();
        for parent in frontier {
            let matched: Vec<&XmlNode> = parent
                .children
                .iter()
                .filter(|c| name == "*" || c.name == *name)
                .collect();
            match index {
                Some(i) => {
                    if let Some(node) = matched.get(i - 1) {
                        next.push(*node);
                    }
                }
                None => next.extend(matched),
            }
        }
        frontier = next;
        if frontier.is_empty() {
            break;
        }
    }

    frontier
}

/// Resolve a hierarchical-path reference to a scalar.
///
/// Multi-valued matches take the first node in document order; an element
/// with no text, a missing attribute, and zero matched nodes are all soft
/// misses.
pub fn resolve_scalar(expression: &str, node: &XmlNode) -> RmlResult<Resolved<String>> {
    let steps = parse_path(expression)?;
    let terminal = steps.last().cloned();
    let element_steps: &[Step] = match terminal {
        Some(Step::Attribute(_)) | Some(Step::Text) => &steps[..steps.len() - 1],
        _ => &steps,
    };

    let matches = select(node, element_steps);
    let Some(first) = matches.first() else {
        return Ok(Resolved::NotFound);
    };

    let value = match terminal {
        Some(Step::Attribute(name)) => first.attribute(&name).map(str::to_string),
        _ => Some(first.text.clone()),
    };

    match value {
        Some(v) if !v.is_empty() => Ok(Resolved::Found(v)),
        _ => Ok(Resolved::NotFound),
    }
}

/// Collect the matches of an iterator expression as owned nodes
pub fn select_nodes(expression: &str, root: &XmlNode) -> RmlResult<Vec<XmlNode>> {
    let steps = parse_path(expression)?;
    if steps
        .iter()
        .any(|s| matches!(s, Step::Attribute(_) | Step::Text))
    {
        return Err(RmlError::InvalidReference(format!(
            "iterator expression `{expression}` must select elements"
        )));
    }
    Ok(select(root, &steps).into_iter().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> XmlNode {
        // <students>
        //   <student id="1"><name>Ann</name></student>
        //   <student id="2"><name>Bob</name><note/></student>
        // </students>
        let mut ann = XmlNode::new("student");
        ann.attributes.push(("id".to_string(), "1".to_string()));
        let mut ann_name = XmlNode::new("name");
        ann_name.text = "Ann".to_string();
        ann.children.push(ann_name);

        let mut bob = XmlNode::new("student");
        bob.attributes.push(("id".to_string(), "2".to_string()));
        let mut bob_name = XmlNode::new("name");
        bob_name.text = "Bob".to_string();
        bob.children.push(bob_name);
        bob.children.push(XmlNode::new("note"));

        let mut students = XmlNode::new("students");
        students.children.push(ann);
        students.children.push(bob);

        let mut root = XmlNode::new("");
        root.children.push(students);
        root
    }

    #[test]
    fn test_select_nodes_iterator() {
        let root = sample_tree();
        let nodes = select_nodes("/students/student", &root).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].attribute("id"), Some("1"));
    }

    #[test]
    fn test_resolve_child_text_and_attribute() {
        let root = sample_tree();
        let student = &select_nodes("/students/student", &root).unwrap()[0];
        assert_eq!(
            resolve_scalar("name", student).unwrap(),
            Resolved::Found("Ann".to_string())
        );
        assert_eq!(
            resolve_scalar("name/text()", student).unwrap(),
            Resolved::Found("Ann".to_string())
        );
        assert_eq!(
            resolve_scalar("@id", student).unwrap(),
            Resolved::Found("1".to_string())
        );
    }

    #[test]
    fn test_positional_filter() {
        let root = sample_tree();
        assert_eq!(
            resolve_scalar("/students/student[2]/name", &root).unwrap(),
            Resolved::Found("Bob".to_string())
        );
        assert_eq!(
            resolve_scalar("/students/student[3]/name", &root).unwrap(),
            Resolved::NotFound
        );
    }

    #[test]
    fn test_empty_matches_are_soft() {
        let root = sample_tree();
        let students = select_nodes("/students/student", &root).unwrap();
        let bob = &students[1];
        // Absent element, absent attribute, and empty element text.
        assert_eq!(resolve_scalar("email", bob).unwrap(), Resolved::NotFound);
        assert_eq!(resolve_scalar("@class", bob).unwrap(), Resolved::NotFound);
        assert_eq!(resolve_scalar("note", bob).unwrap(), Resolved::NotFound);
    }

    #[test]
    fn test_malformed_paths_are_hard() {
        let root = sample_tree();
        for bad in ["", "a//b", "@id/name", "a[0]", "a[x]", "text()/a"] {
            assert!(
                matches!(
                    resolve_scalar(bad, &root),
                    Err(RmlError::InvalidReference(_))
                ),
                "expected hard error for `{bad}`"
            );
        }
    }

    #[test]
    fn test_wildcard_step() {
        let root = sample_tree();
        let names = select_nodes("/students/*/name", &root).unwrap();
        assert_eq!(names.len(), 2);
    }
}
