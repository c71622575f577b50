//! Nested-path expressions over JSON documents
//!
//! A deliberately small dialect: `$` (current node), `.key`, `['quoted key']`,
//! `[n]` array indexing, and `[*]` wildcards. Dot segments containing literal
//! spaces are quoted before dispatch, so `$.first name` and `$['first name']`
//! address the same member. Malformed expressions are hard errors; empty or
//! null matches are soft.

use serde_json::Value;

use crate::error::{Resolved, RmlError, RmlResult};

/// One parsed path step
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
    Wild,
}

/// Wrap space-containing dot segments in bracket-quoted form.
///
/// Applied before parsing so the parser only ever sees quoted multi-word
/// member names. Bracketed portions are passed through untouched.
pub fn quote_spaced_segments(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;

    while !rest.is_empty() {
        if let Some(open) = rest.find('[') {
            let (head, tail) = rest.split_at(open);
            push_quoted_dots(head, &mut out);
            let close = match tail.find(']') {
                Some(c) => c,
                None => {
                    // Unbalanced bracket; let the parser report it.
                    out.push_str(tail);
                    return out;
                }
            };
            out.push_str(&tail[..=close]);
            rest = &tail[close + 1..];
        } else {
            push_quoted_dots(rest, &mut out);
            rest = "";
        }
    }

    out
}

fn push_quoted_dots(chunk: &str, out: &mut String) {
    for (i, seg) in chunk.split('.').enumerate() {
        if i > 0 {
            out.push('.');
        }
        if seg.contains(' ') {
            // Rewrite `first name` as `['first name']`, consuming the
            // separator dot that split() already dropped.
            out.pop();
            out.push_str("['");
            out.push_str(seg);
            out.push_str("']");
        } else {
            out.push_str(seg);
        }
    }
}

fn parse_path(path: &str) -> RmlResult<Vec<Segment>> {
    let normalized = quote_spaced_segments(path.trim());
    let mut rest = normalized.strip_prefix('$').unwrap_or(&normalized);
    let mut segments = Vec::new();
    let mut first = true;

    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('.') {
            let end = stripped
                .find(['.', '['])
                .unwrap_or(stripped.len());
            let key = &stripped[..end];
            if key.is_empty() {
                return Err(RmlError::InvalidReference(format!(
                    "empty key segment in path `{path}`"
                )));
            }
            segments.push(Segment::Key(key.to_string()));
            rest = &stripped[end..];
        } else if let Some(stripped) = rest.strip_prefix('[') {
            let end = stripped.find(']').ok_or_else(|| {
                RmlError::InvalidReference(format!("missing `]` in path `{path}`"))
            })?;
            let inner = stripped[..end].trim();
            let segment = if inner == "*" {
                Segment::Wild
            } else if let Some(quoted) = strip_path_quotes(inner) {
                Segment::Key(quoted.to_string())
            } else {
                let index = inner.parse::<usize>().map_err(|_| {
                    RmlError::InvalidReference(format!(
                        "invalid bracket segment `{inner}` in path `{path}`"
                    ))
                })?;
                Segment::Index(index)
            };
            segments.push(segment);
            rest = &stripped[end + 1..];
        } else if first {
            // Bare leading key, e.g. `name` or `name.street`.
            let end = rest.find(['.', '[']).unwrap_or(rest.len());
            segments.push(Segment::Key(rest[..end].to_string()));
            rest = &rest[end..];
        } else {
            return Err(RmlError::InvalidReference(format!(
                "invalid token in path `{path}` near `{rest}`"
            )));
        }
        first = false;
    }

    Ok(segments)
}

fn strip_path_quotes(inner: &str) -> Option<&str> {
    inner
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
}

/// Collect all values addressed by the parsed path
fn select<'a>(root: &'a Value, segments: &[Segment]) -> Vec<&'a Value> {
    let mut frontier = vec![root];

    for segment in segments {
        let mut next = Vec::new();
        for value in frontier {
            match segment {
                Segment::Key(key) => {
                    if let Some(v) = value.get(key.as_str()) {
                        next.push(v);
                    }
                }
                Segment::Index(idx) => {
                    if let Some(v) = value.as_array().and_then(|a| a.get(*idx)) {
                        next.push(v);
                    }
                }
                Segment::Wild => match value {
                    Value::Array(items) => next.extend(items.iter()),
                    Value::Object(map) => next.extend(map.values()),
                    _ => {}
                },
            }
        }
        frontier = next;
        if frontier.is_empty() {
            break;
        }
    }

    frontier
}

/// Resolve a nested-path reference to a scalar.
///
/// Zero matches and null matches are soft misses. Multi-valued matches take
/// the first value in document order.
pub fn resolve_scalar(expression: &str, root: &Value) -> RmlResult<Resolved<String>> {
    let segments = parse_path(expression)?;
    let matches = select(root, &segments);

    match matches.first() {
        None | Some(Value::Null) => Ok(Resolved::NotFound),
        Some(value) => Ok(Resolved::Found(value_to_scalar(value))),
    }
}

/// Collect the matches of an iterator expression as owned nodes.
///
/// Used by nested sources to enumerate records; zero matches means an
/// immediately exhausted source, not an error.
pub fn select_nodes(expression: &str, root: &Value) -> RmlResult<Vec<Value>> {
    let segments = parse_path(expression)?;
    Ok(select(root, &segments)
        .into_iter()
        .filter(|v| !v.is_null())
        .cloned()
        .collect())
}

fn value_to_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
