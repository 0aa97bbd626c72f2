//! Reader for plain-text graph instances.
//!
//! The first non-empty line starts with the vertex count `n`; every following
//! non-empty line starts with the two endpoints `u v` of an edge. Extra tokens
//! on any line are ignored, as are lines starting with `#`. Duplicate edges
//! are merged.

use crate::error::{MbvstError, MbvstResult};
use crate::graph::{Graph, VertexId};
use std::fs;
use std::path::Path;

/// Largest vertex count accepted in an instance header.
pub const MAX_INSTANCE_VERTICES: usize = 1 << 22;

pub fn read_instance(path: impl AsRef<Path>) -> MbvstResult<Graph> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_instance(&text)
}

pub fn parse_instance(text: &str) -> MbvstResult<Graph> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| MbvstError::Parse("instance is empty".into()))?;
    let vertex_count = parse_token(header.split_whitespace().next(), header_line, "vertex count")?;
    if vertex_count > MAX_INSTANCE_VERTICES {
        return Err(MbvstError::Parse(format!(
            "line {header_line}: vertex count {vertex_count} exceeds the supported maximum of {MAX_INSTANCE_VERTICES}"
        )));
    }
    let mut graph = Graph::new(vertex_count);

    for (line_no, line) in lines {
        let mut tokens = line.split_whitespace();
        let u = parse_token(tokens.next(), line_no, "first endpoint")?;
        let v = parse_token(tokens.next(), line_no, "second endpoint")?;
        graph
            .add_edge(VertexId::new(u), VertexId::new(v))
            .map_err(|err| MbvstError::Parse(format!("line {line_no}: {err}")))?;
    }
    Ok(graph)
}

fn parse_token(token: Option<&str>, line_no: usize, what: &str) -> MbvstResult<usize> {
    let token = token.ok_or_else(|| MbvstError::Parse(format!("line {line_no}: missing {what}")))?;
    token
        .parse::<usize>()
        .map_err(|err| MbvstError::Parse(format!("line {line_no}: invalid {what} '{token}': {err}")))
}
