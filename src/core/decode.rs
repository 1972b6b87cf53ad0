//! Purpose: Validate untrusted JSON and build `Graph` values from it.
//! Exports: `decode`, `parse_value`, `DecodeError`.
//! Role: Single decode seam; all inbound graph JSON goes through here.
//! Invariants: Validation is staged structural-first and fails on the first
//! violation; no partial graph ever escapes.
//! Invariants: The edge-count guard runs on the raw array length before any
//! per-element work.
//! Invariants: Every failure names the offending field or index; values are
//! never coerced across JSON types.

use crate::core::error::{Error, ErrorKind};
use crate::core::graph::{number_is_negative, Graph, GraphError};
use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
    NotAnObject,
    MissingField(&'static str),
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    TooManyEdges(u64),
    VertexNotTextual(usize),
    DuplicateVertexName(String),
    EdgeNotObject(usize),
    MissingEdgeField {
        index: usize,
        field: &'static str,
    },
    SourceNotTextual(usize),
    DestinationNotTextual(usize),
    WeightNotNumeric(usize),
    DanglingVertexReference(String),
    NegativeWeight(usize),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::NotAnObject => write!(f, "graph payload must be a JSON object"),
            DecodeError::MissingField(field) => {
                write!(f, "missing required field '{field}'")
            }
            DecodeError::WrongType { field, expected } => {
                write!(f, "field '{field}' must be {expected}")
            }
            DecodeError::TooManyEdges(max) => {
                write!(f, "graph exceeds the maximum edge count of {max}")
            }
            DecodeError::VertexNotTextual(index) => {
                write!(f, "vertex at index {index} must be a string")
            }
            DecodeError::DuplicateVertexName(name) => {
                write!(f, "duplicate vertex name '{name}'")
            }
            DecodeError::EdgeNotObject(index) => {
                write!(f, "edge at index {index} must be a JSON object")
            }
            DecodeError::MissingEdgeField { index, field } => {
                write!(f, "edge at index {index} is missing field '{field}'")
            }
            DecodeError::SourceNotTextual(index) => {
                write!(f, "edge at index {index}: 'source' must be a string")
            }
            DecodeError::DestinationNotTextual(index) => {
                write!(f, "edge at index {index}: 'destination' must be a string")
            }
            DecodeError::WeightNotNumeric(index) => {
                write!(f, "edge at index {index}: 'weight' must be a decimal number")
            }
            DecodeError::DanglingVertexReference(name) => {
                write!(
                    f,
                    "edge references vertex '{name}' which is not declared in 'vertexes'"
                )
            }
            DecodeError::NegativeWeight(index) => {
                write!(f, "edge at index {index}: 'weight' must not be negative")
            }
        }
    }
}

impl StdError for DecodeError {}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::new(ErrorKind::Usage).with_message(err.to_string())
    }
}

/// Parse raw bytes into a generic JSON value. Syntax failures surface as
/// `Usage` errors so transport layers can return them to the caller.
pub fn parse_value(input: &[u8]) -> Result<Value, Error> {
    serde_json::from_slice(input).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("request payload is not valid JSON: {err}"))
    })
}

/// Validate `value` against the graph schema and build the graph.
///
/// Checks run in a fixed order and stop at the first violation: root shape,
/// field presence and type for `vertexes` then `edges`, the raw edge-count
/// guard, then per-element validation of vertices and edges in input order.
pub fn decode(value: &Value, max_edges: Option<u64>) -> Result<Graph, DecodeError> {
    let root = value.as_object().ok_or(DecodeError::NotAnObject)?;

    let vertexes = required_array(root, "vertexes")?;
    let edges = required_array(root, "edges")?;

    if let Some(max) = max_edges {
        if edges.len() as u64 > max {
            return Err(DecodeError::TooManyEdges(max));
        }
    }

    let mut graph = Graph::with_edge_limit(max_edges);

    for (index, element) in vertexes.iter().enumerate() {
        let name = element
            .as_str()
            .ok_or(DecodeError::VertexNotTextual(index))?;
        graph.add_vertex(name).map_err(|err| match err {
            GraphError::DuplicateVertex(name) => DecodeError::DuplicateVertexName(name),
            other => unreachable_graph_error(other),
        })?;
    }

    for (index, element) in edges.iter().enumerate() {
        let edge = element.as_object().ok_or(DecodeError::EdgeNotObject(index))?;

        let source = edge
            .get("source")
            .ok_or(DecodeError::MissingEdgeField {
                index,
                field: "source",
            })?
            .as_str()
            .ok_or(DecodeError::SourceNotTextual(index))?;
        let destination = edge
            .get("destination")
            .ok_or(DecodeError::MissingEdgeField {
                index,
                field: "destination",
            })?
            .as_str()
            .ok_or(DecodeError::DestinationNotTextual(index))?;
        let weight = edge
            .get("weight")
            .ok_or(DecodeError::MissingEdgeField {
                index,
                field: "weight",
            })?
            .as_number()
            .ok_or(DecodeError::WeightNotNumeric(index))?;

        for endpoint in [source, destination] {
            if !graph.contains_vertex(endpoint) {
                return Err(DecodeError::DanglingVertexReference(endpoint.to_string()));
            }
        }
        if number_is_negative(weight) {
            return Err(DecodeError::NegativeWeight(index));
        }

        graph
            .add_edge(source, destination, weight.clone())
            .map_err(|err| match err {
                GraphError::VertexNotFound(name) => DecodeError::DanglingVertexReference(name),
                GraphError::NegativeWeight => DecodeError::NegativeWeight(index),
                GraphError::EdgeLimitExceeded(max) => DecodeError::TooManyEdges(max),
                other => unreachable_graph_error(other),
            })?;
    }

    Ok(graph)
}

fn required_array<'a>(
    root: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Vec<Value>, DecodeError> {
    let value = root.get(field).ok_or(DecodeError::MissingField(field))?;
    value.as_array().ok_or(DecodeError::WrongType {
        field,
        expected: "an array",
    })
}

// The decoder pre-checks every condition the model enforces, so the
// remaining model errors cannot occur on this path.
fn unreachable_graph_error(err: GraphError) -> DecodeError {
    unreachable!("graph model rejected pre-validated input: {err}")
}

#[cfg(test)]
mod tests {
    use super::{decode, parse_value, DecodeError};
    use crate::core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn root_must_be_an_object() {
        assert_eq!(
            decode(&json!([1, 2, 3]), None).unwrap_err(),
            DecodeError::NotAnObject
        );
        assert_eq!(
            decode(&json!("graph"), None).unwrap_err(),
            DecodeError::NotAnObject
        );
    }

    #[test]
    fn vertexes_presence_precedes_edges_checks() {
        // A payload broken in both fields reports the vertexes failure.
        let payload = json!({ "edges": 5 });
        assert_eq!(
            decode(&payload, None).unwrap_err(),
            DecodeError::MissingField("vertexes")
        );
    }

    #[test]
    fn vertexes_type_precedes_edges_presence() {
        let payload = json!({ "vertexes": {} });
        assert_eq!(
            decode(&payload, None).unwrap_err(),
            DecodeError::WrongType {
                field: "vertexes",
                expected: "an array"
            }
        );
    }

    #[test]
    fn edges_field_is_required_and_must_be_an_array() {
        assert_eq!(
            decode(&json!({ "vertexes": [] }), None).unwrap_err(),
            DecodeError::MissingField("edges")
        );
        assert_eq!(
            decode(&json!({ "vertexes": [], "edges": "none" }), None).unwrap_err(),
            DecodeError::WrongType {
                field: "edges",
                expected: "an array"
            }
        );
    }

    #[test]
    fn edge_count_guard_runs_before_element_validation() {
        // Elements are garbage, but the raw length check fires first.
        let payload = json!({ "vertexes": [], "edges": [1, 2, 3, 4] });
        assert_eq!(
            decode(&payload, Some(3)).unwrap_err(),
            DecodeError::TooManyEdges(3)
        );
    }

    #[test]
    fn edge_count_at_the_limit_is_accepted() {
        let payload = json!({
            "vertexes": ["v1", "v2"],
            "edges": [
                {"source": "v1", "destination": "v2", "weight": 1},
                {"source": "v2", "destination": "v1", "weight": 2},
                {"source": "v1", "destination": "v1", "weight": 3},
            ],
        });
        let graph = decode(&payload, Some(3)).expect("at limit");
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn vertex_elements_must_be_strings() {
        let payload = json!({ "vertexes": ["v1", 4], "edges": [] });
        assert_eq!(
            decode(&payload, None).unwrap_err(),
            DecodeError::VertexNotTextual(1)
        );
    }

    #[test]
    fn duplicate_vertex_names_are_rejected() {
        let payload = json!({ "vertexes": ["v1", "v1"], "edges": [] });
        assert_eq!(
            decode(&payload, None).unwrap_err(),
            DecodeError::DuplicateVertexName("v1".to_string())
        );
    }

    #[test]
    fn edge_elements_must_be_objects() {
        let payload = json!({ "vertexes": ["v1"], "edges": [1] });
        assert_eq!(
            decode(&payload, None).unwrap_err(),
            DecodeError::EdgeNotObject(0)
        );
    }

    #[test]
    fn edge_fields_are_checked_in_order() {
        let missing_source = json!({ "vertexes": ["v1"], "edges": [{}] });
        assert_eq!(
            decode(&missing_source, None).unwrap_err(),
            DecodeError::MissingEdgeField {
                index: 0,
                field: "source"
            }
        );

        let missing_destination = json!({
            "vertexes": ["v1"],
            "edges": [{"source": "v1"}],
        });
        assert_eq!(
            decode(&missing_destination, None).unwrap_err(),
            DecodeError::MissingEdgeField {
                index: 0,
                field: "destination"
            }
        );

        let missing_weight = json!({
            "vertexes": ["v1"],
            "edges": [{"source": "v1", "destination": "v1"}],
        });
        assert_eq!(
            decode(&missing_weight, None).unwrap_err(),
            DecodeError::MissingEdgeField {
                index: 0,
                field: "weight"
            }
        );
    }

    #[test]
    fn edge_endpoint_values_must_be_strings() {
        let bad_source = json!({
            "vertexes": ["v1"],
            "edges": [{"source": 1, "destination": "v1", "weight": 1}],
        });
        assert_eq!(
            decode(&bad_source, None).unwrap_err(),
            DecodeError::SourceNotTextual(0)
        );

        let bad_destination = json!({
            "vertexes": ["v1"],
            "edges": [{"source": "v1", "destination": 1, "weight": 1}],
        });
        assert_eq!(
            decode(&bad_destination, None).unwrap_err(),
            DecodeError::DestinationNotTextual(0)
        );
    }

    #[test]
    fn weight_must_be_numeric() {
        let payload = json!({
            "vertexes": ["v1", "v2"],
            "edges": [{"source": "v1", "destination": "v2", "weight": "asdf"}],
        });
        assert_eq!(
            decode(&payload, None).unwrap_err(),
            DecodeError::WeightNotNumeric(0)
        );
    }

    #[test]
    fn dangling_references_are_rejected() {
        let payload = json!({
            "vertexes": ["v1", "v2"],
            "edges": [{"source": "v1", "destination": "v3", "weight": 1}],
        });
        assert_eq!(
            decode(&payload, None).unwrap_err(),
            DecodeError::DanglingVertexReference("v3".to_string())
        );
    }

    #[test]
    fn dangling_reference_wins_over_negative_weight() {
        let payload = json!({
            "vertexes": ["v1"],
            "edges": [{"source": "v1", "destination": "v3", "weight": -5}],
        });
        assert_eq!(
            decode(&payload, None).unwrap_err(),
            DecodeError::DanglingVertexReference("v3".to_string())
        );
    }

    #[test]
    fn negative_weights_are_rejected() {
        let payload = json!({
            "vertexes": ["v1", "v2"],
            "edges": [{"source": "v1", "destination": "v2", "weight": -20}],
        });
        assert_eq!(
            decode(&payload, None).unwrap_err(),
            DecodeError::NegativeWeight(0)
        );
    }

    #[test]
    fn self_loops_and_parallel_edges_are_valid() {
        let payload = json!({
            "vertexes": ["v1", "v2"],
            "edges": [
                {"source": "v1", "destination": "v1", "weight": 0},
                {"source": "v1", "destination": "v2", "weight": 1},
                {"source": "v1", "destination": "v2", "weight": 1},
            ],
        });
        let graph = decode(&payload, None).expect("valid");
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn empty_graph_is_valid() {
        let graph = decode(&json!({ "vertexes": [], "edges": [] }), Some(0)).expect("empty");
        assert_eq!(graph.vertex_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn messages_name_the_offending_field_or_index() {
        assert_eq!(
            DecodeError::MissingField("vertexes").to_string(),
            "missing required field 'vertexes'"
        );
        assert_eq!(
            DecodeError::VertexNotTextual(3).to_string(),
            "vertex at index 3 must be a string"
        );
        assert_eq!(
            DecodeError::DanglingVertexReference("v3".to_string()).to_string(),
            "edge references vertex 'v3' which is not declared in 'vertexes'"
        );
        assert_eq!(
            DecodeError::TooManyEdges(3).to_string(),
            "graph exceeds the maximum edge count of 3"
        );
    }

    #[test]
    fn decode_errors_convert_to_usage_errors() {
        let err: crate::core::error::Error = DecodeError::NotAnObject.into();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(err.message(), Some("graph payload must be a JSON object"));
    }

    #[test]
    fn parse_value_maps_syntax_errors_to_usage() {
        let err = parse_value(b"{\"vertexes\":").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err
            .message()
            .expect("message")
            .starts_with("request payload is not valid JSON"));
    }
}
