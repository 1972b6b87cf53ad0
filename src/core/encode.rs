//! Purpose: Serialize `Graph` values into the canonical JSON wire format.
//! Exports: `encode`.
//! Role: Counterpart to `decode`; total over valid graphs, never fails.
//! Invariants: Emitted field order is `vertexes` then `edges`; edge objects
//! are `source`, `destination`, `weight`.
//! Invariants: `decode(encode(g), None) == g` for every constructible graph.

use crate::core::graph::Graph;
use serde_json::{json, Value};

pub fn encode(graph: &Graph) -> Value {
    let vertexes: Vec<Value> = graph
        .vertexes()
        .map(|vertex| Value::String(vertex.name().to_string()))
        .collect();
    let edges: Vec<Value> = graph
        .edges()
        .map(|edge| {
            json!({
                "source": edge.source(),
                "destination": edge.destination(),
                "weight": edge.weight().clone(),
            })
        })
        .collect();
    json!({
        "vertexes": vertexes,
        "edges": edges,
    })
}
