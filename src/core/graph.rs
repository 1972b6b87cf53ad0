//! Purpose: Directed weighted graph model backing the codec and the store.
//! Exports: `Vertex`, `Edge`, `Graph`, `GraphError`.
//! Role: In-memory structure built once by the decoder, then read-only.
//! Invariants: Vertex names are unique; edge endpoints name present vertices.
//! Invariants: Iteration order for vertices and edges is insertion order.
//! Invariants: Edge weights are non-negative; the edge limit holds at build time.

use serde_json::Number;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Vertex {
    name: String,
}

impl Vertex {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    source: String,
    destination: String,
    weight: Number,
}

impl Edge {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn weight(&self) -> &Number {
        &self.weight
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GraphError {
    DuplicateVertex(String),
    VertexNotFound(String),
    NegativeWeight,
    EdgeLimitExceeded(u64),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::DuplicateVertex(name) => {
                write!(f, "vertex '{name}' is already present in the graph")
            }
            GraphError::VertexNotFound(name) => {
                write!(f, "vertex '{name}' is not present in the graph")
            }
            GraphError::NegativeWeight => write!(f, "edge weight must not be negative"),
            GraphError::EdgeLimitExceeded(max) => {
                write!(f, "graph exceeds the maximum edge count of {max}")
            }
        }
    }
}

impl StdError for GraphError {}

#[derive(Clone, Debug, Default)]
pub struct Graph {
    vertexes: Vec<Vertex>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    max_edges: Option<u64>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph whose edge count may not grow past `limit`. `None` is unlimited.
    pub fn with_edge_limit(limit: Option<u64>) -> Self {
        Self {
            max_edges: limit,
            ..Self::default()
        }
    }

    pub fn add_vertex(&mut self, name: impl Into<String>) -> Result<(), GraphError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(GraphError::DuplicateVertex(name));
        }
        self.index.insert(name.clone(), self.vertexes.len());
        self.vertexes.push(Vertex { name });
        Ok(())
    }

    pub fn find_vertex(&self, name: &str) -> Result<&Vertex, GraphError> {
        self.index
            .get(name)
            .map(|&slot| &self.vertexes[slot])
            .ok_or_else(|| GraphError::VertexNotFound(name.to_string()))
    }

    pub fn contains_vertex(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn add_edge(
        &mut self,
        source: &str,
        destination: &str,
        weight: Number,
    ) -> Result<(), GraphError> {
        if !self.contains_vertex(source) {
            return Err(GraphError::VertexNotFound(source.to_string()));
        }
        if !self.contains_vertex(destination) {
            return Err(GraphError::VertexNotFound(destination.to_string()));
        }
        if number_is_negative(&weight) {
            return Err(GraphError::NegativeWeight);
        }
        if let Some(max) = self.max_edges {
            if self.edges.len() as u64 >= max {
                return Err(GraphError::EdgeLimitExceeded(max));
            }
        }
        self.edges.push(Edge {
            source: source.to_string(),
            destination: destination.to_string(),
            weight,
        });
        Ok(())
    }

    pub fn vertexes(&self) -> impl Iterator<Item = &Vertex> + '_ {
        self.vertexes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertexes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

// The edge limit is a construction-time constraint, not part of graph identity.
impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.vertexes == other.vertexes && self.edges == other.edges
    }
}

/// Sign test on the number's literal text. The mantissa must carry a nonzero
/// digit behind a leading minus, so `-0`, `-0.0` and `-0e5` count as zero
/// while values below f64 range (`-1e-400`) are still negative.
pub(crate) fn number_is_negative(weight: &Number) -> bool {
    let text = weight.to_string();
    let Some(mantissa) = text.strip_prefix('-') else {
        return false;
    };
    let mantissa = mantissa.split(['e', 'E']).next().unwrap_or(mantissa);
    mantissa.bytes().any(|digit| (b'1'..=b'9').contains(&digit))
}
