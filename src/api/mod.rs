//! Purpose: Define the stable public Rust API boundary for graphstore.
//! Exports: Codec entrypoints, graph types, and local/remote clients.
//! Role: Public, additive-only surface; hides path-resolution internals.
//! Invariants: This module is the only public path to store operations.
//! Invariants: Local and remote clients expose the same operation set.

mod client;
mod remote;

pub use crate::core::decode::{decode, parse_value, DecodeError};
pub use crate::core::encode::encode;
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::graph::{Edge, Graph, GraphError, Vertex};
pub use crate::core::store::{GraphStore, GRAPH_NAMESPACE};
pub use client::LocalClient;
pub use remote::RemoteClient;
