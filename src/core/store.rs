//! Purpose: File-backed repository for encoded graphs plus a vertex side-index.
//! Exports: `GraphStore`, `GRAPH_NAMESPACE`.
//! Role: Persistence boundary; the codec's round-trip contract holds across it.
//! Invariants: Graphs live under `<data_dir>/graphs/<id>.json` with the vertex
//! index beside them; both are written under an exclusive lock.
//! Invariants: A save only reports an id once the written file is confirmed.

use crate::core::decode::decode;
use crate::core::encode::encode;
use crate::core::error::{Error, ErrorKind};
use crate::core::graph::Graph;
use crate::store_paths::{resolve_graph_path, resolve_index_path, GraphIdResolveError};
use fs2::FileExt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Logical collection all graphs are stored under, mirrored in the directory
/// layout. Identifiers are only unique within this namespace.
pub const GRAPH_NAMESPACE: &str = "graphs";

#[derive(Clone, Debug)]
pub struct GraphStore {
    namespace_dir: PathBuf,
}

impl GraphStore {
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            namespace_dir: data_dir.into().join(GRAPH_NAMESPACE),
        }
    }

    pub fn namespace_dir(&self) -> &Path {
        &self.namespace_dir
    }

    /// Persist the graph under a freshly generated identifier and return it.
    pub fn save(&self, graph: &Graph) -> Result<String, Error> {
        fs::create_dir_all(&self.namespace_dir).map_err(|err| {
            Error::new(map_io_error_kind(&err))
                .with_message("failed to create graph namespace directory")
                .with_path(&self.namespace_dir)
                .with_source(err)
        })?;

        let id = new_graph_id()?;
        let graph_path = self.graph_path(&id)?;
        let index_path = self.index_path(&id)?;
        tracing::debug!(id = %id, "saving graph");

        let encoded = serde_json::to_vec(&encode(graph)).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to serialize graph")
                .with_source(err)
        })?;
        let names: Vec<&str> = graph.vertexes().map(|vertex| vertex.name()).collect();
        let index = serde_json::to_vec(&names).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to serialize vertex index")
                .with_source(err)
        })?;

        write_locked(&graph_path, &encoded)?;
        write_locked(&index_path, &index)?;

        if fs::metadata(&graph_path).is_err() {
            return Err(Error::new(ErrorKind::Io)
                .with_message("graph write was not confirmed")
                .with_id(&id)
                .with_path(&graph_path));
        }

        tracing::debug!(id = %id, "graph saved");
        Ok(id)
    }

    /// Load and decode the graph stored under `id`.
    pub fn find_by_id(&self, id: &str) -> Result<Graph, Error> {
        let graph_path = self.graph_path(id)?;
        tracing::debug!(id = %id, "loading graph");

        let bytes = match fs::read(&graph_path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(not_found(id));
            }
            Err(err) => {
                return Err(Error::new(map_io_error_kind(&err))
                    .with_message("failed to read graph file")
                    .with_id(id)
                    .with_path(&graph_path)
                    .with_source(err));
            }
        };

        let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|err| {
            Error::new(ErrorKind::Corrupt)
                .with_message("stored graph is not valid JSON")
                .with_id(id)
                .with_path(&graph_path)
                .with_source(err)
        })?;
        // Stored files were valid when written; a failing decode means the
        // file changed underneath us.
        decode(&value, None).map_err(|err| {
            Error::new(ErrorKind::Corrupt)
                .with_message(format!("stored graph failed validation: {err}"))
                .with_id(id)
                .with_path(&graph_path)
        })
    }

    /// Report whether the graph stored under `id` declares `name` as a vertex,
    /// answered from the side-index without decoding the graph itself.
    pub fn has_vertex(&self, id: &str, name: &str) -> Result<bool, Error> {
        let graph_path = self.graph_path(id)?;
        let index_path = self.index_path(id)?;
        tracing::debug!(id = %id, vertex = %name, "checking vertex membership");

        if fs::metadata(&graph_path).is_err() {
            return Err(not_found(id));
        }

        let bytes = fs::read(&index_path).map_err(|err| {
            Error::new(ErrorKind::Corrupt)
                .with_message("vertex index is missing or unreadable")
                .with_id(id)
                .with_path(&index_path)
                .with_source(err)
        })?;
        let names: Vec<String> = serde_json::from_slice(&bytes).map_err(|err| {
            Error::new(ErrorKind::Corrupt)
                .with_message("vertex index is not a JSON string array")
                .with_id(id)
                .with_path(&index_path)
                .with_source(err)
        })?;

        Ok(names.iter().any(|candidate| candidate == name))
    }

    fn graph_path(&self, id: &str) -> Result<PathBuf, Error> {
        resolve_graph_path(id, &self.namespace_dir).map_err(|err| map_id_error(err, id))
    }

    fn index_path(&self, id: &str) -> Result<PathBuf, Error> {
        resolve_index_path(id, &self.namespace_dir).map_err(|err| map_id_error(err, id))
    }
}

fn not_found(id: &str) -> Error {
    Error::new(ErrorKind::NotFound)
        .with_message(format!("graph with id {id} not found"))
        .with_id(id)
}

fn map_id_error(err: GraphIdResolveError, id: &str) -> Error {
    match err {
        GraphIdResolveError::ContainsPathSeparator => Error::new(ErrorKind::Usage)
            .with_message("graph id must not contain path separators")
            .with_id(id),
    }
}

fn write_locked(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let map_err = |err: std::io::Error, action: &str| {
        Error::new(map_io_error_kind(&err))
            .with_message(format!("failed to {action} graph file"))
            .with_path(path)
            .with_source(err)
    };
    let mut file = File::create(path).map_err(|err| map_err(err, "create"))?;
    file.lock_exclusive().map_err(|err| map_err(err, "lock"))?;
    let result = file
        .write_all(bytes)
        .and_then(|()| file.flush())
        .map_err(|err| map_err(err, "write"));
    let _ = file.unlock();
    result
}

fn map_io_error_kind(err: &std::io::Error) -> ErrorKind {
    match err.kind() {
        std::io::ErrorKind::NotFound => ErrorKind::NotFound,
        std::io::ErrorKind::PermissionDenied => ErrorKind::Permission,
        _ => ErrorKind::Io,
    }
}

fn new_graph_id() -> Result<String, Error> {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes).map_err(|err| {
        Error::new(ErrorKind::Internal).with_message(format!("failed to generate graph id: {err}"))
    })?;
    // RFC 4122 version and variant bits so ids read as well-formed v4 UUIDs.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    let hex: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
    Ok(format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    ))
}
