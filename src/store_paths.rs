//! Purpose: Shared data-directory and graph-id path resolution helpers.
//! Exports: `default_data_dir`, `resolve_graph_path`, `resolve_index_path`.
//! Role: Keep CLI, API-client, and store path semantics aligned from one source.
//! Invariants: Default data directory remains `~/.graphstore`.
//! Invariants: Graph identifiers must not contain path separators.

use std::path::{Path, PathBuf};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum GraphIdResolveError {
    ContainsPathSeparator,
}

pub(crate) fn default_data_dir() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_default();
    PathBuf::from(home).join(".graphstore")
}

pub(crate) fn resolve_graph_path(
    id: &str,
    namespace_dir: &Path,
) -> Result<PathBuf, GraphIdResolveError> {
    ensure_plain_id(id)?;
    Ok(namespace_dir.join(format!("{id}.json")))
}

pub(crate) fn resolve_index_path(
    id: &str,
    namespace_dir: &Path,
) -> Result<PathBuf, GraphIdResolveError> {
    ensure_plain_id(id)?;
    Ok(namespace_dir.join(format!("{id}.vertexes.json")))
}

fn ensure_plain_id(id: &str) -> Result<(), GraphIdResolveError> {
    if id.contains('/') || id.contains('\\') {
        return Err(GraphIdResolveError::ContainsPathSeparator);
    }
    Ok(())
}
