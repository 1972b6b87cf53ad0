//! Purpose: Define the public API client surface for local graph storage.
//! Exports: `LocalClient` and local graph lifecycle operations.
//! Role: Stable boundary for the CLI and server; mirrors CLI resolution rules.
//! Invariants: Data-directory resolution stays aligned with `store_paths`.
//! Invariants: Operations delegate to `GraphStore`; no codec logic lives here.

use crate::core::error::Error;
use crate::core::graph::Graph;
use crate::core::store::GraphStore;
use crate::store_paths::default_data_dir;
use std::path::{Path, PathBuf};

pub type ApiResult<T> = Result<T, Error>;

#[derive(Clone, Debug)]
pub struct LocalClient {
    data_dir: PathBuf,
}

impl LocalClient {
    pub fn new() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn save_graph(&self, graph: &Graph) -> ApiResult<String> {
        self.store().save(graph)
    }

    pub fn graph(&self, id: &str) -> ApiResult<Graph> {
        self.store().find_by_id(id)
    }

    pub fn has_vertex(&self, id: &str, name: &str) -> ApiResult<bool> {
        self.store().has_vertex(id, name)
    }

    fn store(&self) -> GraphStore {
        GraphStore::open(&self.data_dir)
    }
}

impl Default for LocalClient {
    fn default() -> Self {
        Self::new()
    }
}
