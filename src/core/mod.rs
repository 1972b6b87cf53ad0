// Core modules implementing the graph model, codec, store, and error modeling.
pub mod decode;
pub mod encode;
pub mod error;
pub mod graph;
pub mod store;
