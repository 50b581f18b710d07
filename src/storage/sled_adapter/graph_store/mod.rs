mod sled_graph_storage;

pub use sled_graph_storage::*;

#[cfg(test)]
mod sled_graph_storage_test;
