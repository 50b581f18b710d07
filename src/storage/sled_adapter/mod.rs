// Submodule declaration
// -----------------------------------------------------------------------------
mod graph_store;

// Re-export
// -----------------------------------------------------------------------------
pub use graph_store::*;
