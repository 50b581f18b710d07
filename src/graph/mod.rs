//! Graph handles
//!
//! A [`Graph`] owns the pending transaction of one store, commits it, and
//! announces committed or remotely merged records to its change listeners.
//! Watches are the only listeners the crate attaches itself.

mod channels;
#[allow(clippy::module_inception)]
mod graph;
mod handles;
mod transaction;

pub use channels::ChangeListener;
pub use channels::ListenerKey;
pub use channels::Source;
pub use graph::Graph;
pub(crate) use graph::Staging;
pub use handles::*;

pub(crate) use channels::ChangeChannels;
pub(crate) use transaction::Overlay;
pub(crate) use transaction::Transaction;

#[cfg(test)]
mod transaction_test;
