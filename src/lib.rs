//! An embedded, observable graph store.
//!
//! Entities live in a named [`Graph`] backed by sled. Each entity is a node
//! with properties, tags and group memberships hanging off it. Changes are
//! staged on the graph, committed atomically, and announced to every
//! [`Watch`] whose criteria match, as typed callbacks on its
//! [`WatchDelegate`].
//!
//! ```ignore
//! let graph = watchgraph::graph::named("accounts")?;
//!
//! let watch: Watch = Watch::new(&graph);
//! watch.for_types(&["User"]).has_tags(&["Admin"]);
//! watch.set_delegate(&delegate);
//!
//! let user = Entity::new_in("User", &graph)?;
//! user.add_tags(&["Admin"])?;
//! user.set("email", "ops@example.com")?;
//! graph.commit()?;
//! ```

mod config;
mod constants;
mod entity;
mod errors;
pub mod graph;
pub mod metrics;
mod schema;
mod storage;
mod utils;
mod watch;

pub use config::*;
pub use constants::DEFAULT_GRAPH_NAME;
pub use entity::*;
pub use errors::*;
pub use graph::ChangeListener;
pub use graph::Graph;
pub use graph::ListenerKey;
pub use graph::Source;
pub use schema::*;
pub use storage::*;
pub use watch::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
