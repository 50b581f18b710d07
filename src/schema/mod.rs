//! Graph schema
//!
//! Four record kinds make up the graph: a [`NodeRecord`] is the vertex, and
//! [`PropertyRecord`], [`TagRecord`] and [`GroupRecord`] each hang off exactly one
//! node. Every record self-reports its [`RecordKind`], which is what lets a single
//! predicate be evaluated across a change set mixing all four kinds.

mod change;
mod codec;
mod record;
mod value;

pub use change::*;
pub(crate) use codec::*;
pub use record::*;
pub use value::*;
