//! Watches
//!
//! A [`Watch`] follows the changes of one graph through a compound
//! [`Predicate`] and reports what matched as typed callbacks on a
//! [`WatchDelegate`]. Changes come from local commits and from remote merges
//! alike; each callback carries its [`crate::Source`].

mod delegate;
mod dispatch;
mod filters;
mod intake;
mod predicate;
mod registry;
mod subscription;

pub use delegate::*;
pub use predicate::*;
pub use registry::*;
pub use subscription::Watch;

pub(crate) use filters::Filters;
pub(crate) use intake::*;
pub(crate) use subscription::WatchShared;
