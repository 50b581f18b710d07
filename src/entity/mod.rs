#[allow(clippy::module_inception)]
mod entity;

pub use entity::*;
