//! Typed commands and the classifier that produces them.

mod parse;
mod serialize;
mod types;

pub use parse::materialize;
pub use types::{Command, Origin, Target};
