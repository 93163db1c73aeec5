//! Raw IRC lines: grammar, drafts and immutable messages.

mod draft;
pub(crate) mod nom_parser;
mod parse;
mod serialize;
pub mod tags;
mod types;

pub use self::draft::CommandDraft;
pub use self::nom_parser::MAX_PARAMS;
pub use self::parse::parse;
pub use self::tags::TagKey;
pub use self::types::Message;
