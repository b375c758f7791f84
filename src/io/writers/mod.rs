pub mod dot;
pub mod json;
pub mod markdown;
pub mod rust;
pub mod terminal;

pub use dot::DotWriter;
pub use json::JsonWriter;
pub use markdown::MarkdownWriter;
pub use rust::RustWriter;
pub use terminal::TerminalWriter;
