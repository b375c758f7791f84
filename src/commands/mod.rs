//! CLI command implementations for wiremap operations.
//!
//! Available commands:
//! - **compile**: Compile module files into registration plans and sources
//! - **init**: Initialize a new wiremap configuration file

pub mod compile;
pub mod init;

pub use compile::{handle_compile, CompileConfig};
pub use init::{init_config, init_config_in};
