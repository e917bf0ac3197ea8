//! Command implementations for the Cassette CLI.

pub mod contents;
pub mod extract;
pub mod test;
pub mod write;

pub use contents::{ContentsArgs, cmd_contents};
pub use extract::{ExtractArgs, cmd_extract};
pub use test::{TestArgs, cmd_test};
pub use write::{WriteArgs, cmd_write};

/// Result type shared by all commands.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;
