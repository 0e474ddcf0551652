// Outline ingestion: the agent writes the outline text, this module parses and stores it.

pub mod handlers;
pub mod parser;
pub mod prompts;

pub use parser::parse_outline;
