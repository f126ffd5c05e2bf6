//! Collaborator clients
//!
//! Process-backed implementations of the parser traits:
//! - `statistical` - one process per batch, newline-joined stdin, JSON array out
//! - `grammar` - one process per description, JSON object out
//!
//! Anything implementing `StatisticalParser`/`GrammarParser` can replace
//! these; the reconciler does not care how the parsers are hosted.

pub mod grammar;
pub mod statistical;

pub use grammar::CommandGrammarParser;
pub use statistical::CommandStatisticalParser;
