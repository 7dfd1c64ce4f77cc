//! The Language module parses the high-level Blocksembly language into
//! a syntax tree. There is no code generation for it yet; callers get
//! the tree and the diagnostics and decide what to do with them.

pub mod ast;
pub mod parser;
