//! The Assembler module is in charge of taking a
//! Blocksembly assembly file and producing a list of
//! 12-bit instruction words.
//!
//! It does this with a backtracking recursive descent
//! parser over the shared syntax core, followed by a
//! symbol resolution pass for forward label references.

pub mod ast;
pub mod encoder;
pub mod parser;
