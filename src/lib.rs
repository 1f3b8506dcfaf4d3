//! Jack Compiler Library
//!
//! Compiles Jack source (`.jack`) to Hack VM text (`.vm`): tokenizer,
//! one-token lookahead stream, a two-scope symbol table, and a
//! recursive-descent compilation engine that emits VM instructions directly
//! while it parses.
//!
//! # Example
//!
//! ```
//! use jackc::compile_source;
//! use std::path::Path;
//!
//! let vm = compile_source(
//!     "class Main { function void main() { return; } }",
//!     Path::new("Main.jack"),
//! ).unwrap();
//! assert!(vm.contains("function Main.main 0"));
//! ```

pub mod batch;
pub mod engine;
pub mod error;
pub mod lookahead;
pub mod symbol_table;
pub mod token;
pub mod vm;

pub use batch::{compile_unit, discover, Unit};
pub use engine::compile_class as compile_source;
pub use error::{JackError, JackResult, SourceLocation};
pub use symbol_table::{Kind, Symbol, SymbolTable};
pub use token::{tokenize, Token, TokenKind};
