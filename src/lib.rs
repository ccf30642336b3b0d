//! # lc3
//!
//! A two-pass assembler and fetch-decode-execute emulator for a 16-bit
//! word-addressable educational computer architecture.
//!
//! ## Assembler pipeline
//!
//! 1. **Lexer** - tokenizes source text
//! 2. **Parser** - parses tokens into an AST (`Vec<SourceLine>`)
//! 3. **First pass** - walks the AST once to build the symbol table
//! 4. **Encoder** - walks the same AST again to produce machine words
//!
//! ## Example
//!
//! ```rust,no_run
//! use lc3::{encoder::encode, first_pass::first_pass, lexer::tokenize, parser::parse_lines};
//!
//! let source = std::fs::read_to_string("program.asm").unwrap();
//! let lexed = tokenize(&source);
//! let parsed = parse_lines(&lexed.tokens);
//! let first = first_pass(parsed.lines);
//! let encoded = encode(&first);
//!
//! if encoded.errors.is_empty() {
//!     println!("assembled {} words", encoded.machine_code.len());
//! }
//! ```
//!
//! The [`emulator`] module runs the resulting machine words.

pub mod emulator;
pub mod encoder;
pub mod error;
pub mod first_pass;
pub mod lexer;
pub mod parser;
