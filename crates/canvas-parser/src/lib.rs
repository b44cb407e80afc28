//! Live canvas parser: converts a TSX token stream into an AST.
//!
//! TypeScript annotations are recognised and erased while parsing; the
//! resulting [`canvas_types::ast::Module`] carries runtime syntax only.

mod parse_decl;
mod parse_expr;
mod parse_jsx;
mod parse_stmt;
mod parse_type;
mod parser;

pub use parser::{parse_source, ParseResult, Parser, MAX_NESTING_DEPTH};
