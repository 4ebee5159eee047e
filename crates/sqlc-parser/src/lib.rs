//! Hand-written recursive descent SQL parser with Pratt precedence-climbing
//! for expressions. Produces one `sqlc_ast::Ast` per statement.
//!
//! The grammar covers the statement shapes sqlc queries are written in:
//! `SELECT`, `INSERT ... VALUES`, `UPDATE` and `DELETE`, each with
//! `RETURNING` where PostgreSQL allows it.

mod expr;
pub mod lexer;
pub mod parser;
pub mod token;

pub use expr::parse_expr;
pub use lexer::Lexer;
pub use parser::{ParseError, Parser, parse_one, parse_statements};
pub use token::{Token, TokenKind};
