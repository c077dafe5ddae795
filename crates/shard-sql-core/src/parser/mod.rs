//! SQL Parser
//!
//! A hand-written recursive descent parser producing a concrete
//! [`ParseTree`]. Expressions use precedence climbing; ambiguous
//! parenthesized forms are resolved by bounded, memoized speculation.
//! Errors go through an [`ErrorStrategy`] that may skip or insert a single
//! token before the statement is abandoned.

mod ddl;
mod dml;
mod error;
mod expr;
mod options;
#[allow(clippy::module_inception)]
mod parser;
pub mod precedence;
mod query;
mod recovery;
mod tree;

pub use error::{starts_statement, Expected, ExpectedSet, ParseErrorRecord, SyntaxError};
pub use options::ParserOptions;
pub use parser::{Parser, StatementTree};
pub use recovery::{BailErrorStrategy, DefaultErrorStrategy, ErrorStrategy, RecoveryAction, RecoveryContext};
pub use tree::{ParseNode, ParseTree, Rule};
