//! Semantic analysis and three-address-code emission for Compiscript.
//!
//! [`analyzer::analyze`] walks a [`parse_tree::ParseNode`] produced by an
//! external parser and, in one pass, resolves names, checks types,
//! validates control-flow well-formedness, and emits a linear TAC
//! listing. See [`analyzer::AnalysisOutput`] for the result shape.

mod analyzer;
mod declarations;
mod diagnostics;
mod expressions;
mod statements;
mod tree_support;

pub use analyzer::{analyze, AnalysisOutput, Analyzer, SymbolSnapshot};
pub use diagnostics::{Diagnostic, ErrorCollector, MalformedTree};
