use ir_gen::CodeGen;
use parse_tree::ParseNode;
use shared_context::symbol_table::{Mutability, SymbolStore};
use shared_context::types::Type;

use crate::diagnostics::{Diagnostic, ErrorCollector};

/// The `(continue_label, break_label)` pair of one enclosing loop.
/// Pushed on loop entry, popped on exit, so `break`/`continue` always
/// jump to the innermost loop's labels.
pub(crate) struct LoopLabels {
    pub continue_label: String,
    pub break_label: String,
}

/// One symbol as it reads in the driver's end-of-run snapshot:
/// `{ type, const }`, keyed by name.
#[derive(Debug, Clone)]
pub struct SymbolSnapshot {
    pub name: String,
    pub ty: Type,
    pub is_const: bool,
}

/// Everything the driver gets back from one analysis run.
pub struct AnalysisOutput {
    pub semantic_errors: Vec<String>,
    /// Same diagnostics as `semantic_errors`, unrendered, for callers
    /// that want to format them themselves (e.g. against a `SourceMap`)
    /// instead of taking the flat `"Error at line N: ..."` string.
    pub diagnostics: Vec<Diagnostic>,
    pub symbol_table: Vec<SymbolSnapshot>,
    pub intermediate_code: Vec<String>,
}

/// The tree-directed visitor: simultaneously does name resolution,
/// type checking, control-flow well-formedness checking, and TAC
/// emission in one pass. State mutated while walking:
///
/// - `symbols` — the lexical scope stack.
/// - `diagnostics` — every semantic error encountered so far.
/// - `codegen` — fresh-temporary/fresh-label counters, process-local to
///   this run and never reset mid-walk.
/// - `loop_labels` — the loop-label stack; `loop_labels.len()` doubles
///   as `loop_depth`.
/// - `function_return_types` — the stack of enclosing functions'
///   declared return types; empty outside any function body.
pub struct Analyzer {
    pub(crate) symbols: SymbolStore,
    pub(crate) diagnostics: ErrorCollector,
    pub(crate) codegen: CodeGen,
    pub(crate) loop_labels: Vec<LoopLabels>,
    pub(crate) function_return_types: Vec<Type>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            symbols: SymbolStore::new(),
            diagnostics: ErrorCollector::new(),
            codegen: CodeGen::new(),
            loop_labels: Vec::new(),
            function_return_types: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, line: usize, message: impl Into<String>) {
        self.diagnostics.record(line, message);
    }

    pub(crate) fn in_loop(&self) -> bool {
        !self.loop_labels.is_empty()
    }

    /// Walks the whole program, then snapshots the global scope and
    /// concatenates the top-level statements' TAC in source order, per
    /// the driver's return shape (§6).
    pub fn run(&mut self, program: &ParseNode) -> AnalysisOutput {
        let intermediate_code = match self.visit_program(program) {
            Ok(code) => code,
            Err(malformed) => {
                self.record(malformed.line, malformed.to_string());
                Vec::new()
            }
        };

        let symbol_table = self
            .symbols
            .global_scope()
            .map(|symbol| SymbolSnapshot {
                name: symbol.name.clone(),
                ty: symbol.ty.clone(),
                is_const: symbol.mutability == Mutability::Const,
            })
            .collect();

        let collected = std::mem::take(&mut self.diagnostics);
        let diagnostics = collected.diagnostics().to_vec();

        AnalysisOutput {
            semantic_errors: collected.into_rendered(),
            diagnostics,
            symbol_table,
            intermediate_code,
        }
    }

    /// Resolves `name` in the global scope after a walk, for callers that
    /// need the full `Symbol` (e.g. a function's `params`/`return_type`)
    /// rather than the driver's flattened `SymbolSnapshot`.
    pub fn resolve_global(&self, name: &str) -> Option<&shared_context::symbol_table::Symbol> {
        self.symbols.global_scope().find(|symbol| symbol.name == name)
    }
}

/// Runs a fresh `Analyzer` over `program`. The convenience entry point
/// most callers want; construct an `Analyzer` directly only when you
/// need to inspect diagnostics incrementally.
pub fn analyze(program: &ParseNode) -> AnalysisOutput {
    Analyzer::new().run(program)
}
