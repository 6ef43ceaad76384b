// Crate-level imports and re-exports
pub use bumpalo::Bump; // Memory arena used for efficient allocation

// Submodules
pub mod interner; // Deduplicates identifier text into Symbols
pub mod source_map; // Maps AST/parse-tree positions to source code positions
pub mod symbol_table; // Stack-of-scopes symbol store used by the semantic walker
pub mod types; // The type lattice shared by the walker and the code generator helpers

/// Represents a region in the source code.
/// Used for error reporting and mapping parse-tree nodes to positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize, // Starting byte offset in source
    pub end: usize,   // Ending byte offset in source
    pub line: usize,  // Line number in source (1-based)
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
        }
    }
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize) -> Self {
        Self { start, end, line }
    }
}
