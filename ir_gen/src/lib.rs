//! Code generator helpers: fresh-temporary and fresh-label generation,
//! and the `CodeFragment` record every expression/statement visit in
//! the semantic walker returns.
//!
//! The intermediate representation here is literal three-address code
//! text, not a struct-based instruction set — the driver's external
//! contract is the TAC line grammar itself, so fragments carry their
//! code as plain strings ready to be joined and printed.

use shared_context::types::Type;

/// The unit of code returned by visiting one subtree: its TAC lines,
/// the place that names its value (`None` for statements), and its
/// type (`Void` for statements).
#[derive(Debug, Clone)]
pub struct CodeFragment {
    pub code: Vec<String>,
    pub place: Option<String>,
    pub ty: Type,
}

impl CodeFragment {
    pub fn empty_statement() -> Self {
        Self {
            code: Vec::new(),
            place: None,
            ty: Type::Void,
        }
    }

    pub fn unknown() -> Self {
        Self {
            code: Vec::new(),
            place: None,
            ty: Type::Unknown,
        }
    }

    pub fn is_statement(&self) -> bool {
        self.place.is_none()
    }
}

/// Builds a `CodeFragment` from its three parts. A thin constructor,
/// but every call site in the walker goes through it so fragment
/// assembly reads the same way everywhere.
pub fn make_fragment(code: Vec<String>, place: Option<String>, ty: Type) -> CodeFragment {
    CodeFragment { code, place, ty }
}

/// Monotonic counters for fresh temporaries (`t1, t2, …`) and labels
/// (`L1, L2, …`). Process-local to one analysis run; never reset
/// mid-run, matching the deterministic numbering the driver's output
/// contract depends on.
#[derive(Debug, Default)]
pub struct CodeGen {
    next_temp: usize,
    next_label: usize,
}

impl CodeGen {
    pub fn new() -> Self {
        Self {
            next_temp: 0,
            next_label: 0,
        }
    }

    pub fn new_temp(&mut self) -> String {
        self.next_temp += 1;
        format!("t{}", self.next_temp)
    }

    pub fn new_label(&mut self) -> String {
        self.next_label += 1;
        format!("L{}", self.next_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporaries_and_labels_increase_monotonically_and_independently() {
        let mut gen = CodeGen::new();
        assert_eq!(gen.new_temp(), "t1");
        assert_eq!(gen.new_temp(), "t2");
        assert_eq!(gen.new_label(), "L1");
        assert_eq!(gen.new_temp(), "t3");
        assert_eq!(gen.new_label(), "L2");
    }

    #[test]
    fn make_fragment_assembles_the_three_parts() {
        let fragment = make_fragment(vec!["t1 = 1 + 2".to_string()], Some("t1".to_string()), Type::Integer);
        assert_eq!(fragment.code, vec!["t1 = 1 + 2".to_string()]);
        assert_eq!(fragment.place.as_deref(), Some("t1"));
        assert_eq!(fragment.ty, Type::Integer);
        assert!(!fragment.is_statement());
    }
}
