use bumpalo::Bump;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Symbol(pub(crate) usize);

/// Deduplicates identifier text across an analysis run.
///
/// Identifiers are interned once and compared by `Symbol` afterwards,
/// which keeps scope lookups a cheap integer comparison instead of a
/// string comparison.
pub struct Interner<'a> {
    arena: &'a Bump,
    map: HashMap<&'a str, Symbol>,
    vec: Vec<&'a str>,
}

impl<'a> Interner<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            arena,
            map: HashMap::new(),
            vec: Vec::new(),
        }
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.map.get(s) {
            return sym;
        }

        let sym = Symbol(self.vec.len());

        // Allocate the string in the bump arena so returned &str slices
        // outlive the individual tokens/nodes that produced them.
        let stored: &'a str = self.arena.alloc_str(s);

        self.vec.push(stored);
        self.map.insert(stored, sym);

        sym
    }

    pub fn lookup(&self, sym: Symbol) -> &'a str {
        self.vec[sym.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_text_returns_the_same_symbol() {
        let arena = Bump::new();
        let mut interner = Interner::new(&arena);
        let a = interner.intern("x");
        let b = interner.intern("x");
        assert_eq!(a, b);
    }

    #[test]
    fn interning_different_text_returns_different_symbols() {
        let arena = Bump::new();
        let mut interner = Interner::new(&arena);
        let a = interner.intern("x");
        let b = interner.intern("y");
        assert_ne!(a, b);
        assert_eq!(interner.lookup(a), "x");
        assert_eq!(interner.lookup(b), "y");
    }
}
