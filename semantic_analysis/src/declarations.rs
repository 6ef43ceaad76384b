use std::collections::HashSet;

use ir_gen::{CodeFragment, make_fragment};
use parse_tree::{NodeKind, ParseNode};
use shared_context::symbol_table::{Mutability, Symbol};
use shared_context::types::Type;

use crate::analyzer::Analyzer;
use crate::diagnostics::MalformedTree;
use crate::tree_support::{child, place, resolve_type_annotation, text};

impl Analyzer {
    /// `var x [: T] [= e];` — at least one of the annotation or the
    /// initializer is present by construction of the parser, but either
    /// may be missing, and a bare `TypeAnnotation` child is how the
    /// walker tells "annotation, no initializer" apart from "initializer,
    /// no annotation": the two productions never share a `NodeKind`.
    pub(crate) fn visit_variable_declaration(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let name = text(node)?.to_string();

        let mut next = 0;
        let annotation = match node.children.first() {
            Some(first) if first.kind == NodeKind::TypeAnnotation => {
                next += 1;
                Some(resolve_type_annotation(first)?)
            }
            _ => None,
        };
        let initializer = match node.children.get(next) {
            Some(init_node) => Some(self.visit_expression(init_node)?),
            None => None,
        };

        if let (Some(annotation), Some(initializer)) = (&annotation, &initializer) {
            if !initializer.ty.is_unknown() && !annotation.equal(&initializer.ty) {
                self.record(
                    node.line,
                    format!(
                        "Type error: variable '{}' declared as {} but initialized with {}",
                        name, annotation, initializer.ty
                    ),
                );
            }
        }

        let declared_type = annotation
            .or_else(|| initializer.as_ref().map(|f| f.ty.clone()))
            .unwrap_or(Type::Unknown);

        if !self
            .symbols
            .declare(Symbol::variable(name.clone(), declared_type, Mutability::Mutable))
        {
            self.record(
                node.line,
                format!("Identifier '{}' already declared in this scope", name),
            );
        }

        let mut code = initializer.as_ref().map(|f| f.code.clone()).unwrap_or_default();
        if let Some(initializer) = &initializer {
            code.push(format!("{} = {}", name, place(initializer)));
        }

        Ok(make_fragment(code, None, Type::Void))
    }

    /// `const x [: T] = e;` — the initializer is mandatory by grammar.
    pub(crate) fn visit_constant_declaration(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let name = text(node)?.to_string();

        let mut next = 0;
        let annotation = match node.children.first() {
            Some(first) if first.kind == NodeKind::TypeAnnotation => {
                next += 1;
                Some(resolve_type_annotation(first)?)
            }
            _ => None,
        };
        let initializer = self.visit_expression(child(node, next)?)?;

        if let Some(annotation) = &annotation {
            if !initializer.ty.is_unknown() && !annotation.equal(&initializer.ty) {
                self.record(
                    node.line,
                    format!(
                        "Type error: variable '{}' declared as {} but initialized with {}",
                        name, annotation, initializer.ty
                    ),
                );
            }
        }

        let declared_type = annotation.unwrap_or_else(|| initializer.ty.clone());

        if !self
            .symbols
            .declare(Symbol::variable(name.clone(), declared_type, Mutability::Const))
        {
            self.record(
                node.line,
                format!("Identifier '{}' already declared in this scope", name),
            );
        }

        let mut code = initializer.code.clone();
        code.push(format!("{} = {}", name, place(&initializer)));

        Ok(make_fragment(code, None, Type::Void))
    }

    /// `x = e;` — no TAC is emitted at all when `x` is undeclared, per
    /// the driver's contract: a broken assignment leaves no trace in the
    /// listing beyond its diagnostic.
    pub(crate) fn visit_assignment(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let name = text(node)?.to_string();
        let value = self.visit_expression(child(node, 0)?)?;

        let symbol = match self.symbols.resolve(&name) {
            Some(symbol) => symbol.clone(),
            None => {
                self.record(node.line, format!("Variable '{}' not declared", name));
                return Ok(CodeFragment::empty_statement());
            }
        };

        if symbol.mutability == Mutability::Const {
            self.record(
                node.line,
                format!("Reassignment to constant '{}' is not allowed", name),
            );
        }
        if !value.ty.is_unknown() && !symbol.ty.equal(&value.ty) {
            self.record(
                node.line,
                format!(
                    "Type error: cannot assign {} to variable '{}' of type {}",
                    value.ty, name, symbol.ty
                ),
            );
        }

        let mut code = value.code.clone();
        code.push(format!("{} = {}", name, place(&value)));

        Ok(make_fragment(code, None, Type::Void))
    }

    /// `function f(p1: T1, …): R { body }` — the function symbol is
    /// declared into the *enclosing* scope before the body is walked, so
    /// a recursive call inside resolves; parameters live one scope out
    /// from the body's own block scope.
    pub(crate) fn visit_function_declaration(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let name = text(node)?.to_string();
        let parameters_node = child(node, 0)?;

        let mut params = Vec::new();
        let mut seen = HashSet::new();
        for param in &parameters_node.children {
            let param_name = text(param)?.to_string();
            let param_type = resolve_type_annotation(child(param, 0)?)?;
            if !seen.insert(param_name.clone()) {
                self.record(
                    param.line,
                    format!("Duplicate parameter name '{}' in function '{}'", param_name, name),
                );
            }
            params.push((param_name, param_type));
        }

        // Body is always the last child; a `TypeAnnotation` sits between
        // the parameters and the body only when a return type was given.
        let body_index = node.children.len() - 1;
        let return_type = if body_index == 2 {
            resolve_type_annotation(child(node, 1)?)?
        } else {
            Type::Unknown
        };
        let body_node = child(node, body_index)?;

        if !self.symbols.declare(Symbol::function(
            name.clone(),
            params.clone(),
            return_type.clone(),
        )) {
            self.record(
                node.line,
                format!("Identifier '{}' already declared in this scope", name),
            );
        }

        self.symbols.enter_scope();
        for (param_name, param_type) in &params {
            self.symbols.declare(Symbol::variable(
                param_name.clone(),
                param_type.clone(),
                Mutability::Mutable,
            ));
        }
        self.function_return_types.push(return_type);
        let body = self.visit_statement(body_node);
        self.function_return_types.pop();
        self.symbols.exit_scope();
        let body = body?;

        let mut code = vec![format!("{}:", name)];
        code.extend(body.code);

        Ok(make_fragment(code, None, Type::Void))
    }
}

#[cfg(test)]
mod tests {
    use crate::analyzer::analyze;
    use parse_tree::Parser;

    fn analyze_source(source: &str) -> crate::analyzer::AnalysisOutput {
        let mut parser = Parser::new(source);
        let program = parser.parse_program().expect("valid program");
        analyze(&program)
    }

    #[test]
    fn declaration_with_arithmetic_initializer_matches_the_canonical_trace() {
        let out = analyze_source("var x: integer = 1 + 2 * 3;");
        assert!(out.semantic_errors.is_empty());
        assert_eq!(
            out.intermediate_code,
            vec!["t1 = 2 * 3", "t2 = 1 + t1", "x = t2"]
        );
        assert_eq!(out.symbol_table.len(), 1);
        assert_eq!(out.symbol_table[0].name, "x");
        assert!(!out.symbol_table[0].is_const);
    }

    #[test]
    fn mismatched_initializer_is_diagnosed_but_the_symbol_still_exists() {
        let out = analyze_source("var x: integer = \"hi\";");
        assert_eq!(out.semantic_errors.len(), 1);
        assert!(out.semantic_errors[0]
            .contains("variable 'x' declared as integer but initialized with string"));
        assert_eq!(out.symbol_table[0].name, "x");
    }

    #[test]
    fn assignment_to_an_undeclared_name_emits_no_tac() {
        let out = analyze_source("y = 1;");
        assert_eq!(
            out.semantic_errors,
            vec!["Error at line 1: Variable 'y' not declared".to_string()]
        );
        assert!(out.intermediate_code.is_empty());
    }

    #[test]
    fn reassigning_a_constant_is_diagnosed() {
        let out = analyze_source("const x: integer = 1; x = 2;");
        assert!(out
            .semantic_errors
            .iter()
            .any(|e| e.contains("Reassignment to constant 'x' is not allowed")));
    }

    #[test]
    fn function_declared_with_wrong_arity_call_is_diagnosed() {
        let out = analyze_source(
            "function add(a: integer, b: integer): integer { return a + b; } add(1);",
        );
        assert!(out
            .semantic_errors
            .iter()
            .any(|e| e.contains("Function 'add' expects 2 arguments but got 1")));
    }

    #[test]
    fn a_wrong_arity_call_still_leaves_the_function_symbol_intact() {
        use shared_context::symbol_table::SymbolKind;

        let mut parser = Parser::new(
            "function add(a: integer, b: integer): integer { return a + b; } add(1);",
        );
        let program = parser.parse_program().expect("valid program");
        let mut analyzer = crate::analyzer::Analyzer::new();
        let out = analyzer.run(&program);
        assert!(out
            .semantic_errors
            .iter()
            .any(|e| e.contains("Function 'add' expects 2 arguments but got 1")));

        let symbol = analyzer.resolve_global("add").expect("function symbol exists");
        match &symbol.kind {
            SymbolKind::Function { params, return_type } => {
                assert_eq!(
                    params,
                    &vec![
                        ("a".to_string(), Type::Integer),
                        ("b".to_string(), Type::Integer),
                    ]
                );
                assert_eq!(*return_type, Type::Integer);
            }
            other => panic!("expected a function symbol, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_declaration_in_the_same_scope_is_diagnosed() {
        let out = analyze_source("var x: integer = 1; var x: integer = 2;");
        assert!(out
            .semantic_errors
            .iter()
            .any(|e| e.contains("Identifier 'x' already declared in this scope")));
    }
}
