use ir_gen::{CodeFragment, make_fragment};
use parse_tree::{NodeKind, ParseNode};
use shared_context::symbol_table::SymbolKind;
use shared_context::types::Type;

use crate::analyzer::Analyzer;
use crate::diagnostics::MalformedTree;
use crate::tree_support::{child, literal_type, place, text};

fn is_boolean_like(ty: &Type) -> bool {
    ty.is_unknown() || *ty == Type::Boolean
}

impl Analyzer {
    pub(crate) fn visit_expression(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        match node.kind {
            NodeKind::LogicalOrExpr | NodeKind::LogicalAndExpr => self.visit_logical(node),
            NodeKind::EqualityExpr => self.visit_equality(node),
            NodeKind::RelationalExpr => self.visit_relational(node),
            NodeKind::AdditiveExpr | NodeKind::MultiplicativeExpr => self.visit_arithmetic(node),
            NodeKind::UnaryExpr => self.visit_unary(node),
            NodeKind::CallExpr => self.visit_call(node),
            NodeKind::IndexExpr => self.visit_index(node),
            NodeKind::IdentifierExpr => self.visit_identifier(node),
            NodeKind::LiteralExpr => self.visit_literal(node),
            NodeKind::ArrayLiteral => self.visit_array_literal(node),
            other => Err(MalformedTree::new(
                node.line,
                format!("{:?} is not an expression-position node kind", other),
            )),
        }
    }

    fn binary_operands(
        &mut self,
        node: &ParseNode,
    ) -> Result<(CodeFragment, CodeFragment, String), MalformedTree> {
        let op = text(node)?.to_string();
        let left = self.visit_expression(child(node, 0)?)?;
        let right = self.visit_expression(child(node, 1)?)?;
        Ok((left, right, op))
    }

    fn visit_logical(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let (left, right, op) = self.binary_operands(node)?;

        if left.ty.is_unknown() || right.ty.is_unknown() {
            return Ok(CodeFragment::unknown());
        }
        if !is_boolean_like(&left.ty) || !is_boolean_like(&right.ty) {
            self.record(
                node.line,
                format!(
                    "Type error: operator '{}' requires boolean operands, got {} and {}",
                    op, left.ty, right.ty
                ),
            );
            return Ok(CodeFragment::unknown());
        }

        let temp = self.codegen.new_temp();
        let mut code = left.code.clone();
        code.extend(right.code.clone());
        code.push(format!("{} = {} {} {}", temp, place(&left), op, place(&right)));
        Ok(make_fragment(code, Some(temp), Type::Boolean))
    }

    fn visit_equality(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let (left, right, op) = self.binary_operands(node)?;

        if left.ty.is_unknown() || right.ty.is_unknown() {
            return Ok(CodeFragment::unknown());
        }
        if !left.ty.comparable(&right.ty) {
            self.record(
                node.line,
                format!("Type error: cannot compare {} and {}", left.ty, right.ty),
            );
            return Ok(CodeFragment::unknown());
        }

        let temp = self.codegen.new_temp();
        let mut code = left.code.clone();
        code.extend(right.code.clone());
        code.push(format!("{} = {} {} {}", temp, place(&left), op, place(&right)));
        Ok(make_fragment(code, Some(temp), Type::Boolean))
    }

    fn visit_relational(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let (left, right, op) = self.binary_operands(node)?;

        if left.ty.is_unknown() || right.ty.is_unknown() {
            return Ok(CodeFragment::unknown());
        }
        if !left.ty.numeric() || !right.ty.numeric() {
            self.record(
                node.line,
                format!(
                    "Type error: operator '{}' requires numeric operands, got {} and {}",
                    op, left.ty, right.ty
                ),
            );
            return Ok(CodeFragment::unknown());
        }

        let temp = self.codegen.new_temp();
        let mut code = left.code.clone();
        code.extend(right.code.clone());
        code.push(format!("{} = {} {} {}", temp, place(&left), op, place(&right)));
        Ok(make_fragment(code, Some(temp), Type::Boolean))
    }

    fn visit_arithmetic(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let (left, right, op) = self.binary_operands(node)?;

        if left.ty.is_unknown() || right.ty.is_unknown() {
            return Ok(CodeFragment::unknown());
        }
        if !left.ty.numeric() || !right.ty.numeric() {
            self.record(
                node.line,
                format!(
                    "Type error: operator '{}' requires numeric operands, got {} and {}",
                    op, left.ty, right.ty
                ),
            );
            return Ok(CodeFragment::unknown());
        }

        let result_ty = left.ty.arith_result(&right.ty);
        let temp = self.codegen.new_temp();
        let mut code = left.code.clone();
        code.extend(right.code.clone());
        code.push(format!("{} = {} {} {}", temp, place(&left), op, place(&right)));
        Ok(make_fragment(code, Some(temp), result_ty))
    }

    fn visit_unary(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let op = text(node)?.to_string();
        let operand = self.visit_expression(child(node, 0)?)?;

        if operand.ty.is_unknown() {
            return Ok(CodeFragment::unknown());
        }

        match op.as_str() {
            "-" => {
                if !operand.ty.numeric() {
                    self.record(
                        node.line,
                        format!("Type error: unary '-' requires a numeric operand, got {}", operand.ty),
                    );
                    return Ok(CodeFragment::unknown());
                }
                let temp = self.codegen.new_temp();
                let mut code = operand.code.clone();
                code.push(format!("{} = -{}", temp, place(&operand)));
                Ok(make_fragment(code, Some(temp), operand.ty))
            }
            "!" => {
                if !is_boolean_like(&operand.ty) {
                    self.record(
                        node.line,
                        format!("Type error: unary '!' requires a boolean operand, got {}", operand.ty),
                    );
                    return Ok(CodeFragment::unknown());
                }
                let temp = self.codegen.new_temp();
                let mut code = operand.code.clone();
                code.push(format!("{} = !{}", temp, place(&operand)));
                Ok(make_fragment(code, Some(temp), Type::Boolean))
            }
            other => Err(MalformedTree::new(
                node.line,
                format!("unrecognized unary operator '{}'", other),
            )),
        }
    }

    fn visit_identifier(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let name = text(node)?.to_string();
        match self.symbols.resolve(&name) {
            Some(symbol) => Ok(make_fragment(Vec::new(), Some(name), symbol.ty.clone())),
            None => {
                self.record(node.line, format!("Variable '{}' not declared", name));
                Ok(CodeFragment::unknown())
            }
        }
    }

    fn visit_literal(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let literal_text = text(node)?;
        let ty = literal_type(literal_text);
        Ok(make_fragment(Vec::new(), Some(literal_text.to_string()), ty))
    }

    /// `[]` is `Array(Unknown)`; a non-empty literal requires every
    /// element to share a structural type (`Unknown` elements never
    /// break that agreement, since a prior failure already diagnosed
    /// them).
    fn visit_array_literal(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        if node.children.is_empty() {
            let temp = self.codegen.new_temp();
            let code = vec![format!("{} = []", temp)];
            return Ok(make_fragment(code, Some(temp), Type::array_of(Type::Unknown)));
        }

        let mut elements = Vec::with_capacity(node.children.len());
        for element_node in &node.children {
            elements.push(self.visit_expression(element_node)?);
        }

        let reference_ty = elements
            .iter()
            .map(|e| e.ty.clone())
            .find(|ty| !ty.is_unknown())
            .unwrap_or(Type::Unknown);

        let consistent = elements.iter().all(|e| reference_ty.equal(&e.ty));
        if !consistent {
            self.record(node.line, "Type error: array literal has inconsistent element types");
            return Ok(make_fragment(Vec::new(), None, Type::array_of(Type::Unknown)));
        }

        let temp = self.codegen.new_temp();
        let mut code = Vec::new();
        for element in &elements {
            code.extend(element.code.clone());
        }
        code.push(format!("{} = []", temp));
        for element in &elements {
            code.push(format!("push({}, {})", temp, place(element)));
        }

        Ok(make_fragment(code, Some(temp), Type::array_of(reference_ty)))
    }

    /// The base of an index expression is evaluated as a general
    /// expression rather than restricted to a bare identifier — an array
    /// produced by a call or another index still indexes, matching how
    /// every other binary-ish form in this walker treats its operands.
    fn visit_index(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let base = self.visit_expression(child(node, 0)?)?;
        let index = self.visit_expression(child(node, 1)?)?;

        if base.ty.is_unknown() || index.ty.is_unknown() {
            return Ok(CodeFragment::unknown());
        }
        if !base.ty.is_array() {
            self.record(
                node.line,
                format!("Type error: cannot index into non-array type {}", base.ty),
            );
            return Ok(CodeFragment::unknown());
        }
        if index.ty != Type::Integer {
            self.record(
                node.line,
                format!("Type error: array index must be integer, got {}", index.ty),
            );
            return Ok(CodeFragment::unknown());
        }

        let elem_ty = base.ty.element_type();

        let temp = self.codegen.new_temp();
        let mut code = base.code.clone();
        code.extend(index.code.clone());
        code.push(format!("{} = {}[{}]", temp, place(&base), place(&index)));
        Ok(make_fragment(code, Some(temp), elem_ty))
    }

    /// `f(a1, …, ak)`. TAC for calls extends the bit-exact grammar with
    /// `param <place>` per argument followed by `<tmp> = call <name>,
    /// <argcount>` — forms the line grammar is silent on rather than
    /// forbids.
    fn visit_call(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let callee_node = child(node, 0)?;
        let callee_name = match callee_node.kind {
            NodeKind::IdentifierExpr => text(callee_node)?.to_string(),
            _ => {
                return Err(MalformedTree::new(
                    node.line,
                    "call expression callee is not an identifier",
                ));
            }
        };

        let mut args = Vec::with_capacity(node.children.len().saturating_sub(1));
        for arg_node in &node.children[1..] {
            args.push(self.visit_expression(arg_node)?);
        }

        let symbol = self.symbols.resolve(&callee_name).cloned();
        let (params, return_type) = match &symbol {
            Some(symbol) => match &symbol.kind {
                SymbolKind::Function { params, return_type } => {
                    (Some(params.clone()), return_type.clone())
                }
                SymbolKind::Variable => {
                    self.record(node.line, format!("'{}' is not a function", callee_name));
                    (None, Type::Unknown)
                }
            },
            None => {
                self.record(node.line, format!("Function '{}' not declared", callee_name));
                (None, Type::Unknown)
            }
        };

        if let Some(params) = &params {
            if params.len() != args.len() {
                self.record(
                    node.line,
                    format!(
                        "Function '{}' expects {} arguments but got {}",
                        callee_name,
                        params.len(),
                        args.len()
                    ),
                );
            } else {
                for (index, ((_, expected_ty), arg)) in params.iter().zip(args.iter()).enumerate() {
                    if !arg.ty.is_unknown() && !expected_ty.equal(&arg.ty) {
                        self.record(
                            node.line,
                            format!(
                                "Type error: argument {} to '{}' expects {} but got {}",
                                index + 1,
                                callee_name,
                                expected_ty,
                                arg.ty
                            ),
                        );
                    }
                }
            }
        }

        let temp = self.codegen.new_temp();
        let mut code = Vec::new();
        for arg in &args {
            code.extend(arg.code.clone());
        }
        // An argument that already failed to type-check (`Unknown`, no
        // `place`) has no real value to pass; per §6's bit-exact `<place>`
        // grammar a `param` line must always name a temporary, identifier,
        // or literal, so a failed argument contributes no `param` line
        // rather than one referencing a placeholder.
        for arg in &args {
            if let Some(arg_place) = &arg.place {
                code.push(format!("param {}", arg_place));
            }
        }
        code.push(format!("{} = call {}, {}", temp, callee_name, args.len()));

        Ok(make_fragment(code, Some(temp), return_type))
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
    fn mixed_integer_float_arithmetic_widens_to_float() {
        let out = analyze_source("var x: float = 1 + 2.5;");
        assert!(out.semantic_errors.is_empty());
        assert_eq!(out.intermediate_code, vec!["t1 = 1 + 2.5", "x = t1"]);
    }

    #[test]
    fn comparing_a_string_to_a_number_is_diagnosed() {
        let out = analyze_source("var x: boolean = 1 == \"a\";");
        assert!(out.semantic_errors.iter().any(|e| e.contains("cannot compare")));
    }

    #[test]
    fn empty_array_literal_has_unknown_element_type() {
        let out = analyze_source("var a = [];");
        assert!(out.semantic_errors.is_empty());
        assert_eq!(out.intermediate_code, vec!["t1 = []", "a = t1"]);
    }

    #[test]
    fn array_literal_pushes_every_element_in_order() {
        let out = analyze_source("var a = [1, 2, 3];");
        assert!(out.semantic_errors.is_empty());
        assert_eq!(
            out.intermediate_code,
            vec!["t1 = []", "push(t1, 1)", "push(t1, 2)", "push(t1, 3)", "a = t1"]
        );
    }

    #[test]
    fn inconsistent_array_literal_elements_are_diagnosed() {
        let out = analyze_source("var a = [1, \"two\"];");
        assert!(out
            .semantic_errors
            .iter()
            .any(|e| e.contains("inconsistent element types")));
    }

    #[test]
    fn indexing_a_non_array_is_diagnosed() {
        let out = analyze_source("var x: integer = 1; var y = x[0];");
        assert!(out
            .semantic_errors
            .iter()
            .any(|e| e.contains("cannot index into non-array type")));
    }

    #[test]
    fn an_already_unknown_operand_emits_no_tac_and_no_new_diagnostic() {
        let out = analyze_source("z + 1;");
        assert_eq!(
            out.semantic_errors,
            vec!["Error at line 1: Variable 'z' not declared".to_string()]
        );
        assert!(out.intermediate_code.is_empty());
    }

    #[test]
    fn a_chain_of_operators_over_an_unknown_operand_still_emits_only_the_original_diagnostic() {
        let out = analyze_source("z + 1 + 2;");
        assert_eq!(
            out.semantic_errors,
            vec!["Error at line 1: Variable 'z' not declared".to_string()]
        );
        assert!(out.intermediate_code.is_empty());
    }

    #[test]
    fn calling_a_function_with_an_unknown_argument_emits_no_param_line_for_it() {
        let out = analyze_source(
            "function f(a: integer): integer { return a; } f(z);",
        );
        assert!(out
            .semantic_errors
            .iter()
            .any(|e| e.contains("Variable 'z' not declared")));
        assert!(!out.intermediate_code.iter().any(|line| line.contains("<unknown>")));
        assert!(out.intermediate_code.iter().any(|line| line.starts_with("t") && line.contains("= call f, 1")));
    }
}
