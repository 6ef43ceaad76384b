use ir_gen::{CodeFragment, make_fragment};
use parse_tree::{NodeKind, ParseNode};
use shared_context::symbol_table::{Mutability, Symbol};
use shared_context::types::Type;

use crate::analyzer::{Analyzer, LoopLabels};
use crate::diagnostics::MalformedTree;
use crate::tree_support::{child, is_empty_slot, place, text};

impl Analyzer {
    /// Walks the whole program: every top-level child is a statement or
    /// declaration, visited left to right, and the TAC listing is the
    /// concatenation of their fragments' code in that order.
    pub(crate) fn visit_program(&mut self, program: &ParseNode) -> Result<Vec<String>, MalformedTree> {
        let mut code = Vec::new();
        for stmt in &program.children {
            let fragment = self.visit_statement(stmt)?;
            code.extend(fragment.code);
        }
        Ok(code)
    }

    /// Dispatches on node kind to the visitor for one statement or
    /// declaration. Every arm returns a statement-shaped fragment
    /// (`place: None`, `ty: Void`) except where the grammar allows a
    /// bare expression as a statement.
    pub(crate) fn visit_statement(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        match node.kind {
            NodeKind::VariableDeclaration => self.visit_variable_declaration(node),
            NodeKind::ConstantDeclaration => self.visit_constant_declaration(node),
            NodeKind::Assignment => self.visit_assignment(node),
            NodeKind::ExpressionStatement => self.visit_expression_statement(node),
            NodeKind::Block => self.visit_block(node),
            NodeKind::IfStatement => self.visit_if_statement(node),
            NodeKind::WhileStatement => self.visit_while_statement(node),
            NodeKind::DoWhileStatement => self.visit_do_while_statement(node),
            NodeKind::ForStatement => self.visit_for_statement(node),
            NodeKind::ForeachStatement => self.visit_foreach_statement(node),
            NodeKind::BreakStatement => self.visit_break_statement(node),
            NodeKind::ContinueStatement => self.visit_continue_statement(node),
            NodeKind::ReturnStatement => self.visit_return_statement(node),
            NodeKind::FunctionDeclaration => self.visit_function_declaration(node),
            other => Err(MalformedTree::new(
                node.line,
                format!("{:?} is not a statement-position node kind", other),
            )),
        }
    }

    fn visit_expression_statement(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let expr = self.visit_expression(child(node, 0)?)?;
        Ok(make_fragment(expr.code, None, Type::Void))
    }

    /// Visits a `Block`'s statements inside a fresh scope, so any name
    /// declared within cannot leak to the surrounding scope once the
    /// block exits — even along an error path, since every branch
    /// above returns `Ok` or bubbles a `MalformedTree` that the caller
    /// reports and discards rather than panicking mid-walk.
    pub(crate) fn visit_block(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        self.symbols.enter_scope();
        let mut code = Vec::new();
        let mut result = Ok(());
        for stmt in &node.children {
            match self.visit_statement(stmt) {
                Ok(fragment) => code.extend(fragment.code),
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
        self.symbols.exit_scope();
        result.map(|()| make_fragment(code, None, Type::Void))
    }

    fn visit_if_statement(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let cond_node = child(node, 0)?;
        let then_node = child(node, 1)?;
        let else_node = node.children.get(2);

        let cond = self.visit_expression(cond_node)?;
        if !cond.ty.is_unknown() && cond.ty != Type::Boolean {
            self.record(
                node.line,
                format!("Type error: if condition must be boolean, got {}", cond.ty),
            );
        }

        let l_else = self.codegen.new_label();
        let then_fragment = self.visit_statement(then_node)?;
        let l_end = self.codegen.new_label();
        let else_fragment = match else_node {
            Some(n) => Some(self.visit_statement(n)?),
            None => None,
        };

        let mut code = cond.code;
        code.push(format!("ifFalse {} goto {}", place(&cond), l_else));
        code.extend(then_fragment.code);
        code.push(format!("goto {}", l_end));
        code.push(format!("{}:", l_else));
        if let Some(else_fragment) = else_fragment {
            code.extend(else_fragment.code);
        }
        code.push(format!("{}:", l_end));

        Ok(make_fragment(code, None, Type::Void))
    }

    fn visit_while_statement(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let cond_node = child(node, 0)?;
        let body_node = child(node, 1)?;

        let l_start = self.codegen.new_label();
        let cond = self.visit_expression(cond_node)?;
        if !cond.ty.is_unknown() && cond.ty != Type::Boolean {
            self.record(
                node.line,
                format!("Type error: while condition must be boolean, got {}", cond.ty),
            );
        }
        let l_end = self.codegen.new_label();

        self.loop_labels.push(LoopLabels {
            continue_label: l_start.clone(),
            break_label: l_end.clone(),
        });
        let body = self.visit_statement(body_node);
        self.loop_labels.pop();
        let body = body?;

        let mut code = vec![format!("{}:", l_start)];
        code.extend(cond.code);
        code.push(format!("ifFalse {} goto {}", place(&cond), l_end));
        code.extend(body.code);
        code.push(format!("goto {}", l_start));
        code.push(format!("{}:", l_end));

        Ok(make_fragment(code, None, Type::Void))
    }

    fn visit_do_while_statement(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let body_node = child(node, 0)?;
        let cond_node = child(node, 1)?;

        let l_start = self.codegen.new_label();
        let l_cond = self.codegen.new_label();
        let l_end = self.codegen.new_label();

        self.loop_labels.push(LoopLabels {
            continue_label: l_cond.clone(),
            break_label: l_end.clone(),
        });
        let body = self.visit_statement(body_node);
        self.loop_labels.pop();
        let body = body?;

        let cond = self.visit_expression(cond_node)?;
        if !cond.ty.is_unknown() && cond.ty != Type::Boolean {
            self.record(
                node.line,
                format!("Type error: do-while condition must be boolean, got {}", cond.ty),
            );
        }

        let mut code = vec![format!("{}:", l_start)];
        code.extend(body.code);
        code.push(format!("{}:", l_cond));
        code.extend(cond.code);
        code.push(format!("ifTrue {} goto {}", place(&cond), l_start));
        code.push(format!("{}:", l_end));

        Ok(make_fragment(code, None, Type::Void))
    }

    /// `init`/`cond`/`step` are each either a real node or an `Empty`
    /// sentinel filling an omitted grammar slot (see `NodeKind::Empty`);
    /// `body` is always a real statement.
    fn visit_for_statement(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let init_node = child(node, 0)?;
        let cond_node = child(node, 1)?;
        let step_node = child(node, 2)?;
        let body_node = child(node, 3)?;

        // The `for`'s own init/condition live in a scope that wraps the
        // body, so a `for (var i = 0; ...)` counter doesn't leak past
        // the loop.
        self.symbols.enter_scope();

        let init_code = if is_empty_slot(init_node) {
            Vec::new()
        } else {
            self.visit_statement(init_node)?.code
        };

        let l_start = self.codegen.new_label();

        let cond = if is_empty_slot(cond_node) {
            None
        } else {
            let cond = self.visit_expression(cond_node)?;
            if !cond.ty.is_unknown() && cond.ty != Type::Boolean {
                self.record(
                    node.line,
                    format!("Type error: for condition must be boolean, got {}", cond.ty),
                );
            }
            Some(cond)
        };

        let l_end = self.codegen.new_label();
        // `continue` must land on the step, not on `l_start`: the step
        // sits after the body in emission order, so jumping straight to
        // `l_start` would skip it and, for a counting loop, never
        // advance the counter on the `continue` path.
        let l_step = self.codegen.new_label();

        self.loop_labels.push(LoopLabels {
            continue_label: l_step.clone(),
            break_label: l_end.clone(),
        });
        let body = self.visit_statement(body_node);
        let step_code = if is_empty_slot(step_node) {
            Ok(Vec::new())
        } else {
            self.visit_expression(step_node).map(|f| f.code)
        };
        self.loop_labels.pop();
        let body = body?;
        let step_code = step_code?;

        let mut code = init_code;
        code.push(format!("{}:", l_start));
        if let Some(cond) = &cond {
            code.extend(cond.code.clone());
            code.push(format!("ifFalse {} goto {}", place(cond), l_end));
        }
        code.extend(body.code);
        code.push(format!("{}:", l_step));
        code.extend(step_code);
        code.push(format!("goto {}", l_start));
        code.push(format!("{}:", l_end));

        self.symbols.exit_scope();
        Ok(make_fragment(code, None, Type::Void))
    }

    /// Desugars `foreach (x in arr) body` into a counter-based loop over
    /// `arr`'s indices, using `len(...)` as the opaque intrinsic the
    /// spec names. Continues with element type `Unknown` if `arr` isn't
    /// an array, matching the policy for other control-flow type errors.
    fn visit_foreach_statement(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let var_name = text(node)?.to_string();
        let arr_node = child(node, 0)?;
        let body_node = child(node, 1)?;

        let arr = self.visit_expression(arr_node)?;
        let elem_ty = if arr.ty.is_unknown() {
            Type::Unknown
        } else if arr.ty.is_array() {
            arr.ty.element_type()
        } else {
            self.record(
                node.line,
                format!("Type error: foreach requires an array, got {}", arr.ty),
            );
            Type::Unknown
        };

        let counter = self.codegen.new_temp();
        let len_temp = self.codegen.new_temp();
        let l_start = self.codegen.new_label();
        let l_end = self.codegen.new_label();
        // Same fix as the `for` loop: `continue` must land on the
        // increment, which is emitted after the body, not on `l_start`.
        let l_step = self.codegen.new_label();

        self.symbols.enter_scope();
        self.symbols
            .declare(Symbol::variable(var_name.clone(), elem_ty, Mutability::Mutable));

        self.loop_labels.push(LoopLabels {
            continue_label: l_step.clone(),
            break_label: l_end.clone(),
        });
        let cond_temp = self.codegen.new_temp();
        let body = self.visit_statement(body_node);
        self.loop_labels.pop();
        self.symbols.exit_scope();
        let body = body?;

        let incr_temp = self.codegen.new_temp();

        let mut code = arr.code;
        code.push(format!("{} = 0", counter));
        code.push(format!("{} = len({})", len_temp, place(&arr)));
        code.push(format!("{}:", l_start));
        code.push(format!("{} = {} < {}", cond_temp, counter, len_temp));
        code.push(format!("ifFalse {} goto {}", cond_temp, l_end));
        code.push(format!("{} = {}[{}]", var_name, place(&arr), counter));
        code.extend(body.code);
        code.push(format!("{}:", l_step));
        code.push(format!("{} = {} + 1", incr_temp, counter));
        code.push(format!("{} = {}", counter, incr_temp));
        code.push(format!("goto {}", l_start));
        code.push(format!("{}:", l_end));

        Ok(make_fragment(code, None, Type::Void))
    }

    fn visit_break_statement(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        match self.loop_labels.last() {
            Some(labels) => {
                let code = vec![format!("goto {}", labels.break_label)];
                Ok(make_fragment(code, None, Type::Void))
            }
            None => {
                self.record(node.line, "'break' used outside of loop");
                Ok(CodeFragment::empty_statement())
            }
        }
    }

    fn visit_continue_statement(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        match self.loop_labels.last() {
            Some(labels) => {
                let code = vec![format!("goto {}", labels.continue_label)];
                Ok(make_fragment(code, None, Type::Void))
            }
            None => {
                self.record(node.line, "'continue' used outside of loop");
                Ok(CodeFragment::empty_statement())
            }
        }
    }

    fn visit_return_statement(&mut self, node: &ParseNode) -> Result<CodeFragment, MalformedTree> {
        let value_node = node.children.first();

        if self.function_return_types.is_empty() {
            self.record(node.line, "'return' used outside of function");
            if let Some(value_node) = value_node {
                self.visit_expression(value_node)?;
            }
            return Ok(CodeFragment::empty_statement());
        }

        let expected = self
            .function_return_types
            .last()
            .expect("checked non-empty above")
            .clone();

        match value_node {
            Some(expr_node) => {
                let value = self.visit_expression(expr_node)?;
                if !value.ty.is_unknown() && !expected.equal(&value.ty) {
                    self.record(
                        node.line,
                        format!(
                            "Type error: return type mismatch, expected {} but got {}",
                            expected, value.ty
                        ),
                    );
                }
                let mut code = value.code;
                code.push(format!("return {}", place(&value)));
                Ok(make_fragment(code, None, Type::Void))
            }
            None => {
                if !expected.equal(&Type::Void) {
                    self.record(
                        node.line,
                        format!(
                            "Type error: function expects a return value of type {} but return has none",
                            expected
                        ),
                    );
                }
                Ok(make_fragment(vec!["return".to_string()], None, Type::Void))
            }
        }
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
    fn while_loop_emits_the_canonical_template() {
        let out = analyze_source("var i: integer = 0; while (i < 10) { i = i + 1; }");
        assert!(out.semantic_errors.is_empty());
        assert_eq!(
            out.intermediate_code,
            vec![
                "i = 0",
                "L1:",
                "t1 = i < 10",
                "ifFalse t1 goto L2",
                "t2 = i + 1",
                "i = t2",
                "goto L1",
                "L2:",
            ]
        );
    }

    #[test]
    fn break_outside_a_loop_is_diagnosed() {
        let out = analyze_source("break;");
        assert_eq!(
            out.semantic_errors,
            vec!["Error at line 1: 'break' used outside of loop".to_string()]
        );
    }

    #[test]
    fn break_inside_a_loop_is_not_diagnosed() {
        let out = analyze_source("while (true) { break; }");
        assert!(out.semantic_errors.is_empty());
    }

    #[test]
    fn block_scopes_do_not_leak_declarations() {
        let out = analyze_source("if (true) { var y: integer = 1; }");
        assert!(out.semantic_errors.is_empty());
        assert!(out.symbol_table.is_empty());
    }

    #[test]
    fn for_loop_with_all_slots_omitted_still_needs_a_break_to_terminate() {
        let out = analyze_source("for (;;) { break; }");
        assert!(out.semantic_errors.is_empty());
        assert!(out.intermediate_code.iter().any(|line| line.starts_with("goto")));
    }

    #[test]
    fn continue_inside_a_for_loop_still_runs_the_step() {
        let out = analyze_source(
            "for (var i: integer = 0; i < 3; 1 + 1) { if (i == 0) { continue; } }",
        );
        assert!(out.semantic_errors.is_empty());
        assert_eq!(
            out.intermediate_code,
            vec![
                "i = 0",
                "L1:",
                "t1 = i < 3",
                "ifFalse t1 goto L2",
                "t2 = i == 0",
                "ifFalse t2 goto L4",
                "goto L3",
                "goto L5",
                "L4:",
                "L5:",
                "L3:",
                "t3 = 1 + 1",
                "goto L1",
                "L2:",
            ]
        );
    }

    #[test]
    fn continue_inside_a_foreach_loop_still_advances_the_counter() {
        let out = analyze_source("foreach (x in [1, 2, 3]) { if (x == 1) { continue; } }");
        assert!(out.semantic_errors.is_empty());
        assert_eq!(
            out.intermediate_code,
            vec![
                "t1 = []",
                "push(t1, 1)",
                "push(t1, 2)",
                "push(t1, 3)",
                "t2 = 0",
                "t3 = len(t1)",
                "L1:",
                "t4 = t2 < t3",
                "ifFalse t4 goto L2",
                "x = t1[t2]",
                "t5 = x == 1",
                "ifFalse t5 goto L4",
                "goto L3",
                "goto L5",
                "L4:",
                "L5:",
                "L3:",
                "t6 = t2 + 1",
                "t2 = t6",
                "goto L1",
                "L2:",
            ]
        );
    }
}
