use std::collections::VecDeque;

use lexer::{Lexer, SpannedToken, Token};

use crate::node::{NodeKind, ParseNode};
use crate::parse_err::ParseErr;

/// Recursive-descent, precedence-ordered parser producing a generic
/// `ParseNode` tree. One token of current position plus an on-demand
/// lookahead buffer is enough for the whole grammar; the only construct
/// needing more than one token of lookahead is telling an `Assignment`
/// statement (`x = e;`) apart from an expression statement that merely
/// starts with an identifier (`f();`).
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    buffer: VecDeque<SpannedToken<'a>>,
    current: Option<SpannedToken<'a>>,
    last_line: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            buffer: VecDeque::new(),
            current: None,
            last_line: 1,
        }
    }

    fn fill(&mut self, n: usize) -> Result<(), ParseErr> {
        while self.buffer.len() <= n {
            match self.lexer.next() {
                Some(Ok(tok)) => self.buffer.push_back(tok),
                Some(Err(message)) => return Err(ParseErr::new(message, self.last_line)),
                None => break,
            }
        }
        Ok(())
    }

    fn peek_nth(&mut self, n: usize) -> Result<Option<&SpannedToken<'a>>, ParseErr> {
        self.fill(n)?;
        Ok(self.buffer.get(n))
    }

    fn peek(&mut self) -> Result<Option<Token>, ParseErr> {
        Ok(self.peek_nth(0)?.map(|t| t.token_type))
    }

    fn peek_second(&mut self) -> Result<Option<Token>, ParseErr> {
        Ok(self.peek_nth(1)?.map(|t| t.token_type))
    }

    fn current_line(&self) -> usize {
        self.current
            .as_ref()
            .map(|t| t.span.line_num)
            .unwrap_or(self.last_line)
    }

    fn advance(&mut self) -> Result<SpannedToken<'a>, ParseErr> {
        self.fill(0)?;
        let tok = self
            .buffer
            .pop_front()
            .ok_or_else(|| ParseErr::new("unexpected end of input", self.last_line))?;
        self.last_line = tok.span.line_num;
        self.current = Some(tok.clone());
        Ok(tok)
    }

    fn expect(&mut self, expected: Token) -> Result<SpannedToken<'a>, ParseErr> {
        let tok = self.advance()?;
        if tok.token_type == expected {
            Ok(tok)
        } else {
            Err(ParseErr::expected(expected, tok.token_type, tok.span.line_num))
        }
    }

    fn at(&mut self, token: Token) -> Result<bool, ParseErr> {
        Ok(self.peek()? == Some(token))
    }

    /// Parses a whole program: zero or more top-level declarations or
    /// statements, terminated by end of input.
    pub fn parse_program(&mut self) -> Result<ParseNode, ParseErr> {
        let mut children = Vec::new();
        while self.peek()?.is_some() {
            children.push(self.parse_statement()?);
        }
        Ok(ParseNode::with_children(NodeKind::Program, 1, children))
    }

    fn parse_block(&mut self) -> Result<ParseNode, ParseErr> {
        let open = self.expect(Token::LeftCurlyBracket)?;
        let mut children = Vec::new();
        while !self.at(Token::RightCurlyBracket)? {
            if self.peek()?.is_none() {
                return Err(ParseErr::new("unterminated block", self.last_line));
            }
            children.push(self.parse_statement()?);
        }
        self.expect(Token::RightCurlyBracket)?;
        Ok(ParseNode::with_children(
            NodeKind::Block,
            open.span.line_num,
            children,
        ))
    }

    fn parse_statement(&mut self) -> Result<ParseNode, ParseErr> {
        match self.peek()? {
            Some(Token::Var) => self.parse_variable_declaration(),
            Some(Token::Const) => self.parse_constant_declaration(),
            Some(Token::Function) => self.parse_function_declaration(),
            Some(Token::LeftCurlyBracket) => self.parse_block(),
            Some(Token::If) => self.parse_if_statement(),
            Some(Token::While) => self.parse_while_statement(),
            Some(Token::Do) => self.parse_do_while_statement(),
            Some(Token::For) => self.parse_for_statement(),
            Some(Token::Foreach) => self.parse_foreach_statement(),
            Some(Token::Break) => self.parse_break_statement(),
            Some(Token::Continue) => self.parse_continue_statement(),
            Some(Token::Return) => self.parse_return_statement(),
            Some(Token::Identifier) if self.peek_second()? == Some(Token::Assignment) => {
                self.parse_assignment()
            }
            Some(_) => self.parse_expression_statement(),
            None => Err(ParseErr::new("unexpected end of input", self.last_line)),
        }
    }

    fn parse_variable_declaration(&mut self) -> Result<ParseNode, ParseErr> {
        let line = self.expect(Token::Var)?.span.line_num;
        let name = self.expect(Token::Identifier)?;

        let annotation = if self.at(Token::Colon)? {
            self.advance()?;
            Some(self.parse_type_annotation()?)
        } else {
            None
        };

        let initializer = if self.at(Token::Assignment)? {
            self.advance()?;
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect(Token::Semicolon)?;

        let mut node = ParseNode::with_text(NodeKind::VariableDeclaration, line, name.lexeme);
        node = node.push_opt(annotation);
        node = node.push_opt(initializer);
        Ok(node)
    }

    fn parse_constant_declaration(&mut self) -> Result<ParseNode, ParseErr> {
        let line = self.expect(Token::Const)?.span.line_num;
        let name = self.expect(Token::Identifier)?;

        let annotation = if self.at(Token::Colon)? {
            self.advance()?;
            Some(self.parse_type_annotation()?)
        } else {
            None
        };

        self.expect(Token::Assignment)?;
        let initializer = self.parse_expression()?;
        self.expect(Token::Semicolon)?;

        let mut node = ParseNode::with_text(NodeKind::ConstantDeclaration, line, name.lexeme);
        node = node.push_opt(annotation);
        node = node.push(initializer);
        Ok(node)
    }

    fn parse_assignment(&mut self) -> Result<ParseNode, ParseErr> {
        let name = self.expect(Token::Identifier)?;
        self.expect(Token::Assignment)?;
        let value = self.parse_expression()?;
        self.expect(Token::Semicolon)?;

        Ok(ParseNode::with_text(
            NodeKind::Assignment,
            name.span.line_num,
            name.lexeme,
        )
        .push(value))
    }

    fn parse_expression_statement(&mut self) -> Result<ParseNode, ParseErr> {
        let line = self.peek_nth(0)?.map(|t| t.span.line_num).unwrap_or(self.last_line);
        let expr = self.parse_expression()?;
        self.expect(Token::Semicolon)?;
        Ok(ParseNode::with_children(
            NodeKind::ExpressionStatement,
            line,
            vec![expr],
        ))
    }

    fn parse_if_statement(&mut self) -> Result<ParseNode, ParseErr> {
        let line = self.expect(Token::If)?.span.line_num;
        self.expect(Token::LeftParenthesis)?;
        let condition = self.parse_expression()?;
        self.expect(Token::RightParenthesis)?;
        let then_branch = self.parse_statement()?;

        let mut node =
            ParseNode::with_children(NodeKind::IfStatement, line, vec![condition, then_branch]);

        if self.at(Token::Else)? {
            self.advance()?;
            node.children.push(self.parse_statement()?);
        }

        Ok(node)
    }

    fn parse_while_statement(&mut self) -> Result<ParseNode, ParseErr> {
        let line = self.expect(Token::While)?.span.line_num;
        self.expect(Token::LeftParenthesis)?;
        let condition = self.parse_expression()?;
        self.expect(Token::RightParenthesis)?;
        let body = self.parse_statement()?;

        Ok(ParseNode::with_children(
            NodeKind::WhileStatement,
            line,
            vec![condition, body],
        ))
    }

    fn parse_do_while_statement(&mut self) -> Result<ParseNode, ParseErr> {
        let line = self.expect(Token::Do)?.span.line_num;
        let body = self.parse_statement()?;
        self.expect(Token::While)?;
        self.expect(Token::LeftParenthesis)?;
        let condition = self.parse_expression()?;
        self.expect(Token::RightParenthesis)?;
        self.expect(Token::Semicolon)?;

        Ok(ParseNode::with_children(
            NodeKind::DoWhileStatement,
            line,
            vec![body, condition],
        ))
    }

    fn parse_for_statement(&mut self) -> Result<ParseNode, ParseErr> {
        let line = self.expect(Token::For)?.span.line_num;
        self.expect(Token::LeftParenthesis)?;

        let init = if self.at(Token::Semicolon)? {
            None
        } else if self.at(Token::Var)? {
            Some(self.parse_variable_declaration()?)
        } else {
            let expr = self.parse_expression()?;
            self.expect(Token::Semicolon)?;
            Some(ParseNode::with_children(
                NodeKind::ExpressionStatement,
                expr.line,
                vec![expr],
            ))
        };
        if init.is_none() {
            self.expect(Token::Semicolon)?;
        }

        let condition = if self.at(Token::Semicolon)? {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(Token::Semicolon)?;

        let step = if self.at(Token::RightParenthesis)? {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(Token::RightParenthesis)?;

        let body = self.parse_statement()?;

        // Each optional slot is always present as a child, filled with an
        // `Empty` sentinel when the source omitted it — a bare expression
        // kind alone can't tell a condition apart from a step, so the
        // walker needs a fixed 4-child shape (init, condition, step, body)
        // to index into rather than guessing from node kind.
        let mut node = ParseNode::new(NodeKind::ForStatement, line);
        node.children
            .push(init.unwrap_or_else(|| ParseNode::new(NodeKind::Empty, line)));
        node.children
            .push(condition.unwrap_or_else(|| ParseNode::new(NodeKind::Empty, line)));
        node.children
            .push(step.unwrap_or_else(|| ParseNode::new(NodeKind::Empty, line)));
        node.children.push(body);
        Ok(node)
    }

    fn parse_foreach_statement(&mut self) -> Result<ParseNode, ParseErr> {
        let line = self.expect(Token::Foreach)?.span.line_num;
        self.expect(Token::LeftParenthesis)?;
        let loop_var = self.expect(Token::Identifier)?;
        self.expect(Token::In)?;
        let collection = self.parse_expression()?;
        self.expect(Token::RightParenthesis)?;
        let body = self.parse_statement()?;

        Ok(
            ParseNode::with_text(NodeKind::ForeachStatement, line, loop_var.lexeme)
                .push(collection)
                .push(body),
        )
    }

    fn parse_break_statement(&mut self) -> Result<ParseNode, ParseErr> {
        let line = self.expect(Token::Break)?.span.line_num;
        self.expect(Token::Semicolon)?;
        Ok(ParseNode::new(NodeKind::BreakStatement, line))
    }

    fn parse_continue_statement(&mut self) -> Result<ParseNode, ParseErr> {
        let line = self.expect(Token::Continue)?.span.line_num;
        self.expect(Token::Semicolon)?;
        Ok(ParseNode::new(NodeKind::ContinueStatement, line))
    }

    fn parse_return_statement(&mut self) -> Result<ParseNode, ParseErr> {
        let line = self.expect(Token::Return)?.span.line_num;
        let value = if self.at(Token::Semicolon)? {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(Token::Semicolon)?;

        let mut node = ParseNode::new(NodeKind::ReturnStatement, line);
        node = node.push_opt(value);
        Ok(node)
    }

    fn parse_function_declaration(&mut self) -> Result<ParseNode, ParseErr> {
        let line = self.expect(Token::Function)?.span.line_num;
        let name = self.expect(Token::Identifier)?;

        self.expect(Token::LeftParenthesis)?;
        let mut parameters = ParseNode::new(NodeKind::Parameters, line);
        if !self.at(Token::RightParenthesis)? {
            loop {
                let param_name = self.expect(Token::Identifier)?;
                self.expect(Token::Colon)?;
                let annotation = self.parse_type_annotation()?;
                parameters.children.push(
                    ParseNode::with_text(
                        NodeKind::Parameter,
                        param_name.span.line_num,
                        param_name.lexeme,
                    )
                    .push(annotation),
                );

                if self.at(Token::Comma)? {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RightParenthesis)?;

        let return_annotation = if self.at(Token::Colon)? {
            self.advance()?;
            Some(self.parse_type_annotation()?)
        } else {
            None
        };

        let body = self.parse_block()?;

        let mut node = ParseNode::with_text(NodeKind::FunctionDeclaration, line, name.lexeme);
        node.children.push(parameters);
        node = node.push_opt(return_annotation);
        node.children.push(body);
        Ok(node)
    }

    /// `: T` where `T` is `integer | float | string | boolean`, followed
    /// by zero or more repetitions of `[]`.
    fn parse_type_annotation(&mut self) -> Result<ParseNode, ParseErr> {
        let line = self.current_line();
        let ty = self.parse_type()?;
        Ok(ParseNode::with_children(NodeKind::TypeAnnotation, line, vec![ty]))
    }

    fn parse_type(&mut self) -> Result<ParseNode, ParseErr> {
        let tok = self.advance()?;
        let base_name = match tok.token_type {
            Token::IntegerType => "integer",
            Token::FloatType => "float",
            Token::StringType => "string",
            Token::BooleanType => "boolean",
            _ => {
                return Err(ParseErr::expected(
                    "a type name",
                    tok.token_type,
                    tok.span.line_num,
                ));
            }
        };

        let mut ty = ParseNode::with_text(NodeKind::Type, tok.span.line_num, base_name);

        while self.at(Token::LeftSquareBracket)? {
            self.advance()?;
            self.expect(Token::RightSquareBracket)?;
            ty = ParseNode::with_text(NodeKind::Type, tok.span.line_num, "array").push(ty);
        }

        Ok(ty)
    }

    // --- Expressions, one function per precedence level --------------

    pub fn parse_expression(&mut self) -> Result<ParseNode, ParseErr> {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> Result<ParseNode, ParseErr> {
        let mut left = self.parse_logical_and()?;
        while self.at(Token::LogicalOr)? {
            let op = self.advance()?;
            let right = self.parse_logical_and()?;
            left = binary_node(NodeKind::LogicalOrExpr, op, left, right);
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<ParseNode, ParseErr> {
        let mut left = self.parse_equality()?;
        while self.at(Token::LogicalAnd)? {
            let op = self.advance()?;
            let right = self.parse_equality()?;
            left = binary_node(NodeKind::LogicalAndExpr, op, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<ParseNode, ParseErr> {
        let mut left = self.parse_relational()?;
        loop {
            let matched = matches!(
                self.peek()?,
                Some(Token::Equal | Token::NotEqual | Token::StrictEqual | Token::StrictNotEqual)
            );
            if !matched {
                break;
            }
            let op = self.advance()?;
            let right = self.parse_relational()?;
            left = binary_node(NodeKind::EqualityExpr, op, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<ParseNode, ParseErr> {
        let mut left = self.parse_additive()?;
        loop {
            let matched = matches!(
                self.peek()?,
                Some(
                    Token::LessThan
                        | Token::GreaterThan
                        | Token::LessThanOrEq
                        | Token::GreaterThanOrEq
                )
            );
            if !matched {
                break;
            }
            let op = self.advance()?;
            let right = self.parse_additive()?;
            left = binary_node(NodeKind::RelationalExpr, op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<ParseNode, ParseErr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let matched = matches!(self.peek()?, Some(Token::Add | Token::Sub));
            if !matched {
                break;
            }
            let op = self.advance()?;
            let right = self.parse_multiplicative()?;
            left = binary_node(NodeKind::AdditiveExpr, op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<ParseNode, ParseErr> {
        let mut left = self.parse_unary()?;
        loop {
            let matched = matches!(self.peek()?, Some(Token::Mul | Token::Div | Token::Mod));
            if !matched {
                break;
            }
            let op = self.advance()?;
            let right = self.parse_unary()?;
            left = binary_node(NodeKind::MultiplicativeExpr, op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<ParseNode, ParseErr> {
        if matches!(self.peek()?, Some(Token::Sub | Token::LogicalNot)) {
            let op = self.advance()?;
            let operand = self.parse_unary()?;
            return Ok(ParseNode::with_text(
                NodeKind::UnaryExpr,
                op.span.line_num,
                op.token_type.to_string(),
            )
            .push(operand));
        }
        self.parse_postfix()
    }

    /// Call and index expressions bind tighter than unary operators;
    /// `f(x)[0]` chains as many trailers as appear.
    fn parse_postfix(&mut self) -> Result<ParseNode, ParseErr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.at(Token::LeftParenthesis)? {
                let open = self.advance()?;
                let mut args = Vec::new();
                if !self.at(Token::RightParenthesis)? {
                    loop {
                        args.push(self.parse_expression()?);
                        if self.at(Token::Comma)? {
                            self.advance()?;
                        } else {
                            break;
                        }
                    }
                }
                self.expect(Token::RightParenthesis)?;
                let mut node = ParseNode::new(NodeKind::CallExpr, open.span.line_num);
                node.children.push(expr);
                node.children.extend(args);
                expr = node;
            } else if self.at(Token::LeftSquareBracket)? {
                let open = self.advance()?;
                let index = self.parse_expression()?;
                self.expect(Token::RightSquareBracket)?;
                expr = ParseNode::with_children(
                    NodeKind::IndexExpr,
                    open.span.line_num,
                    vec![expr, index],
                );
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<ParseNode, ParseErr> {
        let tok = self
            .peek_nth(0)?
            .cloned()
            .ok_or_else(|| ParseErr::new("unexpected end of input", self.last_line))?;

        match tok.token_type {
            Token::ConstantInt => {
                let tok = self.advance()?;
                Ok(ParseNode::with_text(NodeKind::LiteralExpr, tok.span.line_num, tok.lexeme))
            }
            Token::ConstantFloat => {
                let tok = self.advance()?;
                Ok(ParseNode::with_text(NodeKind::LiteralExpr, tok.span.line_num, tok.lexeme))
            }
            Token::ConstantString => {
                let tok = self.advance()?;
                Ok(ParseNode::with_text(NodeKind::LiteralExpr, tok.span.line_num, tok.lexeme))
            }
            Token::True | Token::False => {
                let tok = self.advance()?;
                Ok(ParseNode::with_text(NodeKind::LiteralExpr, tok.span.line_num, tok.lexeme))
            }
            Token::Identifier => {
                let tok = self.advance()?;
                Ok(ParseNode::with_text(
                    NodeKind::IdentifierExpr,
                    tok.span.line_num,
                    tok.lexeme,
                ))
            }
            Token::LeftParenthesis => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.expect(Token::RightParenthesis)?;
                Ok(inner)
            }
            Token::LeftSquareBracket => self.parse_array_literal(),
            _ => Err(ParseErr::new(
                format!("unexpected token '{}' in expression", tok.token_type),
                tok.span.line_num,
            )),
        }
    }

    fn parse_array_literal(&mut self) -> Result<ParseNode, ParseErr> {
        let open = self.expect(Token::LeftSquareBracket)?;
        let mut elements = Vec::new();
        if !self.at(Token::RightSquareBracket)? {
            loop {
                elements.push(self.parse_expression()?);
                if self.at(Token::Comma)? {
                    self.advance()?;
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RightSquareBracket)?;
        Ok(ParseNode::with_children(
            NodeKind::ArrayLiteral,
            open.span.line_num,
            elements,
        ))
    }
}

fn binary_node(kind: NodeKind, op: SpannedToken<'_>, left: ParseNode, right: ParseNode) -> ParseNode {
    ParseNode::with_text(kind, op.span.line_num, op.token_type.to_string())
        .push(left)
        .push(right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParseNode {
        Parser::new(source).parse_program().expect("valid program")
    }

    #[test]
    fn parses_a_variable_declaration_with_arithmetic_initializer() {
        let program = parse("var x: integer = 1 + 2 * 3;");
        let decl = &program.children[0];
        assert_eq!(decl.kind, NodeKind::VariableDeclaration);
        assert_eq!(decl.text.as_deref(), Some("x"));
        // children: [TypeAnnotation, AdditiveExpr]
        assert_eq!(decl.children[0].kind, NodeKind::TypeAnnotation);
        assert_eq!(decl.children[1].kind, NodeKind::AdditiveExpr);
        assert_eq!(decl.children[1].children[1].kind, NodeKind::MultiplicativeExpr);
    }

    #[test]
    fn parses_nested_array_type_annotations() {
        let program = parse("var m: integer[][] = [];");
        let annotation = &program.children[0].children[0];
        let outer_ty = &annotation.children[0];
        assert_eq!(outer_ty.text.as_deref(), Some("array"));
        assert_eq!(outer_ty.children[0].text.as_deref(), Some("array"));
        assert_eq!(outer_ty.children[0].children[0].text.as_deref(), Some("integer"));
    }

    #[test]
    fn parses_a_while_loop() {
        let program = parse("while (i < 10) { i = i + 1; }");
        let stmt = &program.children[0];
        assert_eq!(stmt.kind, NodeKind::WhileStatement);
        assert_eq!(stmt.children[0].kind, NodeKind::RelationalExpr);
        assert_eq!(stmt.children[1].kind, NodeKind::Block);
    }

    #[test]
    fn parses_a_function_declaration_with_parameters() {
        let program = parse("function add(a: integer, b: integer): integer { return a + b; }");
        let func = &program.children[0];
        assert_eq!(func.kind, NodeKind::FunctionDeclaration);
        assert_eq!(func.text.as_deref(), Some("add"));
        assert_eq!(func.children[0].kind, NodeKind::Parameters);
        assert_eq!(func.children[0].children.len(), 2);
    }

    #[test]
    fn distinguishes_assignment_from_a_bare_call_statement() {
        let program = parse("x = 1; f(x);");
        assert_eq!(program.children[0].kind, NodeKind::Assignment);
        assert_eq!(program.children[1].kind, NodeKind::ExpressionStatement);
        assert_eq!(program.children[1].children[0].kind, NodeKind::CallExpr);
    }

    #[test]
    fn for_statement_keeps_a_fixed_child_count_with_omitted_slots() {
        let program = parse("for (;;) { break; }");
        let stmt = &program.children[0];
        assert_eq!(stmt.kind, NodeKind::ForStatement);
        assert_eq!(stmt.children.len(), 4);
        assert_eq!(stmt.children[0].kind, NodeKind::Empty);
        assert_eq!(stmt.children[1].kind, NodeKind::Empty);
        assert_eq!(stmt.children[2].kind, NodeKind::Empty);
        assert_eq!(stmt.children[3].kind, NodeKind::Block);
    }

    #[test]
    fn for_statement_tells_a_bare_condition_apart_from_a_bare_step() {
        let program = parse("for (; i < 10;) { }");
        let stmt = &program.children[0];
        assert_eq!(stmt.children[0].kind, NodeKind::Empty);
        assert_eq!(stmt.children[1].kind, NodeKind::RelationalExpr);
        assert_eq!(stmt.children[2].kind, NodeKind::Empty);
    }

    #[test]
    fn reports_a_syntax_error_with_its_line() {
        let err = Parser::new("var x = ;").parse_program().unwrap_err();
        assert!(err.to_string().starts_with("Error at line 1:"));
    }
}
