use std::fmt;

use logos::Logos;

/// Per-token position information, threaded through `logos`'s lexer
/// extras so every produced token carries its own line number.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinePosition {
    pub line_num: usize,
    pub col_num: usize,
}

fn update_line_num(lex: &mut logos::Lexer<Token>) {
    lex.extras.line_num += 1;
    lex.extras.col_num = 0;
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Logos)]
#[logos(extras = LinePosition)]
pub enum Token {
    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", priority = 0)]
    Identifier,

    //
    // Literals
    //
    #[regex(r"\d+")]
    ConstantInt,

    #[regex(r"\d+\.\d+")]
    ConstantFloat,

    #[regex(r#""([^"\\]|\\.)*""#)]
    ConstantString,

    //
    // Keywords
    //
    #[token("var")]
    Var,
    #[token("const")]
    Const,
    #[token("function")]
    Function,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("foreach")]
    Foreach,
    #[token("in")]
    In,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Type keywords
    #[token("integer")]
    IntegerType,
    #[token("float")]
    FloatType,
    #[token("string")]
    StringType,
    #[token("boolean")]
    BooleanType,

    //
    // Operators
    //
    #[token("+")]
    Add,
    #[token("-")]
    Sub,
    #[token("*")]
    Mul,
    #[token("/")]
    Div,
    #[token("%")]
    Mod,

    #[token("&&")]
    LogicalAnd,
    #[token("||")]
    LogicalOr,
    #[token("!")]
    LogicalNot,

    #[token("===")]
    StrictEqual,
    #[token("!==")]
    StrictNotEqual,
    #[token("==")]
    Equal,
    #[token("!=")]
    NotEqual,
    #[token("<=")]
    LessThanOrEq,
    #[token(">=")]
    GreaterThanOrEq,
    #[token("<")]
    LessThan,
    #[token(">")]
    GreaterThan,

    #[token("=")]
    Assignment,

    //
    // Symbols
    //
    #[token("(")]
    LeftParenthesis,
    #[token(")")]
    RightParenthesis,
    #[token("{")]
    LeftCurlyBracket,
    #[token("}")]
    RightCurlyBracket,
    #[token("[")]
    LeftSquareBracket,
    #[token("]")]
    RightSquareBracket,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,

    // skipped patterns
    #[regex(r"\n", callback = update_line_num)]
    #[regex(r"[ \t\r\f]+")]
    #[regex(r"//[^\n]*")]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    Skip,

    #[regex(r"\d+[a-zA-Z_][a-zA-Z0-9_]*")]
    Error,
}

impl Token {
    pub fn is_unary(&self) -> bool {
        matches!(self, Token::Sub | Token::LogicalNot)
    }

    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            Token::Add
                | Token::Sub
                | Token::Mul
                | Token::Div
                | Token::Mod
                | Token::LogicalAnd
                | Token::LogicalOr
                | Token::StrictEqual
                | Token::StrictNotEqual
                | Token::Equal
                | Token::NotEqual
                | Token::LessThan
                | Token::GreaterThan
                | Token::LessThanOrEq
                | Token::GreaterThanOrEq
        )
    }

    /// Precedence-climbing table for expression parsing; higher binds
    /// tighter. Mirrors the grammar's LogicalOr/LogicalAnd/Equality/
    /// Relational/Additive/Multiplicative nonterminal chain.
    pub fn precedence(&self) -> usize {
        match self {
            Token::Mul | Token::Div | Token::Mod => 50,
            Token::Add | Token::Sub => 45,
            Token::LessThan | Token::LessThanOrEq | Token::GreaterThan | Token::GreaterThanOrEq => {
                35
            }
            Token::Equal | Token::NotEqual | Token::StrictEqual | Token::StrictNotEqual => 30,
            Token::LogicalAnd => 10,
            Token::LogicalOr => 5,
            _ => 0,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier => write!(f, "identifier"),
            Token::ConstantInt => write!(f, "int literal"),
            Token::ConstantFloat => write!(f, "float literal"),
            Token::ConstantString => write!(f, "string literal"),

            Token::Var => write!(f, "var"),
            Token::Const => write!(f, "const"),
            Token::Function => write!(f, "function"),
            Token::Return => write!(f, "return"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::While => write!(f, "while"),
            Token::Do => write!(f, "do"),
            Token::For => write!(f, "for"),
            Token::Foreach => write!(f, "foreach"),
            Token::In => write!(f, "in"),
            Token::Break => write!(f, "break"),
            Token::Continue => write!(f, "continue"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),

            Token::IntegerType => write!(f, "integer"),
            Token::FloatType => write!(f, "float"),
            Token::StringType => write!(f, "string"),
            Token::BooleanType => write!(f, "boolean"),

            Token::Add => write!(f, "+"),
            Token::Sub => write!(f, "-"),
            Token::Mul => write!(f, "*"),
            Token::Div => write!(f, "/"),
            Token::Mod => write!(f, "%"),

            Token::LogicalAnd => write!(f, "&&"),
            Token::LogicalOr => write!(f, "||"),
            Token::LogicalNot => write!(f, "!"),

            Token::StrictEqual => write!(f, "==="),
            Token::StrictNotEqual => write!(f, "!=="),
            Token::Equal => write!(f, "=="),
            Token::NotEqual => write!(f, "!="),
            Token::LessThan => write!(f, "<"),
            Token::GreaterThan => write!(f, ">"),
            Token::LessThanOrEq => write!(f, "<="),
            Token::GreaterThanOrEq => write!(f, ">="),

            Token::Assignment => write!(f, "="),

            Token::LeftParenthesis => write!(f, "("),
            Token::RightParenthesis => write!(f, ")"),
            Token::LeftCurlyBracket => write!(f, "{{"),
            Token::RightCurlyBracket => write!(f, "}}"),
            Token::LeftSquareBracket => write!(f, "["),
            Token::RightSquareBracket => write!(f, "]"),
            Token::Semicolon => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),

            Token::Skip => write!(f, "<skip>"),
            Token::Error => write!(f, "<error>"),
        }
    }
}
