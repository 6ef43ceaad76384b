use logos::Logos;

pub mod token;

pub use token::{LinePosition, Token};

/// A source position attached to one token, relative to its own line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Span {
    pub line_num: usize,
    pub col_start: usize,
    pub col_end: usize,
}

#[derive(Debug, Clone)]
pub struct SpannedToken<'source> {
    pub token_type: Token,
    pub lexeme: &'source str,
    pub span: Span,
}

/// Wraps `logos`'s generated lexer, skipping whitespace/comment tokens
/// and tracking line/column so every emitted token carries a position.
pub struct Lexer<'source> {
    iter: logos::Lexer<'source, Token>,
    input: &'source str,
    line: usize,
    column: usize,
    position: usize,
}

impl<'source> Lexer<'source> {
    pub fn new(input: &'source str) -> Self {
        Self {
            iter: Token::lexer(input),
            input,
            line: 1,
            column: 0,
            position: 0,
        }
    }

    pub fn get_source_code(&self) -> &'source str {
        self.input
    }

    fn count_lines(&mut self, start: usize) {
        for ch in self.input[self.position..start].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<SpannedToken<'source>, String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let result = self.iter.next()?;

            let start = self.iter.span().start;
            self.count_lines(start);
            self.position = self.iter.span().end;

            let token_type = match result {
                Ok(Token::Skip) => continue,
                Ok(Token::Error) => {
                    return Some(Err(format!(
                        "invalid token '{}' at line {}",
                        self.iter.slice(),
                        self.line
                    )));
                }
                Ok(tok) => tok,
                Err(_) => {
                    return Some(Err(format!(
                        "invalid token '{}' at line {}",
                        self.iter.slice(),
                        self.line
                    )));
                }
            };

            let token_column_start = self.column;
            self.column += self.position - start;
            let token_column_end = self.column;

            return Some(Ok(SpannedToken {
                token_type,
                lexeme: self.iter.slice(),
                span: Span {
                    line_num: self.line,
                    col_start: token_column_start,
                    col_end: token_column_end,
                },
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<Token> {
        Lexer::new(source)
            .map(|result| result.expect("lexing should not fail").token_type)
            .collect()
    }

    #[test]
    fn lexes_a_variable_declaration() {
        let tokens = lex_all("var x: integer = 1;");
        assert_eq!(
            tokens,
            vec![
                Token::Var,
                Token::Identifier,
                Token::Colon,
                Token::IntegerType,
                Token::Assignment,
                Token::ConstantInt,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn distinguishes_strict_and_loose_equality() {
        let tokens = lex_all("a === b != c");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier,
                Token::StrictEqual,
                Token::Identifier,
                Token::NotEqual,
                Token::Identifier,
            ]
        );
    }

    #[test]
    fn tracks_line_numbers_across_newlines() {
        let mut lexer = Lexer::new("var x = 1;\nvar y = 2;");
        let first = lexer.next().unwrap().unwrap();
        assert_eq!(first.span.line_num, 1);

        let tokens: Vec<_> = lexer.collect::<Result<Vec<_>, _>>().unwrap();
        let y_token = tokens
            .iter()
            .find(|t| t.lexeme == "y")
            .expect("second declaration's identifier");
        assert_eq!(y_token.span.line_num, 2);
    }

    #[test]
    fn skips_comments_and_whitespace() {
        let tokens = lex_all("var x = 1; // trailing comment\n/* block */ var y = 2;");
        assert_eq!(
            tokens,
            vec![
                Token::Var,
                Token::Identifier,
                Token::Assignment,
                Token::ConstantInt,
                Token::Semicolon,
                Token::Var,
                Token::Identifier,
                Token::Assignment,
                Token::ConstantInt,
                Token::Semicolon,
            ]
        );
    }
}
