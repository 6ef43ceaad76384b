use std::error::Error;
use std::fmt;

/// A syntax error, surfaced verbatim by the driver in `syntax_errors`.
#[derive(Debug)]
pub struct ParseErr {
    line: usize,
    message: String,
}

impl ParseErr {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }

    pub fn expected(expected: impl fmt::Display, found: impl fmt::Display, line: usize) -> Self {
        ParseErr::new(format!("expected {} but found {}", expected, found), line)
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error at line {}: {}", self.line, self.message)
    }
}

impl Error for ParseErr {}
