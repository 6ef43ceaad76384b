use std::fmt;

/// One recorded semantic complaint, tagged with the line of the
/// offending node. Diagnostics are never fatal — the walker pushes one
/// and keeps going, per the "continue after every error" policy.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }

    /// Renders the driver's diagnostic surface: `"Error at line <L>: <message>"`.
    pub fn render(&self) -> String {
        format!("Error at line {}: {}", self.line, self.message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Ordered list of diagnostics accumulated over one analysis run. No
/// de-duplication: order is traversal order, exactly as encountered.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, line: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(line, message));
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_rendered(self) -> Vec<String> {
        self.diagnostics.iter().map(Diagnostic::render).collect()
    }
}

/// The single fatal condition the walker can hit: a parse tree whose
/// shape doesn't match the grammar production its `NodeKind` claims
/// (wrong child count, a leaf missing its text). Every other semantic
/// problem is recorded in the `ErrorCollector` and the walker carries
/// on; this one aborts the walk because there is no sensible fragment
/// to keep building from. The driver converts it into a single
/// "internal error" diagnostic rather than propagating a panic.
#[derive(Debug)]
pub struct MalformedTree {
    pub line: usize,
    pub detail: String,
}

impl MalformedTree {
    pub fn new(line: usize, detail: impl Into<String>) -> Self {
        Self {
            line,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for MalformedTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "internal error: malformed parse tree ({})", self.detail)
    }
}

impl std::error::Error for MalformedTree {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_the_driver_diagnostic_surface() {
        let d = Diagnostic::new(3, "Variable 'y' not declared");
        assert_eq!(d.render(), "Error at line 3: Variable 'y' not declared");
    }

    #[test]
    fn collector_preserves_insertion_order_without_deduplication() {
        let mut collector = ErrorCollector::new();
        collector.record(1, "first");
        collector.record(1, "first");
        collector.record(2, "second");
        let rendered = collector.into_rendered();
        assert_eq!(
            rendered,
            vec![
                "Error at line 1: first".to_string(),
                "Error at line 1: first".to_string(),
                "Error at line 2: second".to_string(),
            ]
        );
    }
}
