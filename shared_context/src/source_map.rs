use crate::Span;

/// Maps parse-tree positions back to source text, so diagnostics can
/// point at the offending line.
pub struct SourceMap<'a> {
    source_code: &'a str,
    file_name: &'a str,
}

impl<'a> SourceMap<'a> {
    pub fn new(file_name: &'a str, source_code: &'a str) -> Self {
        Self {
            source_code,
            file_name,
        }
    }

    /// Formats a diagnostic message per the driver's error surface:
    /// `"Error at line <L>: <message>"`.
    pub fn format_diagnostic(&self, line: usize, message: &str) -> String {
        format!("Error at line {}: {}", line, message)
    }

    /// Formats an error message with a source-context snippet, used by the
    /// CLI driver when it wants a richer rendering than the bare diagnostic
    /// line.
    ///
    /// Example output:
    /// ```text
    /// file.cspt --> line 3:5
    ///      |
    ///  3   | var x = 10
    ///      |     ^~~ Error message
    /// ```
    pub fn format_message(&self, message: String, span: Span) -> String {
        let line_text = self.get_line_text(span.start);
        let column = self.get_col_number(span.start);

        let mut marker_line = String::new();
        let marker_start = column.saturating_sub(1);
        let marker_len = (span.end.saturating_sub(span.start)).max(1);

        for i in 0..=line_text.len() {
            if i == marker_start {
                marker_line.push('^');
                for _ in 1..marker_len {
                    marker_line.push('~');
                }
                marker_line.push(' ');
                marker_line.push_str(&message);
                break;
            } else if line_text.as_bytes().get(i) == Some(&b'\t') {
                marker_line.push('\t');
            } else {
                marker_line.push(' ');
            }
        }

        format!(
            "{} --> line {}:{}\n     |\n{:>4} | {}\n     | {}\n",
            self.file_name, span.line, column, span.line, line_text, marker_line
        )
    }

    /// Builds the whole-line `Span` for a bare 1-based line number, for
    /// callers (e.g. the driver) that only have a diagnostic's line, not
    /// a byte-offset span.
    pub fn span_for_line(&self, line: usize) -> Span {
        let mut start = 0;
        let mut current_line = 1;
        for (offset, ch) in self.source_code.char_indices() {
            if current_line == line {
                start = offset;
                break;
            }
            if ch == '\n' {
                current_line += 1;
            }
        }
        if current_line < line {
            start = self.source_code.len();
        }

        let line_text = self.get_line_text(start);
        let end = start + line_text.len();
        Span::new(start, end, line)
    }

    fn get_line_text(&self, offset: usize) -> &str {
        let offset = offset.min(self.source_code.len());
        let start = self.source_code[..offset]
            .rfind('\n')
            .map_or(0, |pos| pos + 1);
        let end = self.source_code[offset..]
            .find('\n')
            .map_or(self.source_code.len(), |pos| offset + pos);

        &self.source_code[start..end]
    }

    fn get_col_number(&self, offset: usize) -> usize {
        let offset = offset.min(self.source_code.len());
        let last_newline_index = self.source_code[..offset]
            .char_indices()
            .rfind(|&(_, ch)| ch == '\n')
            .map(|(index, _)| index + 1)
            .unwrap_or(0);

        self.source_code[last_newline_index..offset].len() + 1
    }

    pub fn get_file_name(&self) -> &'a str {
        self.file_name
    }

    pub fn get_source_code(&self) -> &'a str {
        self.source_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_the_driver_diagnostic_surface() {
        let map = SourceMap::new("main.cspt", "var x = 1;\n");
        assert_eq!(
            map.format_diagnostic(1, "Variable 'y' not declared"),
            "Error at line 1: Variable 'y' not declared"
        );
    }

    #[test]
    fn finds_the_line_text_containing_an_offset() {
        let source = "var x = 1;\nvar y = 2;\n";
        let map = SourceMap::new("main.cspt", source);
        let span = Span::new(11, 14, 2);
        assert_eq!(map.get_line_text(11), "var y = 2;");
    }

    #[test]
    fn builds_a_whole_line_span_from_a_bare_line_number() {
        let source = "var x = 1;\nvar y = 2;\n";
        let map = SourceMap::new("main.cspt", source);
        let span = map.span_for_line(2);
        assert_eq!(span.line, 2);
        assert_eq!(&source[span.start..span.end], "var y = 2;");
    }

    #[test]
    fn formats_a_message_built_from_a_bare_line_number() {
        let source = "var x = 1;\nvar y = 2;\n";
        let map = SourceMap::new("main.cspt", source);
        let span = map.span_for_line(2);
        let rendered = map.format_message("Variable 'y' not declared".to_string(), span);
        assert!(rendered.contains("main.cspt --> line 2:1"));
        assert!(rendered.contains("var y = 2;"));
    }
}
