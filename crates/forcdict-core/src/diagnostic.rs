pub const E_MARKER_UNBALANCED: &str = "E_MARKER_UNBALANCED";
pub const E_FRAGMENT_EMPTY: &str = "E_FRAGMENT_EMPTY";

pub const W_STYLE_UNKNOWN: &str = "W_STYLE_UNKNOWN";
pub const W_REF_UNRECOGNIZED: &str = "W_REF_UNRECOGNIZED";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub code: &'static str,
    pub message: String,
    /// Raw text the diagnostic is about, for debugging.
    pub snippet: Option<String>,
}

impl Diagnostic {
    pub fn new(
        severity: DiagnosticSeverity,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            snippet: None,
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, code, message)
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

impl DiagnosticSeverity {
    pub fn label(self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
        }
    }
}
