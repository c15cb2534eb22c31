use thiserror::Error;

use crate::diagnostic::{
    Diagnostic, DiagnosticSeverity, E_FRAGMENT_EMPTY, E_MARKER_UNBALANCED,
};

/// Fatal failure for a single entry. Other entries of a batch are unaffected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("fragment has no root element")]
    EmptyFragment,

    /// A marker was recognized inside a styled run, so the sense it opens
    /// would have to close outside that run.
    #[error("marker `{marker}` (level {depth}) at offset {offset} opens a sense inside a styled run: {snippet}")]
    UnbalancedMarker {
        depth: u8,
        marker: String,
        /// Character offset in the entry's flattened text.
        offset: usize,
        snippet: String,
        /// Serialized entry as seen by the classifier.
        intermediate: String,
    },
}

impl ConvertError {
    pub fn code(&self) -> &'static str {
        match self {
            ConvertError::EmptyFragment => E_FRAGMENT_EMPTY,
            ConvertError::UnbalancedMarker { .. } => E_MARKER_UNBALANCED,
        }
    }

    /// Full problematic text, when there is one worth dumping.
    pub fn intermediate(&self) -> Option<&str> {
        match self {
            ConvertError::EmptyFragment => None,
            ConvertError::UnbalancedMarker { intermediate, .. } => Some(intermediate),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::new(DiagnosticSeverity::Error, self.code(), self.to_string());
        match self {
            ConvertError::EmptyFragment => diagnostic,
            ConvertError::UnbalancedMarker { snippet, .. } => diagnostic.with_snippet(snippet.clone()),
        }
    }
}
