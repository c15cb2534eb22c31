use crate::ast::Rendition;
use crate::diagnostic::{Diagnostic, W_STYLE_UNKNOWN};

/// Maps an inline `style` declaration to a rendition.
///
/// Bold wins over italic when a declaration carries both. Anything else is
/// kept as `Unknown` and reported once through `diagnostics`.
pub fn classify_style(declaration: &str, diagnostics: &mut Vec<Diagnostic>) -> Rendition {
    if declaration.contains("bold") {
        Rendition::Bold
    } else if declaration.contains("italic") {
        Rendition::Italic
    } else {
        log::debug!("unknown span style: {}", declaration);
        diagnostics.push(
            Diagnostic::warning(
                W_STYLE_UNKNOWN,
                format!("unknown span style `{}`; run kept unmarked", declaration),
            )
            .with_snippet(declaration),
        );
        Rendition::Unknown(declaration.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::classify_style;
    use crate::ast::Rendition;
    use crate::diagnostic::W_STYLE_UNKNOWN;

    #[test]
    fn recognizes_bold_and_italic() {
        let mut diagnostics = Vec::new();
        assert_eq!(
            classify_style("font-weight: bold;", &mut diagnostics),
            Rendition::Bold
        );
        assert_eq!(
            classify_style("font-style:italic", &mut diagnostics),
            Rendition::Italic
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn bold_takes_precedence() {
        let mut diagnostics = Vec::new();
        assert_eq!(
            classify_style("font-style: italic; font-weight: bold", &mut diagnostics),
            Rendition::Bold
        );
    }

    #[test]
    fn unknown_style_reports_once() {
        let mut diagnostics = Vec::new();
        let rend = classify_style("color:red", &mut diagnostics);
        assert_eq!(rend, Rendition::Unknown("color:red".to_string()));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, W_STYLE_UNKNOWN);
        assert_eq!(diagnostics[0].snippet.as_deref(), Some("color:red"));
    }
}
