mod ast;
mod cleanup;
mod diagnostic;
mod emit;
mod error;
mod marker;
mod parser;
mod reference;
mod section;
mod style;

use std::{panic, thread};

pub use ast::{Entry, Inline, InlineSeq, MarkedSegment, Rendition, SenseNode, plain_text};
pub use cleanup::{LIGATURES, apply_ligatures, cleanup_entry, cleanup_inlines, remove_empty_runs};
pub use diagnostic::{
    Diagnostic, DiagnosticSeverity, E_FRAGMENT_EMPTY, E_MARKER_UNBALANCED, W_REF_UNRECOGNIZED,
    W_STYLE_UNKNOWN,
};
pub use emit::{emit_entry, emit_entry_sanitized};
pub use error::ConvertError;
pub use marker::{Classification, classify};
pub use parser::{ParseResult, parse};
pub use reference::{LOOKUP_QUERY, lookup_headword, rewrite_references};
pub use section::build_senses;
pub use style::classify_style;

/// A converted entry and the non-fatal findings collected on the way.
#[derive(Clone, Debug, PartialEq)]
pub struct Conversion {
    pub entry: Entry,
    pub diagnostics: Vec<Diagnostic>,
}

impl Conversion {
    pub fn to_html(&self) -> String {
        emit_entry(&self.entry)
    }
}

/// Runs one fragment through the whole pipeline.
pub fn convert(source: &str) -> Result<Conversion, ConvertError> {
    let ParseResult {
        inlines,
        mut diagnostics,
    } = parse(source)?;
    log::debug!("parsed fragment into {} top-level inlines", inlines.len());

    let Classification { header, segments } = classify(inlines)?;
    log::debug!("classified {} marked segments", segments.len());

    let mut entry = Entry {
        header,
        senses: build_senses(segments),
    };
    cleanup_entry(&mut entry);
    rewrite_references(&mut entry, &mut diagnostics);

    for diagnostic in &diagnostics {
        log::warn!("{}: {}", diagnostic.code, diagnostic.message);
    }
    Ok(Conversion { entry, diagnostics })
}

/// Converts independent fragments concurrently. Results keep input order and
/// a failing fragment does not affect the others.
pub fn convert_batch(sources: &[String]) -> Vec<Result<Conversion, ConvertError>> {
    thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .map(|source| scope.spawn(move || convert(source)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::{ConvertError, convert, convert_batch};

    #[test]
    fn marker_inside_run_fails_the_entry() {
        let err = convert(
            "<div>Vox. <span style=\"font-style:italic\">sic — α) non</span></div>",
        )
        .err()
        .expect("unbalanced marker");
        assert_eq!(err.code(), crate::E_MARKER_UNBALANCED);
        assert!(err.intermediate().is_some_and(|text| text.contains("α)")));
    }

    #[test]
    fn headword_widget_becomes_bold_header() {
        let conversion = convert(
            "<div><img src=\"logo.png\">\
             <span><span><span><span><div>icon</div>ABAGIO</span></span></span>, onis.</span> \
             Vox. <span style=\"font-style:italic\">A)</span> sensus.</div>",
        )
        .expect("convert");
        assert_eq!(
            conversion.to_html(),
            "<entryFree><hi><hi rend=\"bold\">ABAGIO</hi>, onis.</hi> Vox.\
             <sense level=\"1\" marker=\"A)\">sensus.</sense></entryFree>"
        );
    }

    #[test]
    fn unknown_style_stays_in_the_diagnostic_only() {
        let conversion = convert("<div>Vox <span style=\"color:red\">rubra</span>.</div>")
            .expect("convert");
        let html = conversion.to_html();
        assert_eq!(html, "<entryFree>Vox <hi>rubra</hi>.</entryFree>");
        assert!(!html.contains("color:red"));
        assert_eq!(conversion.diagnostics.len(), 1);
        assert_eq!(conversion.diagnostics[0].code, crate::W_STYLE_UNKNOWN);
        assert_eq!(conversion.diagnostics[0].snippet.as_deref(), Some("color:red"));
    }

    #[test]
    fn batch_keeps_order_and_isolates_failures() {
        let sources = vec![
            "<div><b>A</b></div>".to_string(),
            "".to_string(),
            "<div>x</div>".to_string(),
        ];
        let results = convert_batch(&sources);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(results[1], Err(ConvertError::EmptyFragment));
        assert_eq!(results[2], convert("<div>x</div>"));
    }
}
