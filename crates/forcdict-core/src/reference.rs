use crate::ast::{Entry, Inline, InlineSeq, SenseNode};
use crate::diagnostic::{Diagnostic, W_REF_UNRECOGNIZED};

/// Query key the site uses for headword lookups (`forc2.php?searchedLG=POR`).
pub const LOOKUP_QUERY: &str = "searchedLG=";

/// Turns every lookup link of the entry into a bare lowercase headword.
pub fn rewrite_references(entry: &mut Entry, diagnostics: &mut Vec<Diagnostic>) {
    rewrite_inlines(&mut entry.header, diagnostics);
    for sense in &mut entry.senses {
        rewrite_sense(sense, diagnostics);
    }
}

fn rewrite_sense(sense: &mut SenseNode, diagnostics: &mut Vec<Diagnostic>) {
    rewrite_inlines(&mut sense.content, diagnostics);
    for child in &mut sense.children {
        rewrite_sense(child, diagnostics);
    }
}

fn rewrite_inlines(inlines: &mut InlineSeq, diagnostics: &mut Vec<Diagnostic>) {
    for inline in inlines {
        if let Inline::Link { href, .. } = inline {
            match lookup_headword(href) {
                Some(headword) => *href = headword,
                None => diagnostics.push(
                    Diagnostic::warning(
                        W_REF_UNRECOGNIZED,
                        "link is not a headword lookup; left unchanged",
                    )
                    .with_snippet(href.clone()),
                ),
            }
        }
        if let Some(children) = inline.children_mut() {
            rewrite_inlines(children, diagnostics);
        }
    }
}

/// Headword encoded in a lookup link, lowercased.
pub fn lookup_headword(href: &str) -> Option<String> {
    let (_, query) = href.split_once(LOOKUP_QUERY)?;
    Some(query.to_lowercase())
}
