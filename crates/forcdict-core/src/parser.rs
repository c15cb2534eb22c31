use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::ast::{Inline, InlineSeq};
use crate::diagnostic::Diagnostic;
use crate::error::ConvertError;
use crate::style::classify_style;

/// Depth of the `span` chain that wraps the site's headword widget.
const HEADWORD_SPAN_DEPTH: usize = 4;

pub struct ParseResult {
    /// Children of the fragment's root element, style-normalized.
    pub inlines: InlineSeq,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parses one raw entry fragment (a single root element such as the site's
/// article `<div>`) into an inline tree.
pub fn parse(source: &str) -> Result<ParseResult, ConvertError> {
    let dom = parse_document(RcDom::default(), Default::default()).one(source);
    let root = find_fragment_root(&dom.document).ok_or(ConvertError::EmptyFragment)?;

    let mut diagnostics = Vec::new();
    let mut inlines = Vec::new();
    convert_children(&root, &mut inlines, &mut diagnostics);
    if extract_headword(&mut inlines) {
        log::trace!("headword widget replaced by bold headword");
    }
    Ok(ParseResult {
        inlines,
        diagnostics,
    })
}

fn find_fragment_root(document: &Handle) -> Option<Handle> {
    let html = first_element(document, Some("html"))?;
    let body = first_element(&html, Some("body"))?;
    first_element(&body, None)
}

fn first_element(parent: &Handle, tag: Option<&str>) -> Option<Handle> {
    parent
        .children
        .borrow()
        .iter()
        .find(|child| match &child.data {
            NodeData::Element { name, .. } => tag.is_none_or(|tag| &*name.local == tag),
            _ => false,
        })
        .cloned()
}

fn convert_children(parent: &Handle, out: &mut InlineSeq, diagnostics: &mut Vec<Diagnostic>) {
    for child in parent.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => push_text(out, &contents.borrow()),
            NodeData::Element { name, attrs, .. } => {
                let attrs = attrs.borrow();
                let attr = |key: &str| {
                    attrs
                        .iter()
                        .find(|attr| &*attr.name.local == key)
                        .map(|attr| attr.value.to_string())
                };
                match &*name.local {
                    // Presentational wrapper with no meaning for the entry.
                    "font" => convert_children(child, out, diagnostics),
                    "br" => out.push(Inline::LineBreak),
                    "span" => {
                        let rend = attr("style")
                            .map(|declaration| classify_style(&declaration, diagnostics));
                        let mut children = Vec::new();
                        convert_children(child, &mut children, diagnostics);
                        out.push(Inline::Hi { rend, children });
                    }
                    "a" => {
                        let mut children = Vec::new();
                        convert_children(child, &mut children, diagnostics);
                        out.push(Inline::Link {
                            href: attr("href").unwrap_or_default(),
                            children,
                        });
                    }
                    tag => {
                        let mut children = Vec::new();
                        convert_children(child, &mut children, diagnostics);
                        out.push(Inline::Element {
                            tag: tag.to_string(),
                            attrs: attrs
                                .iter()
                                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                                .collect(),
                            children,
                        });
                    }
                }
            }
            _ => {}
        }
    }
}

pub(crate) fn push_text(out: &mut InlineSeq, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Inline::Text(prev)) = out.last_mut() {
        prev.push_str(text);
    } else {
        out.push(Inline::Text(text.to_string()));
    }
}

/// Replaces the site's headword widget with a bold headword.
///
/// The widget is a `div` at the bottom of a four-level `span` chain inside
/// the first top-level span; the headword is the text that follows it.
/// Everything before that span is page chrome and is dropped. Returns
/// `false` and leaves the sequence alone when no widget is present.
fn extract_headword(inlines: &mut InlineSeq) -> bool {
    let Some(first_span) = inlines
        .iter()
        .position(|inline| matches!(inline, Inline::Hi { .. }))
    else {
        return false;
    };
    let Some(headword) = find_widget_headword(&inlines[first_span], 1) else {
        return false;
    };

    inlines.drain(..first_span);
    let Some(children) = inlines.first_mut().and_then(Inline::children_mut) else {
        return false;
    };
    match children
        .iter()
        .position(|child| matches!(child, Inline::Hi { .. }))
    {
        Some(index) => children[index] = Inline::bold(vec![Inline::text(headword)]),
        None => children.insert(0, Inline::bold(vec![Inline::text(headword)])),
    }
    true
}

fn find_widget_headword(node: &Inline, depth: usize) -> Option<String> {
    let Inline::Hi { children, .. } = node else {
        return None;
    };
    if depth == HEADWORD_SPAN_DEPTH {
        let div = children
            .iter()
            .position(|child| matches!(child, Inline::Element { tag, .. } if tag == "div"))?;
        return match children.get(div + 1) {
            Some(Inline::Text(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
            _ => None,
        };
    }
    children
        .iter()
        .find_map(|child| find_widget_headword(child, depth + 1))
}
