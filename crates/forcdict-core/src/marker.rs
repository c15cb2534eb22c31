use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{Inline, InlineSeq, MarkedSegment, Rendition, plain_text, text_len};
use crate::emit::render_inlines;
use crate::error::ConvertError;

/// Characters of flattened text shown on each side of a failure position.
const SNIPPET_RADIUS: usize = 30;

pub struct Classification {
    /// Everything before the first recognized marker.
    pub header: InlineSeq,
    pub segments: Vec<MarkedSegment>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Trigger {
    Bold,
    Italic,
    Text,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Context {
    SentenceEnd,
    SentenceEndThroughTag,
    Pilcrow,
    Dash,
}

struct Grammar {
    depth: u8,
    trigger: Trigger,
    context: Context,
    pattern: Regex,
}

impl Grammar {
    fn new(depth: u8, trigger: Trigger, context: Context, pattern: &str) -> Self {
        Self {
            depth,
            trigger,
            context,
            pattern: Regex::new(pattern).expect("marker grammar pattern"),
        }
    }
}

// Priority order. Run patterns are anchored on the run's leading text and
// capture the marker literal; the text pattern includes its leading dash.
static GRAMMARS: Lazy<[Grammar; 7]> = Lazy::new(|| {
    [
        Grammar::new(1, Trigger::Italic, Context::SentenceEnd, r"^\s*([A-Z]\))"),
        Grammar::new(
            2,
            Trigger::Bold,
            Context::SentenceEndThroughTag,
            r"^\s*([IVX]+\.\))",
        ),
        Grammar::new(3, Trigger::Bold, Context::Pilcrow, r"^\s*(\d+\.)"),
        Grammar::new(4, Trigger::Bold, Context::Dash, r"^\s*([0-9]+\.°\))"),
        Grammar::new(5, Trigger::Bold, Context::Dash, r"^\s*([0-9]+\))"),
        Grammar::new(6, Trigger::Italic, Context::Dash, r"^\s*([a-z]\))"),
        Grammar::new(7, Trigger::Text, Context::Dash, r"[-—]\s*([α-ω]\))"),
    ]
});

static ROMAN_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(.*?[!?.])(\s*)([IVX]+\.\))(.*)$").expect("roman split pattern")
});

struct Found {
    index: usize,
    depth: u8,
    marker: String,
    site: Site,
}

enum Site {
    /// Leading marker of a styled run; `consumed` bytes of its first text.
    Run { consumed: usize, context: Context },
    /// Byte range inside a text node, dash included.
    Text { start: usize, end: usize },
}

enum Piece {
    Inline(Inline),
    Boundary { depth: u8, marker: String },
}

/// Splits the top-level sequence of an entry into its header and the
/// ordered marked segments.
pub fn classify(mut inlines: InlineSeq) -> Result<Classification, ConvertError> {
    split_roman_runs(&mut inlines);
    reject_nested_markers(&inlines)?;

    let found = find_markers(&inlines);
    log::debug!("recognized {} sense markers", found.len());
    let pieces = apply_markers(inlines, found);
    Ok(split_segments(pieces))
}

/// A bold run holding both the end of a sentence and a Roman-numeral marker
/// is split so the marker stands in its own run.
fn split_roman_runs(inlines: &mut InlineSeq) {
    let mut index = 0;
    while index < inlines.len() {
        if let Some(replacement) = split_roman_run(&inlines[index]) {
            let len = replacement.len();
            inlines.splice(index..index + 1, replacement);
            index += len;
            continue;
        }
        if let Some(children) = inlines[index].children_mut() {
            split_roman_runs(children);
        }
        index += 1;
    }
}

fn split_roman_run(inline: &Inline) -> Option<InlineSeq> {
    let Inline::Hi {
        rend: Some(Rendition::Bold),
        children,
    } = inline
    else {
        return None;
    };
    let [Inline::Text(text)] = children.as_slice() else {
        return None;
    };
    let caps = ROMAN_SPLIT.captures(text)?;

    let mut out = vec![Inline::bold(vec![Inline::text(&caps[1])])];
    if !caps[2].is_empty() {
        out.push(Inline::text(&caps[2]));
    }
    out.push(Inline::bold(vec![Inline::text(&caps[3])]));
    if !caps[4].is_empty() {
        out.push(Inline::bold(vec![Inline::text(&caps[4])]));
    }
    Some(out)
}

fn find_markers(inlines: &[Inline]) -> Vec<Found> {
    let mut found = Vec::new();
    for (index, inline) in inlines.iter().enumerate() {
        match inline {
            Inline::Hi {
                rend: Some(rend),
                children,
            } => {
                let Some(Inline::Text(leading)) = children.first() else {
                    continue;
                };
                let trigger = match rend {
                    Rendition::Bold => Trigger::Bold,
                    Rendition::Italic => Trigger::Italic,
                    Rendition::Unknown(_) => continue,
                };
                let prefix = &inlines[..index];
                let hit = GRAMMARS
                    .iter()
                    .filter(|grammar| grammar.trigger == trigger)
                    .find_map(|grammar| {
                        let caps = grammar.pattern.captures(leading)?;
                        context_holds(prefix, grammar.context).then(|| Found {
                            index,
                            depth: grammar.depth,
                            marker: caps[1].to_string(),
                            site: Site::Run {
                                consumed: caps.get(0).map_or(0, |m| m.end()),
                                context: grammar.context,
                            },
                        })
                    });
                found.extend(hit);
            }
            Inline::Text(text) => {
                for grammar in GRAMMARS.iter().filter(|g| g.trigger == Trigger::Text) {
                    for caps in grammar.pattern.captures_iter(text) {
                        let (Some(whole), Some(marker)) = (caps.get(0), caps.get(1)) else {
                            continue;
                        };
                        found.push(Found {
                            index,
                            depth: grammar.depth,
                            marker: marker.as_str().to_string(),
                            site: Site::Text {
                                start: whole.start(),
                                end: whole.end(),
                            },
                        });
                    }
                }
            }
            _ => {}
        }
    }
    found
}

fn is_sentence_end(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

fn is_glyph(context: Context, ch: char) -> bool {
    match context {
        Context::SentenceEnd | Context::SentenceEndThroughTag => is_sentence_end(ch),
        Context::Pilcrow => ch == '¶',
        Context::Dash => ch == '-' || ch == '—',
    }
}

fn context_holds(prefix: &[Inline], context: Context) -> bool {
    let glyph_before = matches!(
        prefix.last(),
        Some(Inline::Text(text))
            if text.trim_end().chars().next_back().is_some_and(|ch| is_glyph(context, ch))
    );
    match context {
        Context::SentenceEndThroughTag => glyph_before || sentence_closed_by_tag(prefix),
        _ => glyph_before,
    }
}

/// Sentence punctuation directly followed by one markup boundary: the end of
/// the previous run, or a line break.
fn sentence_closed_by_tag(prefix: &[Inline]) -> bool {
    let mut rest = prefix;
    if let Some((Inline::Text(text), before)) = rest.split_last() {
        if !text.trim().is_empty() {
            return false;
        }
        rest = before;
    }
    match rest.split_last() {
        Some((Inline::LineBreak, before)) => {
            matches!(before.last(), Some(Inline::Text(text)) if text.ends_with(is_sentence_end))
        }
        Some((inline, _)) => matches!(
            inline.children().and_then(|children| children.last()),
            Some(Inline::Text(text)) if text.ends_with(is_sentence_end)
        ),
        None => false,
    }
}

/// Markers inside a styled run cannot open a sense without breaking that
/// run's nesting. Such an entry is rejected as a whole.
fn reject_nested_markers(inlines: &[Inline]) -> Result<(), ConvertError> {
    let mut offset = 0;
    for inline in inlines {
        if let Some(children) = inline.children() {
            reject_markers_in(children, offset, inlines)?;
        }
        offset += text_len(std::slice::from_ref(inline));
    }
    Ok(())
}

fn reject_markers_in(seq: &[Inline], base: usize, entry: &[Inline]) -> Result<(), ConvertError> {
    if let Some(found) = find_markers(seq).into_iter().next() {
        let mut offset = base + text_len(&seq[..found.index]);
        if let (Site::Text { start, .. }, Inline::Text(text)) = (&found.site, &seq[found.index]) {
            offset += text[..*start].chars().count();
        }
        return Err(ConvertError::UnbalancedMarker {
            depth: found.depth,
            marker: found.marker,
            offset,
            snippet: snippet_around(&plain_text(entry), offset),
            intermediate: render_inlines(entry),
        });
    }
    let mut offset = base;
    for inline in seq {
        if let Some(children) = inline.children() {
            reject_markers_in(children, offset, entry)?;
        }
        offset += text_len(std::slice::from_ref(inline));
    }
    Ok(())
}

fn snippet_around(text: &str, offset: usize) -> String {
    let start = offset.saturating_sub(SNIPPET_RADIUS);
    text.chars()
        .skip(start)
        .take(offset - start + SNIPPET_RADIUS)
        .collect()
}

fn apply_markers(inlines: InlineSeq, found: Vec<Found>) -> Vec<Piece> {
    let any = !found.is_empty();
    let mut found = found.into_iter().peekable();
    let mut pieces = Vec::new();
    // Whitespace following a marker belongs to no segment.
    let mut absorb = false;

    for (index, inline) in inlines.into_iter().enumerate() {
        let mut here = Vec::new();
        while let Some(next) = found.next_if(|f| f.index == index) {
            here.push(next);
        }
        if here.is_empty() {
            push_inline(&mut pieces, inline, &mut absorb);
            continue;
        }

        match inline {
            Inline::Text(text) => {
                let mut cursor = 0;
                for hit in here {
                    let Site::Text { start, end } = hit.site else {
                        continue;
                    };
                    push_inline(&mut pieces, Inline::text(&text[cursor..start]), &mut absorb);
                    end_segment(&mut pieces, None);
                    pieces.push(Piece::Boundary {
                        depth: hit.depth,
                        marker: hit.marker,
                    });
                    absorb = true;
                    cursor = end;
                }
                push_inline(&mut pieces, Inline::text(&text[cursor..]), &mut absorb);
            }
            Inline::Hi { rend, mut children } => {
                for hit in here {
                    let Site::Run { consumed, context } = hit.site else {
                        continue;
                    };
                    let glyph = match context {
                        Context::Pilcrow | Context::Dash => Some(context),
                        Context::SentenceEnd | Context::SentenceEndThroughTag => None,
                    };
                    end_segment(&mut pieces, glyph);
                    pieces.push(Piece::Boundary {
                        depth: hit.depth,
                        marker: hit.marker,
                    });
                    if let Some(Inline::Text(leading)) = children.first_mut() {
                        let rest = leading[consumed..].trim_start().to_string();
                        if rest.is_empty() {
                            children.remove(0);
                        } else {
                            *leading = rest;
                        }
                    }
                }
                absorb = children.is_empty();
                pieces.push(Piece::Inline(Inline::Hi { rend, children }));
            }
            other => push_inline(&mut pieces, other, &mut absorb),
        }
    }

    if any && let Some(Piece::Inline(Inline::Text(text))) = pieces.last_mut() {
        let trimmed = text.trim_end().len();
        text.truncate(trimmed);
        if text.is_empty() {
            pieces.pop();
        }
    }
    pieces
}

fn push_inline(pieces: &mut Vec<Piece>, inline: Inline, absorb: &mut bool) {
    let inline = match inline {
        Inline::Text(text) if *absorb => Inline::Text(text.trim_start().to_string()),
        other => other,
    };
    *absorb = false;
    if matches!(&inline, Inline::Text(text) if text.is_empty()) {
        return;
    }
    pieces.push(Piece::Inline(inline));
}

/// Trims the text that precedes a boundary, consuming the context glyph
/// when the grammar swallows it.
fn end_segment(pieces: &mut Vec<Piece>, glyph: Option<Context>) {
    let Some(Piece::Inline(Inline::Text(text))) = pieces.last_mut() else {
        return;
    };
    let mut kept = text.trim_end();
    if let Some(context) = glyph {
        let mut chars = kept.chars();
        if chars.next_back().is_some_and(|ch| is_glyph(context, ch)) {
            kept = chars.as_str().trim_end();
        }
    }
    *text = kept.to_string();
    if text.is_empty() {
        pieces.pop();
    }
}

fn split_segments(pieces: Vec<Piece>) -> Classification {
    let mut header = Vec::new();
    let mut segments: Vec<MarkedSegment> = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Boundary { depth, marker } => segments.push(MarkedSegment {
                depth,
                marker,
                content: Vec::new(),
            }),
            Piece::Inline(inline) => match segments.last_mut() {
                Some(segment) => segment.content.push(inline),
                None => header.push(inline),
            },
        }
    }
    Classification { header, segments }
}
