pub type InlineSeq = Vec<Inline>;

#[derive(Clone, Debug, PartialEq)]
pub enum Inline {
    Text(String),
    Hi {
        rend: Option<Rendition>,
        children: InlineSeq,
    },
    Link {
        href: String,
        children: InlineSeq,
    },
    LineBreak,
    // Any other tag, kept as it came from the source.
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: InlineSeq,
    },
}

impl Inline {
    pub fn text(value: impl Into<String>) -> Self {
        Inline::Text(value.into())
    }

    pub fn bold(children: InlineSeq) -> Self {
        Inline::Hi {
            rend: Some(Rendition::Bold),
            children,
        }
    }

    pub fn italic(children: InlineSeq) -> Self {
        Inline::Hi {
            rend: Some(Rendition::Italic),
            children,
        }
    }

    pub fn children(&self) -> Option<&InlineSeq> {
        match self {
            Inline::Hi { children, .. }
            | Inline::Link { children, .. }
            | Inline::Element { children, .. } => Some(children),
            Inline::Text(_) | Inline::LineBreak => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut InlineSeq> {
        match self {
            Inline::Hi { children, .. }
            | Inline::Link { children, .. }
            | Inline::Element { children, .. } => Some(children),
            Inline::Text(_) | Inline::LineBreak => None,
        }
    }
}

/// Semantic style of a `Hi` run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Rendition {
    Bold,
    Italic,
    /// The raw style declaration that matched neither bold nor italic.
    Unknown(String),
}

impl Rendition {
    pub fn as_attr(&self) -> Option<&'static str> {
        match self {
            Rendition::Bold => Some("bold"),
            Rendition::Italic => Some("italic"),
            Rendition::Unknown(_) => None,
        }
    }
}

/// One recognized marker occurrence and the content up to the next one.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkedSegment {
    pub depth: u8,
    pub marker: String,
    pub content: InlineSeq,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SenseNode {
    pub depth: u8,
    pub marker: String,
    pub content: InlineSeq,
    pub children: Vec<SenseNode>,
}

impl From<MarkedSegment> for SenseNode {
    fn from(segment: MarkedSegment) -> Self {
        Self {
            depth: segment.depth,
            marker: segment.marker,
            content: segment.content,
            children: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub header: InlineSeq,
    pub senses: Vec<SenseNode>,
}

/// Concatenated text of a sequence, ignoring element boundaries.
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    push_plain_text(inlines, &mut out);
    out
}

fn push_plain_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::LineBreak => {}
            other => {
                if let Some(children) = other.children() {
                    push_plain_text(children, out);
                }
            }
        }
    }
}

pub(crate) fn text_len(inlines: &[Inline]) -> usize {
    inlines
        .iter()
        .map(|inline| match inline {
            Inline::Text(text) => text.chars().count(),
            Inline::LineBreak => 0,
            other => other.children().map(|c| text_len(c)).unwrap_or(0),
        })
        .sum()
}
