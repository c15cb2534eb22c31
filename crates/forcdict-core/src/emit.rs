use std::collections::{HashMap, HashSet};

use ammonia::Builder;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{Entry, Inline, Rendition, SenseNode};

const VOID_TAGS: &[&str] = &["area", "col", "embed", "hr", "img", "input", "source", "wbr"];

static GREEK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Greek}{2,}(?: \p{Greek}+)*").expect("greek run pattern"));
static LANG_ABBREV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b((?:It|Fr|Hisp|Germ|Angl)\.) $").expect("language abbreviation pattern")
});
static SEMICOLON_GLOSS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w ]*;$").expect("semicolon gloss pattern"));
static LEADING_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ [—-] ").expect("leading dash pattern"));
static SENTENCE_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\. [—-] ").expect("sentence dash pattern"));

/// Emits one `<entryFree>` element for the entry.
pub fn emit_entry(entry: &Entry) -> String {
    let mut writer = EntryWriter::new(true);
    writer.out.push_str("<entryFree>");
    writer.body_start = writer.out.len();
    writer.inlines(&entry.header);
    for sense in &entry.senses {
        writer.sense(sense);
    }
    writer.out.push_str("</entryFree>");
    writer.out
}

/// Emits the entry and passes it through an allow-list limited to the
/// entry vocabulary. Element names come out lowercased.
pub fn emit_entry_sanitized(entry: &Entry) -> String {
    let raw = emit_entry(entry);

    let tags: HashSet<&'static str> = ["entryfree", "sense", "hi", "a", "br", "span"]
        .iter()
        .copied()
        .collect();

    let mut tag_attributes = HashMap::new();
    tag_attributes.insert("sense", ["level", "marker"].iter().copied().collect());
    tag_attributes.insert("hi", ["rend"].iter().copied().collect());
    tag_attributes.insert("a", ["href"].iter().copied().collect());
    tag_attributes.insert("span", ["lang", "class"].iter().copied().collect());

    Builder::new()
        .tags(tags)
        .generic_attributes(HashSet::new())
        .tag_attributes(tag_attributes)
        .link_rel(None)
        .clean(&raw)
        .to_string()
}

/// Plain serialization of an inline sequence, without the display
/// annotations (Greek spans, language tags, dash breaks).
pub(crate) fn render_inlines(inlines: &[Inline]) -> String {
    let mut writer = EntryWriter::new(false);
    writer.inlines(inlines);
    writer.out
}

struct EntryWriter {
    out: String,
    annotate: bool,
    body_start: usize,
}

impl EntryWriter {
    fn new(annotate: bool) -> Self {
        Self {
            out: String::new(),
            annotate,
            body_start: 0,
        }
    }

    fn sense(&mut self, sense: &SenseNode) {
        self.out.push_str(&format!(
            "<sense level=\"{}\" marker=\"{}\">",
            sense.depth,
            escape_attr(&sense.marker)
        ));
        self.inlines(&sense.content);
        for child in &sense.children {
            self.sense(child);
        }
        self.out.push_str("</sense>");
    }

    fn inlines(&mut self, inlines: &[Inline]) {
        let mut gloss_pending = false;
        for (index, inline) in inlines.iter().enumerate() {
            match inline {
                Inline::Text(text) => {
                    let before_italic = matches!(
                        inlines.get(index + 1),
                        Some(Inline::Hi {
                            rend: Some(Rendition::Italic),
                            ..
                        })
                    );
                    match LANG_ABBREV.captures(text).and_then(|caps| caps.get(1)) {
                        Some(abbrev) if self.annotate && before_italic => {
                            self.text(&text[..abbrev.start()]);
                            self.out.push_str("<span class=\"lang\">");
                            self.out.push_str(&escape_html(abbrev.as_str()));
                            self.out.push_str("</span>");
                            gloss_pending = true;
                        }
                        _ => self.text(text),
                    }
                }
                Inline::Hi {
                    rend: Some(Rendition::Italic),
                    children,
                } if gloss_pending => {
                    gloss_pending = false;
                    self.gloss(children);
                }
                Inline::Hi { rend, children } => {
                    // An unrecognized style was already reported; the run stays unmarked.
                    match rend.as_ref().and_then(Rendition::as_attr) {
                        Some(attr) => self.out.push_str(&format!("<hi rend=\"{}\">", attr)),
                        None => self.out.push_str("<hi>"),
                    }
                    self.inlines(children);
                    self.out.push_str("</hi>");
                }
                Inline::Link { href, children } => {
                    self.out
                        .push_str(&format!("<a href=\"{}\">", escape_attr(href)));
                    self.inlines(children);
                    self.out.push_str("</a>");
                }
                Inline::LineBreak => self.out.push_str("<br/>"),
                Inline::Element {
                    tag,
                    attrs,
                    children,
                } => {
                    self.out.push('<');
                    self.out.push_str(tag);
                    for (key, value) in attrs {
                        self.out
                            .push_str(&format!(" {}=\"{}\"", key, escape_attr(value)));
                    }
                    if VOID_TAGS.contains(&tag.as_str()) && children.is_empty() {
                        self.out.push_str("/>");
                        continue;
                    }
                    self.out.push('>');
                    self.inlines(children);
                    self.out.push_str(&format!("</{}>", tag));
                }
            }
        }
    }

    /// Italic gloss after a language abbreviation. The separating space moves
    /// inside the run; a closing semicolon of a one-phrase gloss moves out.
    fn gloss(&mut self, children: &[Inline]) {
        self.out.push_str("<hi rend=\"italic\"> ");
        if let [Inline::Text(text)] = children
            && SEMICOLON_GLOSS.is_match(text)
        {
            self.text(&text[..text.len() - 1]);
            self.out.push_str("</hi>;");
            return;
        }
        self.inlines(children);
        self.out.push_str("</hi>");
    }

    fn text(&mut self, text: &str) {
        if !self.annotate {
            self.out.push_str(&escape_html(text));
            return;
        }
        let mut rest = text;
        // A dash separator right after markup becomes a line break.
        if self.out.len() > self.body_start
            && let Some(dash) = LEADING_DASH.find(rest)
        {
            self.out.push_str("<br/>");
            rest = &rest[dash.end()..];
        }
        let mut last = 0;
        for dash in SENTENCE_DASH.find_iter(rest) {
            self.script_runs(&rest[last..dash.start() + 1]);
            self.out.push_str("<br/>");
            last = dash.end();
        }
        self.script_runs(&rest[last..]);
    }

    fn script_runs(&mut self, text: &str) {
        let mut last = 0;
        for run in GREEK_RUN.find_iter(text) {
            self.out.push_str(&escape_html(&text[last..run.start()]));
            self.out.push_str("<span lang=\"gr\">");
            self.out.push_str(&escape_html(run.as_str()));
            self.out.push_str("</span>");
            last = run.end();
        }
        self.out.push_str(&escape_html(&text[last..]));
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
