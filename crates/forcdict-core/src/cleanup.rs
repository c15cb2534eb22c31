use crate::ast::{Entry, Inline, InlineSeq, SenseNode};
use crate::parser::push_text;

/// Digraph to ligature table, applied in order.
pub const LIGATURES: [(&str, &str); 4] = [("AE", "Æ"), ("ae", "æ"), ("OE", "Œ"), ("oe", "œ")];

pub fn cleanup_entry(entry: &mut Entry) {
    cleanup_inlines(&mut entry.header);
    for sense in &mut entry.senses {
        cleanup_sense(sense);
    }
}

fn cleanup_sense(sense: &mut SenseNode) {
    cleanup_inlines(&mut sense.content);
    for child in &mut sense.children {
        cleanup_sense(child);
    }
}

pub fn cleanup_inlines(inlines: &mut InlineSeq) {
    remove_empty_runs(inlines);
    ligate_inlines(inlines);
}

/// Drops styled runs without any text, bottom-up. Text around a dropped run
/// is merged, so the run's tail ends up on the preceding text or, when the
/// run came first, at the front of the parent's text.
pub fn remove_empty_runs(inlines: &mut InlineSeq) {
    for inline in inlines.iter_mut() {
        if let Some(children) = inline.children_mut() {
            remove_empty_runs(children);
        }
    }
    for inline in std::mem::take(inlines) {
        match inline {
            Inline::Text(text) => push_text(inlines, &text),
            run if is_empty_run(&run) => {}
            other => inlines.push(other),
        }
    }
}

fn is_empty_run(inline: &Inline) -> bool {
    matches!(
        inline,
        Inline::Hi { children, .. }
            if children.iter().all(|child| matches!(child, Inline::Text(text) if text.is_empty()))
    )
}

pub fn apply_ligatures(text: &str) -> String {
    LIGATURES
        .iter()
        .fold(text.to_string(), |acc, (digraph, ligature)| {
            acc.replace(digraph, ligature)
        })
}

fn ligate_inlines(inlines: &mut InlineSeq) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => *text = apply_ligatures(text),
            other => {
                if let Some(children) = other.children_mut() {
                    ligate_inlines(children);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_ligatures, cleanup_entry, cleanup_inlines, remove_empty_runs};
    use crate::ast::{Entry, Inline, SenseNode, plain_text};

    #[test]
    fn empty_run_tail_joins_preceding_text() {
        let mut inlines = vec![
            Inline::text("ante "),
            Inline::bold(vec![]),
            Inline::text(" post"),
        ];
        remove_empty_runs(&mut inlines);
        assert_eq!(inlines, vec![Inline::text("ante  post")]);
    }

    #[test]
    fn empty_run_tail_joins_preceding_sibling_element() {
        let mut inlines = vec![
            Inline::italic(vec![Inline::text("a")]),
            Inline::bold(vec![]),
            Inline::text(" tail"),
        ];
        remove_empty_runs(&mut inlines);
        assert_eq!(
            inlines,
            vec![Inline::italic(vec![Inline::text("a")]), Inline::text(" tail")]
        );
    }

    #[test]
    fn empty_run_tail_moves_into_parent_text() {
        let mut inlines = vec![Inline::Link {
            href: "x".to_string(),
            children: vec![
                Inline::italic(vec![Inline::text("")]),
                Inline::text("tail"),
                Inline::bold(vec![Inline::text("b")]),
            ],
        }];
        remove_empty_runs(&mut inlines);
        assert_eq!(
            inlines,
            vec![Inline::Link {
                href: "x".to_string(),
                children: vec![
                    Inline::text("tail"),
                    Inline::bold(vec![Inline::text("b")])
                ],
            }]
        );
    }

    #[test]
    fn shells_holding_only_shells_are_removed() {
        let mut inlines = vec![
            Inline::text("x"),
            Inline::bold(vec![Inline::italic(vec![])]),
            Inline::text("y"),
        ];
        remove_empty_runs(&mut inlines);
        assert_eq!(inlines, vec![Inline::text("xy")]);
    }

    #[test]
    fn line_break_is_not_an_empty_run() {
        let mut inlines = vec![Inline::text("a"), Inline::LineBreak, Inline::text("b")];
        remove_empty_runs(&mut inlines);
        assert_eq!(inlines.len(), 3);
    }

    #[test]
    fn removal_is_lossless() {
        let original = vec![
            Inline::bold(vec![]),
            Inline::text(" head "),
            Inline::italic(vec![Inline::bold(vec![]), Inline::text("in")]),
            Inline::bold(vec![Inline::text("")]),
            Inline::text(" end"),
        ];
        let mut cleaned = original.clone();
        remove_empty_runs(&mut cleaned);
        assert_eq!(plain_text(&cleaned), plain_text(&original));
    }

    #[test]
    fn ligatures_replace_digraphs() {
        assert_eq!(apply_ligatures("AEneas caelum OEdipus poena"), "Æneas cælum Œdipus pœna");
        assert_eq!(apply_ligatures("Ae oE"), "Ae oE");
    }

    #[test]
    fn ligatures_are_idempotent() {
        let once = apply_ligatures("praeOEAEoeae");
        assert_eq!(apply_ligatures(&once), once);
    }

    #[test]
    fn ligatures_leave_attributes_alone() {
        let mut inlines = vec![Inline::Link {
            href: "caelum".to_string(),
            children: vec![Inline::text("caelum")],
        }];
        cleanup_inlines(&mut inlines);
        assert_eq!(
            inlines,
            vec![Inline::Link {
                href: "caelum".to_string(),
                children: vec![Inline::text("cælum")],
            }]
        );
    }

    #[test]
    fn cleanup_reaches_nested_senses() {
        let mut entry = Entry {
            header: vec![Inline::text("prae")],
            senses: vec![SenseNode {
                depth: 1,
                marker: "A)".to_string(),
                content: vec![Inline::italic(vec![]), Inline::text("foo")],
                children: vec![SenseNode {
                    depth: 2,
                    marker: "I.)".to_string(),
                    content: vec![Inline::bold(vec![]), Inline::text("poena")],
                    children: Vec::new(),
                }],
            }],
        };
        cleanup_entry(&mut entry);
        assert_eq!(entry.header, vec![Inline::text("præ")]);
        assert_eq!(entry.senses[0].content, vec![Inline::text("foo")]);
        assert_eq!(
            entry.senses[0].children[0].content,
            vec![Inline::text("pœna")]
        );
    }
}
