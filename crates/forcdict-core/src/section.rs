use crate::ast::{MarkedSegment, SenseNode};

/// Folds the flat, document-ordered segments into a sense forest.
pub fn build_senses(segments: Vec<MarkedSegment>) -> Vec<SenseNode> {
    let mut iter = segments.into_iter().peekable();
    let mut out = Vec::new();

    while let Some(segment) = iter.next() {
        let depth = segment.depth;
        // Claim following segments until the next one at the same or a shallower depth.
        let mut claimed = Vec::new();
        while let Some(next) = iter.next_if(|next| next.depth > depth) {
            claimed.push(next);
        }
        let mut node = SenseNode::from(segment);
        node.children = build_senses(claimed);
        out.push(node);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::build_senses;
    use crate::ast::{Inline, MarkedSegment, SenseNode};

    fn seg(depth: u8, marker: &str) -> MarkedSegment {
        MarkedSegment {
            depth,
            marker: marker.to_string(),
            content: vec![Inline::text(marker)],
        }
    }

    fn shape(nodes: &[SenseNode]) -> String {
        nodes
            .iter()
            .map(|node| {
                if node.children.is_empty() {
                    node.marker.clone()
                } else {
                    format!("{}[{}]", node.marker, shape(&node.children))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn deeper_segments_nest_under_preceding_shallower() {
        let senses = build_senses(vec![
            seg(1, "A)"),
            seg(2, "I.)"),
            seg(3, "1."),
            seg(3, "2."),
            seg(2, "II.)"),
            seg(1, "B)"),
        ]);
        assert_eq!(shape(&senses), "A)[I.)[1. 2.] II.)] B)");
    }

    #[test]
    fn depths_may_start_deep_and_skip_levels() {
        let senses = build_senses(vec![seg(3, "1."), seg(5, "1)"), seg(7, "α)"), seg(3, "2.")]);
        assert_eq!(shape(&senses), "1.[1)[α)] 2.");
    }

    #[test]
    fn shallower_segment_after_deep_start_becomes_sibling() {
        let senses = build_senses(vec![seg(4, "1.°)"), seg(2, "I.)"), seg(6, "a)")]);
        assert_eq!(shape(&senses), "1.°) I.)[a)]");
    }

    #[test]
    fn content_is_kept_on_its_node() {
        let senses = build_senses(vec![seg(1, "A)"), seg(2, "I.)")]);
        assert_eq!(senses[0].content, vec![Inline::text("A)")]);
        assert_eq!(senses[0].children[0].content, vec![Inline::text("I.)")]);
    }

    #[test]
    fn empty_input_gives_empty_forest() {
        assert!(build_senses(Vec::new()).is_empty());
    }
}
