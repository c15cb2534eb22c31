use unicode_normalization::UnicodeNormalization;

const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036f}';

/// Lookup forms for a word as typed: lowercased, diacritics stripped and
/// ligatures spelled out. The site indexes exactly one form per word.
pub fn normalize(word: &str) -> Vec<String> {
    let stripped: String = word
        .to_lowercase()
        .nfd()
        .filter(|ch| !COMBINING_MARKS.contains(ch))
        .collect();
    vec![stripped.replace('æ', "ae").replace('œ', "oe")]
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn lowercases_and_strips_marks() {
        assert_eq!(normalize("ÁMŌ"), vec!["amo".to_string()]);
        assert_eq!(normalize("Cāsus bēlli"), vec!["casus belli".to_string()]);
    }

    #[test]
    fn ligatures_are_spelled_out() {
        assert_eq!(normalize("Cælum"), vec!["caelum".to_string()]);
        assert_eq!(normalize("Pœna"), vec!["poena".to_string()]);
        assert_eq!(normalize("ŒDIPUS"), vec!["oedipus".to_string()]);
    }
}
