use std::collections::BTreeMap;

const BASE_CSS: &str = include_str!("../assets/forcdict.css");

/// Identifier of the dictionary document the lookup client expects.
pub const DICTIONARY_ID: &str = "DigitalForcellini";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Auto,
    Light,
    Dark,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    theme: Theme,
}

impl Renderer {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn stylesheet(&self) -> String {
        let mut out = String::new();
        let (light_vars, dark_vars) = default_theme_vars();

        match self.theme {
            Theme::Auto => {
                out.push_str(&root_block(&light_vars));
                out.push_str("@media (prefers-color-scheme: dark) {\n");
                out.push_str(&indent_root_block(&dark_vars));
                out.push_str("}\n");
            }
            Theme::Light => {
                out.push_str(&root_block(&light_vars));
            }
            Theme::Dark => {
                out.push_str(&root_block(&dark_vars));
            }
        }

        out.push_str(BASE_CSS);
        out
    }

    /// Wraps rendered `<entryFree>` elements, in the given order, into one
    /// dictionary document with the stylesheet inlined.
    pub fn embed_dictionary(&self, entries: &[String]) -> String {
        let mut out = String::new();
        out.push_str(&format!("<dictionary id=\"{}\">", DICTIONARY_ID));
        out.push_str("<style type=\"text/css\">\n");
        out.push_str(&self.stylesheet());
        out.push_str("</style>");
        for entry in entries {
            out.push_str(entry);
        }
        out.push_str("</dictionary>\n");
        out
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

fn default_theme_vars() -> (BTreeMap<String, String>, BTreeMap<String, String>) {
    let light = BTreeMap::from([
        ("--forcdict-bg".to_string(), "transparent".to_string()),
        ("--forcdict-fg".to_string(), "#1f2328".to_string()),
        ("--forcdict-muted".to_string(), "#5f6b76".to_string()),
        ("--forcdict-border".to_string(), "#d8dee4".to_string()),
        ("--forcdict-accent".to_string(), "#2b6cb0".to_string()),
        ("--forcdict-marker".to_string(), "#8b3a1a".to_string()),
    ]);

    let dark = BTreeMap::from([
        ("--forcdict-bg".to_string(), "transparent".to_string()),
        ("--forcdict-fg".to_string(), "#e6edf3".to_string()),
        ("--forcdict-muted".to_string(), "#9aa4af".to_string()),
        ("--forcdict-border".to_string(), "#2a313b".to_string()),
        ("--forcdict-accent".to_string(), "#63b3ed".to_string()),
        ("--forcdict-marker".to_string(), "#e0a080".to_string()),
    ]);

    (light, dark)
}

fn format_vars(vars: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in vars {
        out.push_str("  ");
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push_str(";\n");
    }
    out
}

fn root_block(vars: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    out.push_str(":root {\n");
    out.push_str("  color-scheme: light dark;\n");
    out.push_str(&format_vars(vars));
    out.push_str("}\n");
    out
}

fn indent_root_block(vars: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    out.push_str("  :root {\n");
    out.push_str("    color-scheme: light dark;\n");
    for (key, value) in vars {
        out.push_str("    ");
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push_str(";\n");
    }
    out.push_str("  }\n");
    out
}
