use std::time::Duration;

use html5ever::parse_document;
use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use reqwest::blocking::Client;
use reqwest::header::COOKIE;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://lexica.linguax.com";

/// Inline style that marks the article `div`s on a result page.
const ARTICLE_STYLE: &str = "font-family: Palatino Linotype, sans-serif, MS Reference Sans Serif, Microsoft Sans Serif, Verdana, Arial; font-size: 16pt;";
const NOT_FOUND: &str = "Nothing has been found.";
const RESULT_PAGE: &str = "searched Lat. word";
// Commented-out script whose malformed closer swallows the rest of the page.
const RECAPTCHA_COMMENT: &str =
    "<!--  <script src='https://www.google.com/recaptcha/api.js'></script> --!>";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("stopped by timeout: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("server answered {0}")]
    Status(u16),

    #[error("word not found")]
    NotFound,

    /// A result page without any article; the page is kept for inspection.
    #[error("cannot parse answer")]
    Unparseable { page: String },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err)
        } else {
            FetchError::Request(err)
        }
    }
}

pub struct Fetcher {
    client: Client,
    base_url: String,
}

impl Fetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Looks the lemma up and returns the raw article fragments, page order.
    pub fn fetch(&self, lemma: &str) -> Result<Vec<String>, FetchError> {
        let url = format!("{}/forc2.php", self.base_url.trim_end_matches('/'));
        log::debug!("fetching {} for `{}`", url, lemma);
        let response = self
            .client
            .get(&url)
            .query(&[("searchedLG", lemma)])
            .header(COOKIE, "LinguaxMsg=3")
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let page = response.text()?;
        articles_from_page(&page)
    }
}

/// Pulls the article fragments out of a result page.
pub fn articles_from_page(page: &str) -> Result<Vec<String>, FetchError> {
    if page.contains(NOT_FOUND) || !page.contains(RESULT_PAGE) {
        return Err(FetchError::NotFound);
    }
    let cleaned = page.replace(RECAPTCHA_COMMENT, "");
    let dom = parse_document(RcDom::default(), Default::default()).one(cleaned);

    let mut articles = Vec::new();
    collect_articles(&dom.document, &mut articles);
    if articles.is_empty() {
        return Err(FetchError::Unparseable {
            page: page.to_string(),
        });
    }
    log::debug!("found {} article(s) on result page", articles.len());
    Ok(articles)
}

fn collect_articles(node: &Handle, out: &mut Vec<String>) {
    for child in node.children.borrow().iter() {
        if is_article(child) {
            if let Some(html) = serialize_node(child) {
                out.push(html);
            }
            continue;
        }
        collect_articles(child, out);
    }
}

fn is_article(node: &Handle) -> bool {
    let NodeData::Element { name, attrs, .. } = &node.data else {
        return false;
    };
    &*name.local == "div"
        && attrs
            .borrow()
            .iter()
            .any(|attr| &*attr.name.local == "style" && &*attr.value == ARTICLE_STYLE)
}

fn serialize_node(node: &Handle) -> Option<String> {
    let mut bytes = Vec::new();
    let handle: SerializableHandle = node.clone().into();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    if let Err(err) = serialize(&mut bytes, &handle, opts) {
        log::warn!("failed to serialize article: {}", err);
        return None;
    }
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::{ARTICLE_STYLE, FetchError, RECAPTCHA_COMMENT, articles_from_page};

    fn page(body: &str) -> String {
        format!(
            "<html><body><p>searched Lat. word: amo</p>{}</body></html>",
            body
        )
    }

    #[test]
    fn article_divs_are_extracted_in_order() {
        let body = format!(
            "<div style=\"{style}\">prima</div><div>aliud</div>\
             <div><div style=\"{style}\">secunda <span style=\"font-weight:bold\">b</span></div></div>",
            style = ARTICLE_STYLE
        );
        let articles = articles_from_page(&page(&body)).expect("articles");
        assert_eq!(articles.len(), 2);
        assert!(articles[0].starts_with("<div style="));
        assert!(articles[0].contains("prima"));
        assert!(articles[1].contains("<span style=\"font-weight:bold\">b</span>"));
    }

    #[test]
    fn not_found_pages_are_rejected() {
        assert!(matches!(
            articles_from_page("<html><body>Nothing has been found.</body></html>"),
            Err(FetchError::NotFound)
        ));
        assert!(matches!(
            articles_from_page("<html><body>maintenance</body></html>"),
            Err(FetchError::NotFound)
        ));
    }

    #[test]
    fn page_without_articles_is_unparseable() {
        let raw = page("<div>nihil</div>");
        match articles_from_page(&raw) {
            Err(FetchError::Unparseable { page }) => assert_eq!(page, raw),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn recaptcha_comment_does_not_hide_articles() {
        let body = format!(
            "{}<div style=\"{}\">post</div>",
            RECAPTCHA_COMMENT, ARTICLE_STYLE
        );
        let articles = articles_from_page(&page(&body)).expect("articles");
        assert_eq!(articles.len(), 1);
        assert!(articles[0].contains("post"));
    }
}
