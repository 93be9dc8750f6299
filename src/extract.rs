//! Main-body text extraction from arbitrary article pages.
//!
//! Boilerplate elements (`script`, `style`, `nav`, `header`, `footer`) are
//! ignored, then the first container selector with non-empty text wins.
//! Extraction never fails: anything unexpected yields an empty string.

use crate::fetch::Fetcher;
use crate::utils::{collapse_whitespace, truncate_chars};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_MAX_LENGTH: usize = 1000;

const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "nav", "header", "footer"];

/// Candidate body containers, tried in order.
static BODY_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article",
        r#"div[class*="article"]"#,
        r#"div[class*="content"]"#,
        "main",
    ]
    .iter()
    .filter_map(|s| Selector::parse(s).ok())
    .collect()
});

/// Extract the best-guess main body of `html`, at most `max_length` chars.
pub fn extract_body(html: &str, max_length: usize) -> String {
    let document = Html::parse_document(html);

    for selector in BODY_SELECTORS.iter() {
        let candidate = document
            .select(selector)
            .find(|el| !inside_skipped_element(el));
        if let Some(container) = candidate {
            let mut raw = String::new();
            collect_text(container, &mut raw);
            let text = collapse_whitespace(&raw);
            if !text.is_empty() {
                return truncate_chars(&text, max_length);
            }
        }
    }

    String::new()
}

/// Fetch `url` and extract its body; empty on any failure or unusable URL.
#[instrument(level = "debug", skip(fetcher))]
pub async fn fetch_article_content(
    fetcher: &Fetcher,
    url: &str,
    timeout: Duration,
    max_length: usize,
) -> String {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return String::new();
    }
    match fetcher.fetch(url, timeout).await {
        Ok(html) => {
            let body = extract_body(&html, max_length);
            debug!(chars = body.chars().count(), "Extracted article body");
            body
        }
        Err(e) => {
            debug!(error = %e, "Article body fetch failed");
            String::new()
        }
    }
}

fn is_skipped(name: &str) -> bool {
    SKIPPED_ELEMENTS.contains(&name)
}

fn inside_skipped_element(el: &ElementRef) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| is_skipped(a.value().name()))
}

/// Append every text node under `el`, pruning skipped subtrees. Text nodes
/// are separated by a space so adjacent blocks do not run together.
fn collect_text(el: ElementRef, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if !is_skipped(child_el.value().name()) {
                collect_text(child_el, out);
            }
        }
    }
}
