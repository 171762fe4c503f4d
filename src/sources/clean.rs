//! Generic article cleaning: HTML in, plain paragraphs out.
//!
//! Works on any outlet without per-site rules:
//!
//! 1. Pick the first container matching `article`, `main article`, `main`,
//!    `.article-body`, `.article-content`, `.entry-content`, `#article-body`
//! 2. Collect its `<p>` texts, whitespace-collapsed, skipping boilerplate
//!    (`advertisement`, `subscribe`, `sign up`)
//! 3. Drop a leading photo caption credited to Getty
//! 4. Join paragraphs with blank lines so sentence segmentation sees them
//!
//! The meta description, when present, is prepended to the body.

use crate::models::FetchedDocument;
use crate::utils::{collapse_whitespace, domain_of};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article",
        "main article",
        "main",
        ".article-body",
        ".article-content",
        ".entry-content",
        "#article-body",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static META_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static OG_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:description"]"#).unwrap());
static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());

static GETTY_CAPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bvia getty\b|\b/getty\b").unwrap());

const BOILERPLATE: &[&str] = &["advertisement", "subscribe", "sign up"];

/// What the cleaner recovered from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPage {
    /// Headline, for logging; records carry no title.
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
}

impl ParsedPage {
    /// Description and body, separated by a blank line.
    pub fn cleaned_text(&self) -> String {
        [self.description.as_deref(), self.body.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// `None` when the page yielded no text at all.
    pub fn to_document(&self, url: &str, fetched_at: DateTime<Utc>) -> Option<FetchedDocument> {
        let cleaned_text = self.cleaned_text();
        if cleaned_text.is_empty() {
            return None;
        }
        Some(FetchedDocument {
            url: url.to_string(),
            domain: domain_of(url),
            fetched_at,
            cleaned_text,
        })
    }
}

pub fn parse_page(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);
    ParsedPage {
        title: first_text(&document, &HEADLINE)
            .or_else(|| meta_content(&document, &OG_TITLE))
            .or_else(|| first_text(&document, &TITLE)),
        description: meta_content(&document, &META_DESCRIPTION)
            .or_else(|| meta_content(&document, &OG_DESCRIPTION)),
        body: extract_body(&document),
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
}

fn extract_body(document: &Html) -> Option<String> {
    let container = CONTAINERS
        .iter()
        .find_map(|selector| document.select(selector).next())?;

    let mut paragraphs: Vec<String> = container
        .select(&PARAGRAPH)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .filter(|t| !BOILERPLATE.contains(&t.to_lowercase().as_str()))
        .collect();

    if paragraphs.is_empty() {
        let text = element_text(container);
        return (!text.is_empty()).then_some(text);
    }

    if paragraphs.len() > 1 && GETTY_CAPTION.is_match(&paragraphs[0]) {
        paragraphs.remove(0);
    }
    Some(paragraphs.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
          <head>
            <title>Site | Story</title>
            <meta name="description" content="  AI tools are changing   clinics. ">
          </head>
          <body>
            <nav><p>Home</p></nav>
            <article>
              <h1>Clinicians get time back</h1>
              <p>A nurse at work. Photo by Jane Doe via Getty Images</p>
              <p>Clinicians saved 2 hours a day
                 on documentation.</p>
              <p>Advertisement</p>
              <p>Adoption grew 40% this year.</p>
              <p>Subscribe</p>
            </article>
          </body>
        </html>"#;

    #[test]
    fn test_parse_page_extracts_clean_body() {
        let page = parse_page(PAGE);
        assert_eq!(page.title.as_deref(), Some("Clinicians get time back"));
        assert_eq!(page.description.as_deref(), Some("AI tools are changing clinics."));
        assert_eq!(
            page.body.as_deref(),
            Some("Clinicians saved 2 hours a day on documentation.\n\nAdoption grew 40% this year.")
        );
    }

    #[test]
    fn test_cleaned_text_prepends_description() {
        let page = parse_page(PAGE);
        assert!(
            page.cleaned_text()
                .starts_with("AI tools are changing clinics.\n\nClinicians saved")
        );
    }

    #[test]
    fn test_container_without_paragraphs_uses_its_text() {
        let page = parse_page("<main><div>Staff saved  3 hours.</div></main>");
        assert_eq!(page.body.as_deref(), Some("Staff saved 3 hours."));
    }

    #[test]
    fn test_single_caption_paragraph_is_kept() {
        let page = parse_page("<article><p>Photo via Getty Images</p></article>");
        assert_eq!(page.body.as_deref(), Some("Photo via Getty Images"));
    }

    #[test]
    fn test_to_document() {
        let page = parse_page(PAGE);
        let doc = page.to_document("https://www.example.com/story", Utc::now()).unwrap();
        assert_eq!(doc.domain, "www.example.com");
        assert!(doc.cleaned_text.contains("2 hours"));

        let empty = parse_page("<html><body><div>nothing here</div></body></html>");
        assert!(empty.to_document("https://a.com/x", Utc::now()).is_none());
    }
}
