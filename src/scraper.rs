//! Web scraping module for content extraction.
//!
//! Uses reqwest for fetching, encoding_rs for decoding the legacy page encoding
//! and scraper for HTML parsing.

use crate::config::ScraperConfig;
use encoding_rs::Encoding;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("failed to fetch URL: {0}")]
    FetchError(#[from] reqwest::Error),
    #[error("server returned {status} for {url}")]
    Status { url: String, status: StatusCode },
    #[error("unsupported page encoding: {0}")]
    UnsupportedEncoding(String),
    #[error("page is not valid {encoding}")]
    Decode { encoding: &'static str },
    #[error("invalid container selector {selector:?}: {message}")]
    ParseError { selector: String, message: String },
    #[error("no content found in {container}")]
    NoContent { container: String },
}

/// Extracted content from a race page
#[derive(Debug, Clone)]
pub struct PageContent {
    /// The original URL
    pub url: String,
    /// Whitespace-normalized text of the container element
    pub text: String,
}

/// Create a configured HTTP client for scraping
fn create_client(config: &ScraperConfig) -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(&config.user_agent).build()
}

/// Fetch a page and decode its body to UTF-8
pub async fn fetch_page(url: &str, config: &ScraperConfig) -> Result<String, ScraperError> {
    let client = create_client(config)?;

    tracing::info!(url, "fetching page");
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScraperError::Status {
            url: url.to_string(),
            status,
        });
    }

    let body = response.bytes().await?;
    tracing::debug!(bytes = body.len(), "received page body");

    decode_body(&body, &config.encoding, config.strict_decoding)
}

/// Decode raw page bytes using the encoding named by `label`.
///
/// With `strict` set, malformed sequences are an error. Otherwise they become
/// U+FFFD and a warning is logged.
pub fn decode_body(bytes: &[u8], label: &str, strict: bool) -> Result<String, ScraperError> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ScraperError::UnsupportedEncoding(label.to_string()))?;

    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        if strict {
            return Err(ScraperError::Decode {
                encoding: encoding.name(),
            });
        }
        tracing::warn!(
            encoding = encoding.name(),
            "page contains malformed bytes, replaced with U+FFFD"
        );
    }

    Ok(text.into_owned())
}

/// Extract the whitespace-normalized text of the element matching `container`.
///
/// When several elements match, the last one wins. A document without a
/// matching element yields an empty string.
pub fn extract_text(html: &str, container: &str) -> Result<String, ScraperError> {
    let selector = Selector::parse(container).map_err(|e| ScraperError::ParseError {
        selector: container.to_string(),
        message: e.to_string(),
    })?;

    let document = Html::parse_document(html);
    if !document.errors.is_empty() {
        tracing::debug!(
            count = document.errors.len(),
            "recovered from HTML parse errors"
        );
    }

    let Some(element) = document.select(&selector).last() else {
        tracing::warn!(container, "container element not found");
        return Ok(String::new());
    };

    Ok(normalize_whitespace(element.text()))
}

/// Join text fragments, collapsing every whitespace run into one space
fn normalize_whitespace<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    let joined: String = fragments.collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fetch a page and extract its container text, failing when nothing was extracted
pub async fn fetch_content(url: &str, config: &ScraperConfig) -> Result<PageContent, ScraperError> {
    let html = fetch_page(url, config).await?;
    let text = extract_text(&html, &config.container)?;

    if text.is_empty() {
        return Err(ScraperError::NoContent {
            container: config.container.clone(),
        });
    }

    tracing::info!(chars = text.chars().count(), "extracted page text");
    Ok(PageContent {
        url: url.to_string(),
        text,
    })
}
