use std::time::Duration;

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;

use crate::models::FetchedContent;
use crate::pipeline::{CollabResult, CollaboratorError, ContentSource};

const USER_AGENT_STRING: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

// Shorter bodies are almost always cookie walls or error pages.
const MIN_CONTENT_LEN: usize = 200;

/// Fetches one article page over HTTP and extracts its readable body plus
/// whatever author/date metadata the markup exposes.
pub struct HttpContentFetcher {
    client: Client,
}

impl HttpContentFetcher {
    pub fn new(timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// Extract readable content from HTML using html2text.
    fn extract_content(&self, html: &str) -> Option<String> {
        let text = match html2text::from_read(html.as_bytes(), 80) {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!("Failed to convert HTML to text: {}", e);
                return None;
            }
        };

        // Clean up the text - remove excessive whitespace
        let cleaned: String = text
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if cleaned.len() > MIN_CONTENT_LEN {
            Some(cleaned)
        } else {
            tracing::debug!("Extracted content too short ({} chars)", cleaned.len());
            None
        }
    }

    /// Author byline, if the page marks one up the way news sites usually do.
    fn extract_author(&self, html: &str) -> Option<String> {
        let re = Regex::new(
            r#"<(?:span|p|div)[^>]*class=["'][^"']*(?:author|m_auth|m_newsauthor)[^"']*["'][^>]*>([^<]+)<"#,
        )
        .ok()?;
        let author = re.captures(html)?.get(1)?.as_str().trim().to_string();
        if author.is_empty() {
            None
        } else {
            Some(author)
        }
    }

    /// Publication date from a `<time datetime=...>` tag or a dated element.
    fn extract_date(&self, html: &str) -> Option<String> {
        let time_re = Regex::new(r#"<time[^>]*datetime=["']([^"']+)["']"#).ok()?;
        if let Some(cap) = time_re.captures(html) {
            return Some(cap[1].trim().to_string());
        }

        let dated_re = Regex::new(
            r#"<(?:span|div|p)[^>]*class=["'][^"']*(?:date|time|m_newstime)[^"']*["'][^>]*>([^<]+)<"#,
        )
        .ok()?;
        let date = dated_re.captures(html)?.get(1)?.as_str().trim().to_string();
        if date.is_empty() {
            None
        } else {
            Some(date)
        }
    }
}

impl ContentSource for HttpContentFetcher {
    async fn fetch_content(&self, url: &str) -> CollabResult<FetchedContent> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(CollaboratorError::Network(format!(
                "HTTP {} for {url}",
                response.status()
            )));
        }

        let html = response.text().await?;

        let content = self
            .extract_content(&html)
            .ok_or_else(|| CollaboratorError::Parse(format!("no readable body at {url}")))?;

        Ok(FetchedContent {
            content,
            author: self.extract_author(&html),
            date: self.extract_date(&html),
        })
    }
}
