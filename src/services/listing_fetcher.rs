use std::collections::HashSet;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;

use crate::models::Reference;
use crate::pipeline::{CollabResult, CollaboratorError, ListingSource};

const USER_AGENT_STRING: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Scrapes numbered listing pages of a news site for article links.
pub struct HttpListingFetcher {
    client: Client,
    base_url: String,
    listing_path: String,
    source: String,
}

impl HttpListingFetcher {
    pub fn new(base_url: &str, listing_path: &str, source: &str, timeout: Duration) -> Self {
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

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            listing_path: listing_path.to_string(),
            source: source.to_string(),
        }
    }

    fn page_url(&self, page: u32) -> String {
        if page <= 1 {
            format!("{}{}", self.base_url, self.listing_path)
        } else {
            format!("{}{}?page={page}", self.base_url, self.listing_path)
        }
    }

    /// Pull (url, title) pairs out of listing-page anchors. Links that do not
    /// point back into the listing path are navigation, not articles.
    fn parse_references(&self, html: &str) -> Vec<Reference> {
        let link_re = match Regex::new(r#"<a[^>]*href=["']([^"'#]+)["'][^>]*>([^<]+)</a>"#) {
            Ok(re) => re,
            Err(_) => return Vec::new(),
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut references = Vec::new();

        for cap in link_re.captures_iter(html) {
            let href = cap[1].trim();
            let title = cap[2].trim();
            if title.is_empty() || href.starts_with("javascript:") {
                continue;
            }

            let url = self.resolve_url(href);
            if !url.contains(&self.listing_path) || url == self.page_url(1) {
                continue;
            }
            // The listing page itself and pagination links share the path;
            // articles have a longer tail than "?page=N".
            if url.contains("?page=") {
                continue;
            }
            if !seen.insert(url.clone()) {
                continue;
            }

            references.push(Reference {
                url,
                title: title.to_string(),
                date: None,
                source: self.source.clone(),
            });
        }

        references
    }

    /// Resolve a potentially relative URL against the site base.
    fn resolve_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            return href.to_string();
        }

        if let Ok(base) = url::Url::parse(&self.base_url) {
            if let Ok(resolved) = base.join(href) {
                return resolved.to_string();
            }
        }

        href.to_string()
    }
}

impl ListingSource for HttpListingFetcher {
    async fn fetch_page(&self, page: u32) -> CollabResult<Vec<Reference>> {
        let url = self.page_url(page);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(CollaboratorError::Network(format!(
                "HTTP {} for {url}",
                response.status()
            )));
        }

        let html = response.text().await?;
        let references = self.parse_references(&html);
        tracing::debug!("listing page {page}: {} references", references.len());
        Ok(references)
    }
}
