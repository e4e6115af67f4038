//! Bing image search as a candidate source.
//!
//! Result pages carry one `<a class="iusc" m="...">` anchor per image; the
//! `m` attribute is HTML-escaped JSON whose `murl` field is the full-size
//! image URL.

use async_trait::async_trait;
use regex::Regex;
use reqwest::{header, Client};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::http::random_user_agent;
use crate::domain::errors::SearchError;
use crate::domain::models::{Candidate, SearchConfig};
use crate::domain::ports::CandidateSource;
use crate::services::verdict_parser::cached_regex;

fn anchor_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    cached_regex(&PATTERN, r"(?s)<a\s[^>]*>")
}

fn iusc_class_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    cached_regex(&PATTERN, r#"\sclass\s*=\s*"(?:[^"]*\s)?iusc(?:\s[^"]*)?""#)
}

fn metadata_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    cached_regex(&PATTERN, r#"\sm\s*=\s*"([^"]*)""#)
}

#[derive(Debug, Deserialize)]
struct ImageMetadata {
    murl: Option<String>,
}

/// One scraped result page.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ResultPage {
    /// `iusc` anchors on the page, parsable or not.
    pub anchors: usize,
    /// Image URLs in page order.
    pub urls: Vec<String>,
}

/// Extract image URLs from a result page.
pub fn parse_result_page(html: &str) -> ResultPage {
    let mut page = ResultPage::default();
    let (Some(anchor), Some(iusc_class), Some(metadata)) =
        (anchor_pattern(), iusc_class_pattern(), metadata_pattern())
    else {
        return page;
    };
    for tag in anchor.find_iter(html) {
        let tag = tag.as_str();
        if !iusc_class.is_match(tag) {
            continue;
        }
        page.anchors += 1;

        let Some(raw) = metadata.captures(tag).and_then(|c| c.get(1)) else {
            continue;
        };
        match serde_json::from_str::<ImageMetadata>(&unescape_html(raw.as_str())) {
            Ok(ImageMetadata { murl: Some(url) }) if !url.is_empty() => page.urls.push(url),
            Ok(_) => {}
            Err(err) => debug!(error = %err, "skipping unparsable result metadata"),
        }
    }
    page
}

/// Decode the entities Bing uses inside attribute values.
pub fn unescape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';').filter(|&i| i <= 10) else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "quot" => Some('"'),
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Pages through Bing image results.
pub struct BingImageSource {
    client: Client,
    endpoint: String,
    page_delay: Duration,
}

impl BingImageSource {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(random_user_agent())
            .build()
            .map_err(|e| SearchError::Request(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            page_delay: Duration::from_millis(config.page_delay_ms),
        })
    }

    async fn fetch_page(&self, query: &str, first: usize) -> Result<String, reqwest::Error> {
        let first = first.to_string();
        self.client
            .get(&self.endpoint)
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .query(&[("q", query), ("first", first.as_str())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl CandidateSource for BingImageSource {
    fn name(&self) -> &'static str {
        "bing"
    }

    #[instrument(skip(self))]
    async fn discover(
        &self,
        query: &str,
        desired_count: usize,
    ) -> Result<Vec<Candidate>, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let mut urls: Vec<Candidate> = Vec::new();
        let mut seen = HashSet::new();
        let mut first = 0;

        while urls.len() < desired_count {
            let html = match self.fetch_page(query, first).await {
                Ok(html) => html,
                Err(err) => {
                    warn!(error = %err, first, "search request failed, keeping results so far");
                    break;
                }
            };

            let page = parse_result_page(&html);
            if page.anchors == 0 {
                info!(first, "no more results");
                break;
            }

            let mut new_found = 0;
            for url in page.urls {
                if urls.len() >= desired_count {
                    break;
                }
                if seen.insert(url.clone()) {
                    urls.push(Candidate::from(url));
                    new_found += 1;
                }
            }
            debug!(first, anchors = page.anchors, new_found, total = urls.len(), "result page scraped");

            if new_found == 0 && first > 0 {
                info!(first, "page brought no new images, stopping");
                break;
            }

            first += page.anchors;
            if urls.len() >= desired_count {
                break;
            }
            tokio::time::sleep(self.page_delay).await;
        }

        info!(found = urls.len(), desired_count, "candidate discovery finished");
        Ok(urls)
    }
}
