// Generic page extractor
//
// One/detail mode: page metadata. List mode: same-site links, each enriched
// through the detail table when a pool is available.

use async_trait::async_trait;
use extracta_core::domain::{ExtractedPayload, FetchMode};
use extracta_core::port::{ExtractionScope, Extractor, ExtractorError};
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Links returned in list mode when the request carries no `maxPages`
const DEFAULT_LIST_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub link_count: usize,
}

fn selector(css: &str) -> Result<Selector, ExtractorError> {
    Selector::parse(css).map_err(|e| ExtractorError::Failed(format!("bad selector {}: {}", css, e)))
}

fn first_text(document: &Html, css: &str) -> Result<Option<String>, ExtractorError> {
    let sel = selector(css)?;
    Ok(document
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty()))
}

pub fn parse_metadata(html: &str, url: &str) -> Result<PageMetadata, ExtractorError> {
    let document = Html::parse_document(html);
    let description_sel = selector("meta[name='description']")?;
    let links_sel = selector("a[href]")?;

    Ok(PageMetadata {
        url: url.to_string(),
        title: first_text(&document, "title")?,
        description: document
            .select(&description_sel)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        heading: first_text(&document, "h1")?,
        link_count: document.select(&links_sel).count(),
    })
}

/// Distinct same-host http(s) links in document order, fragments dropped
pub fn same_site_links(html: &str, base: &str, limit: usize) -> Result<Vec<String>, ExtractorError> {
    let base = Url::parse(base).map_err(|e| ExtractorError::Page(format!("bad base url: {}", e)))?;
    let document = Html::parse_document(html);
    let links_sel = selector("a[href]")?;

    let mut seen = HashSet::new();
    let mut base_without_fragment = base.clone();
    base_without_fragment.set_fragment(None);
    seen.insert(base_without_fragment.to_string());

    Ok(document
        .select(&links_sel)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .filter(|url| url.host_str() == base.host_str())
        .map(|mut url| {
            url.set_fragment(None);
            url.to_string()
        })
        .filter(|url| seen.insert(url.clone()))
        .take(limit)
        .collect())
}

pub struct GenericPageExtractor {
    mode: FetchMode,
}

impl GenericPageExtractor {
    pub fn new(mode: FetchMode) -> Self {
        Self { mode }
    }
}

#[async_trait]
impl Extractor for GenericPageExtractor {
    async fn extract(&self, scope: &ExtractionScope<'_>) -> Result<ExtractedPayload, ExtractorError> {
        let html = scope
            .page
            .content()
            .await
            .map_err(|e| ExtractorError::Page(e.to_string()))?;
        let base = scope
            .page
            .current_url()
            .unwrap_or_else(|| scope.url().to_string());

        match self.mode {
            FetchMode::One | FetchMode::Detail => {
                let metadata = parse_metadata(&html, &base)?;
                let value = serde_json::to_value(metadata)
                    .map_err(|e| ExtractorError::Failed(e.to_string()))?;
                Ok(ExtractedPayload::Single(value))
            }
            FetchMode::List => {
                let limit = scope
                    .options()
                    .max_pages
                    .map(|n| n as usize)
                    .unwrap_or(DEFAULT_LIST_LIMIT);
                let links = same_site_links(&html, &base, limit)?;
                debug!(url = %base, links = links.len(), "Collected links");
                if links.is_empty() {
                    return Ok(ExtractedPayload::Many(Vec::new()));
                }

                scope
                    .emit
                    .progress(format!("Enriching {} links", links.len()), 60)
                    .await;
                let details = match scope.enrichment {
                    Some(fetcher) => fetcher.fetch_details(links.clone()).await,
                    None => vec![None; links.len()],
                };

                let items = links
                    .into_iter()
                    .zip(details)
                    .map(|(url, detail)| serde_json::json!({ "url": url, "detail": detail }))
                    .collect();
                Ok(ExtractedPayload::Many(items))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::register_builtin;
    use crate::test_support::{Route, TestServer};
    use crate::HttpContextProvider;
    use extracta_core::application::{ExtractorRegistry, OrchestratorConfig, RunOrchestrator};
    use extracta_core::domain::{ExtractionOptions, ExtractionRequest};
    use extracta_core::port::event_sink::mocks::RecordingSink;
    use extracta_core::port::id_provider::UuidProvider;
    use extracta_core::port::time_provider::SystemTimeProvider;
    use std::sync::Arc;
    use std::time::Duration;

    const ARTICLE: &str = r#"<html><head>
        <title> Daily Specials </title>
        <meta name="description" content="What we serve today">
        </head><body>
        <h1>Menu</h1>
        <a href="/dish/1">One</a>
        <a href="/dish/2#reviews">Two</a>
        <a href="/dish/1">One again</a>
        <a href="https://elsewhere.example/x">Away</a>
        <a href="mailto:chef@example.com">Mail</a>
        </body></html>"#;

    #[test]
    fn test_parse_metadata() {
        let meta = parse_metadata(ARTICLE, "https://shop.example/menu").unwrap();
        assert_eq!(meta.title.as_deref(), Some("Daily Specials"));
        assert_eq!(meta.description.as_deref(), Some("What we serve today"));
        assert_eq!(meta.heading.as_deref(), Some("Menu"));
        assert_eq!(meta.link_count, 5);
    }

    #[test]
    fn test_same_site_links_deduplicated_and_bounded() {
        let links = same_site_links(ARTICLE, "https://shop.example/menu", 10).unwrap();
        assert_eq!(
            links,
            vec!["https://shop.example/dish/1", "https://shop.example/dish/2"]
        );

        let limited = same_site_links(ARTICLE, "https://shop.example/menu", 1).unwrap();
        assert_eq!(limited.len(), 1);
    }

    fn orchestrator() -> RunOrchestrator {
        let mut registry = ExtractorRegistry::new();
        register_builtin(&mut registry);
        RunOrchestrator::new(
            Arc::new(registry),
            Arc::new(HttpContextProvider::default()),
            Arc::new(UuidProvider),
            Arc::new(SystemTimeProvider),
            OrchestratorConfig {
                settle_delay: Duration::ZERO,
                ..OrchestratorConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_fetch_one_over_http() {
        let server = TestServer::start(vec![("/menu", Route::html(ARTICLE))]).await;
        let request = ExtractionRequest::new("web", "generic", server.url("/menu"));
        let sink = Arc::new(RecordingSink::new());

        let payload = orchestrator().fetch_one(&request, sink.clone()).await.unwrap();
        let value = payload.into_value();
        assert_eq!(value["title"], "Daily Specials");
        assert_eq!(value["url"], server.url("/menu"));
        assert_eq!(sink.kinds().last(), Some(&"complete"));
    }

    #[tokio::test]
    async fn test_fetch_list_enriches_each_link() {
        let server = TestServer::start(vec![
            ("/menu", Route::html(ARTICLE)),
            ("/dish/1", Route::html("<title>Soup</title>")),
            ("/dish/2", Route::status(404)),
        ])
        .await;
        let request = ExtractionRequest::new("web", "generic", server.url("/menu"))
            .with_options(ExtractionOptions {
                max_pages: Some(5),
                ..Default::default()
            });

        let payload = orchestrator()
            .fetch_list(&request, Arc::new(RecordingSink::new()))
            .await
            .unwrap();
        let items = payload.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["detail"]["title"], "Soup");
        // A failed per-item lookup does not fail the run
        assert!(items[1]["detail"].is_null());
    }

    #[tokio::test]
    async fn test_list_without_links_fails_as_empty() {
        let server = TestServer::start(vec![("/bare", Route::html("<p>nothing</p>"))]).await;
        let request = ExtractionRequest::new("web", "generic", server.url("/bare"));

        let err = orchestrator()
            .fetch_list(&request, Arc::new(RecordingSink::new()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no data extracted"));
    }
}
