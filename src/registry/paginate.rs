//! Page-by-page walking of Harbor list endpoints
//!
//! Harbor list endpoints take `page`/`page_size` query parameters and answer
//! with a JSON array. There is no reliable total, so a walk simply continues
//! until a [`PageHandler`] reports that the page it was handed held no data.

use crate::common::RunContext;
use crate::config::RegistryEndpoint;
use crate::error::Result;
use crate::error::handlers::describe_status;
use crate::registry::transport::RegistryTransport;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

pub const PAGE_SIZE: u32 = 50;

/// What a handler decided after seeing one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page held data; request the next one.
    Continue,
    /// End of data; stop walking.
    Done,
}

/// Receives the raw body of each page in turn.
#[async_trait]
pub trait PageHandler: Send {
    async fn handle_page(&mut self, ctx: &RunContext, body: &[u8]) -> Result<PageOutcome>;
}

/// Decodes a page body as a JSON array, treating an empty body or `null` as no items.
pub fn decode_page<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let items: Option<Vec<T>> = serde_json::from_slice(body)?;
    Ok(items.unwrap_or_default())
}

#[derive(Clone)]
pub struct PageFetcher {
    transport: Arc<dyn RegistryTransport>,
    page_size: u32,
}

impl PageFetcher {
    pub fn new(transport: Arc<dyn RegistryTransport>) -> Self {
        Self {
            transport,
            page_size: PAGE_SIZE,
        }
    }

    /// Walks `path` on `endpoint` from page 1 until `handler` returns
    /// [`PageOutcome::Done`], returning the number of pages requested.
    ///
    /// The first transport error, handler error or cancellation ends the walk.
    pub async fn fetch_pages<H>(
        &self,
        ctx: &RunContext,
        endpoint: &RegistryEndpoint,
        path: &str,
        handler: &mut H,
    ) -> Result<u32>
    where
        H: PageHandler + ?Sized,
    {
        let base = endpoint.resolve(path)?;
        let mut page: u32 = 1;

        loop {
            let url = page_url(&base, page, self.page_size);
            tracing::debug!(page, "Fetching {}", url);

            let response = ctx.run(self.transport.get(endpoint, url)).await?;
            if !response.is_success() {
                tracing::warn!(
                    page,
                    "{}: {}",
                    describe_status(response.status, "page request"),
                    response.body_text()
                );
            }

            if handler.handle_page(ctx, &response.body).await? == PageOutcome::Done {
                tracing::debug!(page, "End of data for {}", path);
                return Ok(page);
            }
            page += 1;
        }
    }
}

/// Sets `page` and `page_size` on `base`, keeping any other query parameters.
fn page_url(base: &Url, page: u32, page_size: u32) -> Url {
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != "page" && key != "page_size")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair("page", &page.to_string())
        .append_pair("page_size", &page_size.to_string());
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrateError;
    use crate::registry::transport::TransportResponse;
    use reqwest::StatusCode;
    use serde::Deserialize;
    use std::sync::Mutex;

    /// Serves canned page bodies and records requested URLs.
    struct CannedTransport {
        pages: Vec<&'static str>,
        requested: Mutex<Vec<Url>>,
    }

    impl CannedTransport {
        fn new(pages: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                pages,
                requested: Mutex::new(Vec::new()),
            })
        }

        fn requested(&self) -> Vec<Url> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RegistryTransport for CannedTransport {
        async fn get(&self, _endpoint: &RegistryEndpoint, url: Url) -> Result<TransportResponse> {
            let mut requested = self.requested.lock().unwrap();
            let body = self.pages.get(requested.len()).copied().unwrap_or("[]");
            requested.push(url);
            Ok(TransportResponse::new(StatusCode::OK, body.as_bytes().to_vec()))
        }

        async fn post(
            &self,
            _endpoint: &RegistryEndpoint,
            _url: Url,
            _body: Vec<u8>,
        ) -> Result<TransportResponse> {
            unreachable!("pagination never posts")
        }
    }

    #[derive(Deserialize)]
    struct Item {
        #[allow(dead_code)]
        id: u32,
    }

    #[derive(Default)]
    struct CountingHandler {
        items: usize,
    }

    #[async_trait]
    impl PageHandler for CountingHandler {
        async fn handle_page(&mut self, _ctx: &RunContext, body: &[u8]) -> Result<PageOutcome> {
            let items: Vec<Item> = decode_page(body)?;
            if items.is_empty() {
                return Ok(PageOutcome::Done);
            }
            self.items += items.len();
            Ok(PageOutcome::Continue)
        }
    }

    fn endpoint() -> RegistryEndpoint {
        RegistryEndpoint::parse("https://pcr.io", "admin", "secret").unwrap()
    }

    #[test]
    fn test_page_url_keeps_existing_query() {
        let base = Url::parse("https://pcr.io/api/v2.0/projects?with_detail=true").unwrap();
        let url = page_url(&base, 3, 50);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("with_detail".to_string(), "true".to_string()),
                ("page".to_string(), "3".to_string()),
                ("page_size".to_string(), "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_page_url_replaces_previous_page() {
        let base = Url::parse("https://pcr.io/api/v2.0/repositories?page=9&page_size=10").unwrap();
        let url = page_url(&base, 1, 50);
        assert_eq!(url.query(), Some("page=1&page_size=50"));
    }

    #[test]
    fn test_decode_page_empty_body() {
        let items: Vec<Item> = decode_page(b"").unwrap();
        assert!(items.is_empty());
        let items: Vec<Item> = decode_page(b"  \n").unwrap();
        assert!(items.is_empty());
        let items: Vec<Item> = decode_page(b"null").unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_stops_after_first_empty_page() {
        let transport = CannedTransport::new(vec![r#"[{"id":1},{"id":2}]"#, r#"[{"id":3}]"#, "[]"]);
        let fetcher = PageFetcher::new(transport.clone());
        let mut handler = CountingHandler::default();

        let pages = fetcher
            .fetch_pages(&RunContext::new(), &endpoint(), "/api/v2.0/repositories", &mut handler)
            .await
            .unwrap();

        assert_eq!(pages, 3);
        assert_eq!(handler.items, 3);
        let requested: Vec<String> = transport
            .requested()
            .iter()
            .map(|u| u.query().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            requested,
            vec![
                "page=1&page_size=50",
                "page=2&page_size=50",
                "page=3&page_size=50"
            ]
        );
    }

    #[tokio::test]
    async fn test_decode_error_aborts_walk() {
        let transport = CannedTransport::new(vec![r#"[{"id":1}]"#, "<html>oops</html>", "[]"]);
        let fetcher = PageFetcher::new(transport.clone());
        let mut handler = CountingHandler::default();

        let err = fetcher
            .fetch_pages(&RunContext::new(), &endpoint(), "/api/v2.0/repositories", &mut handler)
            .await
            .unwrap_err();

        assert!(matches!(err, MigrateError::Decode(_)));
        assert_eq!(transport.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_context_requests_nothing() {
        let transport = CannedTransport::new(vec![r#"[{"id":1}]"#]);
        let fetcher = PageFetcher::new(transport.clone());
        let ctx = RunContext::new();
        ctx.cancel();

        let err = fetcher
            .fetch_pages(&ctx, &endpoint(), "/api/v2.0/repositories", &mut CountingHandler::default())
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(transport.requested().is_empty());
    }
}
