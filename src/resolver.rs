use crate::error::ResolveError;
use crate::fetcher::Fetcher;
use crate::parser::{gallery_id_from_url, metadata_url, parse_gallery};
use crate::types::Gallery;
use std::sync::Arc;
use tracing::debug;

/// 畫廊網址 → Gallery，失敗不重試，由呼叫端決定略過
pub struct GalleryResolver<F: Fetcher> {
    fetcher: Arc<F>,
}

impl<F: Fetcher> GalleryResolver<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }

    pub async fn resolve(&self, url: &str) -> Result<Gallery, ResolveError> {
        let id = gallery_id_from_url(url)?;
        let endpoint = metadata_url(id);
        debug!(url, endpoint = %endpoint, "讀取畫廊資訊");

        let response = self.fetcher.get(&endpoint, &[]).await?;
        if response.status != 200 {
            return Err(ResolveError::HttpStatus(response.status));
        }

        parse_gallery(&response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetcher::FetchResponse;
    use bytes::Bytes;
    use std::sync::Mutex;

    /// 回傳固定結果並記錄請求網址
    struct StaticFetcher {
        result: Result<FetchResponse, String>,
        requested: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        fn new(result: Result<FetchResponse, String>) -> Arc<Self> {
            Arc::new(Self {
                result,
                requested: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl Fetcher for StaticFetcher {
        async fn get(
            &self,
            url: &str,
            _headers: &[(&'static str, String)],
        ) -> Result<FetchResponse, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.result.clone().map_err(FetchError::Transport)
        }
    }

    fn ok(status: u16, body: &'static [u8]) -> Result<FetchResponse, String> {
        Ok(FetchResponse {
            status,
            body: Bytes::from_static(body),
        })
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let fetcher = StaticFetcher::new(ok(
            200,
            br#"var galleryinfo = {"id":"555","title":"A","japanese_title":"B","language":"korean","files":[]}"#,
        ));
        let resolver = GalleryResolver::new(Arc::clone(&fetcher));

        let gallery = resolver
            .resolve("https://hitomi.la/manga/a-title-555.html")
            .await
            .unwrap();

        assert_eq!(gallery.id, "555");
        assert_eq!(gallery.display_title(), "B");
        assert_eq!(
            fetcher.requested.lock().unwrap().as_slice(),
            ["https://ltn.hitomi.la/galleries/555.js"]
        );
    }

    #[tokio::test]
    async fn test_resolve_http_status() {
        let resolver = GalleryResolver::new(StaticFetcher::new(ok(404, b"")));
        let result = resolver.resolve("https://hitomi.la/x-1.html").await;
        assert!(matches!(result, Err(ResolveError::HttpStatus(404))));
    }

    #[tokio::test]
    async fn test_resolve_network_error() {
        let resolver = GalleryResolver::new(StaticFetcher::new(Err("connection reset".to_string())));
        let result = resolver.resolve("https://hitomi.la/x-1.html").await;
        assert!(matches!(result, Err(ResolveError::Network(_))));
    }

    #[tokio::test]
    async fn test_resolve_parse_error() {
        let resolver = GalleryResolver::new(StaticFetcher::new(ok(200, b"<html>blocked</html>")));
        let result = resolver.resolve("https://hitomi.la/x-1.html").await;
        assert!(matches!(result, Err(ResolveError::Parse(_))));
    }

    #[tokio::test]
    async fn test_resolve_invalid_url_makes_no_request() {
        let fetcher = StaticFetcher::new(ok(200, b"{}"));
        let resolver = GalleryResolver::new(Arc::clone(&fetcher));

        let result = resolver.resolve("https://hitomi.la/broken-.html").await;
        assert!(matches!(result, Err(ResolveError::InvalidUrl(_))));
        assert!(fetcher.requested.lock().unwrap().is_empty());
    }
}
