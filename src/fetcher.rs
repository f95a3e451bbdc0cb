use crate::error::FetchError;
use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::{Client, Proxy};
use std::time::Duration;

/// 所有請求共用的 User-Agent
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.88 Safari/537.36";

/// 一次 GET 的結果，狀態碼由呼叫端判斷
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Bytes,
}

/// HTTP Fetcher trait - 抽象介面（測試時可替換）
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> std::result::Result<FetchResponse, FetchError>;
}

/// HTTP 實作
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// 建立新的 HTTP Fetcher，proxy 為 SOCKS 位址
    pub fn new(timeout_secs: u64, proxy: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT);

        if let Some(address) = proxy {
            let proxy = Proxy::all(proxy_url(address))
                .with_context(|| format!("無效的 proxy 位址: {}", address))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("無法建立 HTTP 客戶端")?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn get(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> std::result::Result<FetchResponse, FetchError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(format!("讀取回應失敗: {}", e)))?;

        Ok(FetchResponse { status, body })
    }
}

/// 設定檔裡的 proxy 可能只寫 host:port，預設當作 socks5
fn proxy_url(address: &str) -> String {
    if address.contains("://") {
        address.to_string()
    } else {
        format!("socks5://{}", address)
    }
}
