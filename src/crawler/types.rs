use serde::Deserialize;
use std::path::PathBuf;

/// 下載設定（config.json，欄位名稱沿用舊版格式）
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// 存檔根目錄
    #[serde(rename = "SavePath")]
    pub save_path: PathBuf,
    /// SOCKS proxy，空字串視為不使用
    #[serde(rename = "Socks", default)]
    pub proxy: Option<String>,
    /// 失敗後的重試次數（總嘗試次數 = retry_limit + 1）
    #[serde(rename = "Retry", default)]
    pub retry_limit: u32,
    /// 下載 worker 數量，小於 1 時使用 CPU 數
    #[serde(rename = "ThreadNum", default)]
    pub worker_count: i64,
    /// 請求超時（秒）
    #[serde(rename = "Timeout", default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    60
}

impl CrawlerConfig {
    pub fn new(save_path: impl Into<PathBuf>) -> Self {
        Self {
            save_path: save_path.into(),
            proxy: None,
            retry_limit: 3,
            worker_count: 0,
            timeout_secs: default_timeout(),
        }
    }

    pub fn with_concurrency(mut self, worker_count: i64) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// 實際的 proxy 位址（去掉空字串）
    pub fn proxy_address(&self) -> Option<&str> {
        self.proxy
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
    }

    /// min(設定值, 可用平行度)；設定值小於 1 時直接用可用平行度
    pub fn normalized_worker_count(&self) -> usize {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        match usize::try_from(self.worker_count) {
            Ok(count) if count >= 1 => count.min(parallelism),
            _ => parallelism,
        }
    }
}
