use thiserror::Error;

/// HTTP 層錯誤（連線、讀取 body）
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("請求失敗: {0}")]
    Transport(String),
}

/// 解析畫廊失敗：只影響該畫廊，其他畫廊照常處理
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("無法從網址取得畫廊編號: {0}")]
    InvalidUrl(String),

    #[error("網路錯誤: {0}")]
    Network(#[from] FetchError),

    #[error("HTTP 狀態碼 {0}")]
    HttpStatus(u16),

    #[error("metadata 解析失敗: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 單張圖片下載失敗
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("{0}")]
    Transport(#[from] FetchError),

    #[error("HTTP 狀態碼 {0}")]
    HttpStatus(u16),

    #[error("回應內容為空")]
    EmptyBody,

    #[error("無效的圖片 hash: {0:?}")]
    InvalidHash(String),
}
