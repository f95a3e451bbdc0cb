// 子模組
pub mod types;
pub mod engine;
pub mod downloader;
pub mod quiescence;
pub mod writer;

// 重新導出
pub use types::CrawlerConfig;
pub use engine::CrawlerEngine;
