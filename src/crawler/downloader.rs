use super::quiescence::QuiescenceTracker;
use crate::dedup::sanitize_name;
use crate::error::DownloadError;
use crate::fetcher::Fetcher;
use crate::locator::{image_url, output_file_name};
use crate::types::{DownloadJob, WriteJob};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

/// 多個 worker 共用同一個接收端
pub type SharedReceiver<T> = Arc<Mutex<mpsc::Receiver<T>>>;

/// 圖片下載器
pub struct ImageDownloader<F: Fetcher> {
    fetcher: Arc<F>,
    retry_limit: u32,
}

impl<F: Fetcher> Clone for ImageDownloader<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            retry_limit: self.retry_limit,
        }
    }
}

impl<F: Fetcher> ImageDownloader<F> {
    pub fn new(fetcher: Arc<F>, retry_limit: u32) -> Self {
        Self {
            fetcher,
            retry_limit,
        }
    }

    /// 下載單張圖片，失敗立即重試（不等待），最多 retry_limit + 1 次
    pub async fn download(&self, job: &DownloadJob) -> Result<WriteJob, DownloadError> {
        let url = image_url(&job.image)?;
        let referer = format!("https://hitomi.la/reader/{}.html", job.gallery.id);
        let headers = [("Referer", referer)];

        let mut attempt = 0;
        loop {
            attempt += 1;

            match self.download_once(&url, &headers).await {
                Ok(payload) => {
                    if attempt > 1 {
                        debug!(url = %url, attempt, "重試後下載成功");
                    }
                    let file_name = sanitize_name(&output_file_name(&job.image));
                    return Ok(WriteJob {
                        payload,
                        path: job.destination.join(file_name),
                    });
                }
                Err(e) if attempt > self.retry_limit => return Err(e),
                Err(e) => {
                    debug!(url = %url, attempt, error = %e, "下載失敗，重試");
                }
            }
        }
    }

    async fn download_once(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> Result<bytes::Bytes, DownloadError> {
        let response = self.fetcher.get(url, headers).await?;

        if response.status != 200 {
            return Err(DownloadError::HttpStatus(response.status));
        }
        if response.body.is_empty() {
            return Err(DownloadError::EmptyBody);
        }

        Ok(response.body)
    }

    /// 下載 worker：佇列關閉且取完後結束
    pub async fn run_worker(
        self,
        worker_id: usize,
        jobs: SharedReceiver<DownloadJob>,
        writes: mpsc::Sender<WriteJob>,
        tracker: Arc<QuiescenceTracker>,
    ) -> WorkerStats {
        let mut stats = WorkerStats::default();

        loop {
            // 只在取任務時持有鎖
            let job = jobs.lock().await.recv().await;
            let Some(job) = job else {
                break;
            };
            tracker.job_started();

            match self.download(&job).await {
                Ok(write_job) => {
                    stats.downloaded += 1;
                    if writes.send(write_job).await.is_err() {
                        // 寫檔端已經不在了，這個任務不會再被寫入
                        warn!(worker_id, file = %job.image.file_name, "寫檔佇列已關閉");
                        tracker.job_finished();
                    }
                }
                Err(e) => {
                    stats.abandoned += 1;
                    warn!(
                        gallery = %job.gallery.id,
                        file = %job.image.file_name,
                        error = %e,
                        "下載圖片失敗，已達最大重試次數"
                    );
                    tracker.job_finished();
                }
            }
        }

        debug!(worker_id, ?stats, "下載 worker 結束");
        stats
    }
}

/// 單一 worker 的統計
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkerStats {
    pub downloaded: u64,
    pub abandoned: u64,
}
