use super::downloader::{ImageDownloader, SharedReceiver, WorkerStats};
use super::quiescence::{QuiescenceTracker, RunState};
use super::types::CrawlerConfig;
use super::writer::run_writer;
use crate::dedup::dedup;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::file_manager::FileManager;
use crate::resolver::GalleryResolver;
use crate::types::{DownloadJob, Gallery};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// 寫檔佇列是下載佇列的幾倍，讓慢速磁碟不拖住網路
const WRITE_QUEUE_FACTOR: usize = 100;

/// 下載管線：解析畫廊 → 展開任務 → 並行下載 → 單一寫檔
pub struct CrawlerEngine<F: Fetcher + 'static> {
    fetcher: Arc<F>,
    file_manager: Arc<FileManager>,
    config: CrawlerConfig,
    tracker: Arc<QuiescenceTracker>,
    show_progress: bool,
}

impl CrawlerEngine<HttpFetcher> {
    /// 使用真實 HTTP 客戶端（含 proxy 設定）
    pub fn from_config(config: CrawlerConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.timeout_secs, config.proxy_address())?;
        Ok(Self::new(Arc::new(fetcher), config).with_progress(true))
    }
}

impl<F: Fetcher + 'static> CrawlerEngine<F> {
    pub fn new(fetcher: Arc<F>, config: CrawlerConfig) -> Self {
        Self {
            fetcher,
            file_manager: Arc::new(FileManager::new(config.save_path.clone())),
            config,
            tracker: Arc::new(QuiescenceTracker::new()),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn tracker(&self) -> Arc<QuiescenceTracker> {
        Arc::clone(&self.tracker)
    }

    /// 跑完整個管線，所有階段結束後回傳統計
    pub async fn run(&self, gallery_urls: Vec<String>) -> Result<RunReport> {
        let started_at = Utc::now();
        let timer = Instant::now();

        let urls = dedup(gallery_urls);
        let workers = self.config.normalized_worker_count();
        info!(
            galleries = urls.len(),
            workers,
            retry = self.config.retry_limit,
            "開始下載"
        );

        let multi_progress = MultiProgress::new();
        let (gallery_pb, image_pb) = self.progress_bars(&multi_progress, urls.len() as u64);

        let (gallery_tx, gallery_rx) = mpsc::channel::<Gallery>(workers);
        let (job_tx, job_rx) = mpsc::channel::<DownloadJob>(workers);
        let (write_tx, write_rx) = mpsc::channel(workers * WRITE_QUEUE_FACTOR);
        let job_rx: SharedReceiver<DownloadJob> = Arc::new(Mutex::new(job_rx));

        self.tracker.advance(RunState::Resolving);

        let total = urls.len();
        let producer = tokio::spawn(produce_galleries(
            GalleryResolver::new(Arc::clone(&self.fetcher)),
            urls,
            gallery_tx,
        ));

        let fan_out = tokio::spawn(fan_out_jobs(
            Arc::clone(&self.file_manager),
            gallery_rx,
            job_tx,
            Arc::clone(&self.tracker),
            gallery_pb.clone(),
            total,
        ));

        let downloader = ImageDownloader::new(Arc::clone(&self.fetcher), self.config.retry_limit);
        let worker_handles: Vec<JoinHandle<WorkerStats>> = (0..workers)
            .map(|worker_id| {
                tokio::spawn(downloader.clone().run_worker(
                    worker_id,
                    Arc::clone(&job_rx),
                    write_tx.clone(),
                    Arc::clone(&self.tracker),
                ))
            })
            .collect();
        // worker 全部結束時寫檔佇列才會關閉
        drop(write_tx);

        let writer = tokio::spawn(run_writer(
            write_rx,
            Arc::clone(&self.tracker),
            image_pb.clone(),
        ));

        // 依序等待：解析 → 展開 → 下載 → 寫檔
        let producer_stats = producer.await.context("畫廊解析任務異常結束")?;
        self.tracker.advance(RunState::Downloading);

        let fan_out_stats = fan_out.await.context("任務展開異常結束")?;

        let mut worker_stats = WorkerStats::default();
        for handle in worker_handles {
            let stats = handle.await.context("下載 worker 異常結束")?;
            worker_stats.downloaded += stats.downloaded;
            worker_stats.abandoned += stats.abandoned;
        }
        self.tracker.advance(RunState::Draining);

        let writer_stats = writer.await.context("寫檔 worker 異常結束")?;
        let state = self.tracker.advance(RunState::Done);

        gallery_pb.finish_and_clear();
        image_pb.finish_and_clear();

        let report = RunReport {
            state,
            galleries_total: total,
            galleries_resolved: producer_stats.resolved,
            galleries_failed: producer_stats.failed,
            galleries_skipped: fan_out_stats.skipped,
            jobs_started: self.tracker.started(),
            images_downloaded: worker_stats.downloaded,
            images_written: writer_stats.written,
            images_abandoned: worker_stats.abandoned,
            write_failures: writer_stats.failed,
            started_at,
            elapsed: timer.elapsed(),
        };

        match report.state {
            RunState::Done => info!(written = report.images_written, "下載完成"),
            _ => warn!(state = ?report.state, "沒有任何圖片被下載"),
        }

        Ok(report)
    }

    fn progress_bars(&self, multi_progress: &MultiProgress, galleries: u64) -> (ProgressBar, ProgressBar) {
        if !self.show_progress {
            return (ProgressBar::hidden(), ProgressBar::hidden());
        }

        let gallery_pb = multi_progress.add(ProgressBar::new(galleries));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} 畫廊 {msg}")
        {
            gallery_pb.set_style(style.progress_chars("=>-"));
        }

        let image_pb = multi_progress.add(ProgressBar::new(0));
        if let Ok(style) = ProgressStyle::default_bar().template("{msg} {pos} 張") {
            image_pb.set_style(style);
        }
        image_pb.set_message("🖼️  已下載圖片:");

        (gallery_pb, image_pb)
    }
}

#[derive(Debug, Default)]
struct ProducerStats {
    resolved: u64,
    failed: u64,
}

/// Stage A：依輸入順序逐一解析畫廊
async fn produce_galleries<F: Fetcher>(
    resolver: GalleryResolver<F>,
    urls: Vec<String>,
    galleries: mpsc::Sender<Gallery>,
) -> ProducerStats {
    let mut stats = ProducerStats::default();

    for url in urls {
        match resolver.resolve(&url).await {
            Ok(gallery) => {
                stats.resolved += 1;
                if galleries.send(gallery).await.is_err() {
                    warn!(url = %url, "畫廊佇列已關閉，停止解析");
                    break;
                }
            }
            Err(e) => {
                stats.failed += 1;
                warn!(url = %url, error = %e, "讀取畫廊資訊失敗，略過");
            }
        }
    }

    stats
}

#[derive(Debug, Default)]
struct FanOutStats {
    skipped: u64,
}

/// Stage B：建立目錄並為每張圖片產生一個下載任務
async fn fan_out_jobs(
    file_manager: Arc<FileManager>,
    mut galleries: mpsc::Receiver<Gallery>,
    jobs: mpsc::Sender<DownloadJob>,
    tracker: Arc<QuiescenceTracker>,
    gallery_pb: ProgressBar,
    total: usize,
) -> FanOutStats {
    let mut stats = FanOutStats::default();
    let mut index = 0;

    while let Some(gallery) = galleries.recv().await {
        index += 1;
        let title = gallery.display_title().to_string();
        info!(
            gallery = %gallery.id,
            images = gallery.images.len(),
            "開始下載 ({}/{}): {}",
            index,
            total,
            title
        );
        gallery_pb.set_message(title);
        gallery_pb.inc(1);

        let destination = match file_manager.create_gallery_dir(&gallery) {
            Ok(path) => path,
            Err(e) => {
                stats.skipped += 1;
                let reason = format!("{:#}", e);
                warn!(gallery = %gallery.id, error = %reason, "無法建立畫廊目錄，略過");
                continue;
            }
        };

        for image in &gallery.images {
            let job = DownloadJob {
                image: image.clone(),
                gallery: gallery.clone(),
                destination: destination.clone(),
            };

            tracker.job_enqueued();
            if jobs.send(job).await.is_err() {
                tracker.job_finished();
                warn!(gallery = %gallery.id, "下載佇列已關閉");
                return stats;
            }
        }
    }

    stats
}

/// 一次執行的結果
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    pub galleries_total: usize,
    pub galleries_resolved: u64,
    pub galleries_failed: u64,
    pub galleries_skipped: u64,
    pub jobs_started: u64,
    pub images_downloaded: u64,
    pub images_written: u64,
    pub images_abandoned: u64,
    pub write_failures: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn print_report(&self) {
        println!("\n╔══════════════════════════════════╗");
        println!("║       📊 下載統計               ║");
        println!("╠══════════════════════════════════╣");
        println!("║ 畫廊總數:   {:>18} ║", self.galleries_total);
        println!("║ 解析成功:   {:>18} ║", self.galleries_resolved);
        println!("║ 解析失敗:   {:>18} ║", self.galleries_failed);
        println!("║ 目錄失敗:   {:>18} ║", self.galleries_skipped);
        println!("║ 圖片完成:   {:>18} ║", self.images_written);
        println!("║ 下載失敗:   {:>18} ║", self.images_abandoned);
        println!("║ 寫檔失敗:   {:>18} ║", self.write_failures);
        println!("║ 耗時(秒):   {:>18.1} ║", self.elapsed.as_secs_f64());
        println!("╚══════════════════════════════════╝");
        println!("開始時間: {}", self.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}
