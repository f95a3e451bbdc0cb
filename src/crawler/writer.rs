use super::quiescence::QuiescenceTracker;
use crate::file_manager::FileManager;
use crate::types::WriteJob;
use indicatif::ProgressBar;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

/// 寫檔結果統計
#[derive(Debug, Default, Clone, Copy)]
pub struct WriterStats {
    pub written: u64,
    pub failed: u64,
}

/// 單一寫檔 worker：不論成功失敗都會扣掉 in-flight
pub async fn run_writer(
    mut writes: mpsc::Receiver<WriteJob>,
    tracker: Arc<QuiescenceTracker>,
    image_pb: ProgressBar,
) -> WriterStats {
    let mut stats = WriterStats::default();

    while let Some(job) = writes.recv().await {
        match FileManager::save_image(&job.path, &job.payload).await {
            Ok(()) => {
                stats.written += 1;
                image_pb.inc(1);
            }
            Err(e) => {
                stats.failed += 1;
                let reason = format!("{:#}", e);
                error!(path = %job.path.display(), error = %reason, "寫入圖片失敗");
            }
        }
        tracker.job_finished();
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_writer_counts_failures_and_drains() {
        let dir = TempDir::new().unwrap();
        let tracker = Arc::new(QuiescenceTracker::new());
        let (tx, rx) = mpsc::channel(8);

        let jobs = [
            dir.path().join("ok.avif"),
            dir.path().join("missing-dir").join("fail.avif"),
        ];
        for path in jobs {
            tracker.job_enqueued();
            tracker.job_started();
            tx.send(WriteJob {
                payload: Bytes::from_static(b"data"),
                path,
            })
            .await
            .unwrap();
        }
        drop(tx);

        let stats = run_writer(rx, Arc::clone(&tracker), ProgressBar::hidden()).await;

        assert_eq!(stats.written, 1);
        assert_eq!(stats.failed, 1);
        assert!(tracker.is_quiescent());
        assert_eq!(std::fs::read(dir.path().join("ok.avif")).unwrap(), b"data");
    }
}
