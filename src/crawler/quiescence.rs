use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

/// 整體執行狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    Init = 0,
    /// 解析畫廊中（下載 worker 同時在跑）
    Resolving = 1,
    /// 所有畫廊已解析完，只剩下載
    Downloading = 2,
    /// 下載 worker 都結束了，等寫檔
    Draining = 3,
    Done = 4,
    /// 全部結束但從來沒有任何任務
    Empty = 5,
}

impl RunState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RunState::Init,
            1 => RunState::Resolving,
            2 => RunState::Downloading,
            3 => RunState::Draining,
            4 => RunState::Done,
            _ => RunState::Empty,
        }
    }
}

/// 完成偵測用的共享計數器
#[derive(Debug)]
pub struct QuiescenceTracker {
    /// 已排入或下載中、尚未寫檔的任務
    in_flight: AtomicU64,
    /// 曾經開始過的任務總數
    started: AtomicU64,
    state: AtomicU8,
}

impl Default for QuiescenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl QuiescenceTracker {
    pub fn new() -> Self {
        Self {
            in_flight: AtomicU64::new(0),
            started: AtomicU64::new(0),
            state: AtomicU8::new(RunState::Init as u8),
        }
    }

    /// 任務排入下載佇列
    pub fn job_enqueued(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    /// worker 取出任務開始下載
    pub fn job_started(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    /// 任務結束（寫檔完成、寫檔失敗或放棄下載）
    pub fn job_finished(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "in-flight counter underflow");
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    /// 沒有進行中的任務，且至少開始過一個
    pub fn is_quiescent(&self) -> bool {
        self.in_flight() == 0 && self.started() > 0
    }

    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// 只能往前推進；Done 必須滿足 is_quiescent
    pub fn advance(&self, next: RunState) -> RunState {
        let next = match next {
            RunState::Done | RunState::Empty if self.is_quiescent() => RunState::Done,
            RunState::Done | RunState::Empty if self.started() == 0 => RunState::Empty,
            RunState::Done | RunState::Empty => RunState::Draining,
            other => other,
        };

        let previous = self.state.fetch_max(next as u8, Ordering::SeqCst);
        RunState::from_u8(previous.max(next as u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_not_quiescent_before_any_job() {
        let tracker = QuiescenceTracker::new();
        assert_eq!(tracker.in_flight(), 0);
        assert!(!tracker.is_quiescent());
        assert_eq!(tracker.advance(RunState::Done), RunState::Empty);
    }

    #[test]
    fn test_quiescent_after_all_jobs_finish() {
        let tracker = QuiescenceTracker::new();
        tracker.job_enqueued();
        tracker.job_enqueued();
        tracker.job_started();
        assert!(!tracker.is_quiescent());

        tracker.job_finished();
        tracker.job_started();
        assert!(!tracker.is_quiescent());
        assert_eq!(tracker.advance(RunState::Done), RunState::Draining);

        tracker.job_finished();
        assert!(tracker.is_quiescent());
        assert_eq!(tracker.advance(RunState::Done), RunState::Done);
        assert_eq!(tracker.started(), 2);
    }

    #[test]
    fn test_state_never_moves_backwards() {
        let tracker = QuiescenceTracker::new();
        assert_eq!(tracker.advance(RunState::Downloading), RunState::Downloading);
        assert_eq!(tracker.advance(RunState::Resolving), RunState::Downloading);
        assert_eq!(tracker.state(), RunState::Downloading);
    }

    #[test]
    fn test_concurrent_updates() {
        let tracker = Arc::new(QuiescenceTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        tracker.job_enqueued();
                        tracker.job_started();
                        tracker.job_finished();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.started(), 8000);
        assert!(tracker.is_quiescent());
    }
}
