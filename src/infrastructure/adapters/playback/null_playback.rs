//! Null Playback Engine - 不出声的播放设备
//!
//! 按缓冲时长计时后报告播放结束，用于无音频设备的服务器与测试

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

use crate::application::ports::{
    DeviceState, PlaybackEnginePort, PlaybackError, PlaybackHandle, PlaybackId,
};
use crate::domain::DecodedAudio;

/// 模拟的设备故障
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullFault {
    #[default]
    None,
    /// open 失败
    Open,
    /// play_buffer 返回错误
    Play,
    /// play_buffer 成功，但缓冲被设备丢弃（句柄报告 Stopped）
    Abort,
}

pub struct NullPlaybackEngine {
    state: Mutex<DeviceState>,
    fault: NullFault,
    next_id: AtomicU64,
    /// 播放中的缓冲；移除发送端即视为被停止
    active: Arc<DashMap<PlaybackId, oneshot::Sender<()>>>,
    played: AtomicUsize,
    opens: AtomicUsize,
}

impl NullPlaybackEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DeviceState::Closed),
            fault: NullFault::None,
            next_id: AtomicU64::new(1),
            active: Arc::new(DashMap::new()),
            played: AtomicUsize::new(0),
            opens: AtomicUsize::new(0),
        }
    }

    pub fn with_fault(fault: NullFault) -> Self {
        Self {
            fault,
            ..Self::new()
        }
    }

    /// 打开总是失败的设备
    pub fn failing_open() -> Self {
        Self::with_fault(NullFault::Open)
    }

    /// 累计播放的缓冲数
    pub fn played_count(&self) -> usize {
        self.played.load(Ordering::SeqCst)
    }

    /// 正在播放的缓冲数
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: DeviceState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

impl Default for NullPlaybackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEnginePort for NullPlaybackEngine {
    fn open(&self) -> Result<(), PlaybackError> {
        if self.fault == NullFault::Open {
            return Err(PlaybackError::DeviceUnavailable(
                "no output device".to_string(),
            ));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.set_state(DeviceState::Running);
        Ok(())
    }

    fn play_buffer(&self, audio: DecodedAudio) -> Result<PlaybackHandle, PlaybackError> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match *state {
                DeviceState::Closed => return Err(PlaybackError::NotOpen),
                DeviceState::Suspended => {
                    tracing::debug!("Resuming suspended null device");
                    *state = DeviceState::Running;
                }
                DeviceState::Running => {}
            }
        }
        if self.fault == NullFault::Play {
            return Err(PlaybackError::PlaybackFailed("simulated device error".to_string()));
        }

        let id = PlaybackId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = oneshot::channel();
        self.played.fetch_add(1, Ordering::SeqCst);
        if self.fault == NullFault::Abort {
            drop(tx);
            return Ok(PlaybackHandle::new(id, rx));
        }
        self.active.insert(id, tx);

        let duration = audio.duration();
        let active = self.active.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some((_, tx)) = active.remove(&id) {
                let _ = tx.send(());
            }
        });

        tracing::trace!(playback_id = %id, duration_ms = duration.as_millis() as u64, "Null playback started");
        Ok(PlaybackHandle::new(id, rx))
    }

    fn stop(&self, id: PlaybackId) {
        self.active.remove(&id);
    }

    fn suspend(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == DeviceState::Running {
            *state = DeviceState::Suspended;
        }
    }

    fn close(&self) {
        self.active.clear();
        self.set_state(DeviceState::Closed);
    }

    fn state(&self) -> DeviceState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::PlaybackOutcome;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_buffer_completes_after_duration() {
        let engine = NullPlaybackEngine::new();
        engine.open().unwrap();

        let started = tokio::time::Instant::now();
        let handle = engine
            .play_buffer(DecodedAudio::silence(800, 8000))
            .unwrap();
        assert_eq!(handle.finished().await, PlaybackOutcome::Completed);
        assert!(started.elapsed() >= Duration::from_millis(800));
        assert_eq!(engine.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_reports_stopped() {
        let engine = NullPlaybackEngine::new();
        engine.open().unwrap();

        let handle = engine
            .play_buffer(DecodedAudio::silence(5000, 8000))
            .unwrap();
        engine.stop(handle.id());
        // 重复 stop 为空操作
        engine.stop(handle.id());
        assert_eq!(handle.finished().await, PlaybackOutcome::Stopped);
    }

    #[tokio::test]
    async fn test_play_requires_open_device() {
        let engine = NullPlaybackEngine::new();
        assert!(matches!(
            engine.play_buffer(DecodedAudio::silence(10, 8000)),
            Err(PlaybackError::NotOpen)
        ));

        engine.open().unwrap();
        engine.suspend();
        assert_eq!(engine.state(), DeviceState::Suspended);

        // open 恢复挂起的设备
        engine.open().unwrap();
        assert_eq!(engine.state(), DeviceState::Running);
        assert_eq!(engine.open_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_resumes_suspended_device() {
        let engine = NullPlaybackEngine::new();
        engine.open().unwrap();
        engine.suspend();

        let handle = engine
            .play_buffer(DecodedAudio::silence(100, 8000))
            .unwrap();
        assert_eq!(engine.state(), DeviceState::Running);
        assert_eq!(handle.finished().await, PlaybackOutcome::Completed);
    }

    #[tokio::test]
    async fn test_faults() {
        let engine = NullPlaybackEngine::with_fault(NullFault::Play);
        engine.open().unwrap();
        assert!(matches!(
            engine.play_buffer(DecodedAudio::silence(10, 8000)),
            Err(PlaybackError::PlaybackFailed(_))
        ));

        let engine = NullPlaybackEngine::with_fault(NullFault::Abort);
        engine.open().unwrap();
        let handle = engine
            .play_buffer(DecodedAudio::silence(10, 8000))
            .unwrap();
        assert_eq!(handle.finished().await, PlaybackOutcome::Stopped);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let engine = NullPlaybackEngine::new();
        engine.open().unwrap();
        engine.close();
        engine.close();
        assert_eq!(engine.state(), DeviceState::Closed);
    }

    #[test]
    fn test_failing_open() {
        let engine = NullPlaybackEngine::failing_open();
        assert!(matches!(
            engine.open(),
            Err(PlaybackError::DeviceUnavailable(_))
        ));
        assert_eq!(engine.state(), DeviceState::Closed);
    }
}
