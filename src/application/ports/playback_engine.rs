//! Playback Engine Port - 音频输出设备抽象
//!
//! 一次只播放一个解码缓冲；设备由 Narrator 在 start 时打开、teardown 时关闭

use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::DecodedAudio;

/// 播放设备错误
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Audio device not open")]
    NotOpen,

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

/// 设备状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Closed,
    /// 已打开但被挂起，需要 resume
    Suspended,
    Running,
}

/// 播放句柄标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackId(pub u64);

impl std::fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 播放结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// 自然播放结束
    Completed,
    /// 被强制停止
    Stopped,
}

/// 单个缓冲的播放句柄
///
/// 引擎在自然结束时发送一次完成信号；强制停止时丢弃发送端
#[derive(Debug)]
pub struct PlaybackHandle {
    id: PlaybackId,
    ended: oneshot::Receiver<()>,
}

impl PlaybackHandle {
    pub fn new(id: PlaybackId, ended: oneshot::Receiver<()>) -> Self {
        Self { id, ended }
    }

    pub fn id(&self) -> PlaybackId {
        self.id
    }

    /// 等待播放结束
    pub async fn finished(self) -> PlaybackOutcome {
        match self.ended.await {
            Ok(()) => PlaybackOutcome::Completed,
            Err(_) => PlaybackOutcome::Stopped,
        }
    }
}

/// Playback Engine Port
pub trait PlaybackEnginePort: Send + Sync {
    /// 打开输出设备；设备处于挂起状态时恢复
    fn open(&self) -> Result<(), PlaybackError>;

    /// 播放一个缓冲直到结束；设备挂起时先恢复
    fn play_buffer(&self, audio: DecodedAudio) -> Result<PlaybackHandle, PlaybackError>;

    /// 立即停止播放，句柄已结束时为空操作
    fn stop(&self, id: PlaybackId);

    /// 挂起设备（暂停所有输出）
    fn suspend(&self);

    /// 释放设备，幂等
    fn close(&self);

    /// 当前设备状态
    fn state(&self) -> DeviceState;
}
