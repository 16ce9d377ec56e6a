//! Event Publisher Implementation
//!
//! 朗读通知: loading / playing 变化、chunk 开始（驱动滚动同步）、模式切换、结束

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::narration::{EscalationReason, NarrationMode};

/// 会话结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// 全部 chunk 朗读完毕
    Completed,
    /// 回退朗读失败，会话终止
    Failed,
}

/// 朗读事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum NarrationEvent {
    /// loading 状态变更
    LoadingChanged { session_id: u64, loading: bool },
    /// playing 状态变更
    PlayingChanged { session_id: u64, playing: bool },
    /// 开始朗读某个 chunk
    ChunkStarted {
        session_id: u64,
        index: usize,
        anchor: String,
        mode: NarrationMode,
    },
    /// 会话切换到回退朗读
    ModeChanged {
        session_id: u64,
        mode: NarrationMode,
        reason: EscalationReason,
    },
    /// 会话结束
    Ended { session_id: u64, reason: EndReason },
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<NarrationEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { channel: tx }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// 订阅朗读事件
    pub fn subscribe(&self) -> broadcast::Receiver<NarrationEvent> {
        self.channel.subscribe()
    }

    pub fn publish_loading_changed(&self, session_id: u64, loading: bool) {
        self.publish(NarrationEvent::LoadingChanged {
            session_id,
            loading,
        });
    }

    pub fn publish_playing_changed(&self, session_id: u64, playing: bool) {
        self.publish(NarrationEvent::PlayingChanged {
            session_id,
            playing,
        });
    }

    pub fn publish_chunk_started(
        &self,
        session_id: u64,
        index: usize,
        anchor: &str,
        mode: NarrationMode,
    ) {
        self.publish(NarrationEvent::ChunkStarted {
            session_id,
            index,
            anchor: anchor.to_string(),
            mode,
        });
    }

    pub fn publish_mode_changed(&self, session_id: u64, reason: EscalationReason) {
        self.publish(NarrationEvent::ModeChanged {
            session_id,
            mode: NarrationMode::Fallback,
            reason,
        });
    }

    pub fn publish_ended(&self, session_id: u64, reason: EndReason) {
        self.publish(NarrationEvent::Ended { session_id, reason });
    }

    fn publish(&self, event: NarrationEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::trace!(error = %e, "Failed to publish event (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
