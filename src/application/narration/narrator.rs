//! Narrator - 朗读状态机
//!
//! 状态: Idle -> Loading -> Playing(k) -> ... -> Idle
//!
//! 播放循环按顺序处理每个 chunk：
//! 1. 推进播放指针并预取后续 chunk
//! 2. 有界等待 chunk 就绪（缓存命中 / 仅回退 / 超时升级）
//! 3. 发布 ChunkStarted，淘汰落后的缓存
//! 4. 远程音频交给播放设备，或由本机合成器朗读
//!
//! 所有异步回调在修改状态前都检查会话是否仍为当前代数

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, watch};

use super::{EscalationReason, Fetcher, NarrationMode, Session};
use crate::application::error::NarrationError;
use crate::application::ports::{
    LocalSynthesizerPort, PlaybackEnginePort, PlaybackId, PlaybackOutcome, RemoteSynthesizerPort,
    SpeechRequest,
};
use crate::config::NarrationConfig;
use crate::domain::{Chunk, DecodedAudio, Language, VoicePreference};
use crate::infrastructure::events::{EndReason, EventPublisher, NarrationEvent};

/// 开始朗读的参数
#[derive(Debug, Clone)]
pub struct NarrationRequest {
    pub chunks: Vec<Chunk>,
    pub voice: VoicePreference,
    pub language: Language,
}

impl NarrationRequest {
    pub fn new(chunks: Vec<Chunk>, voice: VoicePreference, language: Language) -> Self {
        Self {
            chunks,
            voice,
            language,
        }
    }
}

/// 可观察的朗读状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NarrationStatus {
    /// 活跃会话 id，Idle 时为 None
    pub session_id: Option<u64>,
    pub active: bool,
    /// 第一个 chunk 开始前为 true
    pub loading: bool,
    /// 会话活跃期间为 true
    pub playing: bool,
    pub current_index: usize,
    pub total_chunks: usize,
    pub mode: Option<NarrationMode>,
    pub started_at: Option<DateTime<Utc>>,
}

impl NarrationStatus {
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// 单个 chunk 的等待结果
enum Readiness {
    Remote(DecodedAudio),
    Fallback,
    Cancelled,
}

/// 朗读编排器
///
/// 同一时刻最多一个活跃会话；start 会先拆除已有会话
#[derive(Clone)]
pub struct Narrator {
    inner: Arc<NarratorInner>,
}

struct NarratorInner {
    config: NarrationConfig,
    fetcher: Fetcher,
    local: Arc<dyn LocalSynthesizerPort>,
    playback: Arc<dyn PlaybackEnginePort>,
    events: Arc<EventPublisher>,
    /// start / stop 串行化，保证旧会话拆除后才安装新会话
    lifecycle: Mutex<()>,
    /// 当前代数，teardown 时递增
    generation: AtomicU64,
    active: Mutex<Option<Arc<Session>>>,
    /// 播放闸门：检查会话 + play_buffer + 记录句柄 在同一把锁内完成
    current_playback: Mutex<Option<PlaybackId>>,
    status: watch::Sender<NarrationStatus>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Narrator {
    pub fn new(
        config: NarrationConfig,
        remote: Arc<dyn RemoteSynthesizerPort>,
        local: Arc<dyn LocalSynthesizerPort>,
        playback: Arc<dyn PlaybackEnginePort>,
        events: Arc<EventPublisher>,
    ) -> Self {
        let fetcher = Fetcher::new(remote, events.clone(), config.max_attempts);
        let (status, _) = watch::channel(NarrationStatus::default());

        Self {
            inner: Arc::new(NarratorInner {
                config,
                fetcher,
                local,
                playback,
                events,
                lifecycle: Mutex::new(()),
                generation: AtomicU64::new(0),
                active: Mutex::new(None),
                current_playback: Mutex::new(None),
                status,
            }),
        }
    }

    /// 开始朗读，返回新会话 id
    ///
    /// 播放设备在此同步打开；打开失败时状态保持 Idle
    pub fn start(&self, request: NarrationRequest) -> Result<u64, NarrationError> {
        let _lifecycle = lock(&self.inner.lifecycle);
        self.inner.teardown(None);

        if request.chunks.is_empty() {
            return Err(NarrationError::EmptySession);
        }

        if let Err(e) = self.inner.playback.open() {
            tracing::error!(error = %e, "Failed to open audio device");
            self.inner.playback.close();
            return Err(NarrationError::PlaybackDeviceFailure(e));
        }

        let id = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let session = Arc::new(Session::new(
            id,
            request.chunks,
            request.voice,
            request.language,
        ));

        {
            let mut active = lock(&self.inner.active);
            *active = Some(session.clone());
            self.inner.status.send_replace(NarrationStatus {
                session_id: Some(id),
                active: true,
                loading: true,
                playing: true,
                current_index: 0,
                total_chunks: session.len(),
                mode: Some(NarrationMode::Remote),
                started_at: Some(session.started_at()),
            });
            self.inner.events.publish_playing_changed(id, true);
            self.inner.events.publish_loading_changed(id, true);
        }

        tracing::info!(
            session_id = id,
            chunks = session.len(),
            voice = %session.voice(),
            language = %session.language(),
            "Narration started"
        );

        for index in 0..self.inner.config.prefetch_ahead {
            self.inner.fetcher.fetch(&session, index);
        }

        let inner = self.inner.clone();
        tokio::spawn(async move {
            inner.run(session).await;
        });

        Ok(id)
    }

    /// 停止朗读，幂等；Idle 时调用无副作用
    pub fn stop(&self) {
        let _lifecycle = lock(&self.inner.lifecycle);
        self.inner.teardown(None);
    }

    /// 活跃时停止，否则开始；返回新会话 id（停止时为 None）
    pub fn toggle(&self, request: NarrationRequest) -> Result<Option<u64>, NarrationError> {
        if self.is_active() {
            self.stop();
            Ok(None)
        } else {
            self.start(request).map(Some)
        }
    }

    pub fn is_active(&self) -> bool {
        lock(&self.inner.active).is_some()
    }

    pub fn status(&self) -> NarrationStatus {
        self.inner.status.borrow().clone()
    }

    /// 监听状态变化
    pub fn watch_status(&self) -> watch::Receiver<NarrationStatus> {
        self.inner.status.subscribe()
    }

    /// 订阅朗读事件
    pub fn subscribe(&self) -> broadcast::Receiver<NarrationEvent> {
        self.inner.events.subscribe()
    }

    #[cfg(test)]
    fn active_session(&self) -> Option<Arc<Session>> {
        lock(&self.inner.active).clone()
    }
}

impl NarratorInner {
    fn is_current(&self, session: &Session) -> bool {
        session.is_live() && self.generation.load(Ordering::SeqCst) == session.id()
    }

    async fn run(self: Arc<Self>, session: Arc<Session>) {
        let reason = match self.narrate(&session).await {
            Ok(()) => EndReason::Completed,
            Err(e) => {
                tracing::error!(session_id = session.id(), error = %e, "Narration failed");
                EndReason::Failed
            }
        };

        if self.teardown(Some(session.id())) {
            let elapsed = Utc::now() - session.started_at();
            tracing::info!(
                session_id = session.id(),
                reason = ?reason,
                elapsed_ms = elapsed.num_milliseconds(),
                "Narration ended"
            );
            self.events.publish_ended(session.id(), reason);
        } else {
            tracing::debug!(session_id = session.id(), "Play loop exited for stopped session");
        }
    }

    async fn narrate(&self, session: &Arc<Session>) -> Result<(), NarrationError> {
        for index in 0..session.len() {
            if !self.is_current(session) {
                return Ok(());
            }
            session.set_play_index(index);

            // 起始预取覆盖第一个窗口
            if index > 0 {
                for ahead in index + 1..=index + self.config.prefetch_ahead {
                    self.fetcher.fetch(session, ahead);
                }
            }

            match self.await_ready(session, index).await {
                Readiness::Cancelled => return Ok(()),
                Readiness::Remote(audio) => {
                    if !self.chunk_started(session, index) {
                        return Ok(());
                    }
                    self.play_remote(session, index, audio).await?;
                }
                Readiness::Fallback => {
                    if !self.chunk_started(session, index) {
                        return Ok(());
                    }
                    self.speak_local(session, index).await?;
                }
            }
        }
        Ok(())
    }

    /// 有界等待 chunk 就绪；每次轮询都会在需要时重新发起请求
    async fn await_ready(&self, session: &Arc<Session>, index: usize) -> Readiness {
        let interval = self.config.ready_poll_interval();
        let mut polls = 0;

        loop {
            if !self.is_current(session) {
                return Readiness::Cancelled;
            }
            if session.is_fallback() || session.ledger().is_fallback_only(index) {
                return Readiness::Fallback;
            }
            if let Some(audio) = session.cache().get(index) {
                return Readiness::Remote(audio);
            }
            if polls >= self.config.ready_poll_max {
                break;
            }

            self.fetcher.fetch(session, index);
            tokio::select! {
                biased;
                _ = session.cancelled() => return Readiness::Cancelled,
                _ = tokio::time::sleep(interval) => {}
            }
            polls += 1;
        }

        tracing::warn!(
            session_id = session.id(),
            index = index,
            waited_ms = self.config.ready_timeout().as_millis() as u64,
            "Chunk not ready in time"
        );
        self.escalate(session, EscalationReason::ReadyTimeout);
        Readiness::Fallback
    }

    /// 发布 chunk 开始并淘汰落后的缓存；会话已失效时返回 false
    fn chunk_started(&self, session: &Session, index: usize) -> bool {
        let Some(chunk) = session.chunk(index) else {
            return false;
        };

        // 持有 active 锁，保证不会与 teardown 的状态重置交错
        let active = lock(&self.active);
        let is_active = matches!(active.as_ref(), Some(s) if s.id() == session.id());
        if !is_active || !self.is_current(session) {
            return false;
        }

        let mode = session.mode();
        let mut was_loading = false;
        self.status.send_modify(|status| {
            was_loading = status.loading;
            status.loading = false;
            status.current_index = index;
            status.mode = Some(mode);
        });
        if was_loading {
            self.events.publish_loading_changed(session.id(), false);
        }
        self.events
            .publish_chunk_started(session.id(), index, chunk.anchor(), mode);
        drop(active);

        if let Some(behind) = index.checked_sub(self.config.evict_behind) {
            session.cache().evict(behind);
        }

        tracing::debug!(
            session_id = session.id(),
            index = index,
            anchor = chunk.anchor(),
            mode = ?mode,
            "Chunk started"
        );
        true
    }

    fn escalate(&self, session: &Session, reason: EscalationReason) {
        if !self.is_current(session) || !session.escalate() {
            return;
        }
        tracing::warn!(session_id = session.id(), reason = ?reason, "Switching session to fallback speech");
        self.events.publish_mode_changed(session.id(), reason);
        self.status.send_if_modified(|status| {
            if status.session_id == Some(session.id()) {
                status.mode = Some(NarrationMode::Fallback);
                true
            } else {
                false
            }
        });
    }

    async fn play_remote(
        &self,
        session: &Arc<Session>,
        index: usize,
        audio: DecodedAudio,
    ) -> Result<(), NarrationError> {
        let played = {
            let mut current = lock(&self.current_playback);
            if !self.is_current(session) {
                return Ok(());
            }
            let result = self.playback.play_buffer(audio);
            if let Ok(handle) = &result {
                *current = Some(handle.id());
            }
            result
        };

        let handle = match played {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(session_id = session.id(), index = index, error = %e, "Playback failed");
                self.escalate(session, EscalationReason::PlaybackFailed);
                return self.speak_local(session, index).await;
            }
        };

        let id = handle.id();
        let outcome = tokio::select! {
            biased;
            _ = session.cancelled() => PlaybackOutcome::Stopped,
            outcome = handle.finished() => outcome,
        };

        {
            let mut current = lock(&self.current_playback);
            if *current == Some(id) {
                *current = None;
            }
        }

        tracing::trace!(session_id = session.id(), index = index, outcome = ?outcome, "Chunk playback finished");

        // 会话仍存活却被中止：设备丢失了这个缓冲
        if outcome == PlaybackOutcome::Stopped && self.is_current(session) {
            tracing::warn!(session_id = session.id(), index = index, "Playback aborted by device");
            self.escalate(session, EscalationReason::PlaybackFailed);
            return self.speak_local(session, index).await;
        }
        Ok(())
    }

    async fn speak_local(&self, session: &Arc<Session>, index: usize) -> Result<(), NarrationError> {
        let Some(chunk) = session.chunk(index) else {
            return Ok(());
        };
        let request = SpeechRequest {
            text: chunk.text().to_string(),
            language: session.language().clone(),
            voice: session.voice(),
        };

        tracing::debug!(session_id = session.id(), index = index, "Speaking chunk locally");

        let result = tokio::select! {
            biased;
            _ = session.cancelled() => return Ok(()),
            result = self.local.speak(request) => result,
        };

        match result {
            Ok(()) => Ok(()),
            // 被 stop 取消
            Err(_) if !self.is_current(session) => Ok(()),
            Err(e) => Err(NarrationError::LocalSynthesisFailure(e)),
        }
    }

    /// 拆除活跃会话
    ///
    /// expected 为 Some 时仅当活跃会话 id 一致才执行；返回是否拆除了会话
    fn teardown(&self, expected: Option<u64>) -> bool {
        let mut active = lock(&self.active);
        if let Some(id) = expected {
            if active.as_ref().map(|s| s.id()) != Some(id) {
                return false;
            }
        }
        let session = active.take();

        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(session) = &session {
            session.cancel();
        }

        if let Some(id) = lock(&self.current_playback).take() {
            self.playback.stop(id);
        }
        self.local.cancel_all();

        if let Some(session) = &session {
            session.cache().clear();
            session.ledger().clear();
        }
        self.playback.close();

        let previous = self.status.send_replace(NarrationStatus::default());
        if let Some(id) = previous.session_id {
            if previous.loading {
                self.events.publish_loading_changed(id, false);
            }
            if previous.playing {
                self.events.publish_playing_changed(id, false);
            }
        }

        match session {
            Some(session) => {
                tracing::info!(session_id = session.id(), "Narration session torn down");
                true
            }
            None => false,
        }
    }
}
