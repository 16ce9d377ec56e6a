//! Fetcher - 远程合成请求
//!
//! 每个 chunk 同一时刻至多一个请求；失败计数达到上限后该 chunk 只走回退朗读，
//! 第一个 chunk 失败耗尽时整个会话升级到回退模式

use std::sync::Arc;

use super::{EscalationReason, Session};
use crate::application::error::NarrationError;
use crate::application::ports::{RemoteSynthesizerPort, SynthesisRequest};
use crate::infrastructure::events::EventPublisher;

/// 远程请求发起者
#[derive(Clone)]
pub struct Fetcher {
    remote: Arc<dyn RemoteSynthesizerPort>,
    events: Arc<EventPublisher>,
    max_attempts: u32,
}

impl Fetcher {
    pub fn new(
        remote: Arc<dyn RemoteSynthesizerPort>,
        events: Arc<EventPublisher>,
        max_attempts: u32,
    ) -> Self {
        Self {
            remote,
            events,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 为 chunk 发起远程请求
    ///
    /// 以下情况为空操作并返回 false：会话已失效或处于回退模式、
    /// index 越界、已缓存、已标记为仅回退、已有请求在途
    pub fn fetch(&self, session: &Arc<Session>, index: usize) -> bool {
        if !session.is_live() || session.is_fallback() {
            return false;
        }
        let Some(chunk) = session.chunk(index) else {
            return false;
        };
        if session.cache().has(index) || session.ledger().is_fallback_only(index) {
            return false;
        }
        if !session.ledger().try_begin(index) {
            return false;
        }

        let request = SynthesisRequest::new(chunk.text(), session.voice());
        tracing::debug!(
            session_id = session.id(),
            index = index,
            attempt = session.ledger().attempts(index) + 1,
            "Fetching chunk audio"
        );

        let worker = self.clone();
        let session = Arc::clone(session);
        tokio::spawn(async move {
            worker.run(session, index, request).await;
        });
        true
    }

    async fn run(&self, session: Arc<Session>, index: usize, request: SynthesisRequest) {
        let result = tokio::select! {
            biased;
            _ = session.cancelled() => {
                tracing::trace!(session_id = session.id(), index = index, "Fetch abandoned, session stopped");
                session.ledger().finish(index);
                return;
            }
            result = self.remote.synthesize(request) => result,
        };

        // 会话已被停止或替换：丢弃结果，不触碰任何状态
        if !session.is_live() {
            session.ledger().finish(index);
            return;
        }

        match result {
            Ok(audio) => {
                if session.accepts(index) {
                    tracing::debug!(
                        session_id = session.id(),
                        index = index,
                        duration_ms = audio.duration().as_millis() as u64,
                        "Chunk audio ready"
                    );
                    session.cache().put(index, audio);
                } else {
                    tracing::trace!(session_id = session.id(), index = index, "Discarding audio for passed chunk");
                }
            }
            Err(e) => self.record_failure(&session, index, e.into()),
        }

        session.ledger().finish(index);
    }

    fn record_failure(&self, session: &Session, index: usize, error: NarrationError) {
        let attempts = session.ledger().record_failure(index);
        if attempts < self.max_attempts {
            tracing::warn!(
                session_id = session.id(),
                index = index,
                attempts = attempts,
                error = %error,
                "Chunk fetch failed, will retry"
            );
            return;
        }

        tracing::warn!(
            session_id = session.id(),
            index = index,
            attempts = attempts,
            error = %error,
            "Chunk fetch attempts exhausted, using fallback speech"
        );
        session.ledger().mark_fallback(index);

        if index == 0 && session.escalate() {
            tracing::warn!(session_id = session.id(), "First chunk unavailable, switching session to fallback");
            self.events
                .publish_mode_changed(session.id(), EscalationReason::FirstChunkFailed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::narration::NarrationMode;
    use crate::domain::{Chunk, Language, VoicePreference};
    use crate::infrastructure::adapters::{FakeOutcome, FakeSynthesizer, FakeSynthesizerConfig};
    use crate::infrastructure::events::NarrationEvent;
    use std::time::Duration;

    fn session(n: usize) -> Arc<Session> {
        let chunks = (0..n)
            .map(|i| Chunk::new(i, format!("chunk-{} text", i), format!("verse-{}", i + 1)))
            .collect();
        Arc::new(Session::new(
            7,
            chunks,
            VoicePreference::Female,
            Language::new("en").unwrap(),
        ))
    }

    fn fetcher(remote: Arc<FakeSynthesizer>) -> (Fetcher, Arc<EventPublisher>) {
        let events = EventPublisher::arc();
        (Fetcher::new(remote, events.clone(), 2), events)
    }

    fn remote() -> Arc<FakeSynthesizer> {
        Arc::new(FakeSynthesizer::new(FakeSynthesizerConfig {
            latency_ms: 50,
            clip_ms: 1000,
            sample_rate: 8000,
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_populates_cache() {
        let remote = remote();
        let (fetcher, _) = fetcher(remote.clone());
        let session = session(3);

        assert!(fetcher.fetch(&session, 0));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(session.cache().has(0));
        assert!(!session.ledger().is_in_flight(0));
        // 已缓存时不再请求
        assert!(!fetcher.fetch(&session, 0));
        assert_eq!(remote.call_count("chunk-0 text"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_request_not_duplicated() {
        let remote = remote();
        let (fetcher, _) = fetcher(remote.clone());
        let session = session(3);

        assert!(fetcher.fetch(&session, 1));
        assert!(!fetcher.fetch(&session, 1));
        assert!(!fetcher.fetch(&session, 1));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(remote.call_count("chunk-1 text"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_range_is_noop() {
        let remote = remote();
        let (fetcher, _) = fetcher(remote.clone());
        let session = session(2);

        assert!(!fetcher.fetch(&session, 2));
        assert!(remote.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_chunk_marked_fallback_only() {
        let remote = remote();
        remote.script("chunk-1 text", [FakeOutcome::Fail, FakeOutcome::Fail]);
        let (fetcher, _) = fetcher(remote.clone());
        let session = session(3);

        fetcher.fetch(&session, 1);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(session.ledger().attempts(1), 1);
        assert!(!session.ledger().is_fallback_only(1));

        assert!(fetcher.fetch(&session, 1));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(session.ledger().is_fallback_only(1));
        // 非首个 chunk 不升级整个会话
        assert_eq!(session.mode(), NarrationMode::Remote);

        assert!(!fetcher.fetch(&session, 1));
        assert_eq!(remote.call_count("chunk-1 text"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_chunk_exhaustion_escalates_session() {
        let remote = remote();
        remote.script("chunk-0 text", [FakeOutcome::Fail, FakeOutcome::Fail]);
        let (fetcher, events) = fetcher(remote.clone());
        let mut rx = events.subscribe();
        let session = session(3);

        fetcher.fetch(&session, 0);
        tokio::time::sleep(Duration::from_millis(100)).await;
        fetcher.fetch(&session, 0);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(session.is_fallback());
        assert_eq!(
            rx.try_recv().unwrap(),
            NarrationEvent::ModeChanged {
                session_id: 7,
                mode: NarrationMode::Fallback,
                reason: EscalationReason::FirstChunkFailed,
            }
        );
        // 回退模式下不再发起远程请求
        assert!(!fetcher.fetch(&session, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_after_stop_is_discarded() {
        let remote = remote();
        let (fetcher, _) = fetcher(remote.clone());
        let session = session(2);

        fetcher.fetch(&session, 0);
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.cancel();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(session.cache().is_empty());
        assert!(!session.ledger().is_in_flight(0));
        assert!(!fetcher.fetch(&session, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_passed_chunk_audio_discarded() {
        let remote = remote();
        let (fetcher, _) = fetcher(remote.clone());
        let session = session(4);

        fetcher.fetch(&session, 1);
        session.set_play_index(2);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!session.cache().has(1));
    }
}
