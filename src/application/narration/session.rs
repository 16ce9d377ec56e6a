//! Narration Session - 一次朗读运行的状态
//!
//! 每个异步回调持有 Session 并在修改前检查其 id 是否仍为活跃代数，
//! 被停止或替换的会话上迟到的回调一律变为空操作

use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use super::ChunkCache;
use crate::domain::{Chunk, Language, VoicePreference};

/// 会话朗读模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrationMode {
    /// 远程合成 + 本地播放
    Remote,
    /// 本机朗读
    Fallback,
}

/// 整个会话切换到回退朗读的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    /// 第一个 chunk 远程合成失败次数达到上限
    FirstChunkFailed,
    /// 等待 chunk 就绪超时
    ReadyTimeout,
    /// 播放设备无法播放缓冲
    PlaybackFailed,
}

/// 远程请求账本: 请求中标记、失败计数、单 chunk 回退标记
#[derive(Debug, Default)]
pub struct FetchLedger {
    in_flight: DashSet<usize>,
    attempts: DashMap<usize, u32>,
    fallback_only: DashSet<usize>,
}

impl FetchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记请求开始；已在请求中时返回 false
    pub fn try_begin(&self, index: usize) -> bool {
        self.in_flight.insert(index)
    }

    /// 清除请求中标记（无论成功失败）
    pub fn finish(&self, index: usize) {
        self.in_flight.remove(&index);
    }

    pub fn is_in_flight(&self, index: usize) -> bool {
        self.in_flight.contains(&index)
    }

    /// 记录一次失败，返回累计失败次数
    pub fn record_failure(&self, index: usize) -> u32 {
        let mut attempts = self.attempts.entry(index).or_insert(0);
        *attempts += 1;
        *attempts
    }

    pub fn attempts(&self, index: usize) -> u32 {
        self.attempts.get(&index).map(|a| *a).unwrap_or(0)
    }

    /// 该 chunk 只能走回退朗读
    pub fn mark_fallback(&self, index: usize) {
        self.fallback_only.insert(index);
    }

    pub fn is_fallback_only(&self, index: usize) -> bool {
        self.fallback_only.contains(&index)
    }

    pub fn clear(&self) {
        self.in_flight.clear();
        self.attempts.clear();
        self.fallback_only.clear();
    }
}

/// 朗读会话
///
/// 不变量:
/// - chunks 在会话期间不可变
/// - 一旦进入回退模式，不再回到远程模式
/// - 播放指针只前进
#[derive(Debug)]
pub struct Session {
    id: u64,
    chunks: Vec<Chunk>,
    voice: VoicePreference,
    language: Language,
    cache: ChunkCache,
    ledger: FetchLedger,
    fallback: AtomicBool,
    play_index: AtomicUsize,
    cancel: CancellationToken,
    started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: u64, chunks: Vec<Chunk>, voice: VoicePreference, language: Language) -> Self {
        Self {
            id,
            chunks,
            voice,
            language,
            cache: ChunkCache::new(),
            ledger: FetchLedger::new(),
            fallback: AtomicBool::new(false),
            play_index: AtomicUsize::new(0),
            cancel: CancellationToken::new(),
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunk(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    pub fn voice(&self) -> VoicePreference {
        self.voice
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    pub fn ledger(&self) -> &FetchLedger {
        &self.ledger
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn mode(&self) -> NarrationMode {
        if self.is_fallback() {
            NarrationMode::Fallback
        } else {
            NarrationMode::Remote
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.load(Ordering::SeqCst)
    }

    /// 切换到回退模式；仅第一次切换返回 true
    pub fn escalate(&self) -> bool {
        self.fallback
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn play_index(&self) -> usize {
        self.play_index.load(Ordering::SeqCst)
    }

    pub fn set_play_index(&self, index: usize) {
        self.play_index.fetch_max(index, Ordering::SeqCst);
    }

    /// 播放指针已越过的 chunk 不再接收音频
    pub fn accepts(&self, index: usize) -> bool {
        index >= self.play_index()
    }

    pub fn is_live(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 会话被停止时完成
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(n: usize) -> Session {
        let chunks = (0..n)
            .map(|i| Chunk::new(i, format!("chunk {}", i), format!("verse-{}", i + 1)))
            .collect();
        Session::new(1, chunks, VoicePreference::Male, Language::new("en").unwrap())
    }

    #[test]
    fn test_escalation_is_one_way() {
        let session = session(2);
        assert_eq!(session.mode(), NarrationMode::Remote);
        assert!(session.escalate());
        assert!(!session.escalate());
        assert_eq!(session.mode(), NarrationMode::Fallback);
    }

    #[test]
    fn test_play_index_only_moves_forward() {
        let session = session(5);
        session.set_play_index(3);
        session.set_play_index(1);
        assert_eq!(session.play_index(), 3);
        assert!(!session.accepts(2));
        assert!(session.accepts(3));
    }

    #[test]
    fn test_ledger_in_flight_guard() {
        let ledger = FetchLedger::new();
        assert!(ledger.try_begin(0));
        assert!(!ledger.try_begin(0));
        ledger.finish(0);
        assert!(!ledger.is_in_flight(0));
        assert!(ledger.try_begin(0));
    }

    #[test]
    fn test_ledger_counts_failures() {
        let ledger = FetchLedger::new();
        assert_eq!(ledger.record_failure(2), 1);
        assert_eq!(ledger.record_failure(2), 2);
        assert_eq!(ledger.attempts(2), 2);
        assert_eq!(ledger.attempts(3), 0);

        ledger.mark_fallback(2);
        assert!(ledger.is_fallback_only(2));
        ledger.clear();
        assert!(!ledger.is_fallback_only(2));
        assert_eq!(ledger.attempts(2), 0);
    }

    #[tokio::test]
    async fn test_cancel_resolves_waiters() {
        let session = session(1);
        assert!(session.is_live());
        session.cancel();
        session.cancelled().await;
        assert!(!session.is_live());
    }
}
