//! Silent Speech Synthesizer - 无声的本机朗读
//!
//! 按语速模拟朗读时长，记录朗读过的文本；用于无音频环境与测试

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{LocalSynthesizerPort, SpeechError, SpeechRequest};

/// 最短朗读时长
const MIN_UTTERANCE: Duration = Duration::from_millis(100);

pub struct SilentSpeechSynthesizer {
    words_per_minute: u32,
    cancel: Mutex<CancellationToken>,
    spoken: Mutex<Vec<String>>,
    failing: AtomicBool,
    cancels: AtomicUsize,
}

impl SilentSpeechSynthesizer {
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute: words_per_minute.max(1),
            cancel: Mutex::new(CancellationToken::new()),
            spoken: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            cancels: AtomicUsize::new(0),
        }
    }

    /// 模拟本机合成不可用
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// 已开始朗读的文本
    pub fn spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// 文本的模拟朗读时长
    pub fn utterance_duration(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count() as u64;
        let millis = words * 60_000 / self.words_per_minute as u64;
        Duration::from_millis(millis).max(MIN_UTTERANCE)
    }
}

#[async_trait]
impl LocalSynthesizerPort for SilentSpeechSynthesizer {
    async fn speak(&self, request: SpeechRequest) -> Result<(), SpeechError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SpeechError::DeviceError(
                "speech engine unavailable".to_string(),
            ));
        }

        let token = self
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let duration = self.utterance_duration(&request.text);
        self.spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.text);

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(SpeechError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    fn cancel_all(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        let mut token = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        token.cancel();
        *token = CancellationToken::new();
    }
}
