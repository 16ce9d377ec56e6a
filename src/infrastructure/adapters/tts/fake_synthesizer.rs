//! Fake Synthesizer - 用于测试与离线演示的远程合成器
//!
//! 不调用任何服务，按脚本返回静音缓冲、失败或永不返回

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::application::ports::{RemoteSynthesizerPort, SynthesisError, SynthesisRequest};
use crate::domain::DecodedAudio;

/// 单次调用的脚本结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeOutcome {
    Succeed,
    Fail,
    /// 永不返回（模拟卡住的请求）
    Hang,
}

/// Fake Synthesizer 配置
#[derive(Debug, Clone)]
pub struct FakeSynthesizerConfig {
    /// 模拟合成延迟（毫秒）
    pub latency_ms: u64,
    /// 返回的音频时长（毫秒）
    pub clip_ms: u64,
    /// 采样率
    pub sample_rate: u32,
}

impl Default for FakeSynthesizerConfig {
    fn default() -> Self {
        Self {
            latency_ms: 200,
            clip_ms: 1500,
            sample_rate: 22050,
        }
    }
}

/// Fake Synthesizer
///
/// 未配置脚本的文本总是成功
pub struct FakeSynthesizer {
    config: FakeSynthesizerConfig,
    scripts: DashMap<String, VecDeque<FakeOutcome>>,
    calls: Mutex<Vec<String>>,
}

impl FakeSynthesizer {
    pub fn new(config: FakeSynthesizerConfig) -> Self {
        tracing::info!(
            latency_ms = config.latency_ms,
            clip_ms = config.clip_ms,
            "FakeSynthesizer initialized"
        );
        Self {
            config,
            scripts: DashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeSynthesizerConfig::default())
    }

    /// 为某段文本依次设定调用结果，用完后恢复为成功
    pub fn script(&self, text: &str, outcomes: impl IntoIterator<Item = FakeOutcome>) {
        self.scripts
            .entry(text.to_string())
            .or_default()
            .extend(outcomes);
    }

    /// 按调用顺序记录的文本
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self, text: &str) -> usize {
        self.calls().iter().filter(|t| t.as_str() == text).count()
    }

    fn next_outcome(&self, text: &str) -> FakeOutcome {
        self.scripts
            .get_mut(text)
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or(FakeOutcome::Succeed)
    }
}

#[async_trait]
impl RemoteSynthesizerPort for FakeSynthesizer {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<DecodedAudio, SynthesisError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.text.clone());
        let outcome = self.next_outcome(&request.text);

        tracing::debug!(
            text_len = request.text.len(),
            voice = %request.voice,
            outcome = ?outcome,
            "FakeSynthesizer: synthesizing"
        );

        tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;

        match outcome {
            FakeOutcome::Succeed => Ok(DecodedAudio::silence(
                self.config.clip_ms,
                self.config.sample_rate,
            )),
            FakeOutcome::Fail => Err(SynthesisError::ServiceError(
                "scripted failure".to_string(),
            )),
            FakeOutcome::Hang => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VoicePreference;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_script_consumed_in_order() {
        let fake = FakeSynthesizer::new(FakeSynthesizerConfig {
            latency_ms: 10,
            clip_ms: 500,
            sample_rate: 8000,
        });
        fake.script("a", [FakeOutcome::Fail]);

        let request = SynthesisRequest::new("a", VoicePreference::Female);
        assert!(fake.synthesize(request.clone()).await.is_err());
        let audio = fake.synthesize(request).await.unwrap();
        assert_eq!(audio.duration(), Duration::from_millis(500));
        assert_eq!(fake.call_count("a"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_never_resolves() {
        let fake = FakeSynthesizer::with_defaults();
        fake.script("stuck", [FakeOutcome::Hang]);

        let result = tokio::time::timeout(
            Duration::from_secs(60),
            fake.synthesize(SynthesisRequest::new("stuck", VoicePreference::Male)),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(fake.calls(), vec!["stuck".to_string()]);
    }
}
