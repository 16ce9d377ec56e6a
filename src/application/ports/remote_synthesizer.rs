//! Remote Synthesizer Port - 远程语音合成抽象
//!
//! 定义远程 TTS 的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{DecodedAudio, VoicePreference};

/// 远程合成错误
///
/// 调用方对所有错误一视同仁（计入重试次数），分类仅用于日志
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),
}

/// 远程合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的文本内容
    pub text: String,
    /// 音色偏好
    pub voice: VoicePreference,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice: VoicePreference) -> Self {
        Self {
            text: text.into(),
            voice,
        }
    }
}

/// Remote Synthesizer Port
///
/// 给定文本与音色偏好，返回解码后的音频
#[async_trait]
pub trait RemoteSynthesizerPort: Send + Sync {
    /// 合成并解码一段文本
    async fn synthesize(&self, request: SynthesisRequest) -> Result<DecodedAudio, SynthesisError>;

    /// 检查远程服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
