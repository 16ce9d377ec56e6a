//! 应用层错误定义
//!
//! 朗读流水线错误与统一的命令错误类型

use thiserror::Error;

use crate::application::ports::{PlaybackError, SpeechError, SynthesisError};
use crate::domain::DomainError;

/// 朗读流水线错误
#[derive(Debug, Error)]
pub enum NarrationError {
    /// 远程合成失败（重试耗尽前不会向外暴露）
    #[error("Remote synthesis failed: {0}")]
    RemoteSynthesisFailure(#[from] SynthesisError),

    /// 本机朗读失败，会话终止
    #[error("Local synthesis failed: {0}")]
    LocalSynthesisFailure(#[from] SpeechError),

    /// 播放设备无法打开或播放
    #[error("Playback device failure: {0}")]
    PlaybackDeviceFailure(#[from] PlaybackError),

    /// 没有可朗读的 chunk
    #[error("Nothing to narrate: chunk list is empty")]
    EmptySession,
}

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 朗读错误
    #[error(transparent)]
    Narration(#[from] NarrationError),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<DomainError> for ApplicationError {
    fn from(err: DomainError) -> Self {
        Self::ValidationError(err.to_string())
    }
}
