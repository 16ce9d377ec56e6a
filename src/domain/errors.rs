//! Domain Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("语言标签不能为空")]
    EmptyLanguage,

    #[error("无效的音色偏好: {0}")]
    InvalidVoicePreference(String),

    #[error("无效的分段模式: {0}")]
    InvalidChunkMode(String),

    #[error("没有可朗读的内容")]
    NoChunks,
}
