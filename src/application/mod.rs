//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（远程合成、本机朗读、播放设备）
//! - narration: 渐进式朗读管线（缓存、预取、回退、teardown）
//! - commands: 朗读控制命令及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod narration;
pub mod ports;

// Re-exports
pub use commands::{
    handlers::{
        NarrationDefaults, StartNarrationHandler, StopNarrationHandler, ToggleNarrationHandler,
    },
    StartNarrationCommand, StartNarrationResponse, StopNarrationCommand, StopNarrationResponse,
    ToggleNarrationCommand, ToggleNarrationResponse,
};

pub use error::{ApplicationError, NarrationError};

pub use narration::{
    ChunkCache, EscalationReason, FetchLedger, Fetcher, NarrationMode, NarrationRequest,
    NarrationStatus, Narrator, Session,
};

pub use ports::{
    select_voice, DeviceState, LocalSynthesizerPort, PlaybackEnginePort, PlaybackError,
    PlaybackHandle, PlaybackId, PlaybackOutcome, RemoteSynthesizerPort, SpeechError,
    SpeechRequest, SynthesisError, SynthesisRequest, VoiceInfo,
};
