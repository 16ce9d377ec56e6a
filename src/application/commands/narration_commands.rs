//! Narration Commands - 朗读控制命令

use serde::Serialize;

use crate::domain::{ChunkMode, VoicePreference};

/// 开始朗读命令 - 分段并启动新会话
#[derive(Debug, Clone)]
pub struct StartNarrationCommand {
    pub text: String,
    pub mode: ChunkMode,
    /// 缺省时使用配置的默认音色
    pub voice: Option<VoicePreference>,
    /// 缺省时使用配置的默认语言
    pub language: Option<String>,
}

/// 开始朗读响应
#[derive(Debug, Clone, Serialize)]
pub struct StartNarrationResponse {
    pub session_id: u64,
    pub total_chunks: usize,
    pub anchors: Vec<String>,
}

/// 停止朗读命令
#[derive(Debug, Clone, Default)]
pub struct StopNarrationCommand;

/// 停止朗读响应
#[derive(Debug, Clone, Serialize)]
pub struct StopNarrationResponse {
    /// 停止前是否有活跃会话
    pub was_active: bool,
}

/// 切换命令 - 空闲时开始，活跃时停止
#[derive(Debug, Clone)]
pub struct ToggleNarrationCommand {
    pub start: StartNarrationCommand,
}

/// 切换响应
#[derive(Debug, Clone, Serialize)]
pub struct ToggleNarrationResponse {
    pub active: bool,
    pub session_id: Option<u64>,
    pub total_chunks: usize,
}
