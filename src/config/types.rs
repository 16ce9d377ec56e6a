//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::time::Duration;

use crate::domain::VoicePreference;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 远程 TTS 配置
    #[serde(default)]
    pub remote: RemoteTtsConfig,

    /// 本机朗读（回退）配置
    #[serde(default)]
    pub local: LocalSpeechConfig,

    /// 朗读管线参数
    #[serde(default)]
    pub narration: NarrationConfig,

    /// 音频输出配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 远程 TTS 实现
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteProvider {
    #[default]
    Http,
    /// 本地模拟，不发网络请求
    Fake,
}

/// 远程 TTS 配置
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTtsConfig {
    #[serde(default)]
    pub provider: RemoteProvider,

    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,
}

fn default_tts_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tts_timeout() -> u64 {
    30
}

impl Default for RemoteTtsConfig {
    fn default() -> Self {
        Self {
            provider: RemoteProvider::default(),
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
        }
    }
}

/// 本机朗读实现
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalProvider {
    /// 调用外部朗读程序（espeak-ng 等）
    #[default]
    Command,
    /// 只模拟朗读时长
    Silent,
}

/// 本机朗读配置
#[derive(Debug, Clone, Deserialize)]
pub struct LocalSpeechConfig {
    #[serde(default)]
    pub provider: LocalProvider,

    /// 朗读程序
    #[serde(default = "default_speech_program")]
    pub program: String,

    /// 语速（词/分钟）
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,
}

fn default_speech_program() -> String {
    "espeak-ng".to_string()
}

fn default_words_per_minute() -> u32 {
    175
}

impl Default for LocalSpeechConfig {
    fn default() -> Self {
        Self {
            provider: LocalProvider::default(),
            program: default_speech_program(),
            words_per_minute: default_words_per_minute(),
        }
    }
}

/// 朗读管线参数
#[derive(Debug, Clone, Deserialize)]
pub struct NarrationConfig {
    /// 预取窗口：当前播放位置之后请求的 chunk 数
    #[serde(default = "default_prefetch_ahead")]
    pub prefetch_ahead: usize,

    /// 开始播放第 k 个 chunk 时淘汰 k - evict_behind
    #[serde(default = "default_evict_behind")]
    pub evict_behind: usize,

    /// 单个 chunk 的远程合成最大失败次数
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 等待 chunk 就绪的轮询间隔（毫秒）
    #[serde(default = "default_poll_interval")]
    pub ready_poll_interval_ms: u64,

    /// 等待 chunk 就绪的最大轮询次数
    #[serde(default = "default_poll_max")]
    pub ready_poll_max: u32,

    /// 默认语言
    #[serde(default = "default_language")]
    pub default_language: String,

    /// 默认音色偏好
    #[serde(default)]
    pub default_voice: VoicePreference,
}

fn default_prefetch_ahead() -> usize {
    2
}

fn default_evict_behind() -> usize {
    2
}

fn default_max_attempts() -> u32 {
    2
}

fn default_poll_interval() -> u64 {
    200
}

fn default_poll_max() -> u32 {
    30 // 30 x 200ms ≈ 6s
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            prefetch_ahead: default_prefetch_ahead(),
            evict_behind: default_evict_behind(),
            max_attempts: default_max_attempts(),
            ready_poll_interval_ms: default_poll_interval(),
            ready_poll_max: default_poll_max(),
            default_language: default_language(),
            default_voice: VoicePreference::default(),
        }
    }
}

impl NarrationConfig {
    pub fn ready_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ready_poll_interval_ms)
    }

    /// 单个 chunk 的最长等待时间
    pub fn ready_timeout(&self) -> Duration {
        self.ready_poll_interval() * self.ready_poll_max
    }
}

/// 音频输出方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioOutput {
    /// 本机扬声器（需要 `speaker` feature）
    Speaker,
    /// 无输出，仅模拟播放时长
    #[default]
    Null,
}

/// 音频配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub output: AudioOutput,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
