//! Narrator - 渐进式朗读服务
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Chunk / ChunkMode: 朗读单元与分段模式
//! - DecodedAudio: 解码后的 PCM 缓冲
//! - VoicePreference / Language: 音色偏好与语言标签
//!
//! 应用层 (application/):
//! - Ports: 远程合成、本机朗读、播放设备
//! - Narration: 缓存、预取、重试升级、回退朗读、teardown
//! - Commands: 开始 / 停止 / 切换
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: HTTP/Fake 合成器、espeak-ng/静默朗读、rodio/空播放设备、symphonia 解码
//! - Events: 朗读事件广播
//! - HTTP: RESTful API + WebSocket

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{NarrationRequest, NarrationStatus, Narrator};
pub use config::{load_config, AppConfig};
