//! Narration - 渐进式朗读管线
//!
//! 逐 chunk 向远程合成器请求音频，边取边播：
//! - ChunkCache: 按 index 存放解码音频，淘汰由 Narrator 决定
//! - Fetcher: 远程请求、失败计数与回退升级
//! - Session: 一次朗读运行的全部状态，带代数（generation）防止过期回调
//! - Narrator: 状态机，串联预取、等待、播放、回退朗读与 teardown

mod cache;
mod fetcher;
mod narrator;
mod session;

pub use cache::ChunkCache;
pub use fetcher::Fetcher;
pub use narrator::{NarrationRequest, NarrationStatus, Narrator};
pub use session::{EscalationReason, FetchLedger, NarrationMode, Session};
