//! Events Layer - 朗读事件推送
//!
//! 基于 broadcast 通道向 UI 推送朗读状态变化

mod publisher;

pub use publisher::{EndReason, EventPublisher, NarrationEvent};
