//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：朗读的开始、停止与切换

mod narration_commands;

pub mod handlers;

pub use narration_commands::*;
