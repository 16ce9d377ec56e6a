//! Domain Layer - 领域层
//!
//! 朗读管线的值对象:
//! - Chunk: 待朗读的文本单元（经文或段落）
//! - Voice: 音色偏好与语言
//! - Audio: 解码后的音频数据

mod audio;
mod chunk;
mod errors;
mod voice;

// 共享的文本分割器
mod text_segmenter;

pub use audio::DecodedAudio;
pub use chunk::{Chunk, ChunkMode};
pub use errors::DomainError;
pub use text_segmenter::{segment_text, SegmentConfig};
pub use voice::{Language, VoicePreference};
