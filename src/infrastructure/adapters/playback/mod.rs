//! Playback Adapter - 音频输出设备实现

mod null_playback;
#[cfg(feature = "speaker")]
mod rodio_engine;

pub use null_playback::{NullFault, NullPlaybackEngine};
#[cfg(feature = "speaker")]
pub use rodio_engine::RodioPlaybackEngine;
