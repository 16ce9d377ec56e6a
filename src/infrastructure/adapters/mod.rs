//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod decoder;
pub mod playback;
pub mod speech;
pub mod tts;

pub use playback::*;
pub use speech::*;
pub use tts::*;
