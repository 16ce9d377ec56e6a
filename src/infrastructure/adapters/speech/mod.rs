//! Speech Adapter - 本机语音合成实现

mod command_speech;
mod silent_speech;

pub use command_speech::{CommandSpeechConfig, CommandSpeechSynthesizer};
pub use silent_speech::SilentSpeechSynthesizer;
