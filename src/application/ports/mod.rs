//! Application Ports - 出站端口定义
//!
//! 定义朗读管线与外部协作者之间的抽象接口

mod local_synthesizer;
mod playback_engine;
mod remote_synthesizer;

pub use local_synthesizer::{
    select_voice, LocalSynthesizerPort, SpeechError, SpeechRequest, VoiceInfo,
};
pub use playback_engine::{
    DeviceState, PlaybackEnginePort, PlaybackError, PlaybackHandle, PlaybackId, PlaybackOutcome,
};
pub use remote_synthesizer::{RemoteSynthesizerPort, SynthesisError, SynthesisRequest};
