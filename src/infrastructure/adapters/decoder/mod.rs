//! Audio Decoder - 远程返回的压缩/容器音频解码为 PCM

mod symphonia_decoder;

pub use symphonia_decoder::{decode_audio, DecodeError};
