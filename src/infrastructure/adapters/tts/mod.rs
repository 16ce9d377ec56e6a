//! TTS Adapter - 远程合成器实现

mod fake_synthesizer;
mod http_synthesizer;

pub use fake_synthesizer::{FakeOutcome, FakeSynthesizer, FakeSynthesizerConfig};
pub use http_synthesizer::{HttpSynthesizer, HttpSynthesizerConfig};
