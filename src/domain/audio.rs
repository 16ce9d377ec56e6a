//! Decoded Audio Value Object

use std::sync::Arc;
use std::time::Duration;

/// 解码后的 PCM 音频
///
/// 样本为交错排列的 f32，底层存储共享，clone 不复制样本
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: u16,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            channels,
        }
    }

    /// 生成指定时长的静音
    pub fn silence(duration_ms: u64, sample_rate: u32) -> Self {
        let frames = (duration_ms * sample_rate as u64 / 1000) as usize;
        Self::new(vec![0.0; frames], sample_rate, 1)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(self.frames() as u64 * 1_000_000 / self.sample_rate as u64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
