//! HTTP Synthesizer - 调用远程 TTS HTTP 服务
//!
//! 远程 TTS API:
//! POST {base_url}/api/tts/synthesize
//! Request: {"text": "...", "voice": "female" | "male"}  (JSON)
//! Response: audio/mpeg 或 audio/wav 二进制

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{RemoteSynthesizerPort, SynthesisError, SynthesisRequest};
use crate::domain::{DecodedAudio, VoicePreference};
use crate::infrastructure::adapters::decoder::decode_audio;

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct SynthesizeHttpRequest<'a> {
    text: &'a str,
    voice: VoicePreference,
}

/// HTTP 合成客户端配置
#[derive(Debug, Clone)]
pub struct HttpSynthesizerConfig {
    /// 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpSynthesizerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpSynthesizerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 合成客户端
pub struct HttpSynthesizer {
    client: Client,
    config: HttpSynthesizerConfig,
}

impl HttpSynthesizer {
    pub fn new(config: HttpSynthesizerConfig) -> Result<Self, SynthesisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SynthesisError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn synthesize_url(&self) -> String {
        format!("{}/api/tts/synthesize", self.config.base_url.trim_end_matches('/'))
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }
}

fn classify_status(status: StatusCode, body: String) -> SynthesisError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => SynthesisError::QuotaExceeded(body),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => SynthesisError::Timeout,
        _ => SynthesisError::ServiceError(format!("HTTP {}: {}", status, body)),
    }
}

fn classify_transport(e: reqwest::Error) -> SynthesisError {
    if e.is_timeout() {
        SynthesisError::Timeout
    } else if e.is_connect() {
        SynthesisError::NetworkError(format!("Cannot connect to TTS service: {}", e))
    } else {
        SynthesisError::NetworkError(e.to_string())
    }
}

#[async_trait]
impl RemoteSynthesizerPort for HttpSynthesizer {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<DecodedAudio, SynthesisError> {
        let body = SynthesizeHttpRequest {
            text: &request.text,
            voice: request.voice,
        };

        tracing::debug!(
            url = %self.synthesize_url(),
            text_len = request.text.len(),
            voice = %request.voice,
            "Sending synthesize request"
        );

        let response = self
            .client
            .post(self.synthesize_url())
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, error_text));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(classify_transport)?;
        let size = bytes.len();

        // 解码是 CPU 密集操作
        let audio = tokio::task::spawn_blocking(move || decode_audio(&bytes, content_type.as_deref()))
            .await
            .map_err(|e| SynthesisError::DecodeError(e.to_string()))?
            .map_err(|e| SynthesisError::DecodeError(e.to_string()))?;

        tracing::debug!(
            audio_size = size,
            duration_ms = audio.duration().as_millis() as u64,
            sample_rate = audio.sample_rate(),
            "Synthesis completed"
        );

        Ok(audio)
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = HttpSynthesizerConfig::new("http://example.com:9000/").with_timeout(60);
        assert_eq!(config.timeout_secs, 60);

        let client = HttpSynthesizer::new(config).unwrap();
        assert_eq!(
            client.synthesize_url(),
            "http://example.com:9000/api/tts/synthesize"
        );
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into()),
            SynthesisError::QuotaExceeded(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::GATEWAY_TIMEOUT, String::new()),
            SynthesisError::Timeout
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            SynthesisError::ServiceError(_)
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let body = SynthesizeHttpRequest {
            text: "In the beginning",
            voice: VoicePreference::Male,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["voice"], "male");
        assert_eq!(json["text"], "In the beginning");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let client = HttpSynthesizer::new(
            HttpSynthesizerConfig::new("http://127.0.0.1:9").with_timeout(2),
        )
        .unwrap();
        let result = client
            .synthesize(SynthesisRequest::new("hello", VoicePreference::Female))
            .await;
        assert!(matches!(
            result,
            Err(SynthesisError::NetworkError(_)) | Err(SynthesisError::Timeout)
        ));
        assert!(!client.health_check().await);
    }
}
