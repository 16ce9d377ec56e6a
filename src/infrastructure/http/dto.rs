//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::StartNarrationCommand;
use crate::domain::{ChunkMode, VoicePreference};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Narration DTOs
// ============================================================================

/// 开始/切换朗读请求
#[derive(Debug, Clone, Deserialize)]
pub struct NarrationStartRequest {
    pub text: String,
    /// verse | paragraph（fluid 为 paragraph 的别名）
    #[serde(default)]
    pub mode: ChunkMode,
    #[serde(default)]
    pub voice: Option<VoicePreference>,
    #[serde(default)]
    pub language: Option<String>,
}

impl NarrationStartRequest {
    pub fn into_command(self) -> StartNarrationCommand {
        StartNarrationCommand {
            text: self.text,
            mode: self.mode,
            voice: self.voice,
            language: self.language,
        }
    }
}

/// 切换请求；活跃时 text 可省略
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NarrationToggleRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub mode: ChunkMode,
    #[serde(default)]
    pub voice: Option<VoicePreference>,
    #[serde(default)]
    pub language: Option<String>,
}

impl NarrationToggleRequest {
    pub fn into_command(self) -> StartNarrationCommand {
        StartNarrationCommand {
            text: self.text,
            mode: self.mode,
            voice: self.voice,
            language: self.language,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_request_defaults() {
        let req: NarrationStartRequest = serde_json::from_str(r#"{"text": "1 In the beginning"}"#).unwrap();
        assert_eq!(req.mode, ChunkMode::Verse);
        assert!(req.voice.is_none());
        assert!(req.language.is_none());
    }

    #[test]
    fn test_start_request_fluid_mode() {
        let req: NarrationStartRequest = serde_json::from_str(
            r#"{"text": "para", "mode": "fluid", "voice": "male", "language": "pt-BR"}"#,
        )
        .unwrap();
        let cmd = req.into_command();
        assert_eq!(cmd.mode, ChunkMode::Paragraph);
        assert_eq!(cmd.voice, Some(VoicePreference::Male));
        assert_eq!(cmd.language.as_deref(), Some("pt-BR"));
    }

    #[test]
    fn test_response_envelope() {
        let json = serde_json::to_value(ApiResponse::success(3u64)).unwrap();
        assert_eq!(json["errno"], 0);
        assert_eq!(json["error"], "");
        assert_eq!(json["data"], 3);
    }
}
