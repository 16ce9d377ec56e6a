//! Narration Command Handlers

use crate::application::commands::narration_commands::*;
use crate::application::error::ApplicationError;
use crate::application::narration::{NarrationRequest, Narrator};
use crate::config::NarrationConfig;
use crate::domain::{segment_text, DomainError, Language, SegmentConfig, VoicePreference};

/// 命令的缺省参数
#[derive(Debug, Clone)]
pub struct NarrationDefaults {
    pub voice: VoicePreference,
    pub language: Language,
    pub segment: SegmentConfig,
}

impl NarrationDefaults {
    pub fn from_config(config: &NarrationConfig) -> Result<Self, ApplicationError> {
        Ok(Self {
            voice: config.default_voice,
            language: Language::new(config.default_language.as_str())?,
            segment: SegmentConfig::default(),
        })
    }

    /// 把命令文本分段为朗读请求
    fn request(&self, cmd: &StartNarrationCommand) -> Result<NarrationRequest, ApplicationError> {
        let language = match &cmd.language {
            Some(tag) => Language::new(tag.as_str())?,
            None => self.language.clone(),
        };

        let chunks = segment_text(&cmd.text, cmd.mode, &self.segment);
        if chunks.is_empty() {
            return Err(DomainError::NoChunks.into());
        }

        Ok(NarrationRequest::new(
            chunks,
            cmd.voice.unwrap_or(self.voice),
            language,
        ))
    }
}

/// Start Handler - 分段并开始朗读
pub struct StartNarrationHandler {
    narrator: Narrator,
    defaults: NarrationDefaults,
}

impl StartNarrationHandler {
    pub fn new(narrator: Narrator, defaults: NarrationDefaults) -> Self {
        Self { narrator, defaults }
    }

    pub fn handle(
        &self,
        cmd: StartNarrationCommand,
    ) -> Result<StartNarrationResponse, ApplicationError> {
        let request = self.defaults.request(&cmd)?;
        let anchors: Vec<String> = request
            .chunks
            .iter()
            .map(|c| c.anchor().to_string())
            .collect();

        let session_id = self.narrator.start(request)?;

        tracing::info!(
            session_id = session_id,
            mode = cmd.mode.as_str(),
            total_chunks = anchors.len(),
            "Narration start requested"
        );

        Ok(StartNarrationResponse {
            session_id,
            total_chunks: anchors.len(),
            anchors,
        })
    }
}

/// Stop Handler
pub struct StopNarrationHandler {
    narrator: Narrator,
}

impl StopNarrationHandler {
    pub fn new(narrator: Narrator) -> Self {
        Self { narrator }
    }

    pub fn handle(&self, _cmd: StopNarrationCommand) -> StopNarrationResponse {
        let was_active = self.narrator.is_active();
        self.narrator.stop();

        tracing::info!(was_active = was_active, "Narration stop requested");

        StopNarrationResponse { was_active }
    }
}

/// Toggle Handler - 空闲时开始，活跃时停止
pub struct ToggleNarrationHandler {
    narrator: Narrator,
    defaults: NarrationDefaults,
}

impl ToggleNarrationHandler {
    pub fn new(narrator: Narrator, defaults: NarrationDefaults) -> Self {
        Self { narrator, defaults }
    }

    pub fn handle(
        &self,
        cmd: ToggleNarrationCommand,
    ) -> Result<ToggleNarrationResponse, ApplicationError> {
        // 停止不需要有效文本
        if self.narrator.is_active() {
            self.narrator.stop();
            tracing::info!("Narration toggled off");
            return Ok(ToggleNarrationResponse {
                active: false,
                session_id: None,
                total_chunks: 0,
            });
        }

        let request = self.defaults.request(&cmd.start)?;
        let total_chunks = request.chunks.len();
        let session_id = self.narrator.toggle(request)?;

        tracing::info!(session_id = ?session_id, "Narration toggled");

        Ok(ToggleNarrationResponse {
            active: session_id.is_some(),
            session_id,
            total_chunks: if session_id.is_some() { total_chunks } else { 0 },
        })
    }
}
