//! Command Speech Synthesizer - 调用本机 espeak-ng 朗读
//!
//! 每次朗读启动一个子进程，文本经 stdin 传入；cancel_all 杀死所有在途进程

use async_trait::async_trait;
use dashmap::DashMap;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    select_voice, LocalSynthesizerPort, SpeechError, SpeechRequest, VoiceInfo,
};
use crate::domain::{Language, VoicePreference};

/// 命令行朗读配置
#[derive(Debug, Clone)]
pub struct CommandSpeechConfig {
    /// 合成程序（需兼容 espeak-ng 参数）
    pub program: String,
    /// 语速（每分钟词数）
    pub words_per_minute: u32,
}

impl Default for CommandSpeechConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".to_string(),
            words_per_minute: 175,
        }
    }
}

/// 命令行朗读合成器
pub struct CommandSpeechSynthesizer {
    config: CommandSpeechConfig,
    /// 当前批次的取消令牌，cancel_all 时替换
    cancel: Mutex<CancellationToken>,
    /// 按语言前缀缓存的音色列表
    voices: DashMap<String, Vec<VoiceInfo>>,
}

impl CommandSpeechSynthesizer {
    pub fn new(config: CommandSpeechConfig) -> Self {
        Self {
            config,
            cancel: Mutex::new(CancellationToken::new()),
            voices: DashMap::new(),
        }
    }

    fn current_token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn list_voices(&self, language: &Language) -> Result<Vec<VoiceInfo>, SpeechError> {
        let output = Command::new(&self.config.program)
            .arg(format!("--voices={}", language.prefix()))
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| spawn_error(&self.config.program, e))?;

        Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn voice_for(&self, language: &Language, preference: VoicePreference) -> Option<String> {
        let voices = self.voices(language).await;
        select_voice(&voices, language, preference).map(|v| v.name.clone())
    }
}

fn spawn_error(program: &str, e: std::io::Error) -> SpeechError {
    if e.kind() == std::io::ErrorKind::NotFound {
        SpeechError::Unsupported(format!("{} not installed", program))
    } else {
        SpeechError::DeviceError(e.to_string())
    }
}

/// 解析 `espeak-ng --voices` 输出
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File          Other Languages
///  5  en-us           M  english-us           gmw/en-US
/// ```
fn parse_voice_list(output: &str) -> Vec<VoiceInfo> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _priority = fields.next()?;
            let language = fields.next()?;
            let gender = fields.next()?;
            let name = fields.next()?;

            let voice = VoiceInfo::new(name, language);
            Some(match gender.chars().last() {
                Some('F') => voice.with_gender(VoicePreference::Female),
                Some('M') => voice.with_gender(VoicePreference::Male),
                _ => voice,
            })
        })
        .collect()
}

#[async_trait]
impl LocalSynthesizerPort for CommandSpeechSynthesizer {
    async fn speak(&self, request: SpeechRequest) -> Result<(), SpeechError> {
        let token = self.current_token();
        if token.is_cancelled() {
            return Err(SpeechError::Cancelled);
        }

        let voice = self.voice_for(&request.language, request.voice).await;

        let mut command = Command::new(&self.config.program);
        command
            .arg("-s")
            .arg(self.config.words_per_minute.to_string())
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(voice) = &voice {
            command.arg("-v").arg(voice);
        }

        tracing::debug!(
            program = %self.config.program,
            voice = ?voice,
            text_len = request.text.len(),
            "Speaking via local command"
        );

        let mut child = command
            .spawn()
            .map_err(|e| spawn_error(&self.config.program, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.text.as_bytes())
                .await
                .map_err(|e| SpeechError::DeviceError(e.to_string()))?;
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "Failed to kill speech process");
                }
                Err(SpeechError::Cancelled)
            }
            status = child.wait() => {
                let status = status.map_err(|e| SpeechError::DeviceError(e.to_string()))?;
                if status.success() {
                    Ok(())
                } else {
                    Err(SpeechError::DeviceError(format!(
                        "{} exited with {}",
                        self.config.program, status
                    )))
                }
            }
        }
    }

    fn cancel_all(&self) {
        let mut token = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        token.cancel();
        *token = CancellationToken::new();
    }

    async fn voices(&self, language: &Language) -> Vec<VoiceInfo> {
        let key = language.prefix();
        if let Some(voices) = self.voices.get(&key) {
            return voices.clone();
        }

        match self.list_voices(language).await {
            Ok(voices) => {
                self.voices.insert(key, voices.clone());
                voices
            }
            Err(e) => {
                tracing::warn!(error = %e, language = %language, "Failed to list local voices");
                Vec::new()
            }
        }
    }
}
