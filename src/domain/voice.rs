//! Voice Value Objects

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::DomainError;

/// 音色偏好
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoicePreference {
    #[default]
    Female,
    Male,
}

impl VoicePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoicePreference::Female => "female",
            VoicePreference::Male => "male",
        }
    }
}

impl FromStr for VoicePreference {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "female" | "f" => Ok(VoicePreference::Female),
            "male" | "m" => Ok(VoicePreference::Male),
            other => Err(DomainError::InvalidVoicePreference(other.to_string())),
        }
    }
}

impl std::fmt::Display for VoicePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 语言标签（如 `en`、`en-US`、`pt_BR`）
///
/// 不变量: 非空
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    pub fn new(tag: impl Into<String>) -> Result<Self, DomainError> {
        let tag = tag.into().trim().to_string();
        if tag.is_empty() {
            return Err(DomainError::EmptyLanguage);
        }
        Ok(Self(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 主语言前缀，小写（`en-US` -> `en`）
    pub fn prefix(&self) -> String {
        self.0
            .split(|c: char| c == '-' || c == '_')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }

    /// 判断另一个语言标签是否属于同一主语言
    pub fn matches(&self, other: &str) -> bool {
        let other_prefix = other
            .split(|c: char| c == '-' || c == '_')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        !other_prefix.is_empty() && other_prefix == self.prefix()
    }
}

impl TryFrom<String> for Language {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.0
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
