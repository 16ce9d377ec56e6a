//! Local Synthesizer Port - 本机语音合成（回退路径）
//!
//! 远程合成不可用或过慢时，由本机朗读文本

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Language, VoicePreference};

/// 本机朗读错误
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech synthesis unsupported: {0}")]
    Unsupported(String),

    #[error("Speech device error: {0}")]
    DeviceError(String),

    #[error("Speech cancelled")]
    Cancelled,
}

/// 本机朗读请求
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub language: Language,
    pub voice: VoicePreference,
}

/// 本机可用的音色
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    /// 音色名称（传给合成程序的标识）
    pub name: String,
    /// 语言标签
    pub language: String,
    /// 平台提供的性别信息（如有）
    pub gender: Option<VoicePreference>,
}

impl VoiceInfo {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
            gender: None,
        }
    }

    pub fn with_gender(mut self, gender: VoicePreference) -> Self {
        self.gender = Some(gender);
        self
    }
}

/// Local Synthesizer Port
#[async_trait]
pub trait LocalSynthesizerPort: Send + Sync {
    /// 朗读文本，朗读结束时返回
    async fn speak(&self, request: SpeechRequest) -> Result<(), SpeechError>;

    /// 立即中止所有正在进行的朗读
    fn cancel_all(&self);

    /// 列出本机可用音色
    async fn voices(&self, _language: &Language) -> Vec<VoiceInfo> {
        Vec::new()
    }
}

const FEMALE_HINTS: &[&str] = &[
    "female", "woman", "girl", "zira", "samantha", "victoria", "karen", "moira", "tessa",
    "fiona", "susan", "hazel", "serena", "allison", "ava", "kate",
];

const MALE_HINTS: &[&str] = &[
    "male", "man", "boy", "david", "daniel", "alex", "fred", "mark", "george", "james",
    "thomas", "oliver", "tom",
];

/// espeak 变体标记（`f3`、`m1`）
fn variant_gender(token: &str) -> Option<VoicePreference> {
    let mut chars = token.chars();
    let gender = match chars.next()? {
        'f' => VoicePreference::Female,
        'm' => VoicePreference::Male,
        _ => return None,
    };
    let digits = chars.as_str();
    (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())).then_some(gender)
}

/// 按名称猜测音色性别
///
/// 按单词匹配，避免 "german" 命中 "man"
fn guess_gender(name: &str) -> Option<VoicePreference> {
    let name = name.to_lowercase();
    let tokens: Vec<&str> = name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    for token in &tokens {
        if FEMALE_HINTS.contains(token) {
            return Some(VoicePreference::Female);
        }
    }
    for token in &tokens {
        if MALE_HINTS.contains(token) {
            return Some(VoicePreference::Male);
        }
    }
    tokens.iter().find_map(|token| variant_gender(token))
}

/// 选择本机音色
///
/// 优先级:
/// 1. 语言前缀匹配且性别匹配（平台性别信息优先，其次按名称推断）
/// 2. 仅语言前缀匹配
/// 3. None，使用平台默认音色
pub fn select_voice<'a>(
    voices: &'a [VoiceInfo],
    language: &Language,
    preference: VoicePreference,
) -> Option<&'a VoiceInfo> {
    let gendered = voices.iter().find(|v| {
        language.matches(&v.language)
            && v.gender.or_else(|| guess_gender(&v.name)) == Some(preference)
    });

    gendered.or_else(|| voices.iter().find(|v| language.matches(&v.language)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<VoiceInfo> {
        vec![
            VoiceInfo::new("Microsoft David", "en-US"),
            VoiceInfo::new("Microsoft Zira", "en-US"),
            VoiceInfo::new("Amelie", "fr-CA"),
            VoiceInfo::new("Thomas", "fr-FR"),
        ]
    }

    #[test]
    fn test_selects_gender_and_language_match() {
        let voices = catalog();
        let en = Language::new("en").unwrap();

        let voice = select_voice(&voices, &en, VoicePreference::Female).unwrap();
        assert_eq!(voice.name, "Microsoft Zira");

        let voice = select_voice(&voices, &en, VoicePreference::Male).unwrap();
        assert_eq!(voice.name, "Microsoft David");
    }

    #[test]
    fn test_falls_back_to_language_only() {
        let voices = vec![
            VoiceInfo::new("Amelie", "fr-CA"),
            VoiceInfo::new("Thomas", "fr-FR"),
        ];
        let fr = Language::new("fr-FR").unwrap();

        // 没有可识别的法语女声，退回第一个法语音色
        let voice = select_voice(&voices, &fr, VoicePreference::Female).unwrap();
        assert_eq!(voice.name, "Amelie");
    }

    #[test]
    fn test_no_language_match_uses_platform_default() {
        let voices = catalog();
        let de = Language::new("de").unwrap();
        assert!(select_voice(&voices, &de, VoicePreference::Male).is_none());
    }

    #[test]
    fn test_platform_gender_wins_over_name() {
        let voices = vec![
            VoiceInfo::new("english-female", "en").with_gender(VoicePreference::Male),
            VoiceInfo::new("english", "en"),
        ];
        let en = Language::new("en").unwrap();
        let voice = select_voice(&voices, &en, VoicePreference::Male).unwrap();
        assert_eq!(voice.name, "english-female");
    }

    #[test]
    fn test_female_name_not_mistaken_for_male() {
        assert_eq!(guess_gender("English Female"), Some(VoicePreference::Female));
        assert_eq!(guess_gender("en+m3"), Some(VoicePreference::Male));
        assert_eq!(guess_gender("klatt"), None);
    }

    #[test]
    fn test_hints_match_whole_words_only() {
        assert_eq!(guess_gender("german"), None);
        assert_eq!(guess_gender("romanian"), None);
        assert_eq!(guess_gender("javanese"), None);
        assert_eq!(guess_gender("Danish (Denmark)"), None);
        assert_eq!(guess_gender("Ava (Enhanced)"), Some(VoicePreference::Female));
        assert_eq!(guess_gender("de+f2"), Some(VoicePreference::Female));
        assert_eq!(guess_gender("Microsoft Mark"), Some(VoicePreference::Male));
    }

    #[test]
    fn test_german_voice_not_picked_as_male() {
        let voices = vec![
            VoiceInfo::new("german", "de"),
            VoiceInfo::new("de+m1", "de"),
        ];
        let de = Language::new("de").unwrap();
        let voice = select_voice(&voices, &de, VoicePreference::Male).unwrap();
        assert_eq!(voice.name, "de+m1");
    }
}
