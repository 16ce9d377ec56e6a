//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;
use crate::domain::Language;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `NARRATOR_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `NARRATOR_SERVER__PORT=8080`
/// - `NARRATOR_REMOTE__URL=http://tts-server:8000`
/// - `NARRATOR_NARRATION__MAX_ATTEMPTS=3`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 5070)?
        .set_default("remote.provider", "http")?
        .set_default("remote.url", "http://localhost:8000")?
        .set_default("remote.timeout_secs", 30)?
        .set_default("local.provider", "command")?
        .set_default("local.program", "espeak-ng")?
        .set_default("local.words_per_minute", 175)?
        .set_default("narration.prefetch_ahead", 2)?
        .set_default("narration.evict_behind", 2)?
        .set_default("narration.max_attempts", 2)?
        .set_default("narration.ready_poll_interval_ms", 200)?
        .set_default("narration.ready_poll_max", 30)?
        .set_default("narration.default_language", "en")?
        .set_default("narration.default_voice", "female")?
        .set_default("audio.output", "null")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: NARRATOR_REMOTE__URL=http://tts-server:8000
    builder = builder.add_source(
        Environment::with_prefix("NARRATOR")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.remote.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Remote TTS URL cannot be empty".to_string(),
        ));
    }

    let narration = &config.narration;
    if narration.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "narration.max_attempts must be at least 1".to_string(),
        ));
    }
    if narration.prefetch_ahead == 0 {
        return Err(ConfigError::ValidationError(
            "narration.prefetch_ahead must be at least 1".to_string(),
        ));
    }
    if narration.ready_poll_interval_ms == 0 || narration.ready_poll_max == 0 {
        return Err(ConfigError::ValidationError(
            "narration ready polling parameters cannot be 0".to_string(),
        ));
    }
    Language::new(narration.default_language.clone())
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    if config.local.words_per_minute == 0 {
        return Err(ConfigError::ValidationError(
            "local.words_per_minute cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Narrator Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Remote TTS: {:?} {}", config.remote.provider, config.remote.url);
    tracing::info!("Remote Timeout: {}s", config.remote.timeout_secs);
    tracing::info!("Local Speech: {:?} ({})", config.local.provider, config.local.program);
    tracing::info!(
        "Prefetch Ahead: {}, Evict Behind: {}",
        config.narration.prefetch_ahead,
        config.narration.evict_behind
    );
    tracing::info!("Max Attempts: {}", config.narration.max_attempts);
    tracing::info!("Ready Timeout: {:?}", config.narration.ready_timeout());
    tracing::info!("Audio Output: {:?}", config.audio.output);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("==============================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_remote_url() {
        let mut config = AppConfig::default();
        config.remote.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_attempts() {
        let mut config = AppConfig::default();
        config.narration.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_poll() {
        let mut config = AppConfig::default();
        config.narration.ready_poll_max = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[narration]\nmax_attempts = 3\nready_poll_max = 10\n\n[remote]\nprovider = \"fake\""
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.narration.max_attempts, 3);
        assert_eq!(config.narration.ready_poll_max, 10);
        assert_eq!(config.narration.prefetch_ahead, 2);
        assert_eq!(config.remote.provider, super::super::RemoteProvider::Fake);
    }
}
