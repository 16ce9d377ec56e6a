//! Narrator - 渐进式朗读服务
//!
//! 按配置装配合成器与播放设备，启动 HTTP 控制面

use std::sync::Arc;

use narrator::application::{LocalSynthesizerPort, Narrator, PlaybackEnginePort, RemoteSynthesizerPort};
use narrator::config::{
    load_config, print_config, AppConfig, AudioOutput, LocalProvider, LogConfig, RemoteProvider,
};
use narrator::infrastructure::adapters::{
    CommandSpeechConfig, CommandSpeechSynthesizer, FakeSynthesizer, HttpSynthesizer,
    HttpSynthesizerConfig, NullPlaybackEngine, SilentSpeechSynthesizer,
};
use narrator::infrastructure::events::EventPublisher;
use narrator::infrastructure::http::{AppState, HttpServer, ServerConfig};
use tracing_subscriber::EnvFilter;

fn init_tracing(log: &LogConfig) {
    let log_filter = format!(
        "{},narrator={},tower_http=debug",
        log.level, log.level
    );
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_remote(config: &AppConfig) -> anyhow::Result<Arc<dyn RemoteSynthesizerPort>> {
    Ok(match config.remote.provider {
        RemoteProvider::Http => {
            let http_config = HttpSynthesizerConfig::new(config.remote.url.clone())
                .with_timeout(config.remote.timeout_secs);
            Arc::new(HttpSynthesizer::new(http_config)?)
        }
        RemoteProvider::Fake => Arc::new(FakeSynthesizer::with_defaults()),
    })
}

fn build_local(config: &AppConfig) -> Arc<dyn LocalSynthesizerPort> {
    match config.local.provider {
        LocalProvider::Command => Arc::new(CommandSpeechSynthesizer::new(CommandSpeechConfig {
            program: config.local.program.clone(),
            words_per_minute: config.local.words_per_minute,
        })),
        LocalProvider::Silent => Arc::new(SilentSpeechSynthesizer::new(config.local.words_per_minute)),
    }
}

fn build_playback(config: &AppConfig) -> anyhow::Result<Arc<dyn PlaybackEnginePort>> {
    match config.audio.output {
        AudioOutput::Null => Ok(Arc::new(NullPlaybackEngine::new())),
        #[cfg(feature = "speaker")]
        AudioOutput::Speaker => Ok(Arc::new(
            narrator::infrastructure::adapters::RodioPlaybackEngine::new(),
        )),
        #[cfg(not(feature = "speaker"))]
        AudioOutput::Speaker => {
            anyhow::bail!("audio.output = \"speaker\" requires building with --features speaker")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("Narrator - 渐进式朗读服务");
    print_config(&config);

    let remote = build_remote(&config)?;
    if !remote.health_check().await {
        tracing::warn!(url = %config.remote.url, "Remote synthesizer not reachable, narration will fall back to local speech");
    }

    let narrator = Narrator::new(
        config.narration.clone(),
        remote,
        build_local(&config),
        build_playback(&config)?,
        EventPublisher::arc(),
    );

    let state = AppState::new(narrator.clone(), &config.narration)?;
    let server = HttpServer::new(ServerConfig::from(&config.server), state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                return;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    narrator.stop();
    tracing::info!("Server shutdown complete");

    Ok(())
}
