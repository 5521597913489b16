//! Balotario - 考题语音朗读系统
//!
//! 架构:
//! - Domain: question/, narration/
//! - Application: playback (控制器 actor), ports
//! - Infrastructure: http, speech, upstream

use std::sync::Arc;
use std::time::Duration;

use balotario::application::playback::{PlaybackController, PlaybackSettings};
use balotario::application::ports::{SpeechEventReceiver, SpeechPort};
use balotario::config::{load_config, print_config, AppConfig};
use balotario::infrastructure::http::{AppState, HttpServer, ServerConfig};
use balotario::infrastructure::speech::{
    EspeakSpeechPort, EspeakSpeechPortConfig, ScriptedSpeechPort, ScriptedSpeechPortConfig,
};
use balotario::infrastructure::upstream::{HttpCatalogClient, HttpCatalogClientConfig};

/// 按配置选择语音引擎
fn create_speech_port(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn SpeechPort>, SpeechEventReceiver)> {
    match config.speech.engine.as_str() {
        "espeak" => {
            let (port, events) = EspeakSpeechPort::new(EspeakSpeechPortConfig {
                binary: config.speech.espeak_binary.clone(),
            })
            .map_err(|e| anyhow::anyhow!("Failed to initialize espeak engine: {}", e))?;
            Ok((port, events))
        }
        "scripted" => {
            let (port, events) = ScriptedSpeechPort::new(ScriptedSpeechPortConfig {
                word_duration: Duration::from_millis(config.speech.word_duration_ms),
                ..Default::default()
            });
            Ok((port, events))
        }
        other => Err(anyhow::anyhow!("Unknown speech engine: {}", other)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},balotario={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Balotario - 考题语音朗读系统");
    print_config(&config);

    // 创建语音引擎
    let (speech_port, speech_events) = create_speech_port(&config)?;

    // 创建题库客户端
    let catalog_config = HttpCatalogClientConfig {
        base_url: config.upstream.url.clone(),
        timeout_secs: config.upstream.timeout_secs,
    };
    let catalog = Arc::new(
        HttpCatalogClient::new(catalog_config)
            .map_err(|e| anyhow::anyhow!("Failed to create catalog client: {}", e))?,
    );

    // 启动播放控制器 actor
    let settings = PlaybackSettings::from_config(&config.narration);
    let playback = PlaybackController::spawn(speech_port, speech_events, settings);

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(playback, catalog);
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
