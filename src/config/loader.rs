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
/// 1. 环境变量（前缀 `BALOTARIO_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `BALOTARIO_SERVER__PORT=8080`
/// - `BALOTARIO_UPSTREAM__URL=http://exam-api:5000/api`
/// - `BALOTARIO_SPEECH__ENGINE=scripted`
/// - `BALOTARIO_NARRATION__LANGUAGE=es-MX`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5080)?
        .set_default("upstream.url", "http://localhost:5000/api")?
        .set_default("upstream.timeout_secs", 30)?
        .set_default("speech.engine", "espeak")?
        .set_default("speech.espeak_binary", "espeak-ng")?
        .set_default("speech.word_duration_ms", 300)?
        .set_default("narration.language", "es-ES")?
        .set_default("narration.rate", 0.9)?
        .set_default("narration.pitch", 1.0)?
        .set_default("narration.gap_ms", 1000)?
        .set_default("log.level", "info")?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: BALOTARIO_
    // 层级分隔符: __ (双下划线)
    builder = builder.add_source(
        Environment::with_prefix("BALOTARIO")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    // 6. 验证配置
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

    if config.upstream.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Upstream URL cannot be empty".to_string(),
        ));
    }

    if !(0.5..=2.0).contains(&config.narration.rate) {
        return Err(ConfigError::ValidationError(format!(
            "Narration rate must be within 0.5..=2.0, got {}",
            config.narration.rate
        )));
    }

    if config.narration.gap_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Inter-question gap cannot be 0".to_string(),
        ));
    }

    match config.speech.engine.as_str() {
        "espeak" | "scripted" => {}
        other => {
            return Err(ConfigError::ValidationError(format!(
                "Unknown speech engine: {}",
                other
            )));
        }
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Upstream API: {}", config.upstream.url);
    tracing::info!("Upstream Timeout: {}s", config.upstream.timeout_secs);
    tracing::info!("Speech Engine: {}", config.speech.engine);
    tracing::info!("Narration Language: {}", config.narration.language);
    tracing::info!("Narration Rate: {}", config.narration.rate);
    tracing::info!("Inter-question Gap: {}ms", config.narration.gap_ms);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5080);
        assert_eq!(config.narration.language, "es-ES");
        assert_eq!(config.narration.gap_ms, 1000);
    }

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
    fn test_validation_error_for_out_of_range_rate() {
        let mut config = AppConfig::default();
        config.narration.rate = 3.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_unknown_engine() {
        let mut config = AppConfig::default();
        config.speech.engine = "festival".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
[server]
port = 6000

[narration]
language = "es-MX"
rate = 1.2
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 6000);
        assert_eq!(config.narration.language, "es-MX");
        assert!((config.narration.rate - 1.2).abs() < f32::EPSILON);
        // 未覆盖的字段保持默认值
        assert_eq!(config.upstream.timeout_secs, 30);
    }
}
