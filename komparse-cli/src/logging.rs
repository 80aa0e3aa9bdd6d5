//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制。
//! 日志写到 stderr，stdout 留给 token 输出。

use std::io;

use clap::ValueEnum;
use komparse_config::Phase;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
    Layer,
};

use crate::config::LogConfig;

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

/// 按阶段构建过滤规则
pub fn build_targets(log_config: &LogConfig) -> Targets {
    Phase::ALL
        .iter()
        .fold(Targets::new().with_default(log_config.global), |targets, phase| {
            targets.with_target(phase.target(), log_config.level_for(*phase))
        })
}

/// 使用指定格式和日志配置初始化日志系统
pub fn init(log_config: &LogConfig, format: LogFormat) -> Result<(), TryInitError> {
    let layer = create_format_layer(format, io::stderr).with_filter(build_targets(log_config));
    tracing_subscriber::registry().with(layer).try_init()
}

/// Create formatter layer based on format
fn create_format_layer<W, F>(
    format: LogFormat,
    make_writer: F,
) -> Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>
where
    W: io::Write + Send + Sync + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_targets_respect_phase_override() {
        let config = LogConfig {
            global: Level::WARN,
            reader: Some(Level::TRACE),
            ..LogConfig::default()
        };
        let targets = build_targets(&config);

        assert!(targets.would_enable("komparse::lexer::reader", &Level::TRACE));
        assert!(!targets.would_enable("komparse::lexer", &Level::TRACE));
        assert!(targets.would_enable("komparse::lexer", &Level::WARN));
        assert!(!targets.would_enable("komparse::cli", &Level::INFO));
    }
}
