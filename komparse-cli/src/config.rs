//! CLI 配置
//!
//! CLI 特有的日志配置：全局级别 + 各阶段覆盖

use komparse_config::Phase;
use tracing::Level;

/// CLI 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub lexer: Option<Level>,
    pub reader: Option<Level>,
    pub source: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::WARN,
            lexer: None,
            reader: None,
            source: None,
        }
    }
}

impl LogConfig {
    /// 获取某个阶段的日志级别，未覆盖时回退到全局级别
    pub fn level_for(&self, phase: Phase) -> Level {
        let level = match phase {
            Phase::Lexer => self.lexer,
            Phase::Reader => self.reader,
            Phase::Source => self.source,
            Phase::Cli => None,
        };
        level.unwrap_or(self.global)
    }
}

/// 解析日志级别字符串
pub fn parse_log_level(s: &str) -> Result<Level, String> {
    match s.to_lowercase().as_str() {
        "silent" => Ok(Level::ERROR), // silent = only errors
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        other => Err(format!(
            "unknown log level '{other}' (expected silent, error, warn, info, debug or trace)"
        )),
    }
}
