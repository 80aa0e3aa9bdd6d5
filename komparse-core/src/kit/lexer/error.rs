//! Lexer 错误类型
//!
//! 提供结构化的词法错误信息，包含错误类型和位置。
//! 除 `Exhausted` 外，所有错误对当前 Lexer 都是终结性的。

use komparse_config::GrammarError;

use super::core::{SourcePosition, StreamError};

/// 错误类型
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// 没有可用 token 时调用 advance（调用方协议错误）
    #[error("No more tokens available")]
    Exhausted,

    /// 字符串在结束标记前遇到输入结束
    #[error("Unterminated string literal, expected {end:?}")]
    UnterminatedString { end: String },

    /// 注释在结束标记前遇到输入结束（严格模式）
    #[error("Unterminated comment, expected {end:?}")]
    UnterminatedComment { end: String },

    /// 嵌套注释超过配置的最大深度
    #[error("Comment nesting deeper than {limit} levels")]
    CommentTooDeep { limit: usize },

    /// 语法配置无效
    #[error("Invalid grammar: {0}")]
    InvalidGrammar(#[from] GrammarError),

    /// 字符源读取失败
    #[error("{0}")]
    Source(#[from] StreamError),
}

/// 词法错误，包含结构化信息
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{}:{}] {kind}", .position.line, .position.column)]
pub struct LexerError {
    /// 错误类型
    pub kind: ErrorKind,
    /// 错误发生的位置（未终止错误指向定界符起点）
    pub position: SourcePosition,
}

impl LexerError {
    /// 在指定位置创建错误
    pub fn at(kind: ErrorKind, position: SourcePosition) -> Self {
        Self { kind, position }
    }

    /// 获取行号（1-based）
    pub fn line(&self) -> usize {
        self.position.line
    }

    /// 获取列号（1-based）
    pub fn column(&self) -> usize {
        self.position.column
    }

    /// 调用方检查 `has_next` 即可避免的错误
    pub fn is_exhausted(&self) -> bool {
        matches!(self.kind, ErrorKind::Exhausted)
    }
}
