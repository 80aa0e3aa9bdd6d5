//! Komparse Lexer
//!
//! 语法可配置的流式词法分析器，设计目标：
//! - 可配置：空白符、注释、字符串定界符全部来自 LexGrammar
//! - 流式：逐字符消费 CharSource，不回退、不重读
//! - 状态机：Std / Whitespace / Comment / String 四种读取状态，封闭枚举分发
//! - 位置追踪：每个 token 携带精确的起止位置

pub mod core;
pub mod error;
pub mod lexer;
pub mod reader;
pub mod token;

pub use self::core::{CharSource, ReadStream, SourcePosition, SourceSpan, StreamError, StringStream};
pub use error::{ErrorKind, LexerError};
pub use lexer::{tokenize, Lexer};
pub use reader::{ReaderState, Step};
pub use token::{Category, Token};
