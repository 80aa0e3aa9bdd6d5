//! Lexer 主入口
//!
//! 驱动当前读取状态，缓冲产出的 token，对外提供拉取式 API。
//!
//! # 示例
//!
//! ```
//! use std::sync::Arc;
//! use komparse_core::{Category, LexGrammar, Lexer, StringStream};
//!
//! let grammar = Arc::new(LexGrammar::new().add_nested_comment("(*", "*)"));
//! let mut lexer = Lexer::new(StringStream::from("(* a (* b *) c *) X"), grammar).unwrap();
//!
//! let comment = lexer.advance().unwrap();
//! assert_eq!(comment.category(), &Category::Comment);
//! assert_eq!(lexer.advance().unwrap().text(), "X");
//! assert!(!lexer.has_next().unwrap());
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use komparse_config::{LexGrammar, LexerConfig};
use tracing::{debug, trace, warn};

use super::core::{CharSource, SourcePosition, StringStream};
use super::error::{ErrorKind, LexerError};
use super::reader::{ReaderState, Step};
use super::token::Token;

/// 语法可配置的流式词法分析器
///
/// 同一时刻只有一个读取状态处于活动状态；字符源中的每个字符只读取一次。
/// 遇到错误后 Lexer 进入终结状态，之后的调用都返回同一个错误。
pub struct Lexer<S> {
    source: S,
    grammar: Arc<LexGrammar>,
    config: LexerConfig,
    /// 当前读取状态，输入耗尽或出错后为 None
    reader: Option<ReaderState>,
    /// 已产出但尚未交付的 token（FIFO）
    remaining: VecDeque<Token>,
    failure: Option<LexerError>,
    /// 迭代器已交付过错误
    failure_reported: bool,
}

impl<S: CharSource> Lexer<S> {
    /// 使用默认配置创建 Lexer
    pub fn new(source: S, grammar: Arc<LexGrammar>) -> Result<Self, LexerError> {
        Self::with_config(source, grammar, LexerConfig::default())
    }

    /// 使用显式配置创建 Lexer，语法无效时返回错误
    pub fn with_config(
        source: S,
        grammar: Arc<LexGrammar>,
        config: LexerConfig,
    ) -> Result<Self, LexerError> {
        grammar
            .validate()
            .map_err(|e| LexerError::at(e.into(), source.position()))?;

        trace!(
            target: "komparse::lexer",
            comments = grammar.comments().len(),
            strings = grammar.strings().len(),
            strict_comments = config.strict_comments,
            "Creating new Lexer"
        );
        Ok(Self {
            source,
            grammar,
            config,
            reader: Some(ReaderState::default()),
            remaining: VecDeque::new(),
            failure: None,
            failure_reported: false,
        })
    }

    /// 是否还能产出 token
    ///
    /// 输入格式错误（如未终止的字符串）在这里尽早暴露。
    pub fn has_next(&mut self) -> Result<bool, LexerError> {
        self.fill_buffer()?;
        Ok(!self.remaining.is_empty())
    }

    /// 取出下一个 token；没有可用 token 时返回 `Exhausted`
    pub fn advance(&mut self) -> Result<Token, LexerError> {
        self.fill_buffer()?;
        self.remaining
            .pop_front()
            .ok_or_else(|| LexerError::at(ErrorKind::Exhausted, self.source.position()))
    }

    /// 下一个未消费字符的位置
    pub fn position(&self) -> SourcePosition {
        self.source.position()
    }

    pub fn grammar(&self) -> &Arc<LexGrammar> {
        &self.grammar
    }

    pub fn config(&self) -> &LexerConfig {
        &self.config
    }

    /// 缓冲区为空时反复推进读取状态，直到产出 token 或输入耗尽
    fn fill_buffer(&mut self) -> Result<(), LexerError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if !self.remaining.is_empty() {
            return Ok(());
        }

        while let Some(reader) = self.reader.take() {
            trace!(target: "komparse::lexer", state = reader.name(), "Requesting next tokens");

            match reader.next_tokens(&mut self.source, &self.grammar, &self.config) {
                Ok(Step::Emit { tokens, next }) => {
                    self.reader = Some(next);
                    if tokens.is_empty() {
                        continue;
                    }
                    for token in &tokens {
                        debug!(
                            target: "komparse::lexer",
                            "Produced token: category={}, text={:?}, line={}, column={}",
                            token.category(),
                            token.text(),
                            token.start().line,
                            token.start().column
                        );
                    }
                    self.remaining.extend(tokens);
                    return Ok(());
                }
                Ok(Step::Exhausted) => {
                    trace!(target: "komparse::lexer", "Reached end of input");
                }
                Err(err) => {
                    warn!(target: "komparse::lexer", error = %err, "Lex error encountered");
                    self.failure = Some(err.clone());
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}

/// 依次产出 token；出错时产出一次错误后结束
impl<S: CharSource> Iterator for Lexer<S> {
    type Item = Result<Token, LexerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failure_reported {
            return None;
        }
        match self.has_next() {
            Ok(true) => Some(self.advance()),
            Ok(false) => None,
            Err(err) => {
                self.failure_reported = true;
                Some(Err(err))
            }
        }
    }
}

/// 对内存文本做完整的词法分析
pub fn tokenize(text: &str, grammar: Arc<LexGrammar>) -> Result<Vec<Token>, LexerError> {
    Lexer::new(StringStream::from(text), grammar)?.collect()
}
