//! 读取状态机
//!
//! 每种词法模式是一个读取状态，负责该模式下的字符消费：
//! - `Std`：累积普通字符，检测空白、注释起始、字符串起始
//! - `Whitespace`：丢弃连续空白，从不产生 token
//! - `Comment`：消费到结束标记（可嵌套）
//! - `String`：消费到未被转义的结束标记
//!
//! 每一步返回 `(tokens, next_state)`，由 Lexer 负责切换状态，状态本身不持有 Lexer 引用。
//! 所有标记匹配都是对累积缓冲区做后缀比较，多字符标记只在最后一个字符被消费时识别。

use komparse_config::{CommentSpec, LexGrammar, LexerConfig, StringSpec};
use tracing::{trace, warn};

use super::core::{CharSource, SourcePosition};
use super::error::{ErrorKind, LexerError};
use super::token::Token;

/// 一次状态推进的结果
#[derive(Debug)]
pub enum Step {
    /// 产出零个或多个 token，并切换到 `next`
    Emit { tokens: Vec<Token>, next: ReaderState },
    /// 输入已耗尽，不会再产生 token
    Exhausted,
}

/// 读取状态（封闭集合）
#[derive(Debug)]
pub enum ReaderState {
    Std(StdReader),
    Whitespace,
    Comment(CommentReader),
    String(StringReader),
}

impl Default for ReaderState {
    fn default() -> Self {
        ReaderState::Std(StdReader::default())
    }
}

impl ReaderState {
    pub fn name(&self) -> &'static str {
        match self {
            ReaderState::Std(_) => "std",
            ReaderState::Whitespace => "whitespace",
            ReaderState::Comment(_) => "comment",
            ReaderState::String(_) => "string",
        }
    }

    /// 推进当前状态，直到它产出 token、切换状态或耗尽输入
    pub fn next_tokens<S: CharSource>(
        self,
        source: &mut S,
        grammar: &LexGrammar,
        config: &LexerConfig,
    ) -> Result<Step, LexerError> {
        match self {
            ReaderState::Std(reader) => reader.next_tokens(source, grammar),
            ReaderState::Whitespace => skip_whitespace(source, grammar),
            ReaderState::Comment(reader) => reader.next_tokens(source, config),
            ReaderState::String(reader) => reader.next_tokens(source),
        }
    }
}

/// 默认状态：累积一段普通字符
#[derive(Debug, Default)]
pub struct StdReader {
    chars: String,
    /// 缓冲区首字符的位置
    start: SourcePosition,
}

impl StdReader {
    fn next_tokens<S: CharSource>(
        mut self,
        source: &mut S,
        grammar: &LexGrammar,
    ) -> Result<Step, LexerError> {
        loop {
            let Some(ch) = peek(source)? else {
                if self.chars.is_empty() {
                    return Ok(Step::Exhausted);
                }
                return Ok(Step::Emit {
                    tokens: self.take_term(),
                    next: ReaderState::default(),
                });
            };

            if grammar.is_whitespace(ch) {
                trace!(target: "komparse::lexer::reader", "std -> whitespace");
                return Ok(Step::Emit {
                    tokens: self.take_term(),
                    next: ReaderState::Whitespace,
                });
            }

            if self.chars.is_empty() {
                self.start = source.position();
            }
            advance(source)?;
            self.chars.push(ch);

            if let Some(spec) = grammar.comment_start(&self.chars) {
                let marker_start = self.strip_marker(&spec.start);
                trace!(
                    target: "komparse::lexer::reader",
                    start = %spec.start,
                    line = marker_start.line,
                    column = marker_start.column,
                    "std -> comment"
                );
                return Ok(Step::Emit {
                    tokens: self.take_term(),
                    next: ReaderState::Comment(CommentReader::new(spec.clone(), marker_start)),
                });
            }

            if let Some(spec) = grammar.string_start(&self.chars) {
                let marker_start = self.strip_marker(&spec.start);
                trace!(
                    target: "komparse::lexer::reader",
                    start = %spec.start,
                    line = marker_start.line,
                    column = marker_start.column,
                    "std -> string"
                );
                return Ok(Step::Emit {
                    tokens: self.take_term(),
                    next: ReaderState::String(StringReader::new(spec.clone(), marker_start)),
                });
            }
        }
    }

    /// 从缓冲区尾部剥离刚匹配的起始标记，返回标记的起始位置
    fn strip_marker(&mut self, marker: &str) -> SourcePosition {
        let term_len = self.chars.len() - marker.len();
        self.chars.truncate(term_len);
        self.start.advanced_by(&self.chars)
    }

    fn take_term(&mut self) -> Vec<Token> {
        if self.chars.is_empty() {
            return Vec::new();
        }
        vec![Token::term(std::mem::take(&mut self.chars), self.start)]
    }
}

/// 丢弃连续空白，然后回到 Std
fn skip_whitespace<S: CharSource>(source: &mut S, grammar: &LexGrammar) -> Result<Step, LexerError> {
    while let Some(ch) = peek(source)? {
        if !grammar.is_whitespace(ch) {
            break;
        }
        advance(source)?;
    }
    Ok(Step::Emit {
        tokens: Vec::new(),
        next: ReaderState::default(),
    })
}

/// 带定界符文本的累积缓冲区
///
/// `floor` 之前的字节属于被转义的字符，字符串的结束标记和转义标记
/// 必须完整落在 `floor` 之后。注释不使用 `floor`，只做字面后缀比较。
#[derive(Debug)]
struct DelimitedText {
    chars: String,
    start: SourcePosition,
    floor: usize,
}

impl DelimitedText {
    fn opened(marker: &str, start: SourcePosition) -> Self {
        Self {
            chars: marker.to_string(),
            start,
            floor: 0,
        }
    }

    fn push(&mut self, ch: char) {
        self.chars.push(ch);
    }

    fn ends_with(&self, marker: &str) -> bool {
        self.chars.ends_with(marker)
    }

    fn ends_with_unescaped(&self, marker: &str) -> bool {
        self.chars.len() >= self.floor + marker.len() && self.chars.ends_with(marker)
    }

    fn seal(&mut self) {
        self.floor = self.chars.len();
    }
}

/// 注释状态
#[derive(Debug)]
pub struct CommentReader {
    spec: CommentSpec,
    text: DelimitedText,
    /// 当前嵌套深度，起始标记已消费所以从 1 开始
    depth: usize,
}

impl CommentReader {
    pub fn new(spec: CommentSpec, start: SourcePosition) -> Self {
        let text = DelimitedText::opened(&spec.start, start);
        Self {
            spec,
            text,
            depth: 1,
        }
    }

    fn next_tokens<S: CharSource>(
        mut self,
        source: &mut S,
        config: &LexerConfig,
    ) -> Result<Step, LexerError> {
        loop {
            let Some(ch) = advance(source)? else {
                return self.close_at_eof(config);
            };
            self.text.push(ch);

            // 先检查结束标记，再检查嵌套起始标记；自重叠的标记按字面后缀匹配
            if self.text.ends_with(&self.spec.end) {
                self.depth -= 1;
                if self.depth == 0 {
                    trace!(target: "komparse::lexer::reader", "comment -> std");
                    let token = Token::comment(self.text.chars, self.text.start);
                    return Ok(Step::Emit {
                        tokens: vec![token],
                        next: ReaderState::default(),
                    });
                }
                trace!(target: "komparse::lexer::reader", depth = self.depth, "Nested comment closed");
            } else if self.spec.nestable && self.text.ends_with(&self.spec.start) {
                self.depth += 1;
                if self.depth > config.max_comment_depth {
                    warn!(
                        target: "komparse::lexer::reader",
                        limit = config.max_comment_depth,
                        "Comment nesting too deep"
                    );
                    return Err(LexerError::at(
                        ErrorKind::CommentTooDeep {
                            limit: config.max_comment_depth,
                        },
                        self.text.start,
                    ));
                }
                trace!(target: "komparse::lexer::reader", depth = self.depth, "Nested comment opened");
            }
        }
    }

    fn close_at_eof(self, config: &LexerConfig) -> Result<Step, LexerError> {
        let start = self.text.start;
        if config.strict_comments {
            warn!(
                target: "komparse::lexer::reader",
                line = start.line,
                column = start.column,
                "Unterminated comment"
            );
            return Err(LexerError::at(
                ErrorKind::UnterminatedComment { end: self.spec.end },
                start,
            ));
        }

        warn!(
            target: "komparse::lexer::reader",
            line = start.line,
            column = start.column,
            "Comment closed by end of input"
        );
        Ok(Step::Emit {
            tokens: vec![Token::comment(self.text.chars, start)],
            next: ReaderState::default(),
        })
    }
}

/// 字符串状态
#[derive(Debug)]
pub struct StringReader {
    spec: StringSpec,
    text: DelimitedText,
    /// 下一个字符被转义
    escaped: bool,
}

impl StringReader {
    pub fn new(spec: StringSpec, start: SourcePosition) -> Self {
        let text = DelimitedText::opened(&spec.start, start);
        Self {
            spec,
            text,
            escaped: false,
        }
    }

    fn next_tokens<S: CharSource>(mut self, source: &mut S) -> Result<Step, LexerError> {
        loop {
            let Some(ch) = advance(source)? else {
                let start = self.text.start;
                warn!(
                    target: "komparse::lexer::reader",
                    line = start.line,
                    column = start.column,
                    "Unterminated string literal"
                );
                return Err(LexerError::at(
                    ErrorKind::UnterminatedString { end: self.spec.end },
                    start,
                ));
            };
            self.text.push(ch);

            if self.escaped {
                // 被转义的字符既不能开始也不能完成结束标记。
                // 被转义的转义标记同样是字面字符，不会再转义下一个字符。
                self.escaped = false;
                self.text.seal();
                continue;
            }

            if self.text.ends_with_unescaped(&self.spec.end) {
                trace!(target: "komparse::lexer::reader", "string -> std");
                let token = Token::string(self.text.chars, self.text.start, self.spec.name.as_deref());
                return Ok(Step::Emit {
                    tokens: vec![token],
                    next: ReaderState::default(),
                });
            }

            if let Some(escape) = &self.spec.escape {
                if self.text.ends_with_unescaped(escape) {
                    self.escaped = true;
                    self.text.seal();
                }
            }
        }
    }
}

fn peek<S: CharSource>(source: &mut S) -> Result<Option<char>, LexerError> {
    let position = source.position();
    source.peek().map_err(|e| LexerError::at(e.into(), position))
}

fn advance<S: CharSource>(source: &mut S) -> Result<Option<char>, LexerError> {
    let position = source.position();
    source.advance().map_err(|e| LexerError::at(e.into(), position))
}
