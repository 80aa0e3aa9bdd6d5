//! 字符源抽象
//!
//! 单向、单字符预读的字符流。词法分析器需要的所有"回看"都通过
//! 读取状态自己的累积缓冲区完成，字符源不提供回退。

use std::collections::VecDeque;
use std::io::{self, Read};

use super::position::SourcePosition;
use tracing::{trace, warn};

/// 字节块读取大小
const CHUNK_SIZE: usize = 4096;

/// Unicode替换字符（用于解码错误恢复）
const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// 字符源错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("I/O error at byte offset {offset}: {message}")]
    Io {
        kind: io::ErrorKind,
        message: String,
        offset: usize,
    },
}

/// 字符源
///
/// 每个字符在整个 Lexer 生命周期内至多被消费一次。
pub trait CharSource {
    /// 预读下一个字符（不消费），输入结束时返回 `None`
    fn peek(&mut self) -> Result<Option<char>, StreamError>;

    /// 消费并返回下一个字符，输入结束时返回 `None`
    fn advance(&mut self) -> Result<Option<char>, StreamError>;

    /// 是否还有字符可读（不消费）
    fn has_next(&mut self) -> Result<bool, StreamError> {
        Ok(self.peek()?.is_some())
    }

    /// 下一个未消费字符的位置
    fn position(&self) -> SourcePosition;
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    fn peek(&mut self) -> Result<Option<char>, StreamError> {
        (**self).peek()
    }

    fn advance(&mut self) -> Result<Option<char>, StreamError> {
        (**self).advance()
    }

    fn position(&self) -> SourcePosition {
        (**self).position()
    }
}

/// 内存文本字符源
#[derive(Debug, Clone)]
pub struct StringStream {
    text: String,
    position: SourcePosition,
}

impl StringStream {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            position: SourcePosition::start(),
        }
    }

    /// 尚未消费的剩余文本
    pub fn remaining(&self) -> &str {
        &self.text[self.position.byte_offset..]
    }
}

impl From<&str> for StringStream {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for StringStream {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl CharSource for StringStream {
    fn peek(&mut self) -> Result<Option<char>, StreamError> {
        Ok(self.remaining().chars().next())
    }

    fn advance(&mut self) -> Result<Option<char>, StreamError> {
        let next = self.remaining().chars().next();
        if let Some(c) = next {
            self.position.advance(c);
        }
        Ok(next)
    }

    fn position(&self) -> SourcePosition {
        self.position
    }
}

/// 字节流字符源
///
/// 从任意 `io::Read` 分块读取并按 UTF-8 解码。非法或截断的字节序列
/// 解码为 U+FFFD 并记录警告，不会中断词法分析。
pub struct ReadStream<R> {
    reader: R,
    /// 已读取但尚未解码的字节
    bytes: VecDeque<u8>,
    /// 已解码但尚未消费的字符
    peeked: Option<char>,
    position: SourcePosition,
    /// 底层读取器已到达 EOF
    eof: bool,
}

impl<R: Read> ReadStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            bytes: VecDeque::with_capacity(CHUNK_SIZE),
            peeked: None,
            position: SourcePosition::start(),
            eof: false,
        }
    }

    /// 确保缓冲区中至少有 `want` 个字节（或已到达 EOF）
    fn fill(&mut self, want: usize) -> Result<(), StreamError> {
        let mut chunk = [0u8; CHUNK_SIZE];
        while self.bytes.len() < want && !self.eof {
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    trace!(target: "komparse::lexer::source", offset = self.position.byte_offset, "Reader reached EOF");
                    self.eof = true;
                }
                Ok(n) => self.bytes.extend(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(target: "komparse::lexer::source", error = %e, "Read failed");
                    return Err(StreamError::Io {
                        kind: e.kind(),
                        message: e.to_string(),
                        offset: self.position.byte_offset,
                    });
                }
            }
        }
        Ok(())
    }

    /// 解码下一个字符到 `peeked`
    fn decode_next(&mut self) -> Result<Option<char>, StreamError> {
        if self.peeked.is_some() {
            return Ok(self.peeked);
        }

        self.fill(1)?;
        let Some(&lead_byte) = self.bytes.front() else {
            return Ok(None);
        };

        let Some(seq_len) = utf8_sequence_length(lead_byte) else {
            warn!(
                target: "komparse::lexer::source",
                "Invalid UTF-8 lead byte: 0x{:02X} at {}:{}",
                lead_byte, self.position.line, self.position.column
            );
            self.bytes.pop_front();
            self.peeked = Some(REPLACEMENT_CHAR);
            return Ok(self.peeked);
        };

        self.fill(seq_len)?;
        let available = seq_len.min(self.bytes.len());
        let seq: Vec<u8> = self.bytes.iter().take(available).copied().collect();
        let c = match std::str::from_utf8(&seq) {
            Ok(s) => {
                self.bytes.drain(..available);
                s.chars().next().unwrap_or(REPLACEMENT_CHAR)
            }
            Err(e) => {
                // 只丢弃非法的最大前缀，其后的字节重新解码
                let invalid = e.error_len().unwrap_or(available);
                warn!(
                    target: "komparse::lexer::source",
                    "Invalid UTF-8 bytes {:02X?} at {}:{}",
                    &seq[..invalid], self.position.line, self.position.column
                );
                self.bytes.drain(..invalid);
                REPLACEMENT_CHAR
            }
        };
        self.peeked = Some(c);
        Ok(self.peeked)
    }
}

impl<R: Read> CharSource for ReadStream<R> {
    fn peek(&mut self) -> Result<Option<char>, StreamError> {
        self.decode_next()
    }

    fn advance(&mut self) -> Result<Option<char>, StreamError> {
        let next = self.decode_next()?;
        if let Some(c) = next {
            self.peeked = None;
            self.position.advance(c);
        }
        Ok(next)
    }

    fn position(&self) -> SourcePosition {
        self.position
    }
}

/// 获取UTF-8序列长度
fn utf8_sequence_length(lead_byte: u8) -> Option<usize> {
    match lead_byte {
        0x00..=0x7F => Some(1),
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        _ => None, // 续字节或超出范围
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 每次只返回一个字节的读取器，用于测试跨块解码
    struct ByteByByte<'a>(&'a [u8]);

    impl Read for ByteByByte<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.split_first() {
                Some((first, rest)) if !buf.is_empty() => {
                    buf[0] = *first;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }
    }

    fn drain<S: CharSource>(mut source: S) -> String {
        let mut out = String::new();
        while let Some(c) = source.advance().unwrap() {
            out.push(c);
        }
        out
    }

    #[test]
    fn test_string_stream_ascii() {
        let mut stream = StringStream::from("abc");

        assert_eq!(stream.peek().unwrap(), Some('a'));
        assert_eq!(stream.peek().unwrap(), Some('a'));
        assert_eq!(stream.advance().unwrap(), Some('a'));
        assert_eq!(stream.advance().unwrap(), Some('b'));
        assert_eq!(stream.remaining(), "c");
        assert_eq!(stream.advance().unwrap(), Some('c'));
        assert!(!stream.has_next().unwrap());
        assert_eq!(stream.advance().unwrap(), None);
        assert_eq!(stream.peek().unwrap(), None);
    }

    #[test]
    fn test_string_stream_position_tracking() {
        let mut stream = StringStream::from("a\n中");

        assert_eq!(stream.position(), SourcePosition::start());
        stream.advance().unwrap();
        stream.advance().unwrap();
        let pos = stream.position();
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 1);
        stream.advance().unwrap();
        assert_eq!(stream.position().byte_offset, 5);
    }

    #[test]
    fn test_read_stream_matches_string_stream() {
        let text = "SELECT \"中文\" -- 🎉\n";
        assert_eq!(drain(ReadStream::new(text.as_bytes())), text);
        assert_eq!(drain(StringStream::from(text)), text);
    }

    #[test]
    fn test_read_stream_split_sequences() {
        let text = "中文🎉x";
        let mut stream = ReadStream::new(ByteByByte(text.as_bytes()));

        assert_eq!(stream.peek().unwrap(), Some('中'));
        assert_eq!(stream.advance().unwrap(), Some('中'));
        assert_eq!(stream.advance().unwrap(), Some('文'));
        assert_eq!(stream.advance().unwrap(), Some('🎉'));
        assert_eq!(stream.position().byte_offset, 10);
        assert_eq!(stream.advance().unwrap(), Some('x'));
        assert_eq!(stream.advance().unwrap(), None);
    }

    #[test]
    fn test_read_stream_invalid_lead_byte() {
        let mut stream = ReadStream::new(&[0x80, b'a'][..]);

        assert_eq!(stream.advance().unwrap(), Some(REPLACEMENT_CHAR));
        assert_eq!(stream.advance().unwrap(), Some('a'));
        assert_eq!(stream.advance().unwrap(), None);
    }

    #[test]
    fn test_read_stream_truncated_sequence_at_eof() {
        // 4字节序列只有首字节
        let mut stream = ReadStream::new(&[b'a', 0xF0][..]);

        assert_eq!(stream.advance().unwrap(), Some('a'));
        assert_eq!(stream.advance().unwrap(), Some(REPLACEMENT_CHAR));
        assert_eq!(stream.advance().unwrap(), None);
    }

    #[test]
    fn test_read_stream_keeps_bytes_after_bad_lead() {
        let bytes = [0xC3, b'"', b'a', b'b', b'"', b' ', b'z'];
        let expected = String::from_utf8_lossy(&bytes).into_owned();

        assert_eq!(drain(ReadStream::new(&bytes[..])), expected);
        assert_eq!(drain(ReadStream::new(ByteByByte(&bytes))), "\u{FFFD}\"ab\" z");
    }

    #[test]
    fn test_read_stream_truncated_lead_keeps_following_chars() {
        let bytes = [b'x', b' ', 0xF0, b'a', b'b'];

        assert_eq!(drain(ReadStream::new(&bytes[..])), "x \u{FFFD}ab");
    }

    #[test]
    fn test_read_stream_partial_sequence_is_one_replacement() {
        // 被截断但前缀合法的序列只替换为一个 U+FFFD
        let bytes = [0xF0, 0x9F, 0x8E, b'!'];
        let expected = String::from_utf8_lossy(&bytes).into_owned();

        assert_eq!(drain(ReadStream::new(&bytes[..])), expected);
        assert_eq!(expected, "\u{FFFD}!");
    }

    #[test]
    fn test_read_stream_io_error() {
        let mut stream = ReadStream::new(FailingReader);
        let err = stream.peek().unwrap_err();
        assert!(matches!(
            err,
            StreamError::Io {
                kind: io::ErrorKind::BrokenPipe,
                offset: 0,
                ..
            }
        ));
        assert!(err.to_string().contains("pipe closed"));
    }

    #[test]
    fn test_mut_ref_is_a_source() {
        fn take_one<S: CharSource>(mut source: S) -> Option<char> {
            source.advance().unwrap()
        }

        let mut stream = StringStream::from("xy");
        assert_eq!(take_one(&mut stream), Some('x'));
        assert_eq!(stream.remaining(), "y");
        assert_eq!(stream.position().column, 2);
    }
}
