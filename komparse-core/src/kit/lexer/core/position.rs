//! 源代码位置追踪
//!
//! 支持多坐标系统，满足不同场景需求：
//! - line/column: 人类可读的错误显示（1-based）
//! - byte_offset: 切片原始输入、重建源码（0-based）
//! - utf16_column: LSP协议通信（0-based，UTF-16单元）

use serde::Serialize;

/// 源代码位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourcePosition {
    /// 行号，1-based
    pub line: usize,
    /// 列号，1-based，Unicode码点计数
    pub column: usize,
    /// 字节偏移，0-based，UTF-8编码
    pub byte_offset: usize,
    /// 行内UTF-16偏移，0-based
    pub utf16_column: usize,
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::start()
    }
}

impl SourcePosition {
    pub fn new(line: usize, column: usize, byte_offset: usize, utf16_column: usize) -> Self {
        Self {
            line,
            column,
            byte_offset,
            utf16_column,
        }
    }

    /// 输入起始位置
    pub fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            byte_offset: 0,
            utf16_column: 0,
        }
    }

    /// 前进一个字符
    pub fn advance(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
            self.column = 1;
            self.utf16_column = 0;
        } else {
            self.column += 1;
            self.utf16_column += c.len_utf16();
        }

        self.byte_offset += c.len_utf8();
    }

    /// 返回越过 `text` 之后的位置（不修改自身）
    ///
    /// 读取状态只记录起点，终点由已捕获文本推算。
    pub fn advanced_by(&self, text: &str) -> Self {
        let mut pos = *self;
        for c in text.chars() {
            pos.advance(c);
        }
        pos
    }
}

/// 源代码区间（Span），end 为开区间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceSpan {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceSpan {
    pub fn at(pos: SourcePosition) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn range(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    /// 从起点和该区间覆盖的文本构造
    pub fn covering(start: SourcePosition, text: &str) -> Self {
        Self {
            start,
            end: start.advanced_by(text),
        }
    }

    /// 字节长度
    pub fn len(&self) -> usize {
        self.end.byte_offset - self.start.byte_offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_start() {
        let pos = SourcePosition::start();
        assert_eq!(pos, SourcePosition::new(1, 1, 0, 0));
        assert_eq!(SourcePosition::default(), pos);
    }

    #[test]
    fn test_position_advance_ascii() {
        let mut pos = SourcePosition::start();

        pos.advance('a');
        assert_eq!(pos.column, 2);
        assert_eq!(pos.byte_offset, 1);
        assert_eq!(pos.utf16_column, 1);
    }

    #[test]
    fn test_position_advance_newline() {
        let mut pos = SourcePosition::start();

        pos.advance('a');
        pos.advance('\n');

        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 1);
        assert_eq!(pos.utf16_column, 0);
        assert_eq!(pos.byte_offset, 2);
    }

    #[test]
    fn test_position_advance_wide_chars() {
        let mut pos = SourcePosition::start();

        // CJK字符：3字节UTF-8，1个UTF-16单元
        pos.advance('中');
        assert_eq!(pos.byte_offset, 3);
        assert_eq!(pos.utf16_column, 1);

        // Emoji：4字节UTF-8，2个UTF-16单元
        pos.advance('🎉');
        assert_eq!(pos.column, 3);
        assert_eq!(pos.byte_offset, 7);
        assert_eq!(pos.utf16_column, 3);
    }

    #[test]
    fn test_advanced_by() {
        let start = SourcePosition::new(2, 5, 10, 4);
        let end = start.advanced_by("ab\ncd");
        assert_eq!(end, SourcePosition::new(3, 3, 15, 2));
        // 原位置不变
        assert_eq!(start.column, 5);
    }

    #[test]
    fn test_span_covering() {
        let span = SourceSpan::covering(SourcePosition::start(), "(* x *)");
        assert_eq!(span.end.column, 8);
        assert_eq!(span.len(), 7);
        assert!(!span.is_empty());
        assert!(SourceSpan::at(SourcePosition::start()).is_empty());
    }
}
