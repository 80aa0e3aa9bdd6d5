//! CLI 格式化输出
//!
//! 提供命令行友好的 token 显示、错误显示和源码上下文打印。

use komparse_core::{LexerError, Token};
use serde::Serialize;

/// JSON 输出中的一条 token 记录
#[derive(Debug, Serialize)]
pub struct TokenRecord<'a> {
    pub categories: Vec<&'a str>,
    pub text: &'a str,
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

impl<'a> From<&'a Token> for TokenRecord<'a> {
    fn from(token: &'a Token) -> Self {
        let start = token.start();
        Self {
            categories: token.categories().iter().map(|c| c.as_str()).collect(),
            text: token.text(),
            line: start.line,
            column: start.column,
            byte_offset: start.byte_offset,
        }
    }
}

/// 文本格式：`CATEGORIES  line:col  "escaped text"`
pub fn format_token(token: &Token) -> String {
    let record = TokenRecord::from(token);
    format!(
        "{}  {}:{}  {:?}",
        record.categories.join("|"),
        record.line,
        record.column,
        record.text
    )
}

/// 打印错误并显示源代码上下文
pub fn print_error_with_source(e: &LexerError, source: &str) {
    eprintln!("❌ {}", e);
    for line in source_context(source, e.line(), e.column()) {
        eprintln!("{}", line);
    }
}

/// 渲染源代码上下文（显示错误行前后几行）
pub fn source_context(source: &str, error_line: usize, error_col: usize) -> Vec<String> {
    const CONTEXT_LINES: usize = 3; // 错误行前后显示的上下文行数

    let lines: Vec<&str> = source.lines().collect();
    let total_lines = lines.len();

    if error_line == 0 || error_line > total_lines {
        return Vec::new();
    }

    let start_line = error_line.saturating_sub(CONTEXT_LINES).max(1);
    let end_line = (error_line + CONTEXT_LINES).min(total_lines);
    let width = end_line.to_string().len();
    let separator = format!("{}|--", "-".repeat(width + 1));

    let mut out = vec![separator.clone()];
    for line_idx in start_line..=end_line {
        out.push(format!("{:>width$} | {}", line_idx, lines[line_idx - 1]));
        if line_idx == error_line {
            // 指向错误位置的标记
            let marker = " ".repeat(error_col.saturating_sub(1));
            out.push(format!("{} | {}^", " ".repeat(width), marker));
        }
    }
    out.push(separator);
    out
}
