//! Token 定义
//!
//! Token 创建后不可变：字段私有，只提供只读访问。

use std::fmt;

use serde::Serialize;

use super::core::{SourcePosition, SourceSpan};

/// 词法类别标签
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    /// 不含空白、不以注释/字符串起始标记结尾的最长字符串
    Term,
    /// 完整的字符串字面量（含定界符）
    String,
    /// 完整的注释（含定界符）
    Comment,
    /// 语法中为某种定界形式指定的名字（如 `DOUBLE_QUOTED`）
    Named(std::string::String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Term => "TERM",
            Category::String => "STRING",
            Category::Comment => "COMMENT",
            Category::Named(name) => name,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token：类别标签（有序）+ 原始文本 + 区间
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    categories: Vec<Category>,
    text: String,
    span: SourceSpan,
}

impl Token {
    /// 创建 token，主类别总在第一位；区间由起点和文本推算
    fn new(category: Category, text: impl Into<String>, start: SourcePosition) -> Self {
        let text = text.into();
        let span = SourceSpan::covering(start, &text);
        Self {
            categories: vec![category],
            text,
            span,
        }
    }

    pub fn term(text: impl Into<String>, start: SourcePosition) -> Self {
        Self::new(Category::Term, text, start)
    }

    pub fn comment(text: impl Into<String>, start: SourcePosition) -> Self {
        Self::new(Category::Comment, text, start)
    }

    /// 字符串 token；若定界形式有名字，名字作为第二个类别
    pub fn string(text: impl Into<String>, start: SourcePosition, name: Option<&str>) -> Self {
        let mut token = Self::new(Category::String, text, start);
        if let Some(name) = name {
            token.categories.push(Category::Named(name.to_string()));
        }
        token
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// 主类别（TERM / STRING / COMMENT）
    pub fn category(&self) -> &Category {
        &self.categories[0]
    }

    pub fn is(&self, category: &Category) -> bool {
        self.categories.contains(category)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn span(&self) -> SourceSpan {
        self.span
    }

    pub fn start(&self) -> SourcePosition {
        self.span.start
    }

    pub fn end(&self) -> SourcePosition {
        self.span.end
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.categories.iter().map(Category::as_str).collect();
        write!(f, "{}({:?})", names.join("|"), self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_token() {
        let token = Token::term("SELECT", SourcePosition::start());
        assert_eq!(token.categories(), &[Category::Term]);
        assert_eq!(token.category(), &Category::Term);
        assert_eq!(token.text(), "SELECT");
        assert_eq!(token.end().column, 7);
        assert_eq!(token.span().len(), 6);
    }

    #[test]
    fn test_named_string_token() {
        let token = Token::string("\"x\"", SourcePosition::start(), Some("DOUBLE_QUOTED"));
        assert_eq!(
            token.categories(),
            &[Category::String, Category::Named("DOUBLE_QUOTED".to_string())]
        );
        assert_eq!(token.category(), &Category::String);
        assert!(token.is(&Category::Named("DOUBLE_QUOTED".to_string())));
        assert!(!token.is(&Category::Comment));
    }

    #[test]
    fn test_multiline_comment_span() {
        let start = SourcePosition::new(3, 5, 20, 4);
        let token = Token::comment("-- hi\n", start);
        assert_eq!(token.start(), start);
        assert_eq!(token.end().line, 4);
        assert_eq!(token.end().column, 1);
        assert_eq!(token.end().byte_offset, 26);
    }

    #[test]
    fn test_primary_category_comes_first() {
        let start = SourcePosition::start();
        let tokens = [
            Token::term("", start),
            Token::comment("", start),
            Token::string("", start, None),
            Token::string("", start, Some("NAMED")),
        ];

        for token in &tokens {
            assert!(!token.categories().is_empty());
            assert_eq!(token.category(), &token.categories()[0]);
        }
        assert_eq!(tokens[3].category(), &Category::String);
    }

    #[test]
    fn test_display() {
        let token = Token::string("'a'", SourcePosition::start(), Some("SINGLE"));
        assert_eq!(token.to_string(), "STRING|SINGLE(\"'a'\")");
        assert_eq!(Category::Comment.to_string(), "COMMENT");
    }
}
