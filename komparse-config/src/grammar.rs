//! Lexical grammar - the data a lexer is configured with
//!
//! Holds the whitespace set plus ordered comment and string delimiter specs.
//! Matching against these specs is plain suffix equality with first-match-wins
//! in configured order, so overlapping markers must be ordered deliberately.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Grammar configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("{kind} spec #{index} has an empty {which} marker")]
    EmptyMarker {
        kind: &'static str,
        index: usize,
        which: &'static str,
    },

    #[error("string spec #{index} has an empty escape marker")]
    EmptyEscape { index: usize },

    #[error("start marker {marker:?} contains whitespace character {ch:?} and can never match")]
    WhitespaceInMarker { marker: String, ch: char },

    /// Category and position reported by serde_json, kept as plain data so the error stays `Clone`
    #[error("invalid grammar JSON: {message}")]
    Json {
        category: serde_json::error::Category,
        line: usize,
        column: usize,
        message: String,
    },
}

impl From<serde_json::Error> for GrammarError {
    fn from(e: serde_json::Error) -> Self {
        GrammarError::Json {
            category: e.classify(),
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        }
    }
}

/// Set of whitespace characters
///
/// Serialized as a plain string, e.g. `" \t\r\n"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct WhitespaceSet(BTreeSet<char>);

impl WhitespaceSet {
    pub fn contains(&self, ch: char) -> bool {
        self.0.contains(&ch)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().copied()
    }
}

impl Default for WhitespaceSet {
    fn default() -> Self {
        WhitespaceSet::from(" \t\r\n")
    }
}

impl From<&str> for WhitespaceSet {
    fn from(chars: &str) -> Self {
        WhitespaceSet(chars.chars().collect())
    }
}

impl From<String> for WhitespaceSet {
    fn from(chars: String) -> Self {
        WhitespaceSet::from(chars.as_str())
    }
}

impl From<WhitespaceSet> for String {
    fn from(set: WhitespaceSet) -> Self {
        set.0.into_iter().collect()
    }
}

/// Comment delimiter spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSpec {
    pub start: String,
    pub end: String,
    /// Inner occurrences of `start` open a nested comment
    #[serde(default)]
    pub nestable: bool,
}

impl CommentSpec {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            nestable: false,
        }
    }

    pub fn nestable(mut self) -> Self {
        self.nestable = true;
        self
    }
}

/// String delimiter spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringSpec {
    pub start: String,
    pub end: String,
    /// Marker that turns the following character into a literal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escape: Option<String>,
    /// Extra category attached to tokens of this form (e.g. `DOUBLE_QUOTED`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl StringSpec {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            escape: None,
            name: None,
        }
    }

    pub fn with_escape(mut self, escape: impl Into<String>) -> Self {
        self.escape = Some(escape.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Lexical grammar
///
/// Built once, then shared read-only (typically behind an `Arc`) by any number of lexers.
///
/// # 示例
///
/// ```
/// use komparse_config::{LexGrammar, StringSpec};
///
/// let grammar = LexGrammar::new()
///     .add_comment("--", "\n")
///     .add_nested_comment("(*", "*)")
///     .add_string_spec(StringSpec::new("\"", "\"").with_escape("#"));
/// assert!(grammar.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LexGrammar {
    #[serde(default)]
    whitespace: WhitespaceSet,
    #[serde(default)]
    comments: Vec<CommentSpec>,
    #[serde(default)]
    strings: Vec<StringSpec>,
}

impl LexGrammar {
    /// Grammar with the default whitespace set and no delimiters
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_whitespace(mut self, whitespace: impl Into<WhitespaceSet>) -> Self {
        self.whitespace = whitespace.into();
        self
    }

    pub fn add_comment(self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.add_comment_spec(CommentSpec::new(start, end))
    }

    pub fn add_nested_comment(self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.add_comment_spec(CommentSpec::new(start, end).nestable())
    }

    pub fn add_comment_spec(mut self, spec: CommentSpec) -> Self {
        self.comments.push(spec);
        self
    }

    pub fn add_string(self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.add_string_spec(StringSpec::new(start, end))
    }

    pub fn add_string_spec(mut self, spec: StringSpec) -> Self {
        self.strings.push(spec);
        self
    }

    pub fn whitespace(&self) -> &WhitespaceSet {
        &self.whitespace
    }

    pub fn comments(&self) -> &[CommentSpec] {
        &self.comments
    }

    pub fn strings(&self) -> &[StringSpec] {
        &self.strings
    }

    pub fn is_whitespace(&self, ch: char) -> bool {
        self.whitespace.contains(ch)
    }

    /// First comment spec whose start marker is a suffix of `chars`
    pub fn comment_start(&self, chars: &str) -> Option<&CommentSpec> {
        self.comments.iter().find(|spec| chars.ends_with(&spec.start))
    }

    /// First string spec whose start marker is a suffix of `chars`
    pub fn string_start(&self, chars: &str) -> Option<&StringSpec> {
        self.strings.iter().find(|spec| chars.ends_with(&spec.start))
    }

    /// Check that every spec can actually match
    pub fn validate(&self) -> Result<(), GrammarError> {
        for (index, spec) in self.comments.iter().enumerate() {
            self.check_markers("comment", index, &spec.start, &spec.end)?;
        }
        for (index, spec) in self.strings.iter().enumerate() {
            self.check_markers("string", index, &spec.start, &spec.end)?;
            if spec.escape.as_deref() == Some("") {
                return Err(GrammarError::EmptyEscape { index });
            }
        }
        Ok(())
    }

    fn check_markers(
        &self,
        kind: &'static str,
        index: usize,
        start: &str,
        end: &str,
    ) -> Result<(), GrammarError> {
        if start.is_empty() {
            return Err(GrammarError::EmptyMarker {
                kind,
                index,
                which: "start",
            });
        }
        if end.is_empty() {
            return Err(GrammarError::EmptyMarker {
                kind,
                index,
                which: "end",
            });
        }
        // Std 状态遇到空白即结束，含空白的起始标记永远无法匹配
        if let Some(ch) = start.chars().find(|&c| self.is_whitespace(c)) {
            return Err(GrammarError::WhitespaceInMarker {
                marker: start.to_string(),
                ch,
            });
        }
        Ok(())
    }

    /// Parse and validate a grammar from JSON
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        let grammar: LexGrammar = serde_json::from_str(json)?;
        grammar.validate()?;
        Ok(grammar)
    }

    pub fn to_json(&self) -> Result<String, GrammarError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
