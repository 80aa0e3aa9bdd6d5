//! Komparse Config - Pure configuration data structures
//!
//! This crate contains only data structures, no global state.
//! It serves as the shared configuration vocabulary across all Komparse crates:
//! the lexical grammar a lexer is built from, and the policy knobs of the lexer itself.

mod grammar;

pub use grammar::{CommentSpec, GrammarError, LexGrammar, StringSpec, WhitespaceSet};

use serde::{Deserialize, Serialize};

/// Lexer behavior configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexerConfig {
    /// Fail with an unterminated-comment error when input ends inside a comment.
    /// When false, the partial comment is emitted as a COMMENT token.
    pub strict_comments: bool,
    /// Maximum nesting depth of nestable comments
    pub max_comment_depth: usize,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            strict_comments: true,
            max_comment_depth: 128,
        }
    }
}

impl LexerConfig {
    /// Reference behavior: close a comment at end of input instead of failing
    pub fn lenient() -> Self {
        Self {
            strict_comments: false,
            ..Self::default()
        }
    }
}

/// Component enum for component-specific log configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Token driver (buffering, pull API)
    Lexer,
    /// Reader states (Std/Whitespace/Comment/String)
    Reader,
    /// Character sources
    Source,
    /// Command line driver
    Cli,
}

impl Phase {
    /// All phases, in target-nesting order
    pub const ALL: [Phase; 4] = [Phase::Lexer, Phase::Reader, Phase::Source, Phase::Cli];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Lexer => "lexer",
            Phase::Reader => "reader",
            Phase::Source => "source",
            Phase::Cli => "cli",
        }
    }

    /// Get the log target name for this phase
    ///
    /// Must stay in sync with the `target:` literals used by komparse-core.
    pub fn target(&self) -> &'static str {
        match self {
            Phase::Lexer => "komparse::lexer",
            Phase::Reader => "komparse::lexer::reader",
            Phase::Source => "komparse::lexer::source",
            Phase::Cli => "komparse::cli",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lexer_config() {
        let cfg = LexerConfig::default();
        assert!(cfg.strict_comments);
        assert_eq!(cfg.max_comment_depth, 128);
    }

    #[test]
    fn test_lenient_lexer_config() {
        let cfg = LexerConfig::lenient();
        assert!(!cfg.strict_comments);
        assert_eq!(cfg.max_comment_depth, 128);
    }

    #[test]
    fn test_lexer_config_partial_json() {
        let cfg: LexerConfig = serde_json::from_str(r#"{"max_comment_depth": 4}"#).unwrap();
        assert!(cfg.strict_comments);
        assert_eq!(cfg.max_comment_depth, 4);
    }

    #[test]
    fn test_phase_as_str() {
        assert_eq!(Phase::Lexer.as_str(), "lexer");
        assert_eq!(Phase::Reader.target(), "komparse::lexer::reader");
        assert_eq!(Phase::Cli.target(), "komparse::cli");
    }
}
