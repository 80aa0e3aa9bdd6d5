//! Komparse Core - Grammar-configurable lexer (pure logic, no global state)
//!
//! Turns a character stream into a lazy sequence of TERM / STRING / COMMENT tokens.
//! Classifying TERM text into keywords or typed tokens is left to downstream layers.
//!
//! Configuration is passed explicitly via parameters, not via global state.

pub mod kit;

// Re-export common types
pub use kit::lexer::{
    tokenize, Category, CharSource, ErrorKind, Lexer, LexerError, ReadStream, SourcePosition,
    SourceSpan, StreamError, StringStream, Token,
};

// Re-export config types from komparse-config
pub use komparse_config::{CommentSpec, GrammarError, LexGrammar, LexerConfig, Phase, StringSpec};
