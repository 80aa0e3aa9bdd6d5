//! Komparse CLI - Command line interface
//!
//! Streams a file through the lexer and prints one line per token.

use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

mod config;
mod logging;
mod platform;

use crate::config::{parse_log_level, LogConfig};
use crate::logging::LogFormat;
use crate::platform::{format_token, print_error_with_source, TokenRecord};
use komparse_core::{LexGrammar, Lexer, LexerConfig, ReadStream, Token};
use tracing::{debug, info, Level};

/// Token 输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// `CATEGORIES  line:col  "text"`
    Text,
    /// 每行一个 JSON 对象
    Json,
}

#[derive(Parser)]
#[command(
    name = "komparse",
    about = "Tokenize a file with a configurable lexical grammar",
    version = "0.1.0"
)]
struct Cli {
    /// File to tokenize
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Lexical grammar (JSON); defaults to plain whitespace splitting
    #[arg(long, value_name = "FILE")]
    grammar: Option<PathBuf>,

    /// Token output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Emit a comment cut off by end of input instead of failing
    #[arg(long)]
    lenient_comments: bool,

    /// Global log level: silent, error, warn, info, debug, trace
    #[arg(long, value_name = "LEVEL", value_parser = parse_log_level, default_value = "warn")]
    log_level: Level,

    /// Log level override for the token driver
    #[arg(long, value_name = "LEVEL", value_parser = parse_log_level)]
    log_lexer: Option<Level>,

    /// Log level override for the reader states
    #[arg(long, value_name = "LEVEL", value_parser = parse_log_level)]
    log_reader: Option<Level>,

    /// Log level override for the character source
    #[arg(long, value_name = "LEVEL", value_parser = parse_log_level)]
    log_source: Option<Level>,

    /// Log output format
    #[arg(long, value_enum, default_value = "compact")]
    log_format: LogFormat,
}

impl Cli {
    fn log_config(&self) -> LogConfig {
        LogConfig {
            global: self.log_level,
            lexer: self.log_lexer,
            reader: self.log_reader,
            source: self.log_source,
        }
    }

    fn lexer_config(&self) -> LexerConfig {
        if self.lenient_comments {
            LexerConfig::lenient()
        } else {
            LexerConfig::default()
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_config(), cli.log_format) {
        eprintln!("Error: Cannot initialize logging: {}", e);
        process::exit(1);
    }

    let grammar = match read_grammar(cli.grammar.as_deref()) {
        Ok(g) => Arc::new(g),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let file = match File::open(&cli.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!(
                "Error: Cannot read input file '{}': {}",
                cli.input.display(),
                e
            );
            process::exit(1);
        }
    };

    info!(target: "komparse::cli", input = %cli.input.display(), "Tokenizing");
    let lexer = match Lexer::with_config(ReadStream::new(file), grammar, cli.lexer_config()) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("❌ {}", e);
            process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut count = 0usize;
    for item in lexer {
        match item {
            Ok(token) => {
                if let Err(e) = write_token(&mut out, &token, cli.format) {
                    // 下游关闭管道时静默退出
                    if e.kind() == io::ErrorKind::BrokenPipe {
                        return;
                    }
                    eprintln!("Error: Cannot write output: {}", e);
                    process::exit(1);
                }
                count += 1;
            }
            Err(e) => {
                flush_tokens(&mut out);
                let source = read_source_lossy(&cli.input);
                print_error_with_source(&e, &source);
                process::exit(1);
            }
        }
    }
    debug!(target: "komparse::cli", tokens = count, "Done");
}

/// Read and validate the grammar file
fn read_grammar(path: Option<&Path>) -> Result<LexGrammar, String> {
    let Some(path) = path else {
        return Ok(LexGrammar::new());
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read grammar '{}': {}", path.display(), e))?;

    LexGrammar::from_json(&content)
        .map_err(|e| format!("Invalid grammar '{}': {}", path.display(), e))
}

fn write_token<W: Write>(out: &mut W, token: &Token, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", format_token(token)),
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, &TokenRecord::from(token))?;
            writeln!(out)
        }
    }
}

/// 报告错误前刷新已输出的 token，刷新失败只记录日志
fn flush_tokens<W: Write>(out: &mut W) {
    if let Err(e) = out.flush() {
        debug!(target: "komparse::cli", error = %e, "Flushing token output failed");
    }
}

/// 错误报告时重新读取源码用于显示上下文
fn read_source_lossy(path: &Path) -> String {
    std::fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use komparse_core::SourcePosition;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["komparse", "input.sql"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.log_format, LogFormat::Compact);
        assert_eq!(cli.log_level, Level::WARN);
        assert!(cli.lexer_config().strict_comments);
    }

    #[test]
    fn test_cli_options() {
        let cli = Cli::try_parse_from([
            "komparse",
            "input.sql",
            "--grammar",
            "sql.json",
            "--format",
            "json",
            "--lenient-comments",
            "--log-reader",
            "trace",
        ])
        .unwrap();
        assert_eq!(cli.grammar, Some(PathBuf::from("sql.json")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(!cli.lexer_config().strict_comments);
        assert_eq!(cli.log_config().reader, Some(Level::TRACE));
    }

    #[test]
    fn test_missing_grammar_file() {
        let err = read_grammar(Some(Path::new("/nonexistent/grammar.json"))).unwrap_err();
        assert!(err.starts_with("Cannot read grammar"));
        assert!(read_grammar(None).unwrap().comments().is_empty());
    }

    #[test]
    fn test_flush_failure_is_logged() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || flush_tokens(&mut ClosedPipe));

        let output = String::from_utf8_lossy(&logs.0.lock().unwrap()).into_owned();
        assert!(output.contains("Flushing token output failed"), "got: {output}");
        assert!(output.contains("pipe closed"), "got: {output}");
    }

    #[test]
    fn test_write_json_line() {
        let mut buf = Vec::new();
        let token = Token::term("SELECT", SourcePosition::start());
        write_token(&mut buf, &token, OutputFormat::Json).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\"categories\":[\"TERM\"],\"text\":\"SELECT\",\"line\":1,\"column\":1,\"byte_offset\":0}\n"
        );
    }
}
