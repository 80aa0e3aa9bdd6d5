//! 词法分析核心基础设施：位置追踪与字符源

mod position;
mod stream;

pub use position::{SourcePosition, SourceSpan};
pub use stream::{CharSource, ReadStream, StreamError, StringStream};
