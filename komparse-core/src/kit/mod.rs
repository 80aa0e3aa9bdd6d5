//! 通用工具组件

pub mod lexer;
