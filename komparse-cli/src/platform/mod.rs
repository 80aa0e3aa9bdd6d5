//! 平台相关输出

mod cli;

pub use cli::{format_token, print_error_with_source, TokenRecord};
