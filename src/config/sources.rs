//! Configuration sources, in precedence order.

pub mod env;
pub mod explicit_file;
pub mod global_file;
