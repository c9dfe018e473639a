//! Property-based tests

mod determinism;
mod merge_laws;
