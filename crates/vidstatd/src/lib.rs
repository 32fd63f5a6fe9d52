//! Vidstat daemon - answers Russian-language analytics questions about
//! video statistics with a single integer.
//!
//! Pipeline per request: raw text -> parser facade (generative path with
//! a total heuristic fallback) -> validated `QueryIntent` -> whitelisted
//! parameterized aggregate over SQLite -> non-negative integer. No
//! failure anywhere in the pipeline ever reaches the caller; every
//! breakdown collapses into the fallback path or the answer `0`.

pub mod answers;
pub mod compile;
pub mod config;
pub mod error;
pub mod extract;
pub mod heuristic;
pub mod ingest;
pub mod llm;
pub mod parser;
pub mod store;
