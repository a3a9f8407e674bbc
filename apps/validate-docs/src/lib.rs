//! validate-docs core library.
//!
//! This crate exposes programmatic APIs for extracting fenced code snippets
//! from documentation and validating them with per-language checkers.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `scan`: Document discovery under a root directory.
//! - `extract`: Fenced code block extraction with line provenance.
//! - `classify`: Language tag normalization and the executable allow-list.
//! - `checker`: Checker capability, cancellation, external-command adapter.
//! - `runner`: Parallel, timeout-bounded snippet validation.
//! - `report`: Deterministic aggregation of results.
//! - `validate`: Pipeline entry points.
//! - `models`: Documents, snippets and results.
//! - `output`: Human/JSON printers.
//! - `error`: Error taxonomy.
//! - `utils`: Supporting helpers.
pub mod checker;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod output;
pub mod report;
pub mod runner;
pub mod scan;
pub mod utils;
pub mod validate;
