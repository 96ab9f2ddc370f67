//! Validator, analyzer and fixer for FRR BGP configuration files
//!
//! Config files are read into a [`ConfigDocument`], a line-oriented view that
//! renders back byte for byte. [`validate`] checks BGP sections against a few
//! policy rules, [`analyze`] summarizes peers, policies and interfaces, and
//! [`fix_document`] inserts missing neighbor statements.

pub mod analyze;
pub mod config;
pub mod document;
pub mod error;
pub mod fix;
pub mod model;
pub mod utils;
pub mod validate;

#[cfg(feature = "cli")]
pub mod cli;

pub use analyze::{analyze, FileAnalysis};
pub use config::Settings;
pub use document::ConfigDocument;
pub use error::{Error, Result};
pub use fix::{fix_document, FixAction, FixOptions, FixOutcome, FixRun};
pub use validate::{validate, Finding, Report, Severity, Verdict};
