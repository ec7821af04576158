//! smellscan - code smell detection for Python sources.
//!
//! Each file is parsed once into an owned syntax tree; every enabled
//! detector then inspects the tree (or, for duplicated code, the raw text)
//! and contributes findings to a per-file report. A failure in one file or
//! one detector never affects the others.
//!
//! # Architecture
//!
//! - `syntax`: tree-sitter based parser producing [`SyntaxTree`]
//! - `detect`: the six smell detectors and the [`Analyzer`] that runs them
//! - `report`: per-file and batch reports, JSON and pretty output
//! - `config`: YAML configuration schema
//! - `error`: per-file error taxonomy
//! - `cli`: command-line interface

pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod report;
pub mod syntax;

pub use config::{Config, SmellSelection, Thresholds};
pub use detect::{Analyzer, Detector, Finding, SmellCategory};
pub use error::AnalysisError;
pub use report::{BatchReport, CategoryResult, MergeMode, Report};
pub use syntax::SyntaxTree;
