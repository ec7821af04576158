//! Error taxonomy for per-file analysis.
//!
//! None of these are fatal to a batch: the runner downgrades read and parse
//! failures to an empty report and detector failures to an empty category.

use thiserror::Error;

use crate::detect::SmellCategory;

/// Errors that can occur while analyzing a single file.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("syntax error in {file}: {description}")]
    Parse { file: String, description: String },
    #[error("{category} detector failed: {message}")]
    Detector {
        category: SmellCategory,
        message: String,
    },
}

impl AnalysisError {
    pub fn parse(file: &str, description: impl Into<String>) -> Self {
        AnalysisError::Parse {
            file: file.to_string(),
            description: description.into(),
        }
    }

    /// A node did not have the shape its kind promises.
    pub fn shape(category: SmellCategory, message: impl Into<String>) -> Self {
        AnalysisError::Detector {
            category,
            message: message.into(),
        }
    }
}
