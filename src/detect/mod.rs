//! Code smell detectors.
//!
//! Each detector inspects one file, either through its syntax tree or its
//! raw text, and appends findings for exactly one [`SmellCategory`].

mod duplicates;
mod feature_envy;
mod god_class;
mod long_method;
mod magic_numbers;
mod parameters;
mod runner;
mod types;

pub use duplicates::DuplicatedCodeDetector;
pub use feature_envy::FeatureEnvyDetector;
pub use god_class::GodClassDetector;
pub use long_method::{count_statements, LongMethodDetector};
pub use magic_numbers::MagicNumbersDetector;
pub use parameters::LargeParameterListDetector;
pub use runner::Analyzer;
pub use types::{snippet_or, Finding, SmellCategory};

use crate::config::Thresholds;
use crate::error::AnalysisError;
use crate::syntax::SyntaxTree;

/// Everything a detector may look at for one file.
pub struct DetectorInput<'a> {
    /// File identifier recorded on every finding.
    pub file: &'a str,
    /// Raw source text.
    pub text: &'a str,
    pub tree: &'a SyntaxTree<'a>,
}

/// A single smell detector.
pub trait Detector: Send + Sync {
    fn category(&self) -> SmellCategory;

    /// Append this detector's findings for one file.
    ///
    /// Returns an error only when the tree does not have the shape its node
    /// kinds promise; the runner then drops this category for the file.
    fn run(&self, input: &DetectorInput<'_>, findings: &mut Vec<Finding>)
        -> Result<(), AnalysisError>;
}

/// Build one detector per category, configured with `thresholds`.
pub fn detector_for(category: SmellCategory, thresholds: &Thresholds) -> Box<dyn Detector> {
    match category {
        SmellCategory::LongMethod => Box::new(LongMethodDetector {
            max_statements: thresholds.long_method_statements,
        }),
        SmellCategory::GodClass => Box::new(GodClassDetector {
            max_methods: thresholds.god_class_methods,
            max_members: thresholds.god_class_members,
        }),
        SmellCategory::DuplicatedCode => Box::new(DuplicatedCodeDetector {
            min_length: thresholds.duplicate_min_length,
            window: thresholds.duplicate_window.max(1),
        }),
        SmellCategory::LargeParameterList => Box::new(LargeParameterListDetector {
            max_parameters: thresholds.max_parameters,
            max_call_arguments: thresholds.max_call_arguments,
        }),
        SmellCategory::MagicNumbers => Box::new(MagicNumbersDetector),
        SmellCategory::FeatureEnvy => Box::new(FeatureEnvyDetector {
            max_calls: thresholds.feature_envy_calls,
        }),
    }
}
