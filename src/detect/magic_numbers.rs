//! Detection of magic numbers.

use crate::error::AnalysisError;
use crate::syntax::NodeKind;

use super::{Detector, DetectorInput, Finding, SmellCategory};

/// Numbers common enough to never count as magic.
const ALLOWED_NUMBERS: [f64; 4] = [0.0, 1.0, -1.0, 2.0];

pub struct MagicNumbersDetector;

impl Detector for MagicNumbersDetector {
    fn category(&self) -> SmellCategory {
        SmellCategory::MagicNumbers
    }

    fn run(
        &self,
        input: &DetectorInput<'_>,
        findings: &mut Vec<Finding>,
    ) -> Result<(), AnalysisError> {
        for node in input.tree.walk() {
            let NodeKind::Constant(constant) = &node.kind else {
                continue;
            };
            let Some(value) = constant.numeric_value() else {
                continue;
            };
            if is_allowed(value) {
                continue;
            }

            let line = node.span.start_line;
            findings.push(Finding::new(
                self.category(),
                input.file,
                (line, line),
                format!(
                    "Magic number {} detected. Consider replacing with a named constant.",
                    constant
                ),
                constant.to_string(),
            ));
        }
        Ok(())
    }
}

fn is_allowed(value: f64) -> bool {
    ALLOWED_NUMBERS.contains(&value) || ALLOWED_NUMBERS.contains(&value.abs())
}
