//! Detection of god classes.
//!
//! A class is flagged when it declares too many methods, or too many
//! methods and class-level attributes together. Only direct members count;
//! nested classes are measured on their own.

use crate::error::AnalysisError;
use crate::syntax::NodeKind;

use super::{snippet_or, Detector, DetectorInput, Finding, SmellCategory};

pub struct GodClassDetector {
    pub max_methods: usize,
    pub max_members: usize,
}

impl Detector for GodClassDetector {
    fn category(&self) -> SmellCategory {
        SmellCategory::GodClass
    }

    fn run(
        &self,
        input: &DetectorInput<'_>,
        findings: &mut Vec<Finding>,
    ) -> Result<(), AnalysisError> {
        for (node, class) in input.tree.classes() {
            let body = node.body().ok_or_else(|| {
                AnalysisError::shape(
                    self.category(),
                    format!("class '{}' at line {} has no body", class.name, node.span.start_line),
                )
            })?;

            let method_count = body
                .children
                .iter()
                .filter(|m| m.as_function().is_some())
                .count();
            let attr_count = body
                .children
                .iter()
                .filter(|m| matches!(m.kind, NodeKind::Assignment))
                .count();

            if method_count > self.max_methods || method_count + attr_count > self.max_members {
                findings.push(Finding::new(
                    self.category(),
                    input.file,
                    (node.span.start_line, node.span.end_line),
                    format!(
                        "Class '{}' has {} methods and {} attributes.",
                        class.name, method_count, attr_count
                    ),
                    snippet_or(input.tree.snippet(node), || class.name.clone()),
                ));
            }
        }
        Ok(())
    }
}
