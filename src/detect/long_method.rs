//! Detection of functions with too many statements.
//!
//! Statements are counted recursively through `if` and `for` bodies so a
//! short function hiding a large loop is still reported.

use crate::error::AnalysisError;
use crate::syntax::{Node, NodeKind};

use super::{snippet_or, Detector, DetectorInput, Finding, SmellCategory};

pub struct LongMethodDetector {
    pub max_statements: usize,
}

impl Detector for LongMethodDetector {
    fn category(&self) -> SmellCategory {
        SmellCategory::LongMethod
    }

    fn run(
        &self,
        input: &DetectorInput<'_>,
        findings: &mut Vec<Finding>,
    ) -> Result<(), AnalysisError> {
        for (node, func) in input.tree.functions() {
            let body = node.body().ok_or_else(|| {
                AnalysisError::shape(
                    self.category(),
                    format!("function '{}' at line {} has no body", func.name, node.span.start_line),
                )
            })?;

            let statement_count = count_statements(&body.children);
            tracing::debug!(
                file = input.file,
                function = %func.name,
                line = node.span.start_line,
                statement_count,
                "counted statements"
            );

            if statement_count > self.max_statements {
                findings.push(Finding::new(
                    self.category(),
                    input.file,
                    (node.span.start_line, node.span.end_line),
                    format!("Function '{}' has {} statements.", func.name, statement_count),
                    snippet_or(input.tree.snippet(node), || func.name.clone()),
                ));
            }
        }
        Ok(())
    }
}

/// Count statements the way LongMethod measures them.
///
/// Assignments, augmented assignments, returns and bare expressions count
/// one each. An `if` counts one plus its body and else-branch; a `for`
/// counts one plus its body. Anything else counts nothing.
pub fn count_statements(statements: &[Node]) -> usize {
    statements.iter().map(statement_weight).sum()
}

fn statement_weight(statement: &Node) -> usize {
    match statement.kind {
        NodeKind::Assignment
        | NodeKind::AugmentedAssignment
        | NodeKind::ReturnStatement
        | NodeKind::ExpressionStatement => 1,
        NodeKind::ForStatement => 1 + count_statements(statement.body_statements()),
        NodeKind::IfStatement => {
            let else_count = statement
                .else_branch()
                .map(|branch| count_statements(&branch.children))
                .unwrap_or(0);
            1 + count_statements(statement.body_statements()) + else_count
        }
        _ => 0,
    }
}
