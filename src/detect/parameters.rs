//! Detection of long parameter and argument lists.
//!
//! Two checks share one category: declarations with too many
//! positional-or-keyword parameters, and call sites passing too many
//! arguments.

use crate::error::AnalysisError;
use crate::syntax::{CallExpression, Node, NodeKind};

use super::{snippet_or, Detector, DetectorInput, Finding, SmellCategory};

/// Callee name used when the called expression is neither a plain name
/// nor an attribute access.
const UNKNOWN_CALLEE: &str = "unknown";

pub struct LargeParameterListDetector {
    pub max_parameters: usize,
    pub max_call_arguments: usize,
}

impl LargeParameterListDetector {
    fn check_declarations(&self, input: &DetectorInput<'_>, findings: &mut Vec<Finding>) {
        for (node, func) in input.tree.functions() {
            let mut param_count = func.regular_parameters().count();
            if func.receiver().is_some() {
                param_count -= 1;
            }

            if param_count > self.max_parameters {
                findings.push(Finding::new(
                    SmellCategory::LargeParameterList,
                    input.file,
                    (node.span.start_line, node.span.end_line),
                    format!("Function '{}' has {} parameters.", func.name, param_count),
                    snippet_or(input.tree.snippet(node), || func.name.clone()),
                ));
            }
        }
    }

    fn check_calls(
        &self,
        input: &DetectorInput<'_>,
        findings: &mut Vec<Finding>,
    ) -> Result<(), AnalysisError> {
        for node in input.tree.walk() {
            let Some(call) = node.as_call() else {
                continue;
            };
            let total = call.total_args();
            if total <= self.max_call_arguments {
                continue;
            }

            let name = callee_name(node, call)?;
            let line = node.span.start_line;
            findings.push(Finding::new(
                SmellCategory::LargeParameterList,
                input.file,
                (line, line),
                format!("Function call '{}' has {} arguments.", name, total),
                snippet_or(input.tree.snippet(node), || total.to_string()),
            ));
        }
        Ok(())
    }
}

impl Detector for LargeParameterListDetector {
    fn category(&self) -> SmellCategory {
        SmellCategory::LargeParameterList
    }

    fn run(
        &self,
        input: &DetectorInput<'_>,
        findings: &mut Vec<Finding>,
    ) -> Result<(), AnalysisError> {
        self.check_declarations(input, findings);
        self.check_calls(input, findings)
    }
}

fn callee_name<'a>(node: &'a Node, call: &CallExpression) -> Result<&'a str, AnalysisError> {
    let callee = node.children.first().ok_or_else(|| {
        AnalysisError::shape(
            SmellCategory::LargeParameterList,
            format!(
                "call with {} arguments at line {} has no callee",
                call.total_args(),
                node.span.start_line
            ),
        )
    })?;

    Ok(match &callee.kind {
        NodeKind::Identifier(name) | NodeKind::AttributeAccess(name) => name,
        _ => UNKNOWN_CALLEE,
    })
}
