//! Detection of feature envy.
//!
//! A function envies another object when it keeps calling the same method
//! on something other than `self`. Calls are tallied by method name across
//! the whole function body, nested definitions included.

use std::collections::{BTreeSet, HashMap};

use crate::error::AnalysisError;
use crate::syntax::{Node, NodeKind, RECEIVER_NAME};

use super::{snippet_or, Detector, DetectorInput, Finding, SmellCategory};

pub struct FeatureEnvyDetector {
    pub max_calls: usize,
}

/// Per-method call counts in first-seen order.
#[derive(Default)]
struct CallTally<'a> {
    counts: Vec<(&'a str, usize)>,
    index: HashMap<&'a str, usize>,
}

impl<'a> CallTally<'a> {
    fn add(&mut self, method: &'a str) {
        match self.index.get(method) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(method, self.counts.len());
                self.counts.push((method, 1));
            }
        }
    }
}

impl Detector for FeatureEnvyDetector {
    fn category(&self) -> SmellCategory {
        SmellCategory::FeatureEnvy
    }

    fn run(
        &self,
        input: &DetectorInput<'_>,
        findings: &mut Vec<Finding>,
    ) -> Result<(), AnalysisError> {
        for (node, func) in input.tree.functions() {
            let own_attributes = self_attributes(node);
            let tally = self.external_calls(node)?;

            tracing::debug!(
                file = input.file,
                function = %func.name,
                self_attributes = ?own_attributes,
                external_methods = tally.counts.len(),
                "collected method usage"
            );

            for (method, count) in tally.counts {
                if count > self.max_calls {
                    findings.push(Finding::new(
                        self.category(),
                        input.file,
                        (node.span.start_line, node.span.end_line),
                        format!(
                            "Function '{}' calls external method '{}' {} times.",
                            func.name, method, count
                        ),
                        snippet_or(input.tree.snippet(node), || func.name.clone()),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl FeatureEnvyDetector {
    fn external_calls<'a>(&self, function: &'a Node) -> Result<CallTally<'a>, AnalysisError> {
        let mut tally = CallTally::default();

        for node in function.walk() {
            if node.as_call().is_none() {
                continue;
            }
            let Some(callee) = node.children.first() else {
                continue;
            };
            let NodeKind::AttributeAccess(method) = &callee.kind else {
                continue;
            };

            let object = callee.children.first().ok_or_else(|| {
                AnalysisError::shape(
                    self.category(),
                    format!(
                        "attribute '{}' at line {} has no object",
                        method, callee.span.start_line
                    ),
                )
            })?;
            if object.is_identifier(RECEIVER_NAME) {
                continue;
            }
            tally.add(method);
        }

        Ok(tally)
    }
}

/// Attributes read or written through `self` inside `function`.
fn self_attributes(function: &Node) -> BTreeSet<&str> {
    function
        .walk()
        .filter_map(|node| match &node.kind {
            NodeKind::AttributeAccess(attr)
                if node
                    .children
                    .first()
                    .is_some_and(|o| o.is_identifier(RECEIVER_NAME)) =>
            {
                Some(attr.as_str())
            }
            _ => None,
        })
        .collect()
}
