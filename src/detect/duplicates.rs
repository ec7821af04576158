//! Detection of duplicated code.
//!
//! This is the only text-based detector. Lines are trimmed, boilerplate is
//! skipped, and every run of `window` consecutive remaining lines forms a
//! block. A block seen more than once is reported at all of its positions.

use std::collections::HashMap;

use crate::error::AnalysisError;

use super::{Detector, DetectorInput, Finding, SmellCategory};

pub struct DuplicatedCodeDetector {
    /// Blocks shorter than this many characters are ignored.
    pub min_length: usize,
    /// Consecutive significant lines per block.
    pub window: usize,
}

/// A trimmed source line together with its 1-indexed line number.
struct SignificantLine<'a> {
    text: &'a str,
    line: usize,
}

/// Occurrences of one block, in first-seen order.
struct BlockGroup {
    block: String,
    positions: Vec<usize>,
}

impl Detector for DuplicatedCodeDetector {
    fn category(&self) -> SmellCategory {
        SmellCategory::DuplicatedCode
    }

    fn run(
        &self,
        input: &DetectorInput<'_>,
        findings: &mut Vec<Finding>,
    ) -> Result<(), AnalysisError> {
        if self.window == 0 {
            return Err(AnalysisError::shape(
                self.category(),
                "duplicate window must be at least 1",
            ));
        }

        let lines = significant_lines(input.text);
        let groups = self.group_blocks(&lines);

        let duplicated = groups.iter().filter(|g| g.positions.len() > 1).count();
        tracing::debug!(
            file = input.file,
            unique_blocks = groups.len(),
            duplicated_blocks = duplicated,
            "compared line blocks"
        );

        for group in groups.into_iter().filter(|g| g.positions.len() > 1) {
            let first = group.positions[0];
            let last = group.positions[group.positions.len() - 1];
            findings.push(Finding::new(
                self.category(),
                input.file,
                (first, last + self.window - 1),
                format!(
                    "Duplicate block appears {} times at lines {}.",
                    group.positions.len(),
                    format_positions(&group.positions)
                ),
                group.block,
            ));
        }
        Ok(())
    }
}

impl DuplicatedCodeDetector {
    fn group_blocks(&self, lines: &[SignificantLine<'_>]) -> Vec<BlockGroup> {
        let mut groups: Vec<BlockGroup> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for run in lines.windows(self.window) {
            let block = run
                .iter()
                .map(|l| l.text)
                .collect::<Vec<_>>()
                .join("\n");
            if block.chars().count() < self.min_length {
                continue;
            }

            let line = run[0].line;
            match index.get(&block) {
                Some(&i) => groups[i].positions.push(line),
                None => {
                    index.insert(block.clone(), groups.len());
                    groups.push(BlockGroup {
                        block,
                        positions: vec![line],
                    });
                }
            }
        }

        groups
    }
}

/// Trimmed lines that take part in comparison.
fn significant_lines(text: &str) -> Vec<SignificantLine<'_>> {
    text.split('\n')
        .enumerate()
        .filter_map(|(i, raw)| {
            let trimmed = raw.trim();
            if is_boilerplate(trimmed) {
                None
            } else {
                Some(SignificantLine {
                    text: trimmed,
                    line: i + 1,
                })
            }
        })
        .collect()
}

fn is_boilerplate(line: &str) -> bool {
    line.is_empty()
        || line.starts_with('#')
        || line.starts_with("import ")
        || line.starts_with("from ")
        || line.starts_with("class ")
        || line.starts_with('@')
        || line.contains("if __name__")
}

/// `[3, 7, 12]`
fn format_positions(positions: &[usize]) -> String {
    let joined = positions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", joined)
}
