//! Report aggregation and output formatting.
//!
//! A [`Report`] holds the findings of one file, one [`CategoryResult`] per
//! smell category. A [`BatchReport`] holds the reports of several files in
//! input order and flattens them according to a [`MergeMode`].
//!
//! Supports two output formats:
//! - JSON: `{"<Category>": {"count": n, "items": [...]}}` per report
//! - Pretty: colored terminal output for human readability

use std::collections::BTreeMap;

use colored::*;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::detect::{Finding, SmellCategory};

/// Findings of one category together with their count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryResult {
    pub count: usize,
    pub items: Vec<Finding>,
}

impl From<Vec<Finding>> for CategoryResult {
    fn from(items: Vec<Finding>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

/// Per-file report. All six categories are always present and serialize in
/// report order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Report {
    categories: BTreeMap<SmellCategory, CategoryResult>,
}

impl Default for Report {
    fn default() -> Self {
        Self::empty()
    }
}

impl Report {
    /// A report with every category present and empty.
    pub fn empty() -> Self {
        Self {
            categories: SmellCategory::ALL
                .into_iter()
                .map(|c| (c, CategoryResult::default()))
                .collect(),
        }
    }

    /// Replace the findings of `category`.
    pub fn set(&mut self, category: SmellCategory, findings: Vec<Finding>) {
        self.categories.insert(category, CategoryResult::from(findings));
    }

    /// Append findings to `category`.
    pub fn extend(&mut self, category: SmellCategory, findings: &[Finding]) {
        let result = self.categories.entry(category).or_default();
        result.items.extend_from_slice(findings);
        result.count = result.items.len();
    }

    pub fn get(&self, category: SmellCategory) -> &CategoryResult {
        &self.categories[&category]
    }

    /// Categories and their results, in report order.
    pub fn iter(&self) -> impl Iterator<Item = (SmellCategory, &CategoryResult)> {
        self.categories.iter().map(|(c, r)| (*c, r))
    }

    /// Total number of findings across all categories.
    pub fn total(&self) -> usize {
        self.categories.values().map(|r| r.count).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

/// How a batch of per-file reports is flattened for output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum MergeMode {
    /// One report per file, keyed by path.
    #[default]
    PerFile,
    /// One report with every file's findings concatenated per category.
    Combined,
    /// One report whose categories come from the last file analyzed.
    Legacy,
}

/// Reports of several files, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    files: Vec<(String, Report)>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: impl Into<String>, report: Report) {
        self.files.push((file.into(), report));
    }

    pub fn files(&self) -> &[(String, Report)] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total number of findings across all files.
    pub fn total(&self) -> usize {
        self.files.iter().map(|(_, r)| r.total()).sum()
    }

    /// Every file's findings concatenated per category, in file order.
    pub fn combined(&self) -> Report {
        let mut merged = Report::empty();
        for (_, report) in &self.files {
            for (category, result) in report.iter() {
                merged.extend(category, &result.items);
            }
        }
        merged
    }

    /// Categories overwritten by each subsequent file.
    pub fn legacy(&self) -> Report {
        self.files
            .last()
            .map(|(_, report)| report.clone())
            .unwrap_or_else(Report::empty)
    }

    /// A serializable view of the batch in the given shape.
    pub fn merge(&self, mode: MergeMode) -> MergedReport<'_> {
        match mode {
            MergeMode::PerFile => MergedReport::PerFile(self),
            MergeMode::Combined => MergedReport::Single(self.combined()),
            MergeMode::Legacy => MergedReport::Single(self.legacy()),
        }
    }
}

/// A batch flattened for output.
pub enum MergedReport<'a> {
    PerFile(&'a BatchReport),
    Single(Report),
}

impl Serialize for MergedReport<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MergedReport::PerFile(batch) => {
                let mut map = serializer.serialize_map(Some(batch.files.len()))?;
                for (file, report) in &batch.files {
                    map.serialize_entry(file, report)?;
                }
                map.end()
            }
            MergedReport::Single(report) => report.serialize(serializer),
        }
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// Render a batch as JSON.
pub fn render_json(batch: &BatchReport, mode: MergeMode) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&batch.merge(mode))?)
}

/// Write a batch as JSON to stdout.
pub fn write_json(batch: &BatchReport, mode: MergeMode) -> anyhow::Result<()> {
    let json = render_json(batch, mode)?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write a batch in pretty (human-readable) format.
pub fn write_pretty(batch: &BatchReport, mode: MergeMode) {
    println!();
    print!("  ");
    print!("{}", "smellscan".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Files: ".dimmed());
    println!("{}", batch.len());
    println!();

    match mode {
        MergeMode::PerFile => {
            for (file, report) in batch.files() {
                write_file_header(file, report);
                write_categories(report);
                println!();
            }
        }
        MergeMode::Combined => {
            write_categories(&batch.combined());
            println!();
        }
        MergeMode::Legacy => {
            write_categories(&batch.legacy());
            println!();
        }
    }

    write_summary(batch.total());
    println!();
}

fn write_file_header(file: &str, report: &Report) {
    print!("  {}", file.blue().bold());
    if report.is_clean() {
        print!("  {}", "clean".green());
    }
    println!();
}

fn write_categories(report: &Report) {
    for (category, result) in report.iter() {
        if result.count == 0 {
            continue;
        }
        println!("    {} ({}):", category.as_str().bold(), result.count);
        for finding in &result.items {
            write_finding(finding);
        }
    }
}

fn write_finding(finding: &Finding) {
    print!("      {}", finding.file.blue());
    if finding.line_start == finding.line_end {
        print!("{}", format!(":{}", finding.line_start).dimmed());
    } else {
        print!(
            "{}",
            format!(":{}-{}", finding.line_start, finding.line_end).dimmed()
        );
    }
    println!();
    println!("          {}", finding.message);
}

fn write_summary(total: usize) {
    if total == 0 {
        println!("  {}", "✓ No smells found".green());
    } else {
        let plural = if total != 1 { "s" } else { "" };
        println!(
            "  {}",
            format!("✗ {} smell{} found", total, plural).yellow().bold()
        );
    }
}
