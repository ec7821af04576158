//! Tests for the JSON output shape.
//!
//! Every report maps each of the six category names to `{count, items}`,
//! and findings carry `file`, `lineStart`, `lineEnd`, `message` and
//! `snippet`.

use std::path::PathBuf;

use serde_json::Value;
use smellscan::config::Config;
use smellscan::detect::{Analyzer, SmellCategory};
use smellscan::report::{self, BatchReport, MergeMode};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn batch() -> BatchReport {
    let testdata = testdata_path();
    let paths = vec![
        testdata.join("smelly.py"),
        testdata.join("broken.py"),
        testdata.join("clean.py"),
    ];
    Analyzer::new(&Config::default()).analyze_batch(&paths)
}

fn render(mode: MergeMode) -> Value {
    let json = report::render_json(&batch(), mode).expect("should render");
    serde_json::from_str(&json).expect("should be valid JSON")
}

fn assert_report_shape(report: &Value) {
    let object = report.as_object().expect("report should be an object");
    assert_eq!(object.len(), 6);
    for category in SmellCategory::ALL {
        let result = &object[category.as_str()];
        let items = result["items"].as_array().expect("items should be an array");
        assert_eq!(result["count"].as_u64(), Some(items.len() as u64));
    }
}

#[test]
fn test_per_file_output() {
    let value = render(MergeMode::PerFile);
    let files = value.as_object().unwrap();
    assert_eq!(files.len(), 3);

    for report in files.values() {
        assert_report_shape(report);
    }

    let broken = files
        .iter()
        .find(|(name, _)| name.ends_with("broken.py"))
        .map(|(_, report)| report)
        .unwrap();
    for category in SmellCategory::ALL {
        assert_eq!(broken[category.as_str()]["count"], 0);
        assert_eq!(broken[category.as_str()]["items"], serde_json::json!([]));
    }
}

#[test]
fn test_finding_fields() {
    let value = render(MergeMode::Combined);
    let finding = &value["MagicNumbers"]["items"][0];
    let fields: Vec<_> = finding.as_object().unwrap().keys().cloned().collect();

    for field in ["file", "lineStart", "lineEnd", "message", "snippet"] {
        assert!(fields.iter().any(|f| f == field), "missing field {}", field);
    }
    assert_eq!(fields.len(), 5);
    assert_eq!(finding["lineStart"], 30);
    assert_eq!(
        finding["message"],
        "Magic number 1.5 detected. Consider replacing with a named constant."
    );
}

#[test]
fn test_combined_output() {
    let value = render(MergeMode::Combined);
    assert_report_shape(&value);
    assert_eq!(value["DuplicatedCode"]["count"], 2);
    assert_eq!(value["GodClass"]["count"], 1);
}

#[test]
fn test_legacy_output_keeps_last_file() {
    // clean.py is analyzed last, so every category is empty.
    let value = render(MergeMode::Legacy);
    assert_report_shape(&value);
    for category in SmellCategory::ALL {
        assert_eq!(value[category.as_str()]["count"], 0);
    }
}

#[test]
fn test_categories_in_report_order() {
    let json = report::render_json(&batch(), MergeMode::Combined).unwrap();
    let positions: Vec<_> = SmellCategory::ALL
        .iter()
        .map(|c| json.find(&format!("\"{}\"", c.as_str())).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}
