//! Integration tests for the Python syntax tree builder.

use std::path::PathBuf;

use smellscan::error::AnalysisError;
use smellscan::syntax::{self, NodeKind};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn read(name: &str) -> String {
    std::fs::read_to_string(testdata_path().join(name)).expect("fixture should exist")
}

#[test]
fn test_parse_fixture_declarations() {
    let source = read("smelly.py");
    let tree = syntax::parse("smelly.py", &source).expect("should parse");

    let functions: Vec<_> = tree.functions().map(|(_, f)| f.name.as_str()).collect();
    // Breadth-first: top-level functions before methods.
    assert_eq!(
        functions,
        vec!["restock", "ship", "summarize", "__init__", "add", "remove", "count", "clear"]
    );

    let classes: Vec<_> = tree.classes().map(|(_, c)| c.name.as_str()).collect();
    assert_eq!(classes, vec!["InventoryManager"]);
}

#[test]
fn test_parse_fixture_spans() {
    let source = read("smelly.py");
    let tree = syntax::parse("smelly.py", &source).unwrap();

    let (node, _) = tree
        .functions()
        .find(|(_, f)| f.name == "restock")
        .unwrap();
    assert_eq!((node.span.start_line, node.span.end_line), (22, 26));
    assert!(tree.snippet(node).unwrap().starts_with("def restock(order):"));
}

#[test]
fn test_parse_broken_fixture() {
    let source = read("broken.py");
    match syntax::parse("broken.py", &source) {
        Err(AnalysisError::Parse { file, description }) => {
            assert_eq!(file, "broken.py");
            assert!(description.contains("line "), "{}", description);
        }
        other => panic!("expected parse error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_parse_empty_source() {
    let tree = syntax::parse("empty.py", "").unwrap();
    assert!(matches!(tree.root().kind, NodeKind::Module));
    assert!(tree.root().children.is_empty());
}
