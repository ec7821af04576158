//! Core types for detection results.

use serde::{Deserialize, Serialize};

/// The six smell categories, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SmellCategory {
    LongMethod,
    GodClass,
    DuplicatedCode,
    LargeParameterList,
    MagicNumbers,
    FeatureEnvy,
}

impl SmellCategory {
    /// Every category, in the order reports list them.
    pub const ALL: [SmellCategory; 6] = [
        SmellCategory::LongMethod,
        SmellCategory::GodClass,
        SmellCategory::DuplicatedCode,
        SmellCategory::LargeParameterList,
        SmellCategory::MagicNumbers,
        SmellCategory::FeatureEnvy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SmellCategory::LongMethod => "LongMethod",
            SmellCategory::GodClass => "GodClass",
            SmellCategory::DuplicatedCode => "DuplicatedCode",
            SmellCategory::LargeParameterList => "LargeParameterList",
            SmellCategory::MagicNumbers => "MagicNumbers",
            SmellCategory::FeatureEnvy => "FeatureEnvy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LongMethod" => Some(SmellCategory::LongMethod),
            "GodClass" => Some(SmellCategory::GodClass),
            "DuplicatedCode" => Some(SmellCategory::DuplicatedCode),
            "LargeParameterList" => Some(SmellCategory::LargeParameterList),
            "MagicNumbers" => Some(SmellCategory::MagicNumbers),
            "FeatureEnvy" => Some(SmellCategory::FeatureEnvy),
            _ => None,
        }
    }
}

impl std::fmt::Display for SmellCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single detected smell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    #[serde(skip)]
    pub category: SmellCategory,
    pub file: String,
    pub line_start: usize,
    pub line_end: usize,
    pub message: String,
    pub snippet: String,
}

impl Finding {
    pub fn new(
        category: SmellCategory,
        file: &str,
        lines: (usize, usize),
        message: String,
        snippet: String,
    ) -> Self {
        Self {
            category,
            file: file.to_string(),
            line_start: lines.0,
            line_end: lines.1,
            message,
            snippet,
        }
    }
}

/// Best-effort snippet: the node's source text, or `fallback` when the
/// text cannot be recovered.
pub fn snippet_or(source: Option<&str>, fallback: impl FnOnce() -> String) -> String {
    match source {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => fallback(),
    }
}
