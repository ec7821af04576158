//! Command-line interface for smellscan.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use globset::GlobSet;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::{self, Config, SmellSelection, DEFAULT_CONFIG_NAMES};
use crate::detect::Analyzer;
use crate::report::{self, MergeMode};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Detect code smells in Python sources.
///
/// Reports long methods, god classes, long parameter lists, duplicated
/// lines, magic numbers and feature envy, one JSON report per file.
#[derive(Parser)]
#[command(name = "smellscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Files or directories to scan
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON object enabling or disabling smells, e.g. '{"MagicNumbers": false}'
    #[arg(short, long)]
    pub smells: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// How reports of several files are combined
    #[arg(short, long, value_enum, default_value_t = MergeMode::PerFile)]
    pub merge: MergeMode,

    /// Exit with status 1 when any smell is found
    #[arg(long)]
    pub fail_on_findings: bool,

    /// Log detector activity to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
}

/// Discover a config file in the current directory.
fn discover_config() -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// Load the effective configuration: the config file (explicit or
/// discovered), then the `--smells` selection on top.
pub fn load_config(path: Option<&Path>, smells: Option<&str>) -> anyhow::Result<Config> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => discover_config(),
    };

    let mut config = match config_path {
        Some(p) => {
            debug!(path = %p.display(), "loading config");
            Config::parse_file(&p)
                .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", p.display(), e))?
        }
        None => Config::default(),
    };

    if let Some(json) = smells {
        config.smells.extend(SmellSelection::from_json(json)?);
    }

    config::validate(&config)?;
    Ok(config)
}

/// Collect the Python files to scan.
///
/// Explicit files are taken as given. Directories are walked for `.py`
/// files, skipping hidden directories, `__pycache__` and excluded paths.
/// Each file appears once, at its first position.
pub fn collect_files(paths: &[PathBuf], excluded: &GlobSet) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut seen = HashSet::new();

    for root in paths {
        if !root.is_dir() {
            if seen.insert(root.clone()) {
                files.push(root.clone());
            }
            continue;
        }

        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                // Skip hidden directories
                if e.file_type().is_dir() && (name.starts_with('.') || name == "__pycache__") {
                    return false;
                }
                !is_excluded(e.path(), root, excluded)
            })
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("py") {
                continue;
            }
            if seen.insert(path.to_path_buf()) {
                files.push(path.to_path_buf());
            }
        }
    }

    Ok(files)
}

fn is_excluded(path: &Path, root: &Path, excluded: &GlobSet) -> bool {
    if excluded.is_empty() {
        return false;
    }
    let relative = path.strip_prefix(root).unwrap_or(path);
    excluded.is_match(relative) || excluded.is_match(path)
}

/// Run a scan.
pub fn run_scan(cli: &Cli) -> anyhow::Result<i32> {
    let config = load_config(cli.config.as_deref(), cli.smells.as_deref())?;
    let excluded = config.excluded_matcher()?;

    let files = collect_files(&cli.paths, &excluded)?;
    info!(files = files.len(), "scanning");

    let analyzer = Analyzer::new(&config);
    let batch = analyzer.analyze_batch(&files);

    match cli.format {
        OutputFormat::Json => report::write_json(&batch, cli.merge)?,
        OutputFormat::Pretty => report::write_pretty(&batch, cli.merge),
    }

    if cli.fail_on_findings && batch.total() > 0 {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}
