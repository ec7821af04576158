//! Analysis runner that orchestrates all detectors.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::AnalysisError;
use crate::report::{BatchReport, Report};
use crate::syntax;

use super::{detector_for, Detector, DetectorInput, Finding};

/// Runs the enabled detectors over files and collects their reports.
pub struct Analyzer {
    detectors: Vec<Box<dyn Detector>>,
}

impl Analyzer {
    /// Create an analyzer running every category enabled in `config`.
    pub fn new(config: &Config) -> Self {
        let detectors = config
            .smells
            .enabled()
            .into_iter()
            .map(|category| detector_for(category, &config.thresholds))
            .collect();
        Self { detectors }
    }

    /// Create an analyzer with an explicit detector list.
    pub fn with_detectors(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self { detectors }
    }

    /// Analyze one file on disk.
    ///
    /// A file that cannot be read or parsed yields an empty report; the
    /// failure is only logged.
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> Report {
        let path = path.as_ref();
        let file = path.display().to_string();

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(source) => {
                let err = AnalysisError::Read {
                    path: file,
                    source,
                };
                warn!("{}", err);
                return Report::empty();
            }
        };

        self.analyze_source(&file, &text)
    }

    /// Analyze in-memory source text identified by `file`.
    pub fn analyze_source(&self, file: &str, text: &str) -> Report {
        let tree = match syntax::parse(file, text) {
            Ok(tree) => tree,
            Err(err) => {
                warn!("{}", err);
                return Report::empty();
            }
        };

        let input = DetectorInput {
            file,
            text,
            tree: &tree,
        };

        let mut report = Report::empty();
        for detector in &self.detectors {
            let category = detector.category();
            match run_isolated(detector.as_ref(), &input) {
                Ok(findings) => {
                    debug!(file, %category, count = findings.len(), "detector finished");
                    report.set(category, findings);
                }
                Err(reason) => {
                    warn!(file, %category, "detector failed: {}", reason);
                }
            }
        }
        report
    }

    /// Analyze multiple files in parallel.
    ///
    /// Uses rayon for parallel processing. Reports keep the order of `paths`.
    pub fn analyze_batch(&self, paths: &[PathBuf]) -> BatchReport {
        let reports: Vec<_> = paths
            .par_iter()
            .map(|p| (p.display().to_string(), self.analyze_file(p)))
            .collect();

        let mut batch = BatchReport::new();
        for (file, report) in reports {
            batch.push(file, report);
        }
        batch
    }
}

/// Run one detector into a scratch buffer so a failure leaves nothing
/// behind in the report.
fn run_isolated(detector: &dyn Detector, input: &DetectorInput<'_>) -> Result<Vec<Finding>, String> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut findings = Vec::new();
        detector.run(input, &mut findings).map(|()| findings)
    }));

    match outcome {
        Ok(Ok(findings)) => Ok(findings),
        Ok(Err(err)) => Err(err.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
