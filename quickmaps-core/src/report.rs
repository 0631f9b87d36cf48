//! Outcome of one export run.
//!
//! Drivers never stop on a per-image or per-material failure; they collect
//! it here and move on. The report serializes to JSON for `--json` output.

use crate::classify::MapType;
use crate::packing::PackError;
use crate::Error;
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;

/// Kind of failure recorded for a material or image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NoSourceMaps,
    SizeMismatch,
    PersistFailure,
    DirectoryCreateFailure,
}

impl FailureKind {
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Pack(PackError::NoSourceMaps) => FailureKind::NoSourceMaps,
            Error::Pack(PackError::SizeMismatch { .. }) => FailureKind::SizeMismatch,
            Error::DirectoryCreate { .. } => FailureKind::DirectoryCreateFailure,
            _ => FailureKind::PersistFailure,
        }
    }
}

/// One recorded failure
#[derive(Debug, Clone, Serialize)]
pub struct ExportFailure {
    /// Material or image name the failure belongs to
    pub subject: String,
    pub kind: FailureKind,
    pub message: String,
    /// Directory failures that look like an unreachable network path
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub network: bool,
}

impl ExportFailure {
    pub fn new(subject: impl Into<String>, error: &Error) -> Self {
        Self {
            subject: subject.into(),
            kind: FailureKind::from_error(error),
            message: error.to_string(),
            network: matches!(error, Error::DirectoryCreate { network: true, .. }),
        }
    }
}

/// A file written (or planned, on a dry run)
#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub material: String,
    /// `None` for packed MRAO images
    pub map_type: Option<MapType>,
    /// Source image(s)
    pub images: Vec<String>,
    pub path: PathBuf,
}

/// Result of one export or extraction run
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub timestamp: String,
    pub export_dir: PathBuf,
    /// Set when the configured directory could not be created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_from: Option<PathBuf>,
    pub materials_processed: usize,
    pub exported: Vec<ExportedFile>,
    pub failures: Vec<ExportFailure>,
    pub warnings: Vec<String>,
}

impl ExportReport {
    pub fn new(export_dir: PathBuf) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            export_dir,
            fallback_from: None,
            materials_processed: 0,
            exported: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, subject: &str, error: &Error) {
        tracing::warn!(subject, error = %error, "export failure");
        self.failures.push(ExportFailure::new(subject, error));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn success_count(&self) -> usize {
        self.exported.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &ExportFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        let mut line = format!(
            "Exported {} texture(s) to {}",
            self.exported.len(),
            self.export_dir.display()
        );
        if !self.failures.is_empty() {
            line.push_str(&format!("; {} failure(s)", self.failures.len()));
        }
        line
    }

    /// Multi-line text: summary, warnings, then failures.
    pub fn to_text(&self) -> String {
        let mut lines = vec![self.summary()];
        if let Some(ref from) = self.fallback_from {
            lines.push(format!(
                "⚠ Could not use {}; exported to fallback folder",
                from.display()
            ));
        }
        for w in &self.warnings {
            lines.push(format!("⚠ {}", w));
        }
        for f in &self.failures {
            lines.push(format!("✗ [{:?}] {}: {}", f.kind, f.subject, f.message));
        }
        lines.join("\n")
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kinds_from_errors() {
        let pack = Error::Pack(PackError::NoSourceMaps);
        assert_eq!(FailureKind::from_error(&pack), FailureKind::NoSourceMaps);

        let dir = Error::DirectoryCreate {
            path: PathBuf::from(r"\\nas\maps"),
            network: true,
            source: std::io::Error::new(std::io::ErrorKind::Other, "unreachable"),
        };
        let failure = ExportFailure::new("Brick", &dir);
        assert_eq!(failure.kind, FailureKind::DirectoryCreateFailure);
        assert!(failure.network);
    }

    #[test]
    fn summary_counts() {
        let mut report = ExportReport::new(PathBuf::from("/out"));
        assert_eq!(report.summary(), "Exported 0 texture(s) to /out");

        report.exported.push(ExportedFile {
            material: "Brick".into(),
            map_type: Some(MapType::Normal),
            images: vec!["brick_n".into()],
            path: PathBuf::from("/out/Brick/Brick_Normal.png"),
        });
        report.record_failure("Glass", &Error::Pack(PackError::NoSourceMaps));
        assert_eq!(report.summary(), "Exported 1 texture(s) to /out; 1 failure(s)");
        assert!(report.to_text().contains("NoSourceMaps"));
        assert_eq!(report.failures_of(FailureKind::NoSourceMaps).count(), 1);
    }

    #[test]
    fn json_shape() {
        let report = ExportReport::new(PathBuf::from("/out"));
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(value.get("timestamp").is_some());
        assert!(value.get("fallback_from").is_none());
        assert_eq!(value["exported"].as_array().unwrap().len(), 0);
    }
}
