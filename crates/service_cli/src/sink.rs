//! File writer for run artefacts.

use crate::Result;
use exposure_core::timestamp::JobTimestamp;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Kind of artefact written by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Result envelope (JSON)
    Envelope,
    /// Consolidated report summary (text)
    Report,
    /// Per-desk exposure table attached to the report (CSV)
    Attachment,
    /// Missing-exposure alert (text)
    Alert,
}

impl ArtifactKind {
    /// File name prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Envelope => "envelope",
            ArtifactKind::Report => "report",
            ArtifactKind::Attachment => "exposures",
            ArtifactKind::Alert => "alert",
        }
    }

    /// File extension.
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Envelope => "json",
            ArtifactKind::Report | ArtifactKind::Alert => "txt",
            ArtifactKind::Attachment => "csv",
        }
    }
}

/// Record of a written file
#[derive(Debug, Clone)]
pub struct WrittenFile {
    /// File path
    pub path: PathBuf,
    /// Artefact kind
    pub kind: ArtifactKind,
    /// Size in bytes
    pub size: usize,
}

/// Writes artefacts of one run into an output directory.
///
/// File names carry the job timestamp, so runs at different snapshot
/// times never overwrite each other.
pub struct FileWriter {
    output_dir: PathBuf,
    stamp: String,
    written: Vec<WrittenFile>,
}

impl FileWriter {
    /// Create the writer, creating `output_dir` if needed.
    pub fn new(output_dir: impl AsRef<Path>, at: &JobTimestamp) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;

        Ok(Self {
            output_dir,
            stamp: at.at().format("%Y%m%d_%H%M").to_string(),
            written: Vec::new(),
        })
    }

    /// Write one artefact; `parts` name the desk/source it belongs to.
    pub fn write(&mut self, kind: ArtifactKind, parts: &[&str], content: &str) -> Result<PathBuf> {
        let mut stem = vec![kind.prefix().to_string()];
        stem.extend(parts.iter().map(|p| sanitise(p)));
        stem.push(self.stamp.clone());

        let path = self
            .output_dir
            .join(format!("{}.{}", stem.join("_"), kind.extension()));
        fs::write(&path, content)?;

        info!(path = %path.display(), size = content.len(), "Artefact written");
        self.written.push(WrittenFile {
            path: path.clone(),
            kind,
            size: content.len(),
        });
        Ok(path)
    }

    /// Files written so far.
    pub fn written(&self) -> &[WrittenFile] {
        &self.written
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Desk and source names contain spaces and slashes; keep file names portable.
fn sanitise(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
