use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use blueprint_core::{Candidate, Idea, SimilarityReport};
use engine_logging::engine_info;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::filename::export_filename;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("could not serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Creates `dir` if missing and checks that files can be written into it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Writes whole files into one directory through a temp file and a rename,
/// so readers never observe a partial file.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

#[derive(Debug, Serialize)]
struct SimilarityExport<'a> {
    devpost_url: &'a str,
    generated_utc: &'a str,
    report: &'a SimilarityReport,
    candidates: Vec<&'a Candidate>,
}

/// Saves a finished similarity check as pretty JSON.
///
/// `candidates` should already be in display order. The file is named after
/// the project and keyed on `devpost_url`.
pub fn export_similarity_report(
    writer: &AtomicFileWriter,
    devpost_url: &str,
    report: &SimilarityReport,
    candidates: Vec<&Candidate>,
    generated_utc: &str,
) -> Result<PathBuf, ExportError> {
    let title = report.project_name.as_deref().unwrap_or("similarity-report");
    let filename = export_filename(title, devpost_url, "json");
    let body = serde_json::to_string_pretty(&SimilarityExport {
        devpost_url,
        generated_utc,
        report,
        candidates,
    })?;
    let path = writer.write(&filename, &body)?;
    engine_info!("Similarity report written to {}", path.display());
    Ok(path)
}

/// Saves an implementation guide as markdown under a `# <title>` heading.
pub fn export_breakdown(
    writer: &AtomicFileWriter,
    hackathon_folder: &str,
    idea: &Idea,
    markdown: &str,
) -> Result<PathBuf, ExportError> {
    let key = format!("{hackathon_folder}#{}", idea.number);
    let filename = export_filename(&idea.title, &key, "md");
    let mut document = format!("# {}\n\n", idea.title.trim());
    document.push_str(markdown.trim_end());
    document.push('\n');
    let path = writer.write(&filename, &document)?;
    engine_info!("Breakdown for idea {} written to {}", idea.number, path.display());
    Ok(path)
}
