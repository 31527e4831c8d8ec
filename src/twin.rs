//! Markdown "digital twins" of presentation files.
//!
//! Presentations are classified by file name alone. For each file a
//! metadata record, a cross-reference list and a placeholder Markdown
//! document are written. A failure on one file is recorded and does not
//! stop the others.

use std::{
    collections::{BTreeMap, BTreeSet},
    ffi::OsStr,
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Serialize;
use walkdir::WalkDir;

mod profile;
mod render;

pub use profile::{
    CrossReference, DocumentCategory, Profile, SubCategory, Urgency, classify_filename,
    cross_references, normalize_name,
};
pub use render::{TwinMetadata, write_twin};

/// Directory, under the output root, holding metadata records.
pub const METADATA_DIR: &str = "metadata";
/// Directory, under the output root, holding cross-reference lists.
pub const CROSS_REFERENCES_DIR: &str = "cross_references";
/// Directory, under the output root, holding Markdown twins.
pub const TWINS_DIR: &str = "digital_twins";
/// File name of the run summary.
pub const SUMMARY_FILE: &str = "processing_summary.json";

/// Twin generation failed.
#[derive(Debug, thiserror::Error)]
pub enum TwinError {
    /// The input directory could not be scanned.
    #[error("failed to scan {}: {source}", path.display())]
    Scan {
        /// The input directory.
        path: PathBuf,
        /// The underlying error.
        source: walkdir::Error,
    },

    /// A file name is not valid UTF-8.
    #[error("file name is not valid UTF-8: {}", .0.display())]
    InvalidName(PathBuf),

    /// An output file or directory could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// The output path.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A JSON document could not be serialized.
    #[error("failed to serialize {}: {source}", path.display())]
    Json {
        /// The output path.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },
}

/// The result of processing one file.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "processing_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileOutcome {
    /// All three outputs were written.
    Completed {
        /// The file name.
        filename: String,
        /// The metadata record.
        metadata: TwinMetadata,
        /// The cross-references found.
        cross_references: Vec<CrossReference>,
    },
    /// The file could not be processed.
    Failed {
        /// The file name.
        filename: String,
        /// Why.
        error: String,
    },
}

/// Totals for one run, written to [`SUMMARY_FILE`].
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingSummary {
    /// RFC 3339 start time.
    pub processing_started: String,
    /// RFC 3339 end time.
    pub processing_completed: String,
    /// Presentations found.
    pub total_files: usize,
    /// Presentations processed.
    pub successful: usize,
    /// Presentations that failed.
    pub failed: usize,
    /// Completed files per category.
    pub categories_summary: BTreeMap<DocumentCategory, usize>,
    /// Every reference found, sorted.
    pub cross_references_global: BTreeSet<&'static str>,
    /// Normalized names shared by more than one file. Only the last such
    /// file's twin is kept on disk.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub overwritten_twins: BTreeSet<String>,
    /// One entry per file, in name order.
    pub files_processed: Vec<FileOutcome>,
}

/// Writes digital twins into an output directory.
#[derive(Debug, Clone)]
pub struct TwinProcessor {
    output: PathBuf,
}

impl TwinProcessor {
    /// Creates a processor writing under `output`.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }

    /// Processes every `.pptx` file directly inside `input`.
    ///
    /// Files are processed in parallel. The summary is also written to
    /// [`SUMMARY_FILE`] in the output directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `input` cannot be scanned or the output
    /// directories or summary cannot be written. Failures on individual
    /// files are reported in the summary instead.
    #[tracing::instrument(skip_all, fields(input = %input.display(), output = %self.output.display()))]
    pub fn process_dir(&self, input: &Path) -> Result<ProcessingSummary, TwinError> {
        let started = chrono::Local::now().to_rfc3339();
        self.create_dirs()?;

        let files = collect_presentations(input)?;
        tracing::info!(count = files.len(), "found presentations");

        let outcomes: Vec<FileOutcome> = files
            .par_iter()
            .map(|path| match self.process_file(path) {
                Ok(outcome) => outcome,
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "failed to process presentation");
                    FileOutcome::Failed {
                        filename: file_name(path).unwrap_or_default().to_string(),
                        error: error.to_string(),
                    }
                }
            })
            .collect();

        let mut summary = ProcessingSummary {
            processing_started: started,
            processing_completed: String::new(),
            total_files: files.len(),
            successful: 0,
            failed: 0,
            categories_summary: BTreeMap::new(),
            cross_references_global: BTreeSet::new(),
            overwritten_twins: BTreeSet::new(),
            files_processed: Vec::with_capacity(outcomes.len()),
        };
        let mut twin_names = BTreeSet::new();
        for outcome in outcomes {
            match &outcome {
                FileOutcome::Completed {
                    filename,
                    metadata,
                    cross_references,
                } => {
                    summary.successful += 1;
                    if !twin_names.insert(metadata.normalized_name.clone()) {
                        tracing::warn!(
                            file = filename.as_str(),
                            twin = metadata.normalized_name.as_str(),
                            "twin name collides with another presentation; one twin was overwritten"
                        );
                        summary
                            .overwritten_twins
                            .insert(metadata.normalized_name.clone());
                    }
                    *summary
                        .categories_summary
                        .entry(metadata.category)
                        .or_default() += 1;
                    summary
                        .cross_references_global
                        .extend(cross_references.iter().map(|r| r.reference));
                }
                FileOutcome::Failed { .. } => summary.failed += 1,
            }
            summary.files_processed.push(outcome);
        }
        summary.processing_completed = chrono::Local::now().to_rfc3339();

        write_json(&self.output.join(SUMMARY_FILE), &summary)?;
        tracing::info!(
            successful = summary.successful,
            failed = summary.failed,
            "digital twin generation complete"
        );
        Ok(summary)
    }

    /// Writes the three outputs for a single presentation.
    ///
    /// # Errors
    ///
    /// Returns an error if the file name is not UTF-8 or an output cannot
    /// be written.
    pub fn process_file(&self, path: &Path) -> Result<FileOutcome, TwinError> {
        let filename = file_name(path).ok_or_else(|| TwinError::InvalidName(path.to_path_buf()))?;
        let stem = filename.strip_suffix(".pptx").unwrap_or(filename);

        let profile = classify_filename(filename);
        let references = cross_references(filename);
        let metadata = TwinMetadata {
            original_filename: filename.to_string(),
            normalized_name: normalize_name(stem),
            file_type: "PPTX",
            processing_timestamp: chrono::Local::now().to_rfc3339(),
            category: profile.category,
            priority: profile.priority,
            sub_category: profile.sub_category,
            file_size: std::fs::metadata(path).ok().map(|m| m.len()),
        };

        write_json(
            &self
                .output
                .join(METADATA_DIR)
                .join(format!("{stem}_metadata.json")),
            &metadata,
        )?;
        write_json(
            &self
                .output
                .join(CROSS_REFERENCES_DIR)
                .join(format!("{stem}_cross_refs.json")),
            &references,
        )?;

        let twin_path = self
            .output
            .join(TWINS_DIR)
            .join(format!("{}.md", metadata.normalized_name));
        let write_error = |source| TwinError::Write {
            path: twin_path.clone(),
            source,
        };
        let mut writer = BufWriter::new(File::create(&twin_path).map_err(write_error)?);
        write_twin(&mut writer, &metadata, &references).map_err(write_error)?;
        writer.flush().map_err(write_error)?;

        tracing::debug!(file = filename, category = %profile.category, "generated twin");
        Ok(FileOutcome::Completed {
            filename: filename.to_string(),
            metadata,
            cross_references: references,
        })
    }

    fn create_dirs(&self) -> Result<(), TwinError> {
        for dir in [METADATA_DIR, CROSS_REFERENCES_DIR, TWINS_DIR] {
            let path = self.output.join(dir);
            std::fs::create_dir_all(&path).map_err(|source| TwinError::Write { path, source })?;
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(OsStr::to_str)
}

fn collect_presentations(input: &Path) -> Result<Vec<PathBuf>, TwinError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(input).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| TwinError::Scan {
            path: input.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && entry.path().extension() == Some(OsStr::new("pptx")) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), TwinError> {
    let write_error = |source| TwinError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(write_error)?);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| TwinError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(write_error)
}
