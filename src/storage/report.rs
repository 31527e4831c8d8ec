//! Writes the generated matrix to disk.
//!
//! A run produces three files in the output directory: the Markdown
//! handover document, the workbook and a plain JSON dump of every record.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{
    domain::{DocumentInfo, HierarchyCatalog, Requirement},
    storage::RequirementRecord,
};

/// Markdown rendering of the handover document.
pub mod markdown;
mod workbook;

pub use workbook::{Sheet, Workbook};

/// File name of the Markdown handover document.
pub const MARKDOWN_FILE: &str = "RTM.md";
/// File name of the workbook.
pub const WORKBOOK_FILE: &str = "RTM_workbook.json";
/// File name of the record dump.
pub const RECORDS_FILE: &str = "requirements.json";

/// A report could not be written.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The output directory could not be created.
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        /// The directory.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A JSON document could not be serialized.
    #[error("failed to serialize {}: {source}", path.display())]
    Json {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },
}

/// Where each export of a run was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    /// The Markdown handover document.
    pub markdown: PathBuf,
    /// The workbook.
    pub workbook: PathBuf,
    /// The record dump.
    pub records: PathBuf,
}

/// Renders enriched requirements into the output directory.
#[derive(Debug, Clone)]
pub struct ReportAssembler<'a> {
    output_dir: PathBuf,
    document: DocumentInfo,
    catalog: &'a HierarchyCatalog,
}

impl<'a> ReportAssembler<'a> {
    /// Creates an assembler writing into `output_dir`.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        document: DocumentInfo,
        catalog: &'a HierarchyCatalog,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            document,
            catalog,
        }
    }

    /// The directory reports are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes all three exports, creating the output directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or any file cannot be written.
    #[tracing::instrument(skip_all, fields(dir = %self.output_dir.display()))]
    pub fn write_all(&self, requirements: &[Requirement]) -> Result<ReportPaths, ReportError> {
        let records: Vec<RequirementRecord> =
            requirements.iter().map(RequirementRecord::from).collect();

        std::fs::create_dir_all(&self.output_dir).map_err(|source| ReportError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let paths = ReportPaths {
            markdown: self.write_markdown(&records)?,
            workbook: self.write_workbook(&records)?,
            records: self.write_records(&records)?,
        };
        tracing::info!(count = records.len(), "reports written");
        Ok(paths)
    }

    /// Writes the Markdown handover document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_markdown(&self, records: &[RequirementRecord]) -> Result<PathBuf, ReportError> {
        let path = self.output_dir.join(MARKDOWN_FILE);
        let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let write_error = |source| ReportError::Write {
            path: path.clone(),
            source,
        };

        let mut writer = BufWriter::new(File::create(&path).map_err(write_error)?);
        markdown::write(
            &mut writer,
            records,
            self.catalog,
            &self.document,
            &generated,
        )
        .map_err(write_error)?;
        writer.flush().map_err(write_error)?;
        tracing::debug!(path = %path.display(), "wrote markdown document");
        Ok(path)
    }

    /// Writes the workbook.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_workbook(&self, records: &[RequirementRecord]) -> Result<PathBuf, ReportError> {
        let path = self.output_dir.join(WORKBOOK_FILE);
        write_json(&path, &Workbook::build(records, self.catalog))?;
        tracing::debug!(path = %path.display(), "wrote workbook");
        Ok(path)
    }

    /// Writes the plain record dump.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_records(&self, records: &[RequirementRecord]) -> Result<PathBuf, ReportError> {
        let path = self.output_dir.join(RECORDS_FILE);
        write_json(&path, records)?;
        tracing::debug!(path = %path.display(), "wrote records");
        Ok(path)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ReportError> {
    let write_error = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(write_error)?);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| ReportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.write_all(b"\n").map_err(write_error)?;
    writer.flush().map_err(write_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Config, HierarchyCatalog},
        pipeline::Generator,
        storage::{BuiltinExtractor, load_records},
    };

    fn generate() -> Vec<Requirement> {
        let catalog = HierarchyCatalog::sbs();
        let config = Config::default();
        Generator::new(config.classifier(&catalog).unwrap(), config.linker())
            .generate(&BuiltinExtractor)
            .unwrap()
    }

    #[test]
    fn writes_three_exports() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("nested").join("rtm");
        let catalog = HierarchyCatalog::sbs();

        let paths = ReportAssembler::new(&out, DocumentInfo::default(), &catalog)
            .write_all(&generate())
            .unwrap();

        assert_eq!(paths.markdown, out.join(MARKDOWN_FILE));
        assert!(paths.markdown.is_file());
        assert!(paths.workbook.is_file());
        assert!(paths.records.is_file());
    }

    #[test]
    fn record_dump_reloads() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = HierarchyCatalog::sbs();
        let requirements = generate();

        let paths = ReportAssembler::new(tmp.path(), DocumentInfo::default(), &catalog)
            .write_all(&requirements)
            .unwrap();

        let records = load_records(&paths.records).unwrap();
        assert_eq!(records.len(), 16);
        assert_eq!(records[0], RequirementRecord::from(&requirements[0]));
    }

    #[test]
    fn markdown_mentions_every_id() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = HierarchyCatalog::sbs();
        let requirements = generate();

        let paths = ReportAssembler::new(tmp.path(), DocumentInfo::default(), &catalog)
            .write_all(&requirements)
            .unwrap();

        let document = std::fs::read_to_string(paths.markdown).unwrap();
        for requirement in &requirements {
            assert!(document.contains(requirement.id().as_str()));
        }
    }

    #[test]
    fn workbook_is_valid_json_with_sheets() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = HierarchyCatalog::sbs();

        let paths = ReportAssembler::new(tmp.path(), DocumentInfo::default(), &catalog)
            .write_all(&generate())
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(paths.workbook).unwrap()).unwrap();
        let sheets = value["sheets"].as_array().unwrap();
        assert_eq!(sheets.len(), 6);
        assert_eq!(sheets[1]["rows"].as_array().unwrap().len(), 16);
    }
}
