//! Requirements Traceability Matrix generation
//!
//! Requirement statements are classified by keyword rules into a system
//! breakdown structure, linked into parent/child clusters and written out as
//! a Markdown document, a workbook and a JSON dump that can be re-validated.

pub mod domain;
pub use domain::{Config, HierarchyCatalog, KeywordClassifier, RelationshipLinker, Requirement};

/// The extract, classify and link pipeline.
pub mod pipeline;
pub use pipeline::Generator;

/// Requirement sources and report writers.
pub mod storage;
pub use storage::{ReportAssembler, RequirementRecord};

/// Digital twins for presentation files.
pub mod twin;
