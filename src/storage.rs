//! Reading requirement sources and writing reports.

pub mod record;
pub mod report;
pub mod source;

pub use record::{RecordError, RequirementRecord, load_records};
pub use report::{ReportAssembler, ReportError, ReportPaths};
pub use source::{BuiltinExtractor, ExtractError, Extractor, FileExtractor};
