//! The flat, serialized form of an enriched requirement.

use serde::{Deserialize, Serialize};

use crate::domain::{HIERARCHY_DEPTH, Requirement};

/// A requirement as it appears in `requirements.json` and the workbook.
///
/// Every field is a plain string so that hand-edited or foreign dumps can
/// be loaded and then checked by the validator. Unassigned hierarchy levels
/// are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementRecord {
    /// Requirement id.
    pub req_id: String,
    /// Requirement text.
    pub description: String,
    /// Level 0 node.
    pub sbs_l0: String,
    /// Level 1 node.
    pub sbs_l1: String,
    /// Level 2 node.
    pub sbs_l2: String,
    /// Level 3 node.
    pub sbs_l3: String,
    /// One of the [`RequirementType`](crate::domain::RequirementType) names.
    pub requirement_type: String,
    /// One of the [`Priority`](crate::domain::Priority) names.
    pub priority: String,
    /// One of the [`VerificationMethod`](crate::domain::VerificationMethod)
    /// names.
    pub verification_method: String,
    /// Derived acceptance criteria.
    pub acceptance_criteria: String,
    /// Derived rationale.
    pub rationale: String,
    /// Section of the source document.
    pub source_section: String,
    /// Source document grouping.
    pub category: String,
    /// Headline quantity.
    pub numerical_value: String,
    /// Ids of the requirements this one derives from.
    pub parent_requirements: Vec<String>,
    /// Ids of the requirements derived from this one.
    pub child_requirements: Vec<String>,
    /// One of the [`Status`](crate::domain::Status) names.
    pub status: String,
}

impl RequirementRecord {
    /// The hierarchy columns, shallowest first.
    #[must_use]
    pub fn sbs_levels(&self) -> [&str; HIERARCHY_DEPTH] {
        [&self.sbs_l0, &self.sbs_l1, &self.sbs_l2, &self.sbs_l3]
    }

    /// The hierarchy columns joined with arrows, skipping empty levels.
    #[must_use]
    pub fn sbs_path(&self) -> String {
        self.sbs_levels()
            .into_iter()
            .filter(|level| !level.is_empty())
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

impl From<&Requirement> for RequirementRecord {
    fn from(requirement: &Requirement) -> Self {
        let hierarchy = requirement.hierarchy();
        let level = |n| hierarchy.level(n).unwrap_or_default().to_string();
        let classification = requirement.classification();

        Self {
            req_id: requirement.id().to_string(),
            description: requirement.description().to_string(),
            sbs_l0: level(0),
            sbs_l1: level(1),
            sbs_l2: level(2),
            sbs_l3: level(3),
            requirement_type: requirement.kind().to_string(),
            priority: requirement.priority().to_string(),
            verification_method: requirement.verification().to_string(),
            acceptance_criteria: classification.acceptance_criteria.clone(),
            rationale: classification.rationale.clone(),
            source_section: requirement.source_section().to_string(),
            category: requirement.category().to_string(),
            numerical_value: requirement.numerical_value().to_string(),
            parent_requirements: requirement.parents().iter().map(ToString::to_string).collect(),
            child_requirements: requirement.children().iter().map(ToString::to_string).collect(),
            status: requirement.status().to_string(),
        }
    }
}

/// Loads records from a JSON dump.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON list of
/// records.
pub fn load_records(path: &std::path::Path) -> Result<Vec<RequirementRecord>, RecordError> {
    let content = std::fs::read_to_string(path).map_err(|source| RecordError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| RecordError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// A requirements dump could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// The dump path.
        path: std::path::PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
    /// The file is not a list of records.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// The dump path.
        path: std::path::PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },
}
