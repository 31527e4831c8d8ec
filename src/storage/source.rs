//! Sources of raw requirement records.
//!
//! The [`Extractor`] trait is the seam where real document parsing would
//! plug in. Two sources ship with the crate: the hand-transcribed cryoplant
//! table ([`BuiltinExtractor`]) and YAML/JSON files ([`FileExtractor`]).

use std::{
    io,
    path::{Path, PathBuf},
};

use crate::domain::{RawRequirement, RequirementId};

/// Produces the raw requirements a report is generated from.
pub trait Extractor {
    /// Returns every raw requirement, in source order.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is missing or cannot be parsed.
    fn extract(&self) -> Result<Vec<RawRequirement>, ExtractError>;
}

/// A requirements source could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The source file does not exist.
    #[error("requirements source not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file extension is not one of the supported formats.
    #[error("unsupported requirements format '{}' (expected .yaml, .yml or .json)", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The source path.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The YAML content is malformed.
    #[error("failed to parse {}: {source}", path.display())]
    Yaml {
        /// The source path.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },

    /// The JSON content is malformed.
    #[error("failed to parse {}: {source}", path.display())]
    Json {
        /// The source path.
        path: PathBuf,
        /// The underlying error.
        source: serde_json::Error,
    },
}

/// The 16 operational requirements of the cryoplant technical requirements
/// document, transcribed by hand.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinExtractor;

impl Extractor for BuiltinExtractor {
    fn extract(&self) -> Result<Vec<RawRequirement>, ExtractError> {
        Ok(builtin_requirements())
    }
}

/// Reads raw requirements from a YAML (`.yaml`, `.yml`) or JSON (`.json`)
/// file holding a list of records.
#[derive(Debug, Clone)]
pub struct FileExtractor {
    path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl FileExtractor {
    /// Creates an extractor for `path`. The file is not touched until
    /// [`Extractor::extract`] is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The source path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Extractor for FileExtractor {
    fn extract(&self) -> Result<Vec<RawRequirement>, ExtractError> {
        let format = Format::from_path(&self.path)
            .ok_or_else(|| ExtractError::UnsupportedFormat(self.path.clone()))?;

        let content = std::fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ExtractError::NotFound(self.path.clone())
            } else {
                ExtractError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        let requirements: Vec<RawRequirement> = match format {
            Format::Yaml => serde_yaml::from_str(&content).map_err(|source| ExtractError::Yaml {
                path: self.path.clone(),
                source,
            })?,
            Format::Json => serde_json::from_str(&content).map_err(|source| ExtractError::Json {
                path: self.path.clone(),
                source,
            })?,
        };

        tracing::debug!(path = %self.path.display(), count = requirements.len(), "read requirements");
        Ok(requirements)
    }
}

fn builtin_requirements() -> Vec<RawRequirement> {
    const LIFETIME: &str = "3.2.1 Lifetime and annual maintenance schedule";
    const STEADY: &str = "3.2.2 Steady state operational scenarios";
    const TRANSIENT: &str = "3.2.3 Transient operational scenarios";
    const OTHER: &str = "3.2.4 Other operational scenarios";

    let table: [(&str, &str, &str, &str, &str); 16] = [
        (
            "RTM-01",
            "The QPLANT shall be capable to operate uninterrupted in 2K mode for at least 90 consecutive days",
            LIFETIME,
            "Operational",
            "90 days",
        ),
        (
            "RTM-02",
            "The maintenance schedule shall take into account the following constraints: ≥ 6 months: ≤ 10 days in 2K standby; ≥ 1 year: ≤ 20 days in 4.5K standby; ≥ 5 years: ≤ 60 days in warm stop; ≥ 10 years: ≤ 120 days in warm stop",
            LIFETIME,
            "Maintenance",
            "Various time limits",
        ),
        (
            "RTM-03",
            "The QPLANT shall have a lifetime of at least 40 years",
            LIFETIME,
            "Lifetime",
            "40 years",
        ),
        (
            "RTM-04",
            "The QPLANT shall support ≥ 50 warm-up/cool-down cycles (300 K ↔ 2 K)",
            LIFETIME,
            "Operational",
            "50 cycles",
        ),
        (
            "RTM-05",
            "The QPLANT shall support the steady state operational scenarios: Warm Stop, Thermal Shield Standby, 4.5 K Standby, 2 K Standby, 2 K Operation",
            STEADY,
            "Operational",
            "5 scenarios",
        ),
        (
            "RTM-06",
            "The QPLANT shall support the scenario transitions given in Figure 6",
            TRANSIENT,
            "Operational",
            "Multiple transitions",
        ),
        (
            "RTM-07",
            "The QPLANT shall execute the transition using the capacity defined by the steady state scenarios. No additional capacity shall be added solely for acceleration of state transitions",
            TRANSIENT,
            "Performance",
            "Existing capacity only",
        ),
        (
            "RTM-08",
            "The QPLANT shall perform the cool-down of the QPLANT simultaneously with the cryogenic users (QCELL and QDIST static heat loads only)",
            TRANSIENT,
            "Operational",
            "Simultaneous operation",
        ),
        (
            "RTM-09",
            "The QPLANT shall facilitate parallel cool down/warm up of all QCELLs. During cooldown and warm-up, cryomodules impose constraints: Magnetic shields must reach T < 70 K before cavities reach T < 10 K",
            TRANSIENT,
            "Operational",
            "T < 70K and T < 10K",
        ),
        (
            "RTM-010",
            "The QPLANT shall facilitate an alternative cooldown in which only the thermal-shield (TS) circuit is cooled until their average temperature reaches 50 K. Subsequently the headers A–B and D–E are simultaneous cooled down",
            TRANSIENT,
            "Operational",
            "50 K threshold",
        ),
        (
            "RTM-011",
            "The QPLANT shall facilitate the warm-up of the cryogenic users from 2 K to 300 K in less than 5 days",
            TRANSIENT,
            "Operational",
            "5 days maximum",
        ),
        (
            "RTM-012",
            "The QPLANT shall support the transition shown in Figure 6 for the warming-up of the cryogenic users, whether passively or actively (with QCELL heaters if available)",
            TRANSIENT,
            "Operational",
            "Multiple warming transitions",
        ),
        (
            "RTM-013",
            "The Contractor may implement a manual purging, manual conditioning, and manual initial preparation of the QPLANT",
            OTHER,
            "Operational",
            "Manual operation allowed",
        ),
        (
            "RTM-014",
            "The QPLANT shall adhere to the purge-parameter table (pressure, flow-rate, duration, allowable residual O₂) provided by SCK CEN during contract execution",
            OTHER,
            "Safety",
            "Per SCK CEN parameters",
        ),
        (
            "RTM-015",
            "The QPLANT shall facilitate an average retention rate of 0.8 g/s LHe per individual QCELL (24 g/s total) during the filling process",
            OTHER,
            "Performance",
            "0.8 g/s per QCELL, 24 g/s total",
        ),
        (
            "RTM-016",
            "During LHe filling, the QPLANT shall provide 2,900 L of LHe to the users",
            OTHER,
            "Performance",
            "2,900 L LHe",
        ),
    ];

    table
        .into_iter()
        .map(|(id, description, section, category, numerical_value)| RawRequirement {
            id: RequirementId::new(id).expect("built-in ids are non-empty"),
            description: description.to_string(),
            section: section.to_string(),
            category: category.to_string(),
            numerical_value: numerical_value.to_string(),
        })
        .collect()
}
