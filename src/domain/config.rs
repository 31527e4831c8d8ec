use std::{
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::domain::{
    classifier::{ClassifierRules, KeywordClassifier, RuleError},
    hierarchy::HierarchyCatalog,
    linker::{LinkGroups, RelationshipLinker},
};

/// Configuration for RTM generation.
///
/// Holds every rule and group table, so that a project can re-tune the
/// classifier without code changes. Each field falls back to the built-in
/// defaults when it is omitted from the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Requirements file to read instead of the built-in table.
    pub source: Option<PathBuf>,

    /// Directory the reports are written to.
    pub output_dir: PathBuf,

    /// Title block of the generated documents.
    pub document: DocumentInfo,

    /// Keyword rules for every derived attribute.
    pub rules: ClassifierRules,

    /// Parent/child clusters.
    pub groups: LinkGroups,
}

/// Identifies the generated documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentInfo {
    /// Document title.
    pub title: String,
    /// The project the requirements belong to.
    pub project: String,
    /// Controlled document identifier.
    pub document_id: String,
    /// Document version.
    pub version: String,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            title: "QPLANT Cryogenic System - Requirements Traceability Matrix".to_string(),
            project: "MYRRHA Phase 1 - Cryoplant Technical Requirements".to_string(),
            document_id: "QPLANT-RTM-001".to_string(),
            version: "1.0".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            output_dir: default_output_dir(),
            document: DocumentInfo::default(),
            rules: ClassifierRules::default(),
            groups: LinkGroups::default(),
        }
    }
}

/// Errors raised while reading or writing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        /// The configuration path.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The file is not valid configuration TOML.
    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        /// The configuration path.
        path: PathBuf,
        /// The underlying error.
        source: toml::de::Error,
    },

    /// The configuration could not be rendered as TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file could not be written.
    #[error("Failed to write config file {}: {source}", path.display())]
    Write {
        /// The configuration path.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the configuration, or returns the defaults if `path` does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds a classifier from the configured rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules name nodes that are not in `catalog`.
    pub fn classifier(&self, catalog: &HierarchyCatalog) -> Result<KeywordClassifier, RuleError> {
        KeywordClassifier::new(self.rules.clone(), catalog)
    }

    /// Builds a linker from the configured groups.
    #[must_use]
    pub fn linker(&self) -> RelationshipLinker {
        RelationshipLinker::new(self.groups.clone())
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("rtm")
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<PathBuf>,

        #[serde(default = "default_output_dir")]
        output_dir: PathBuf,

        #[serde(default)]
        document: DocumentInfo,

        #[serde(default)]
        rules: ClassifierRules,

        #[serde(default)]
        groups: LinkGroups,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                source,
                output_dir,
                document,
                rules,
                groups,
            } => Self {
                source,
                output_dir,
                document,
                rules,
                groups,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            source: config.source,
            output_dir: config.output_dir,
            document: config.document,
            rules: config.rules,
            groups: config.groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::requirement::{Priority, RequirementType};

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"_version = "1"
source = "reqs.yaml"
output_dir = "out"

[document]
title = "Test RTM"

[[groups]]
name = "pair"
members = ["RTM-01", "RTM-02"]
"#,
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.source, Some(PathBuf::from("reqs.yaml")));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.document.title, "Test RTM");
        assert_eq!(
            config.document.document_id,
            DocumentInfo::default().document_id
        );
        assert_eq!(config.groups.len(), 1);
        assert_eq!(config.rules, ClassifierRules::default());
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(matches!(error, ConfigError::Read { .. }));
        assert!(error.to_string().starts_with("Failed to read config file"));
    }

    #[test]
    fn load_or_default_tolerates_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&tmp.path().join("rtm.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\noutput_dir = 3\n").unwrap();

        let error = Config::load_or_default(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn unknown_version_is_rejected() {
        assert!(toml::from_str::<Config>(r#"_version = "2""#).is_err());
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load_preserves_rules() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rtm.toml");

        let mut config = Config::default();
        config.output_dir = PathBuf::from("handover");
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_rules_override_only_named_fields() {
        let config: Config = toml::from_str(
            r#"_version = "1"

[rules.priority]
default = "Medium"
rules = []
"#,
        )
        .unwrap();

        let classifier = config.classifier(&HierarchyCatalog::sbs()).unwrap();
        let classification = classifier.classify("The plant shall operate");
        assert_eq!(classification.priority, Priority::Medium);
        assert_eq!(classification.kind, RequirementType::Performance);
    }
}
