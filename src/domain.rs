//! Domain models for requirements traceability.
//!
//! This module contains the requirement types, the system breakdown
//! structure, and the rule-driven classifier, linker and validator that
//! operate on them.

/// Requirement identity and attributes.
pub mod requirement;
pub use requirement::{
    Classification, HIERARCHY_DEPTH, HierarchyGap, HierarchyPath, InvalidRequirementId, Priority,
    RawRequirement, Requirement, RequirementId, RequirementType, Status, UnknownVariant,
    VerificationMethod,
};

pub mod hierarchy;
pub use hierarchy::{CatalogError, HierarchyCatalog, HierarchyNode};

pub mod classifier;
pub use classifier::{ClassifierRules, KeywordClassifier, RuleError};

pub mod linker;
pub use linker::{LinkGroup, LinkGroups, RelationshipLinker};

pub mod validator;
pub use validator::{ValidationError, ValidationReport, ValidationWarning, Validator};

mod config;
pub use config::{Config, ConfigError, DocumentInfo};
