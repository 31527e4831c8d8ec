//! Requirement identity, categorical attributes and hierarchy placement.

use std::{collections::BTreeSet, fmt, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

/// A validated, non-empty requirement identifier (e.g. `RTM-01`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequirementId(NonEmptyString);

impl RequirementId {
    /// Creates a new identifier, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequirementId`] if the trimmed string is empty.
    pub fn new(s: impl Into<String>) -> Result<Self, InvalidRequirementId> {
        let s: String = s.into();
        let trimmed = s.trim().to_string();
        NonEmptyString::new(trimmed)
            .map(Self)
            .map_err(|_| InvalidRequirementId(s))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for RequirementId {
    type Error = InvalidRequirementId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RequirementId {
    type Error = InvalidRequirementId;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RequirementId> for String {
    fn from(id: RequirementId) -> Self {
        id.as_str().to_string()
    }
}

impl FromStr for RequirementId {
    type Err = InvalidRequirementId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for RequirementId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for RequirementId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a requirement identifier is empty.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid requirement id '{0}': must contain at least one non-whitespace character")]
pub struct InvalidRequirementId(String);

/// Error returned when parsing one of the categorical requirement attributes.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown {attribute} '{value}'")]
pub struct UnknownVariant {
    attribute: &'static str,
    value: String,
}

macro_rules! attribute_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($(#[$vmeta:meta])* $variant:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The display name of this value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|value| value.as_str().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| UnknownVariant {
                        attribute: $label,
                        value: s.to_string(),
                    })
            }
        }
    };
}

attribute_enum! {
    /// The broad nature of a requirement.
    RequirementType, "requirement type" {
        /// Capacity, rate, efficiency and similar measurable targets.
        Performance,
        /// Protection of people and equipment.
        Safety,
        /// Connections and compatibility with other systems.
        Interface,
        /// Behaviour, operation and control.
        Functional,
        /// Construction, materials and lifetime.
        Design,
    }
}

attribute_enum! {
    /// How urgently a requirement must be satisfied.
    Priority, "priority" {
        /// Mandatory language ("shall", "must") or safety related.
        High,
        /// Advisory language ("should", "may").
        Medium,
    }
}

attribute_enum! {
    /// How compliance with a requirement is demonstrated.
    VerificationMethod, "verification method" {
        /// Measured under controlled conditions.
        Test,
        /// Shown by calculation or modelling.
        Analysis,
        /// Checked by examining documents or hardware.
        Inspection,
        /// Observed during operation.
        Demonstration,
    }
}

attribute_enum! {
    /// Lifecycle status of a requirement.
    Status, "status" {
        /// The requirement is in force.
        Active,
    }
}

/// The number of levels in the system breakdown structure.
pub const HIERARCHY_DEPTH: usize = 4;

/// An assignment of a requirement to the system breakdown structure.
///
/// Holds between zero and [`HIERARCHY_DEPTH`] node ids, shallowest first.
/// A deeper level can never be present without every shallower one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchyPath(Vec<String>);

/// A deeper hierarchy level was assigned while a shallower one was not.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("hierarchy level {level} is set but level {} is empty", .level - 1)]
pub struct HierarchyGap {
    /// The first level found below an unassigned level.
    pub level: usize,
}

impl HierarchyPath {
    /// Builds a path from per-level assignments.
    ///
    /// Empty strings are treated as unassigned.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyGap`] if an assigned level follows an unassigned
    /// one.
    pub fn from_levels<I, S>(levels: I) -> Result<Self, HierarchyGap>
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let mut path = Vec::with_capacity(HIERARCHY_DEPTH);
        let mut ended = false;
        for (level, value) in levels.into_iter().take(HIERARCHY_DEPTH).enumerate() {
            match value.map(Into::<String>::into).filter(|v| !v.is_empty()) {
                Some(_) if ended => return Err(HierarchyGap { level }),
                Some(v) => path.push(v),
                None => ended = true,
            }
        }
        Ok(Self(path))
    }

    /// The node assigned at `level`, if any.
    #[must_use]
    pub fn level(&self, level: usize) -> Option<&str> {
        self.0.get(level).map(String::as_str)
    }

    /// The number of assigned levels.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Iterates the assigned nodes, shallowest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for HierarchyPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0.join(" → "))
    }
}

/// A requirement as transcribed from its source document, before
/// classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRequirement {
    /// Unique identifier.
    pub id: RequirementId,
    /// The requirement text.
    pub description: String,
    /// Section of the source document the text came from.
    #[serde(default)]
    pub section: String,
    /// Free-form grouping used by the source document.
    #[serde(default)]
    pub category: String,
    /// The headline quantity, as written in the source.
    #[serde(default)]
    pub numerical_value: String,
}

/// The attributes the classifier derives from a requirement's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Placement in the system breakdown structure.
    pub hierarchy: HierarchyPath,
    /// The requirement type.
    pub kind: RequirementType,
    /// The requirement priority.
    pub priority: Priority,
    /// The verification method.
    pub verification: VerificationMethod,
    /// Acceptance criteria derived from quantities in the text.
    pub acceptance_criteria: String,
    /// Why the requirement exists.
    pub rationale: String,
}

/// A classified requirement with its traceability links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub(crate) id: RequirementId,
    pub(crate) description: String,
    pub(crate) source_section: String,
    pub(crate) category: String,
    pub(crate) numerical_value: String,
    pub(crate) classification: Classification,
    pub(crate) parents: BTreeSet<RequirementId>,
    pub(crate) children: BTreeSet<RequirementId>,
    pub(crate) status: Status,
}

impl Requirement {
    /// Combines a raw record with its classification.
    ///
    /// The new requirement is active and has no links.
    #[must_use]
    pub fn new(raw: RawRequirement, classification: Classification) -> Self {
        Self {
            id: raw.id,
            description: raw.description,
            source_section: raw.section,
            category: raw.category,
            numerical_value: raw.numerical_value,
            classification,
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
            status: Status::Active,
        }
    }

    /// The unique identifier.
    #[must_use]
    pub const fn id(&self) -> &RequirementId {
        &self.id
    }

    /// The requirement text.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The section of the source document.
    #[must_use]
    pub fn source_section(&self) -> &str {
        &self.source_section
    }

    /// The source document's grouping of this requirement.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The headline quantity, as written in the source.
    #[must_use]
    pub fn numerical_value(&self) -> &str {
        &self.numerical_value
    }

    /// The derived attributes.
    #[must_use]
    pub const fn classification(&self) -> &Classification {
        &self.classification
    }

    /// Placement in the system breakdown structure.
    #[must_use]
    pub const fn hierarchy(&self) -> &HierarchyPath {
        &self.classification.hierarchy
    }

    /// The requirement type.
    #[must_use]
    pub const fn kind(&self) -> RequirementType {
        self.classification.kind
    }

    /// The requirement priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.classification.priority
    }

    /// The verification method.
    #[must_use]
    pub const fn verification(&self) -> VerificationMethod {
        self.classification.verification
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Requirements this one is derived from.
    #[must_use]
    pub const fn parents(&self) -> &BTreeSet<RequirementId> {
        &self.parents
    }

    /// Requirements derived from this one.
    #[must_use]
    pub const fn children(&self) -> &BTreeSet<RequirementId> {
        &self.children
    }

    /// Replaces the parent set with a single parent.
    pub(crate) fn set_parent(&mut self, parent: RequirementId) {
        self.parents.clear();
        self.parents.insert(parent);
    }

    /// Adds a child, returning `false` if it was already present.
    pub(crate) fn add_child(&mut self, child: RequirementId) -> bool {
        self.children.insert(child)
    }
}
