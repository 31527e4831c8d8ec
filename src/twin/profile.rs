//! Filename-driven classification of presentation files.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::domain::classifier::{Rule, first_match};

/// The document family a presentation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentCategory {
    /// Architecture overviews.
    SystemArchitecture,
    /// Values and commitments.
    ValuesPolicy,
    /// Status reports and phase reviews.
    ProjectStatus,
    /// Naming and documentation conventions.
    Standards,
    /// Regulatory compliance.
    Compliance,
    /// Buildings and facilities.
    Infrastructure,
    /// Plant systems and operations.
    Systems,
    /// Anything else.
    General,
}

impl DocumentCategory {
    /// The name used in metadata and summaries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SystemArchitecture => "SYSTEM_ARCHITECTURE",
            Self::ValuesPolicy => "VALUES_POLICY",
            Self::ProjectStatus => "PROJECT_STATUS",
            Self::Standards => "STANDARDS",
            Self::Compliance => "COMPLIANCE",
            Self::Infrastructure => "INFRASTRUCTURE",
            Self::Systems => "SYSTEMS",
            Self::General => "GENERAL",
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgently a document should be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    /// Regulatory deadlines apply.
    Critical,
    /// Process early.
    High,
    /// Process in turn.
    Medium,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
        })
    }
}

/// Refinement of a [`DocumentCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubCategory {
    /// Core plant architecture.
    CoreSystems,
    /// Policy and governance.
    Governance,
    /// Milestones and reviews.
    ProgressTracking,
    /// Documentation rules.
    Documentation,
    /// Regulatory obligations.
    Regulatory,
    /// Buildings and sites.
    Facilities,
    /// Running the plant.
    Operations,
    /// Unclassified.
    Misc,
}

impl fmt::Display for SubCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::CoreSystems => "CORE_SYSTEMS",
            Self::Governance => "GOVERNANCE",
            Self::ProgressTracking => "PROGRESS_TRACKING",
            Self::Documentation => "DOCUMENTATION",
            Self::Regulatory => "REGULATORY",
            Self::Facilities => "FACILITIES",
            Self::Operations => "OPERATIONS",
            Self::Misc => "MISC",
        })
    }
}

/// The classification of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Profile {
    /// Document family.
    pub category: DocumentCategory,
    /// Processing urgency.
    pub priority: Urgency,
    /// Refinement of the family.
    pub sub_category: SubCategory,
}

impl Profile {
    const fn new(category: DocumentCategory, priority: Urgency, sub_category: SubCategory) -> Self {
        Self {
            category,
            priority,
            sub_category,
        }
    }
}

const FALLBACK_PROFILE: Profile = Profile::new(
    DocumentCategory::General,
    Urgency::Medium,
    SubCategory::Misc,
);

static PROFILE_RULES: LazyLock<Vec<Rule<Profile>>> = LazyLock::new(|| {
    use DocumentCategory as C;
    use SubCategory as S;
    use Urgency as U;

    vec![
        Rule::new(
            &["architecture", "minerva"],
            Profile::new(C::SystemArchitecture, U::High, S::CoreSystems),
        ),
        Rule::new(
            &["values", "commitments"],
            Profile::new(C::ValuesPolicy, U::High, S::Governance),
        ),
        Rule::new(
            &["status", "granting", "phase"],
            Profile::new(C::ProjectStatus, U::Medium, S::ProgressTracking),
        ),
        Rule::new(
            &["naming", "conventions"],
            Profile::new(C::Standards, U::High, S::Documentation),
        ),
        Rule::new(
            &["ped", "compliance"],
            Profile::new(C::Compliance, U::Critical, S::Regulatory),
        ),
        Rule::new(
            &["buildings", "qplant"],
            Profile::new(C::Infrastructure, U::Medium, S::Facilities),
        ),
        Rule::new(
            &["recovery", "pressure", "he"],
            Profile::new(C::Systems, U::High, S::Operations),
        ),
    ]
});

/// Classifies a file by its name. The first matching rule wins.
#[must_use]
pub fn classify_filename(filename: &str) -> Profile {
    first_match(&PROFILE_RULES, &filename.to_lowercase())
        .copied()
        .unwrap_or(FALLBACK_PROFILE)
}

/// A link from a document to a controlled reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossReference {
    /// The reference number, e.g. `SCK CEN/0245`.
    pub reference: &'static str,
    /// What the reference is about.
    pub context: &'static str,
    /// Always `primary`; filename matching cannot find secondary references.
    #[serde(rename = "type")]
    pub kind: &'static str,
}

static REFERENCE_RULES: LazyLock<Vec<Rule<(&'static str, &'static str)>>> = LazyLock::new(|| {
    vec![
        Rule::new(
            &["minerva", "architecture"],
            ("SCK CEN/0245", "MINERVA Architecture"),
        ),
        Rule::new(
            &["values", "commitments"],
            ("SCK CEN/0156", "Values & Commitments"),
        ),
        Rule::new(&["qplant", "status"], ("SCK CEN/0789", "QPLANT Status")),
        Rule::new(
            &["naming", "conventions"],
            ("SCK CEN/0334", "Naming Conventions"),
        ),
        Rule::new(&["ped", "compliance"], ("SCK CEN/0567", "PED Compliance")),
    ]
});

/// Every reference whose keywords occur in the file name, in table order.
#[must_use]
pub fn cross_references(filename: &str) -> Vec<CrossReference> {
    let lowered = filename.to_lowercase();
    REFERENCE_RULES
        .iter()
        .filter(|rule| rule.matches(&lowered))
        .map(|rule| CrossReference {
            reference: rule.outcome.0,
            context: rule.outcome.1,
            kind: "primary",
        })
        .collect()
}

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("pattern is valid"));

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    UNSAFE_CHARS.replace_all(name, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("MINERVA overview.pptx", DocumentCategory::SystemArchitecture, Urgency::High; "architecture")]
    #[test_case("Our Values.pptx", DocumentCategory::ValuesPolicy, Urgency::High; "values")]
    #[test_case("Granting phase 2.pptx", DocumentCategory::ProjectStatus, Urgency::Medium; "status")]
    #[test_case("Naming rules.pptx", DocumentCategory::Standards, Urgency::High; "standards")]
    #[test_case("PED audit.pptx", DocumentCategory::Compliance, Urgency::Critical; "compliance")]
    #[test_case("Buildings.pptx", DocumentCategory::Infrastructure, Urgency::Medium; "infrastructure")]
    #[test_case("Recovery.pptx", DocumentCategory::Systems, Urgency::High; "systems")]
    #[test_case("Budget.pptx", DocumentCategory::General, Urgency::Medium; "fallback")]
    fn filename_profiles(name: &str, category: DocumentCategory, priority: Urgency) {
        let profile = classify_filename(name);
        assert_eq!(profile.category, category);
        assert_eq!(profile.priority, priority);
    }

    #[test]
    fn first_profile_rule_wins() {
        // "status" precedes "qplant" in the table.
        let profile = classify_filename("QPLANT status.pptx");
        assert_eq!(profile.category, DocumentCategory::ProjectStatus);
        assert_eq!(profile.sub_category, SubCategory::ProgressTracking);
    }

    #[test]
    fn every_matching_reference_contributes() {
        let refs: Vec<&str> = cross_references("MINERVA QPLANT status.pptx")
            .into_iter()
            .map(|r| r.reference)
            .collect();
        assert_eq!(refs, ["SCK CEN/0245", "SCK CEN/0789"]);
    }

    #[test]
    fn no_references_for_unrelated_name() {
        assert!(cross_references("Budget.pptx").is_empty());
    }

    #[test]
    fn reference_serializes_type_key() {
        let value = serde_json::to_value(&cross_references("ped.pptx")[0]).unwrap();
        assert_eq!(value["type"], "primary");
        assert_eq!(value["context"], "PED Compliance");
    }

    #[test]
    fn names_are_normalized() {
        assert_eq!(normalize_name("QPLANT status (v2)"), "QPLANT_status__v2_");
        assert_eq!(normalize_name("a.b-c_d"), "a.b-c_d");
        assert_eq!(normalize_name("Ünits"), "_nits");
    }

    #[test]
    fn category_names_match_serialization() {
        let json = serde_json::to_value(DocumentCategory::SystemArchitecture).unwrap();
        assert_eq!(json, DocumentCategory::SystemArchitecture.as_str());
    }
}
