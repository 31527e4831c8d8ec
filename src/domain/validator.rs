//! Post-hoc checks over a dump of enriched requirements.
//!
//! The validator never stops at the first problem. Every record is checked
//! and all findings are returned in a [`ValidationReport`]. Errors fail the
//! report; warnings are advisory.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};
use serde::Serialize;
use thiserror::Error;

use crate::{
    domain::{
        HIERARCHY_DEPTH,
        hierarchy::HierarchyCatalog,
        requirement::{Priority, RequirementType, Status, VerificationMethod},
    },
    storage::RequirementRecord,
};

/// The id reported for records that have none.
pub const UNKNOWN_ID: &str = "UNKNOWN";

/// A problem that fails validation.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// A mandatory field is empty.
    #[error("{id}: missing required field '{field}'")]
    MissingField {
        /// The record id.
        id: String,
        /// The empty field.
        field: &'static str,
    },

    /// More than one record shares an id.
    #[error("duplicate requirement ids: {}", .ids.join(", "))]
    DuplicateIds {
        /// Every id that occurs more than once, sorted.
        ids: Vec<String>,
    },

    /// A hierarchy level is set below an empty one.
    #[error("{id}: sbs_l{level} is set but sbs_l{} is empty", .level - 1)]
    HierarchyGap {
        /// The record id.
        id: String,
        /// The first populated level below the gap.
        level: usize,
    },

    /// A categorical field holds an unknown value.
    #[error("{id}: invalid {field} '{value}'")]
    InvalidValue {
        /// The record id.
        id: String,
        /// The offending field.
        field: &'static str,
        /// The value found.
        value: String,
    },
}

/// Direction of a traceability link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDirection {
    /// An entry of `parent_requirements`.
    Parent,
    /// An entry of `child_requirements`.
    Child,
}

/// A problem that does not fail validation.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    /// A link names a requirement that is not in the dump.
    #[error("{id}: {direction:?} link to unknown requirement '{target}'")]
    DanglingLink {
        /// The record holding the link.
        id: String,
        /// Which list the link is in.
        direction: LinkDirection,
        /// The missing id.
        target: String,
    },

    /// A hierarchy value does not fit the catalog.
    #[error("{id}: sbs_l{level} '{node}' {reason}")]
    OffCatalog {
        /// The record id.
        id: String,
        /// The hierarchy level.
        level: usize,
        /// The value found.
        node: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Records that are, transitively, their own parents.
    #[error("parent links form a cycle: {}", .ids.join(" → "))]
    LinkCycle {
        /// The records in the cycle, sorted.
        ids: Vec<String>,
    },
}

/// The outcome of a validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Number of records checked.
    pub checked: usize,
    /// Problems that fail validation.
    pub errors: Vec<ValidationError>,
    /// Advisory findings.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// Whether the run found no errors.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks requirement records against the mandatory fields, the enum
/// vocabularies and a hierarchy catalog.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    catalog: &'a HierarchyCatalog,
}

impl<'a> Validator<'a> {
    /// Creates a validator that checks hierarchy values against `catalog`.
    #[must_use]
    pub const fn new(catalog: &'a HierarchyCatalog) -> Self {
        Self { catalog }
    }

    /// Validates `records`, collecting every finding.
    #[tracing::instrument(level = "debug", skip_all, fields(records = records.len()))]
    pub fn validate(&self, records: &[RequirementRecord]) -> ValidationReport {
        let mut report = ValidationReport {
            checked: records.len(),
            ..ValidationReport::default()
        };

        for record in records {
            check_mandatory(record, &mut report.errors);
            check_vocabulary(record, &mut report.errors);
            check_hierarchy_gap(record, &mut report.errors);
            self.check_catalog(record, &mut report.warnings);
        }

        if let Some(error) = duplicate_ids(records) {
            report.errors.push(error);
        }

        check_links(records, &mut report.warnings);

        tracing::debug!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "validation finished"
        );
        report
    }

    fn check_catalog(&self, record: &RequirementRecord, warnings: &mut Vec<ValidationWarning>) {
        let levels = record.sbs_levels();
        for (level, node) in levels.iter().enumerate() {
            if node.is_empty() {
                continue;
            }

            let reason = match self.catalog.get(node) {
                None => Some("is not in the breakdown structure".to_string()),
                Some(entry) if entry.level != level => {
                    Some(format!("is a level {} node", entry.level))
                }
                Some(entry) if level >= 2 => {
                    let above = levels[level - 1];
                    (!above.is_empty() && entry.parent.as_deref() != Some(above))
                        .then(|| format!("is not under '{above}'"))
                }
                Some(_) => None,
            };

            if let Some(reason) = reason {
                warnings.push(ValidationWarning::OffCatalog {
                    id: record_id(record),
                    level,
                    node: (*node).to_string(),
                    reason,
                });
            }
        }
    }
}

fn record_id(record: &RequirementRecord) -> String {
    let id = record.req_id.trim();
    if id.is_empty() {
        UNKNOWN_ID.to_string()
    } else {
        id.to_string()
    }
}

fn check_mandatory(record: &RequirementRecord, errors: &mut Vec<ValidationError>) {
    let fields = [
        ("req_id", &record.req_id),
        ("description", &record.description),
        ("sbs_l0", &record.sbs_l0),
        ("sbs_l1", &record.sbs_l1),
        ("requirement_type", &record.requirement_type),
        ("priority", &record.priority),
    ];

    errors.extend(
        fields
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| ValidationError::MissingField {
                id: record_id(record),
                field,
            }),
    );
}

fn check_vocabulary(record: &RequirementRecord, errors: &mut Vec<ValidationError>) {
    let checks: [(&'static str, &str, bool); 4] = [
        (
            "requirement_type",
            &record.requirement_type,
            record.requirement_type.parse::<RequirementType>().is_ok(),
        ),
        (
            "priority",
            &record.priority,
            record.priority.parse::<Priority>().is_ok(),
        ),
        (
            "verification_method",
            &record.verification_method,
            record.verification_method.parse::<VerificationMethod>().is_ok(),
        ),
        (
            "status",
            &record.status,
            record.status.parse::<Status>().is_ok(),
        ),
    ];

    // Empty values are either reported as missing or optional.
    errors.extend(
        checks
            .into_iter()
            .filter(|(_, value, valid)| !value.trim().is_empty() && !valid)
            .map(|(field, value, _)| ValidationError::InvalidValue {
                id: record_id(record),
                field,
                value: value.to_string(),
            }),
    );
}

fn check_hierarchy_gap(record: &RequirementRecord, errors: &mut Vec<ValidationError>) {
    let levels = record.sbs_levels();
    for level in 1..HIERARCHY_DEPTH {
        if !levels[level].is_empty() && levels[level - 1].is_empty() {
            errors.push(ValidationError::HierarchyGap {
                id: record_id(record),
                level,
            });
        }
    }
}

fn duplicate_ids(records: &[RequirementRecord]) -> Option<ValidationError> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        let id = record.req_id.trim();
        if !id.is_empty() {
            *counts.entry(id).or_default() += 1;
        }
    }

    let ids: Vec<String> = counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(id, _)| id.to_string())
        .collect();

    (!ids.is_empty()).then_some(ValidationError::DuplicateIds { ids })
}

fn check_links(records: &[RequirementRecord], warnings: &mut Vec<ValidationWarning>) {
    let known: BTreeSet<&str> = records.iter().map(|r| r.req_id.trim()).collect();
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for record in records {
        let id = record.req_id.trim();
        if id.is_empty() {
            continue;
        }
        graph.add_node(id);

        let links = record
            .parent_requirements
            .iter()
            .map(|target| (LinkDirection::Parent, target))
            .chain(
                record
                    .child_requirements
                    .iter()
                    .map(|target| (LinkDirection::Child, target)),
            );

        for (direction, target) in links {
            let target = target.trim();
            if !known.contains(target) {
                warnings.push(ValidationWarning::DanglingLink {
                    id: id.to_string(),
                    direction,
                    target: target.to_string(),
                });
                continue;
            }
            match direction {
                LinkDirection::Parent => graph.add_edge(id, target, ()),
                LinkDirection::Child => graph.add_edge(target, id, ()),
            };
        }
    }

    for component in tarjan_scc(&graph) {
        let looped = component.len() > 1
            || component
                .first()
                .is_some_and(|&node| graph.contains_edge(node, node));
        if looped {
            let mut ids: Vec<String> = component.into_iter().map(str::to_string).collect();
            ids.sort();
            warnings.push(ValidationWarning::LinkCycle { ids });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> RequirementRecord {
        RequirementRecord {
            req_id: id.to_string(),
            description: "The plant shall operate".to_string(),
            sbs_l0: "QSYS".to_string(),
            sbs_l1: "QPLANT".to_string(),
            sbs_l2: "WCS".to_string(),
            requirement_type: "Performance".to_string(),
            priority: "High".to_string(),
            verification_method: "Test".to_string(),
            status: "Active".to_string(),
            ..RequirementRecord::default()
        }
    }

    fn validate(records: &[RequirementRecord]) -> ValidationReport {
        Validator::new(&HierarchyCatalog::sbs()).validate(records)
    }

    #[test]
    fn clean_records_pass() {
        let report = validate(&[record("RTM-01"), record("RTM-02")]);
        assert!(report.passed(), "{report:?}");
        assert!(report.warnings.is_empty(), "{report:?}");
        assert_eq!(report.checked, 2);
    }

    #[test]
    fn duplicate_id_is_one_error() {
        let report = validate(&[record("RTM-01"), record("RTM-01"), record("RTM-02")]);

        assert!(!report.passed());
        assert_eq!(
            report.errors,
            vec![ValidationError::DuplicateIds {
                ids: vec!["RTM-01".to_string()]
            }]
        );
    }

    #[test]
    fn missing_description_is_reported() {
        let mut broken = record("RTM-03");
        broken.description = "  ".to_string();

        let report = validate(&[broken]);
        assert_eq!(
            report.errors,
            vec![ValidationError::MissingField {
                id: "RTM-03".to_string(),
                field: "description"
            }]
        );
    }

    #[test]
    fn every_missing_field_is_collected() {
        let report = validate(&[RequirementRecord::default()]);

        let missing: Vec<&str> = report
            .errors
            .iter()
            .filter_map(|error| match error {
                ValidationError::MissingField { id, field } => {
                    assert_eq!(id, UNKNOWN_ID);
                    Some(*field)
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            missing,
            [
                "req_id",
                "description",
                "sbs_l0",
                "sbs_l1",
                "requirement_type",
                "priority"
            ]
        );
    }

    #[test]
    fn gap_in_hierarchy_is_an_error() {
        let mut broken = record("RTM-04");
        broken.sbs_l1 = String::new();
        broken.sbs_l2 = "QRB".to_string();

        let report = validate(&[broken]);
        assert!(report.errors.contains(&ValidationError::HierarchyGap {
            id: "RTM-04".to_string(),
            level: 2
        }));
    }

    #[test]
    fn unknown_vocabulary_is_an_error() {
        let mut broken = record("RTM-05");
        broken.priority = "Urgent".to_string();
        broken.verification_method = "Guesswork".to_string();

        let report = validate(&[broken]);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.contains(&ValidationError::InvalidValue {
            id: "RTM-05".to_string(),
            field: "priority",
            value: "Urgent".to_string()
        }));
    }

    #[test]
    fn dangling_link_is_a_warning() {
        let mut child = record("RTM-02");
        child.parent_requirements = vec!["RTM-99".to_string()];

        let report = validate(&[child]);
        assert!(report.passed());
        assert_eq!(
            report.warnings,
            vec![ValidationWarning::DanglingLink {
                id: "RTM-02".to_string(),
                direction: LinkDirection::Parent,
                target: "RTM-99".to_string()
            }]
        );
    }

    #[test]
    fn off_catalog_nodes_are_warnings() {
        let mut unknown = record("RTM-06");
        unknown.sbs_l1 = "QMOON".to_string();
        unknown.sbs_l2 = String::new();

        let mut misplaced = record("RTM-07");
        misplaced.sbs_l3 = "TURBINES".to_string();

        let report = validate(&[unknown, misplaced]);
        assert!(report.passed());
        assert_eq!(report.warnings.len(), 2, "{:?}", report.warnings);
        assert!(matches!(
            &report.warnings[1],
            ValidationWarning::OffCatalog { id, level: 3, .. } if id == "RTM-07"
        ));
    }

    #[test]
    fn parent_cycles_are_warnings() {
        let mut a = record("A");
        a.parent_requirements = vec!["B".to_string()];
        let mut b = record("B");
        b.parent_requirements = vec!["A".to_string()];

        let report = validate(&[a, b, record("C")]);
        assert!(report.passed());
        assert_eq!(
            report.warnings,
            vec![ValidationWarning::LinkCycle {
                ids: vec!["A".to_string(), "B".to_string()]
            }]
        );
    }

    #[test]
    fn consistent_parent_child_pair_is_not_a_cycle() {
        let mut parent = record("P");
        parent.child_requirements = vec!["C".to_string()];
        let mut child = record("C");
        child.parent_requirements = vec!["P".to_string()];

        let report = validate(&[parent, child]);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn report_serializes_with_kinds() {
        let report = validate(&[record("X"), record("X")]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["errors"][0]["kind"], "duplicate_ids");
        assert_eq!(value["checked"], 2);
    }
}
