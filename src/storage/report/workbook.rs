//! A spreadsheet-shaped view of the matrix, serialized as JSON.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::{Value, json};

use crate::{domain::HierarchyCatalog, storage::RequirementRecord};

/// A set of named tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workbook {
    /// Sheets in presentation order.
    pub sheets: Vec<Sheet>,
}

/// One table of a [`Workbook`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    /// Sheet name.
    pub name: String,
    /// Column headers.
    pub columns: Vec<String>,
    /// Cells, one vector per row, aligned with `columns`.
    pub rows: Vec<Vec<Value>>,
}

impl Sheet {
    fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(ToString::to_string).collect(),
            rows: Vec::new(),
        }
    }

    /// The index of a column by header.
    #[must_use]
    pub fn column(&self, header: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == header)
    }
}

impl Workbook {
    /// Builds every sheet for `records`.
    #[must_use]
    pub fn build(records: &[RequirementRecord], catalog: &HierarchyCatalog) -> Self {
        Self {
            sheets: vec![
                navigation(),
                matrix(records),
                breakdown(catalog),
                summary(records),
                pivot("BySystem", "SBS Level 1", records, |r| r.sbs_l1.as_str()),
                pivot("ByType", "Category", records, category),
            ],
        }
    }

    /// Looks up a sheet by name.
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

fn category(record: &RequirementRecord) -> &str {
    if record.category.is_empty() {
        "General"
    } else {
        &record.category
    }
}

fn navigation() -> Sheet {
    let mut sheet = Sheet::new("Navigation", &["Sheet Name", "Description"]);
    sheet.rows = [
        ("RTM", "Complete RTM with all requirements and traceability"),
        ("SBS", "System Breakdown Structure hierarchy"),
        ("Summary", "Summary statistics and metrics"),
        ("BySystem", "Requirements organized by SBS levels"),
        ("ByType", "Requirements organized by type and category"),
    ]
    .into_iter()
    .map(|(name, description)| vec![json!(name), json!(description)])
    .collect();
    sheet
}

fn matrix(records: &[RequirementRecord]) -> Sheet {
    let mut sheet = Sheet::new(
        "RTM",
        &[
            "Requirement ID",
            "Description",
            "SBS Level 0",
            "SBS Level 1",
            "SBS Level 2",
            "SBS Level 3",
            "Requirement Type",
            "Category",
            "Priority",
            "Verification Method",
            "Acceptance Criteria",
            "Source Section",
            "Parent Requirements",
            "Child Requirements",
            "Status",
            "Rationale",
            "Numerical Value",
        ],
    );
    sheet.rows = records
        .iter()
        .map(|r| {
            let numerical_value: &str = if r.numerical_value.is_empty() {
                "N/A"
            } else {
                &r.numerical_value
            };
            vec![
                json!(r.req_id),
                json!(r.description),
                json!(r.sbs_l0),
                json!(r.sbs_l1),
                json!(r.sbs_l2),
                json!(r.sbs_l3),
                json!(r.requirement_type),
                json!(category(r)),
                json!(r.priority),
                json!(r.verification_method),
                json!(r.acceptance_criteria),
                json!(r.source_section),
                json!(r.parent_requirements.join(", ")),
                json!(r.child_requirements.join(", ")),
                json!(r.status),
                json!(r.rationale),
                json!(numerical_value),
            ]
        })
        .collect();
    sheet
}

fn breakdown(catalog: &HierarchyCatalog) -> Sheet {
    let mut sheet = Sheet::new(
        "SBS",
        &["SBS ID", "Name", "Level", "Parent", "Children", "Description"],
    );
    sheet.rows = catalog
        .nodes()
        .map(|node| {
            vec![
                json!(node.id),
                json!(node.name),
                json!(node.level),
                json!(node.parent.as_deref().unwrap_or_default()),
                json!(node.children.join(", ")),
                json!(node.description),
            ]
        })
        .collect();
    sheet
}

fn summary(records: &[RequirementRecord]) -> Sheet {
    let count = |predicate: &dyn Fn(&RequirementRecord) -> bool| {
        records.iter().filter(|&r| predicate(r)).count()
    };

    let metrics: [(&str, usize); 14] = [
        ("Total Requirements", records.len()),
        ("High Priority Requirements", count(&|r| r.priority == "High")),
        ("Medium Priority Requirements", count(&|r| r.priority == "Medium")),
        ("Safety Requirements", count(&|r| r.requirement_type == "Safety")),
        ("Performance Requirements", count(&|r| r.requirement_type == "Performance")),
        ("Functional Requirements", count(&|r| r.requirement_type == "Functional")),
        ("Design Requirements", count(&|r| r.requirement_type == "Design")),
        ("Interface Requirements", count(&|r| r.requirement_type == "Interface")),
        (
            "Requirements Needing Test Verification",
            count(&|r| r.verification_method == "Test"),
        ),
        (
            "Requirements Needing Analysis Verification",
            count(&|r| r.verification_method == "Analysis"),
        ),
        (
            "Requirements Needing Demonstration",
            count(&|r| r.verification_method == "Demonstration"),
        ),
        ("Operational Requirements", count(&|r| r.category == "Operational")),
        ("Maintenance Requirements", count(&|r| r.category == "Maintenance")),
        ("Lifetime Requirements", count(&|r| r.category == "Lifetime")),
    ];

    let mut sheet = Sheet::new("Summary", &["Metric", "Count"]);
    sheet.rows = metrics
        .into_iter()
        .map(|(metric, count)| vec![json!(metric), json!(count)])
        .collect();
    sheet
}

/// Counts records by `row_key` × requirement type. Rows and type columns
/// are sorted; missing combinations count zero.
fn pivot<'r>(
    name: &str,
    row_label: &str,
    records: &'r [RequirementRecord],
    row_key: impl Fn(&'r RequirementRecord) -> &'r str,
) -> Sheet {
    let types: BTreeSet<&str> = records.iter().map(|r| r.requirement_type.as_str()).collect();
    let mut counts: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
    for record in records {
        *counts
            .entry(row_key(record))
            .or_default()
            .entry(record.requirement_type.as_str())
            .or_default() += 1;
    }

    let mut columns = vec![row_label];
    columns.extend(types.iter().copied());

    let mut sheet = Sheet::new(name, &columns);
    sheet.rows = counts
        .into_iter()
        .map(|(row, by_type)| {
            std::iter::once(json!(row))
                .chain(
                    types
                        .iter()
                        .map(|kind| json!(by_type.get(kind).copied().unwrap_or(0))),
                )
                .collect()
        })
        .collect();
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, l1: &str, kind: &str, category: &str) -> RequirementRecord {
        RequirementRecord {
            req_id: id.to_string(),
            sbs_l0: "QSYS".to_string(),
            sbs_l1: l1.to_string(),
            requirement_type: kind.to_string(),
            priority: "High".to_string(),
            verification_method: "Test".to_string(),
            category: category.to_string(),
            ..RequirementRecord::default()
        }
    }

    fn records() -> Vec<RequirementRecord> {
        vec![
            record("R1", "QPLANT", "Performance", "Operational"),
            record("R2", "QPLANT", "Safety", "Safety"),
            record("R3", "QDIST", "Performance", ""),
            record("R4", "QPLANT", "Performance", "Operational"),
        ]
    }

    fn cell_sum(sheet: &Sheet) -> u64 {
        sheet
            .rows
            .iter()
            .flat_map(|row| row.iter().skip(1))
            .filter_map(Value::as_u64)
            .sum()
    }

    #[test]
    fn has_all_sheets_in_order() {
        let workbook = Workbook::build(&records(), &HierarchyCatalog::sbs());
        let names: Vec<&str> = workbook.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["Navigation", "RTM", "SBS", "Summary", "BySystem", "ByType"]
        );
    }

    #[test]
    fn pivots_count_every_requirement_once() {
        let records = records();
        let workbook = Workbook::build(&records, &HierarchyCatalog::sbs());

        for name in ["BySystem", "ByType"] {
            let sheet = workbook.sheet(name).unwrap();
            assert_eq!(cell_sum(sheet), records.len() as u64, "{name}");
        }
    }

    #[test]
    fn pivot_rows_and_columns_are_sorted() {
        let workbook = Workbook::build(&records(), &HierarchyCatalog::sbs());
        let by_system = workbook.sheet("BySystem").unwrap();

        assert_eq!(by_system.columns, ["SBS Level 1", "Performance", "Safety"]);
        assert_eq!(by_system.rows[0], vec![json!("QDIST"), json!(1), json!(0)]);
        assert_eq!(by_system.rows[1], vec![json!("QPLANT"), json!(2), json!(1)]);
    }

    #[test]
    fn blank_category_is_general() {
        let workbook = Workbook::build(&records(), &HierarchyCatalog::sbs());
        let by_type = workbook.sheet("ByType").unwrap();
        let rows: Vec<&Value> = by_type.rows.iter().map(|row| &row[0]).collect();
        assert_eq!(rows, [&json!("General"), &json!("Operational"), &json!("Safety")]);
    }

    #[test]
    fn summary_has_fourteen_metrics() {
        let workbook = Workbook::build(&records(), &HierarchyCatalog::sbs());
        let summary = workbook.sheet("Summary").unwrap();

        assert_eq!(summary.rows.len(), 14);
        assert_eq!(summary.rows[0], vec![json!("Total Requirements"), json!(4)]);
        assert_eq!(summary.rows[4], vec![json!("Performance Requirements"), json!(3)]);
    }

    #[test]
    fn sbs_sheet_lists_catalog() {
        let catalog = HierarchyCatalog::sbs();
        let workbook = Workbook::build(&[], &catalog);
        let sbs = workbook.sheet("SBS").unwrap();
        assert_eq!(sbs.rows.len(), catalog.len());
        assert_eq!(sbs.rows[0][0], json!("QSYS"));
        assert_eq!(sbs.rows[0][3], json!(""));
    }

    #[test]
    fn empty_input_gives_header_only_pivots() {
        let workbook = Workbook::build(&[], &HierarchyCatalog::sbs());
        let by_system = workbook.sheet("BySystem").unwrap();
        assert_eq!(by_system.columns, ["SBS Level 1"]);
        assert!(by_system.rows.is_empty());
    }
}
