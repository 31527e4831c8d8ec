use std::io::{self, Write};

use crate::{
    domain::{DocumentInfo, HierarchyCatalog},
    storage::RequirementRecord,
};

fn level_title(level: usize) -> &'static str {
    match level {
        0 => "System Level",
        1 => "Major Subsystems",
        2 => "Major Components",
        _ => "Sub-Components",
    }
}

/// Preserves first-appearance order of keys.
fn group_by<'r>(
    records: &'r [RequirementRecord],
    key: impl Fn(&'r RequirementRecord) -> &'r str,
) -> Vec<(&'r str, Vec<&'r RequirementRecord>)> {
    let mut groups: Vec<(&str, Vec<&RequirementRecord>)> = Vec::new();
    for record in records {
        let k = key(record);
        match groups.iter_mut().find(|(existing, _)| *existing == k) {
            Some((_, members)) => members.push(record),
            None => groups.push((k, vec![record])),
        }
    }
    groups
}

/// Writes the engineering handover document.
///
/// `generated` is the timestamp printed in the title block.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write<W: Write>(
    out: &mut W,
    records: &[RequirementRecord],
    catalog: &HierarchyCatalog,
    document: &DocumentInfo,
    generated: &str,
) -> io::Result<()> {
    let count = |predicate: fn(&RequirementRecord) -> bool| {
        records.iter().filter(|&r| predicate(r)).count()
    };

    writeln!(out, "# {}", document.title)?;
    writeln!(out, "## Engineering Handover Document\n")?;
    writeln!(out, "**Document Version:** {}  ", document.version)?;
    writeln!(out, "**Generated:** {generated}  ")?;
    writeln!(out, "**Project:** {}  ", document.project)?;
    writeln!(out, "**Document ID:** {}\n", document.document_id)?;
    writeln!(out, "---\n")?;

    writeln!(out, "## Key Metrics\n")?;
    writeln!(out, "- **Total Requirements:** {}", records.len())?;
    writeln!(
        out,
        "- **High Priority Requirements:** {}",
        count(|r| r.priority == "High")
    )?;
    writeln!(
        out,
        "- **Safety Requirements:** {}",
        count(|r| r.requirement_type == "Safety")
    )?;
    writeln!(
        out,
        "- **Performance Requirements:** {}\n",
        count(|r| r.requirement_type == "Performance")
    )?;
    writeln!(out, "---\n")?;

    write_breakdown(out, catalog)?;
    write_requirements(out, records)?;
    write_summary(out, records)
}

fn write_breakdown<W: Write>(out: &mut W, catalog: &HierarchyCatalog) -> io::Result<()> {
    writeln!(out, "## System Breakdown Structure (SBS)")?;
    for level in 0..=catalog.max_level() {
        writeln!(out, "\n### Level {level} - {}", level_title(level))?;
        for node in catalog.at_level(level) {
            write!(out, "- **{}**: {}", node.id, node.name)?;
            if level >= 2 {
                if let Some(parent) = &node.parent {
                    write!(out, " (under {parent})")?;
                }
            }
            writeln!(out)?;
        }
    }
    writeln!(out, "\n---\n")
}

fn write_requirements<W: Write>(out: &mut W, records: &[RequirementRecord]) -> io::Result<()> {
    writeln!(out, "## Requirements Breakdown\n")?;
    let by_category = group_by(records, |r| {
        if r.category.is_empty() {
            "General"
        } else {
            r.category.as_str()
        }
    });
    for (category, members) in by_category {
        writeln!(out, "### {category} Requirements\n")?;
        for r in members {
            writeln!(out, "#### {}", r.req_id)?;
            writeln!(out, "**Description:** {}\n", r.description)?;
            writeln!(out, "**SBS Assignment:** {}\n", r.sbs_path())?;
            writeln!(out, "**Type:** {}  ", r.requirement_type)?;
            writeln!(out, "**Priority:** {}  ", r.priority)?;
            writeln!(out, "**Verification Method:** {}  ", r.verification_method)?;
            writeln!(out, "**Acceptance Criteria:** {}  ", r.acceptance_criteria)?;
            writeln!(out, "**Rationale:** {}\n", r.rationale)?;
            if !r.parent_requirements.is_empty() {
                writeln!(
                    out,
                    "**Parent Requirements:** {}  ",
                    r.parent_requirements.join(", ")
                )?;
            }
            if !r.child_requirements.is_empty() {
                writeln!(
                    out,
                    "**Child Requirements:** {}  ",
                    r.child_requirements.join(", ")
                )?;
            }
            writeln!(out, "---\n")?;
        }
    }
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, records: &[RequirementRecord]) -> io::Result<()> {
    writeln!(out, "## Traceability Matrix Summary\n")?;
    writeln!(out, "| SBS Level 1 | Requirements Count | High Priority | Safety Critical |")?;
    writeln!(out, "|-------------|-------------------|---------------|-----------------|")?;
    for (node, members) in group_by(records, |r| r.sbs_l1.as_str()) {
        let high = members.iter().filter(|r| r.priority == "High").count();
        let safety = members
            .iter()
            .filter(|r| r.requirement_type == "Safety")
            .count();
        writeln!(out, "| {node} | {} | {high} | {safety} |", members.len())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, category: &str, kind: &str) -> RequirementRecord {
        RequirementRecord {
            req_id: id.to_string(),
            description: format!("{id} text"),
            sbs_l0: "QSYS".to_string(),
            sbs_l1: "QPLANT".to_string(),
            sbs_l2: "WCS".to_string(),
            requirement_type: kind.to_string(),
            priority: "High".to_string(),
            verification_method: "Test".to_string(),
            category: category.to_string(),
            ..RequirementRecord::default()
        }
    }

    fn render_default(records: &[RequirementRecord]) -> String {
        let mut out = Vec::new();
        write(
            &mut out,
            records,
            &HierarchyCatalog::sbs(),
            &DocumentInfo::default(),
            "2025-01-01 00:00:00",
        )
        .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn lists_every_requirement() {
        let records = vec![
            record("RTM-01", "Operational", "Performance"),
            record("RTM-02", "Maintenance", "Design"),
            record("RTM-03", "Operational", "Safety"),
        ];
        let document = render_default(&records);

        for r in &records {
            assert!(document.contains(&format!("#### {}\n", r.req_id)), "{}", r.req_id);
        }
    }

    #[test]
    fn categories_keep_first_appearance_order() {
        let records = vec![
            record("A", "Operational", "Performance"),
            record("B", "Maintenance", "Design"),
            record("C", "Operational", "Safety"),
        ];
        let document = render_default(&records);

        let operational = document.find("### Operational Requirements").unwrap();
        let maintenance = document.find("### Maintenance Requirements").unwrap();
        let c = document.find("#### C\n").unwrap();
        assert!(operational < c && c < maintenance);
    }

    #[test]
    fn title_block_uses_document_info() {
        let document = render_default(&[]);
        assert!(document.starts_with("# QPLANT Cryogenic System"));
        assert!(document.contains("**Document ID:** QPLANT-RTM-001"));
        assert!(document.contains("**Generated:** 2025-01-01 00:00:00"));
        assert!(document.contains("- **Total Requirements:** 0"));
    }

    #[test]
    fn breakdown_is_generated_from_catalog() {
        let document = render_default(&[]);
        assert!(document.contains("### Level 1 - Major Subsystems"));
        assert!(document.contains("- **QPLANT**: Cryoplant\n"));
        assert!(document.contains("- **TURBINES**:"));
        assert!(document.contains("(under QRB)"));
    }

    #[test]
    fn summary_table_counts_per_subsystem() {
        let records = vec![
            record("A", "Operational", "Safety"),
            record("B", "Operational", "Performance"),
        ];
        let document = render_default(&records);
        assert!(document.contains("| QPLANT | 2 | 2 | 1 |"));
    }

    #[test]
    fn links_are_listed_when_present() {
        let mut parent = record("P", "Operational", "Design");
        parent.child_requirements = vec!["C1".to_string(), "C2".to_string()];
        let document = render_default(&[parent]);

        assert!(document.contains("**Child Requirements:** C1, C2"));
        assert!(!document.contains("**Parent Requirements:**"));
    }

    struct FailingWriter;

    impl io::Write for FailingWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_errors_are_propagated() {
        let error = write(
            &mut FailingWriter,
            &[record("A", "Operational", "Safety")],
            &HierarchyCatalog::sbs(),
            &DocumentInfo::default(),
            "now",
        )
        .unwrap_err();
        assert_eq!(error.to_string(), "disk full");
    }
}
