use std::io::{self, Write};

use serde::Serialize;

use super::profile::{CrossReference, DocumentCategory, SubCategory, Urgency};

/// What is known about a presentation without opening it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TwinMetadata {
    /// The file name as found on disk.
    pub original_filename: String,
    /// The file stem with unsafe characters replaced.
    pub normalized_name: String,
    /// Always `PPTX`.
    pub file_type: &'static str,
    /// RFC 3339 time of processing.
    pub processing_timestamp: String,
    /// Document family.
    pub category: DocumentCategory,
    /// Processing urgency.
    pub priority: Urgency,
    /// Refinement of the family.
    pub sub_category: SubCategory,
    /// Size on disk in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

/// Writes the Markdown placeholder for one presentation.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_twin<W: Write>(
    out: &mut W,
    metadata: &TwinMetadata,
    references: &[CrossReference],
) -> io::Result<()> {
    let title = metadata
        .original_filename
        .strip_suffix(".pptx")
        .unwrap_or(&metadata.original_filename);

    writeln!(out, "# {title}\n")?;

    writeln!(out, "## Document Metadata")?;
    writeln!(out, "- **Original Filename**: {}", metadata.original_filename)?;
    writeln!(out, "- **Category**: {}", metadata.category)?;
    writeln!(out, "- **Priority**: {}", metadata.priority)?;
    writeln!(out, "- **Sub-category**: {}", metadata.sub_category)?;
    writeln!(out, "- **File Type**: {}", metadata.file_type)?;
    writeln!(out, "- **Processing Date**: {}", metadata.processing_timestamp)?;
    if let Some(size) = metadata.file_size {
        writeln!(out, "- **File Size**: {size} bytes")?;
    }

    writeln!(out, "\n## Cross-References")?;
    if references.is_empty() {
        writeln!(out, "- No cross-references detected")?;
    }
    for reference in references {
        writeln!(
            out,
            "- **{}**: {} ({})",
            reference.reference, reference.context, reference.kind
        )?;
    }

    writeln!(out, "\n## Content Analysis")?;
    writeln!(out, "- **Slides**: TBD")?;
    writeln!(out, "- **Visual Content**: Detection pending")?;
    writeln!(out, "- **Tables**: Detection pending")?;

    writeln!(out, "\n## Change Log")?;
    writeln!(out, "- **Created**: {}", metadata.processing_timestamp)?;
    writeln!(out, "- **Version**: 1.0.0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twin::profile::cross_references;

    fn metadata(name: &str) -> TwinMetadata {
        TwinMetadata {
            original_filename: name.to_string(),
            normalized_name: "x".to_string(),
            file_type: "PPTX",
            processing_timestamp: "2025-01-01T00:00:00+00:00".to_string(),
            category: DocumentCategory::Compliance,
            priority: Urgency::Critical,
            sub_category: SubCategory::Regulatory,
            file_size: None,
        }
    }

    fn render(metadata: &TwinMetadata, references: &[CrossReference]) -> String {
        let mut out = Vec::new();
        write_twin(&mut out, metadata, references).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn title_drops_extension() {
        let twin = render(&metadata("PED review.pptx"), &[]);
        assert!(twin.starts_with("# PED review\n"));
        assert!(twin.contains("- **Category**: COMPLIANCE"));
        assert!(twin.contains("- No cross-references detected"));
    }

    #[test]
    fn lists_references() {
        let twin = render(
            &metadata("PED review.pptx"),
            &cross_references("PED review.pptx"),
        );
        assert!(twin.contains("- **SCK CEN/0567**: PED Compliance (primary)"));
        assert!(!twin.contains("No cross-references"));
    }
}
