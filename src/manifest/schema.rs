use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::format_filename;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Folder identity as written by the generator: a phase number or a folder name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhaseRef {
    Number(u32),
    Name(String),
}

impl fmt::Display for PhaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseRef::Number(n) => write!(f, "{n}"),
            PhaseRef::Name(name) => f.write_str(name),
        }
    }
}

/// One entry in a folder's manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub is_phase_overview: bool,
}

impl DocumentRecord {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            title: None,
            date: None,
            category: None,
            is_phase_overview: false,
        }
    }

    pub fn display_title(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format_filename(&self.file),
        }
    }
}

/// Current manifest shape: a `documents` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestV2 {
    #[serde(default)]
    pub phase: Option<PhaseRef>,
    #[serde(default)]
    pub generated: Option<String>,
    pub documents: Vec<DocumentRecord>,
}

/// Legacy manifest shape: a flat `files` array with no dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestV1 {
    #[serde(default)]
    pub phase: Option<PhaseRef>,
    #[serde(default)]
    pub generated: Option<String>,
    pub files: Vec<LegacyFileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyFileEntry {
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ManifestDocument {
    V2(ManifestV2),
    V1(ManifestV1),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestLayout {
    /// Records carry dates and may name an overview.
    Dated,
    /// Legacy list: manifest order only, no grouping, no overview.
    Flat,
}

/// Canonical, read-only view of one folder's manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderManifest {
    pub phase: Option<PhaseRef>,
    pub generated: Option<String>,
    pub layout: ManifestLayout,
    pub documents: Vec<DocumentRecord>,
}

impl FolderManifest {
    pub fn empty() -> Self {
        Self {
            phase: None,
            generated: None,
            layout: ManifestLayout::Dated,
            documents: Vec::new(),
        }
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let document: ManifestDocument = serde_json::from_str(raw)?;
        Ok(document.into())
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn overview(&self) -> Option<&DocumentRecord> {
        self.documents.iter().find(|d| d.is_phase_overview)
    }

    pub fn find(&self, file: &str) -> Option<&DocumentRecord> {
        self.documents.iter().find(|d| d.file == file)
    }

    /// Enforces unique `file` values and at most one overview; the first
    /// occurrence wins in both cases.
    fn normalized(mut self) -> Self {
        let mut seen = HashSet::new();
        let mut has_overview = false;
        let phase = self
            .phase
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "?".into());

        self.documents.retain_mut(|doc| {
            if !seen.insert(doc.file.clone()) {
                log_warn!("Manifest for phase {phase} lists {} twice; keeping the first", doc.file);
                return false;
            }
            if doc.is_phase_overview {
                if has_overview {
                    log_warn!(
                        "Manifest for phase {phase} marks {} as a second overview; ignoring the flag",
                        doc.file
                    );
                    doc.is_phase_overview = false;
                }
                has_overview = true;
            }
            true
        });
        self
    }
}

impl From<ManifestDocument> for FolderManifest {
    fn from(document: ManifestDocument) -> Self {
        let manifest = match document {
            ManifestDocument::V2(v2) => FolderManifest {
                phase: v2.phase,
                generated: v2.generated,
                layout: ManifestLayout::Dated,
                documents: v2.documents,
            },
            ManifestDocument::V1(v1) => FolderManifest {
                phase: v1.phase,
                generated: v1.generated,
                layout: ManifestLayout::Flat,
                documents: v1
                    .files
                    .into_iter()
                    .map(|entry| DocumentRecord {
                        title: entry.title,
                        ..DocumentRecord::new(entry.filename)
                    })
                    .collect(),
            },
        };
        manifest.normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_documents_shape() {
        let manifest = FolderManifest::from_json(
            r#"{
                "phase": 3,
                "generated": "2024-04-01T10:00:00Z",
                "documents": [
                    {"file": "index.html", "title": "Overview", "isPhaseOverview": true},
                    {"file": "b.html", "date": "2024-03-05", "category": "notes"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.layout, ManifestLayout::Dated);
        assert_eq!(manifest.phase, Some(PhaseRef::Number(3)));
        assert_eq!(manifest.documents.len(), 2);
        assert_eq!(manifest.overview().map(|d| d.file.as_str()), Some("index.html"));
        assert_eq!(manifest.documents[1].category.as_deref(), Some("notes"));
        assert!(!manifest.documents[1].is_phase_overview);
        assert_eq!(
            manifest.find("b.html").and_then(|d| d.date.as_deref()),
            Some("2024-03-05")
        );
        assert!(manifest.find("missing.html").is_none());
    }

    #[test]
    fn parses_legacy_files_shape_as_flat() {
        let manifest = FolderManifest::from_json(
            r#"{
                "phase": "2_proposal",
                "fileCount": 2,
                "files": [
                    {"filename": "draft.html", "title": "Draft", "path": "thesis_html/2_proposal/draft.html"},
                    {"filename": "final_version.html"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.layout, ManifestLayout::Flat);
        assert_eq!(manifest.phase, Some(PhaseRef::Name("2_proposal".into())));
        assert_eq!(manifest.documents[0].display_title(), "Draft");
        assert_eq!(manifest.documents[1].display_title(), "Final Version");
        assert!(manifest.overview().is_none());
        assert!(manifest.documents.iter().all(|d| d.date.is_none()));
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert!(FolderManifest::from_json(r#"{"phase": 1}"#).is_err());
        assert!(FolderManifest::from_json("not json").is_err());
    }

    #[test]
    fn keeps_first_duplicate_and_first_overview() {
        let manifest = FolderManifest::from_json(
            r#"{"documents": [
                {"file": "a.html", "isPhaseOverview": true},
                {"file": "b.html", "date": "2024-01-01"},
                {"file": "b.html", "date": "2025-01-01"},
                {"file": "c.html", "isPhaseOverview": true}
            ]}"#,
        )
        .unwrap();

        let files: Vec<_> = manifest.documents.iter().map(|d| d.file.as_str()).collect();
        assert_eq!(files, vec!["a.html", "b.html", "c.html"]);
        assert_eq!(manifest.documents[1].date.as_deref(), Some("2024-01-01"));
        assert!(!manifest.documents[2].is_phase_overview);
        assert_eq!(manifest.overview().map(|d| d.file.as_str()), Some("a.html"));
    }

    #[test]
    fn blank_title_falls_back_to_filename() {
        let record = DocumentRecord {
            title: Some("  ".into()),
            ..DocumentRecord::new("week_one.html")
        };
        assert_eq!(record.display_title(), "Week One");
    }
}
