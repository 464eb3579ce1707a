//! Previous/next traversal over a phase's canonical document sequence.
//!
//! The sequence is `[landing, overview?, dated documents oldest first,
//! undated documents]`. Stepping past the last document continues at the
//! next phase's landing view; there is no wrap-around at either end.

use chrono::{Local, TimeZone};
use serde::Serialize;
use url::form_urlencoded;

use crate::manifest::{DocumentRecord, FolderManifest, ManifestLayout};
use crate::settings::SiteSettings;
use crate::toc::grouping::group_by_date_in;

pub const PHASE_PAGE: &str = "phase.html";

/// Link to a phase's landing view, or to one of its documents.
pub fn phase_href(phase: u32, file: Option<&str>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("phase", &phase.to_string());
    if let Some(file) = file {
        query.append_pair("file", file);
    }
    format!("{PHASE_PAGE}?{}", query.finish())
}

/// Total order over the configured phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseOrder {
    numbers: Vec<u32>,
}

impl PhaseOrder {
    pub fn new(mut numbers: Vec<u32>) -> Self {
        numbers.sort_unstable();
        numbers.dedup();
        Self { numbers }
    }

    pub fn from_settings(settings: &SiteSettings) -> Self {
        Self::new(settings.phases.iter().map(|p| p.number).collect())
    }

    pub fn next_after(&self, phase: u32) -> Option<u32> {
        self.numbers.iter().copied().find(|&n| n > phase)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NavTarget {
    Landing { phase: u32 },
    Document { phase: u32, file: String },
}

impl NavTarget {
    pub fn href(&self) -> String {
        match self {
            NavTarget::Landing { phase } => phase_href(*phase, None),
            NavTarget::Document { phase, file } => phase_href(*phase, Some(file)),
        }
    }
}

/// Resolved buttons; `None` means the button is hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLinks {
    pub previous: Option<NavTarget>,
    pub next: Option<NavTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationSequence {
    phase: u32,
    overview: Option<DocumentRecord>,
    documents: Vec<DocumentRecord>,
}

impl NavigationSequence {
    pub fn from_manifest(phase: u32, manifest: &FolderManifest) -> Self {
        Self::from_manifest_in(phase, manifest, &Local)
    }

    pub fn from_manifest_in<Tz: TimeZone>(phase: u32, manifest: &FolderManifest, tz: &Tz) -> Self {
        match manifest.layout {
            ManifestLayout::Flat => Self {
                phase,
                overview: None,
                documents: manifest.documents.clone(),
            },
            ManifestLayout::Dated => {
                let groups = group_by_date_in(&manifest.documents, tz);
                let documents = groups
                    .chronological()
                    .chain(groups.undated())
                    .cloned()
                    .collect();
                Self {
                    phase,
                    overview: manifest.overview().cloned(),
                    documents,
                }
            }
        }
    }

    /// The full ordered sequence, starting with the landing view.
    pub fn canonical(&self) -> Vec<NavTarget> {
        std::iter::once(self.landing())
            .chain(self.overview.iter().map(|d| self.target(d)))
            .chain(self.documents.iter().map(|d| self.target(d)))
            .collect()
    }

    /// Previous/next for the landing view (`None`) or a document. Returns
    /// `None` when `current` names no record in this phase.
    pub fn links(&self, current: Option<&str>, order: &PhaseOrder) -> Option<NavLinks> {
        let Some(file) = current else {
            let next = self
                .overview
                .as_ref()
                .or_else(|| self.documents.first())
                .map(|d| self.target(d));
            return Some(NavLinks {
                previous: None,
                next,
            });
        };

        if self.overview.as_ref().is_some_and(|o| o.file == file) {
            return Some(NavLinks {
                previous: Some(self.landing()),
                next: self
                    .documents
                    .first()
                    .map(|d| self.target(d))
                    .or_else(|| self.next_phase_landing(order)),
            });
        }

        let index = self.documents.iter().position(|d| d.file == file)?;
        let previous = match index.checked_sub(1) {
            Some(prev) => self.target(&self.documents[prev]),
            None => self
                .overview
                .as_ref()
                .map(|o| self.target(o))
                .unwrap_or_else(|| self.landing()),
        };
        let next = self
            .documents
            .get(index + 1)
            .map(|d| self.target(d))
            .or_else(|| self.next_phase_landing(order));

        Some(NavLinks {
            previous: Some(previous),
            next,
        })
    }

    fn landing(&self) -> NavTarget {
        NavTarget::Landing { phase: self.phase }
    }

    fn target(&self, doc: &DocumentRecord) -> NavTarget {
        NavTarget::Document {
            phase: self.phase,
            file: doc.file.clone(),
        }
    }

    fn next_phase_landing(&self, order: &PhaseOrder) -> Option<NavTarget> {
        order
            .next_after(self.phase)
            .map(|phase| NavTarget::Landing { phase })
    }
}
