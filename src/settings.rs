use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

pub const SETTINGS_FILE: &str = "site.json";

/// One top-level research folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseInfo {
    pub number: u32,
    pub folder: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl PhaseInfo {
    fn new(number: u32, folder: &str, name: &str, description: &str) -> Self {
        Self {
            number,
            folder: folder.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    /// Folder under the site root that holds one sub-folder per phase.
    pub base_folder: String,
    /// Extension of content documents, without the dot.
    pub content_extension: String,
    pub manifest_name: String,
    /// Stripped from extracted `<title>` text and appended to page titles.
    pub title_suffix: String,
    pub phases: Vec<PhaseInfo>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            base_folder: "thesis_html".into(),
            content_extension: "html".into(),
            manifest_name: "manifest.json".into(),
            title_suffix: " - DBA Thesis".into(),
            phases: default_phases(),
        }
    }
}

fn default_phases() -> Vec<PhaseInfo> {
    vec![
        PhaseInfo::new(
            0,
            "0_reflection_journal",
            "Reflection Journal",
            "This section contains reflections, insights, and learning documented throughout the research journey. It serves as a personal journal of the doctoral experience.",
        ),
        PhaseInfo::new(
            1,
            "1_idea_generation",
            "Idea Generation",
            "The idea generation phase explores potential research topics, identifies areas of interest, and begins to shape the research focus through brainstorming and preliminary investigation.",
        ),
        PhaseInfo::new(
            2,
            "2_proposal",
            "Proposal",
            "The proposal phase presents the formal research proposal, including the research question, objectives, methodology, and expected contributions to knowledge.",
        ),
        PhaseInfo::new(
            3,
            "3_literature_review",
            "Literature Review",
            "A comprehensive review of existing literature, identifying key theories, methodologies, and findings that inform and contextualize this research.",
        ),
        PhaseInfo::new(
            4,
            "4_theoretical_framework",
            "Theoretical Framework",
            "This phase develops the theoretical framework that grounds the research, establishing the conceptual foundations and explaining the theoretical lens through which the research is conducted.",
        ),
        PhaseInfo::new(
            5,
            "5_design",
            "Design",
            "The design phase details the research methodology, including the philosophical approach, research design, data collection methods, and analytical techniques.",
        ),
        PhaseInfo::new(
            6,
            "6_data_collection",
            "Data Collection",
            "Documentation of the data collection process, including participant recruitment, interview protocols, survey administration, and other data gathering activities.",
        ),
        PhaseInfo::new(
            7,
            "7_data_analysis",
            "Data Analysis",
            "This phase presents the analysis of collected data, identifying patterns, themes, and insights that emerge from the research.",
        ),
        PhaseInfo::new(
            8,
            "8_report",
            "Report",
            "The final report synthesizes all phases of the research into a comprehensive thesis document, presenting findings, contributions, and implications.",
        ),
    ]
}

impl SiteSettings {
    pub fn phase(&self, number: u32) -> Option<&PhaseInfo> {
        self.phases.iter().find(|p| p.number == number)
    }

    /// Directory holding a phase's documents, relative to the site root.
    pub fn phase_dir(&self, phase: &PhaseInfo) -> PathBuf {
        Path::new(&self.base_folder).join(&phase.folder)
    }

    /// URL prefix for a phase's documents, as referenced from the page.
    pub fn phase_url_base(&self, phase: &PhaseInfo) -> String {
        format!("{}/{}/", self.base_folder, phase.folder)
    }

    pub fn manifest_path(&self, phase: &PhaseInfo) -> PathBuf {
        self.phase_dir(phase).join(&self.manifest_name)
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<SiteSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!(
                    "Ignoring malformed settings in {}: {err}; using defaults",
                    path.display()
                );
                SiteSettings::default()
            })
        } else {
            SiteSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn for_root(root: &Path) -> Result<Self> {
        Self::new(root.join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> SiteSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Writes the current settings to disk, creating the file if needed.
    pub fn save(&self) -> Result<()> {
        let data = self.settings();
        self.persist(&data)
    }

    fn persist(&self, data: &SiteSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_nine_phases() {
        let settings = SiteSettings::default();
        assert_eq!(settings.phases.len(), 9);
        assert_eq!(settings.phase(3).map(|p| p.name.as_str()), Some("Literature Review"));
        assert!(settings.phase(9).is_none());
        assert_eq!(
            settings.manifest_path(settings.phase(0).unwrap()),
            Path::new("thesis_html/0_reflection_journal/manifest.json")
        );
    }

    #[test]
    fn missing_file_yields_defaults_and_save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::for_root(dir.path()).unwrap();
        assert_eq!(store.settings(), SiteSettings::default());

        store.save().unwrap();
        let reloaded = SettingsStore::for_root(dir.path()).unwrap();
        assert_eq!(reloaded.settings(), SiteSettings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"baseFolder":"docs","phases":[{"number":0,"folder":"intro","name":"Intro"}]}"#,
        )
        .unwrap();

        let settings = SettingsStore::for_root(dir.path()).unwrap().settings();
        assert_eq!(settings.base_folder, "docs");
        assert_eq!(settings.content_extension, "html");
        assert_eq!(settings.phases.len(), 1);
        assert_eq!(settings.phases[0].description, "");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "{ not json").unwrap();
        let settings = SettingsStore::for_root(dir.path()).unwrap().settings();
        assert_eq!(settings, SiteSettings::default());
    }
}
