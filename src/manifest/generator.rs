//! Offline manifest generation: scans each phase folder for content
//! documents and writes the `documents`-shaped manifest next to them.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use regex::Regex;
use walkdir::WalkDir;

use crate::manifest::{DocumentRecord, ManifestV2, PhaseRef};
use crate::settings::{PhaseInfo, SiteSettings};
use crate::utils::format_filename;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex"));
static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").expect("valid h1 regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static META_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b([^>]*)>").expect("valid meta regex"));
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z][\w:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid attribute regex")
});

/// Display title of a document: `<title>` minus the site suffix, else the
/// first `<h1>` with inner markup removed.
pub fn extract_title(html: &str, title_suffix: &str) -> Option<String> {
    if let Some(caps) = TITLE_RE.captures(html) {
        let title = caps[1].replace(title_suffix, "");
        let title = title.trim();
        if !title.is_empty() {
            return Some(title.to_string());
        }
    }

    H1_RE.captures(html).and_then(|caps| {
        let heading = TAG_RE.replace_all(&caps[1], "");
        let heading = heading.trim();
        (!heading.is_empty()).then(|| heading.to_string())
    })
}

/// Value of `<meta name="{name}" content="...">`, in any attribute order.
pub fn extract_meta(html: &str, name: &str) -> Option<String> {
    META_RE.captures_iter(html).find_map(|meta| {
        let mut meta_name = None;
        let mut content = None;
        for attr in ATTR_RE.captures_iter(&meta[1]) {
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .map(|m| m.as_str().trim().to_string());
            match attr[1].to_ascii_lowercase().as_str() {
                "name" => meta_name = value,
                "content" => content = value,
                _ => {}
            }
        }
        match meta_name {
            Some(found) if found.eq_ignore_ascii_case(name) => content.filter(|c| !c.is_empty()),
            _ => None,
        }
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Written {
        phase: u32,
        path: PathBuf,
        documents: usize,
    },
    MissingFolder {
        phase: u32,
        path: PathBuf,
    },
}

pub struct ManifestGenerator<'a> {
    root: &'a Path,
    settings: &'a SiteSettings,
}

impl<'a> ManifestGenerator<'a> {
    pub fn new(root: &'a Path, settings: &'a SiteSettings) -> Self {
        Self { root, settings }
    }

    /// Regenerates every configured phase. Fails only when the base folder
    /// itself is missing.
    pub fn generate_all(&self) -> Result<Vec<GenerationOutcome>> {
        let base = self.root.join(&self.settings.base_folder);
        if !base.is_dir() {
            bail!("Base directory does not exist: {}", base.display());
        }

        self.settings
            .phases
            .iter()
            .map(|phase| self.generate_phase(phase))
            .collect()
    }

    pub fn generate_phase(&self, phase: &PhaseInfo) -> Result<GenerationOutcome> {
        let dir = self.root.join(self.settings.phase_dir(phase));
        if !dir.is_dir() {
            log_warn!("Directory does not exist: {}", dir.display());
            return Ok(GenerationOutcome::MissingFolder {
                phase: phase.number,
                path: dir,
            });
        }

        let documents = self.scan_folder(&dir)?;
        let manifest = ManifestV2 {
            phase: Some(PhaseRef::Number(phase.number)),
            generated: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            documents,
        };

        let path = dir.join(&self.settings.manifest_name);
        write_atomic(&path, &serde_json::to_string_pretty(&manifest)?)?;
        log_info!(
            "Generated manifest for {} ({} files)",
            phase.folder,
            manifest.documents.len()
        );

        Ok(GenerationOutcome::Written {
            phase: phase.number,
            path,
            documents: manifest.documents.len(),
        })
    }

    /// Lists content documents directly inside `dir`, sorted by filename.
    pub fn scan_folder(&self, dir: &Path) -> Result<Vec<DocumentRecord>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(false) {
            let entry =
                entry.with_context(|| format!("failed to list {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if self.is_content_file(&path) {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        Ok(paths.iter().filter_map(|path| self.describe(path)).collect())
    }

    fn is_content_file(&self, path: &Path) -> bool {
        let is_manifest = path.file_name() == Some(OsStr::new(&self.settings.manifest_name));
        let ext = path.extension().and_then(OsStr::to_str).unwrap_or("");
        !is_manifest && ext.eq_ignore_ascii_case(&self.settings.content_extension)
    }

    fn describe(&self, path: &Path) -> Option<DocumentRecord> {
        let Some(filename) = path.file_name().and_then(OsStr::to_str) else {
            log_warn!("Skipping {} (file name is not valid UTF-8)", path.display());
            return None;
        };
        let filename = filename.to_string();

        let html = match fs::read_to_string(path) {
            Ok(html) => Some(html),
            Err(err) => {
                log_warn!("Could not extract title from {filename}: {err}");
                None
            }
        };
        let html = html.as_deref().unwrap_or("");

        let title = extract_title(html, &self.settings.title_suffix)
            .unwrap_or_else(|| format_filename(&filename));
        let date = extract_meta(html, "date").or_else(|| modified_date(path));
        let is_phase_overview = path.file_stem() == Some(OsStr::new("index"));

        Some(DocumentRecord {
            file: filename,
            title: Some(title),
            date,
            category: extract_meta(html, "category"),
            is_phase_overview,
        })
    }
}

fn modified_date(path: &Path) -> Option<String> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let local: DateTime<Local> = modified.into();
    Some(local.format("%Y-%m-%d").to_string())
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("failed to replace {}", path.display()))
}
