use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;

use crate::manifest::FolderManifest;
use crate::settings::{PhaseInfo, SiteSettings};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Reads and parses a manifest file.
pub async fn fetch_manifest(path: &Path) -> Result<FolderManifest> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    FolderManifest::from_json(&raw)
        .with_context(|| format!("failed to parse manifest {}", path.display()))
}

/// Loads a phase's manifest from the site root, degrading to an empty
/// manifest when it is missing or malformed.
pub async fn load_phase_manifest(
    root: &Path,
    settings: &SiteSettings,
    phase: &PhaseInfo,
) -> FolderManifest {
    let path = root.join(settings.manifest_path(phase));
    match fetch_manifest(&path).await {
        Ok(manifest) => {
            log_info!(
                "Loaded {} document(s) for phase {} from {}",
                manifest.documents.len(),
                phase.number,
                path.display()
            );
            manifest
        }
        Err(err) => {
            log_warn!("No usable manifest for phase {}: {err:#}", phase.number);
            FolderManifest::empty()
        }
    }
}
