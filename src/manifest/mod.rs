pub mod generator;
pub mod loader;
pub mod schema;

pub use generator::{GenerationOutcome, ManifestGenerator};
pub use loader::{fetch_manifest, load_phase_manifest};
pub use schema::{
    DocumentRecord, FolderManifest, LegacyFileEntry, ManifestDocument, ManifestLayout,
    ManifestV1, ManifestV2, PhaseRef,
};
