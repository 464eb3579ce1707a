use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::cli::{Cli, Command, ConfigAction, NodeArgs};
use crate::db::StateDatabase;
use crate::manifest::{load_phase_manifest, GenerationOutcome, ManifestGenerator};
use crate::navigation::{NavLinks, NavTarget, NavigationSequence, PhaseOrder};
use crate::page::{resolve_phase, PageLoader, PageQuery};
use crate::settings::{SettingsStore, SiteSettings};
use crate::toc::{build_tree, render_html, ExpandStateStore};

const ENABLE_LOGS: bool = true;

use crate::log_info;

pub(crate) struct AppState {
    root: PathBuf,
    state_path: PathBuf,
    settings: SettingsStore,
}

impl AppState {
    fn new(cli: &Cli) -> Result<Self> {
        let root = cli.root.clone();
        let state_path = cli
            .state
            .clone()
            .unwrap_or_else(|| StateDatabase::default_path(&root));
        let settings = SettingsStore::for_root(&root)?;
        Ok(Self {
            root,
            state_path,
            settings,
        })
    }

    fn expand_state(&self) -> Result<ExpandStateStore<StateDatabase>> {
        Ok(ExpandStateStore::new(StateDatabase::open(self.state_path.clone())?))
    }
}

#[derive(Serialize)]
struct NavReport {
    found: bool,
    previous: Option<NavTarget>,
    next: Option<NavTarget>,
}

impl From<Option<NavLinks>> for NavReport {
    fn from(links: Option<NavLinks>) -> Self {
        match links {
            Some(links) => Self {
                found: true,
                previous: links.previous,
                next: links.next,
            },
            None => Self {
                found: false,
                previous: None,
                next: None,
            },
        }
    }
}

pub(crate) async fn dispatch(cli: Cli) -> Result<()> {
    let app = AppState::new(&cli)?;
    let settings = app.settings.settings();

    match cli.command {
        Command::Manifest => generate_manifests(&app.root, &settings),
        Command::Toc { phase, file, json } => {
            let query = PageQuery {
                phase: Some(phase),
                file,
            };
            let phase = resolve_phase(&settings, &query)?;
            let state = app.expand_state()?;
            let manifest = load_phase_manifest(&app.root, &settings, phase).await;
            let tree = build_tree(phase, &manifest, query.file.as_deref(), &state);
            if json {
                print_json(&tree)
            } else {
                write_stdout(&render_html(&tree))
            }
        }
        Command::Nav { phase, file } => {
            let query = PageQuery {
                phase: Some(phase),
                file,
            };
            let phase = resolve_phase(&settings, &query)?;
            let manifest = load_phase_manifest(&app.root, &settings, phase).await;
            let links = NavigationSequence::from_manifest(phase.number, &manifest)
                .links(query.file.as_deref(), &PhaseOrder::from_settings(&settings));
            print_json(&NavReport::from(links))
        }
        Command::Expand { node, collapse } => set_node(&app, &node, !collapse),
        Command::Toggle { node } => {
            let key = node.key()?;
            let expanded = app.expand_state()?.toggle(key)?;
            println!("{key} {}", if expanded { "expanded" } else { "collapsed" });
            Ok(())
        }
        Command::State => {
            let db = StateDatabase::open(app.state_path.clone())?;
            for (key, expanded) in db.entries()? {
                println!("{key}\t{expanded}");
            }
            Ok(())
        }
        Command::Page { query, out, json } => {
            let state = app.expand_state()?;
            let loader = PageLoader::new(&app.root, &settings, &state);
            let page = loader.load(&PageQuery::parse(&query)).await;
            let rendered = if json {
                serde_json::to_string_pretty(&page)?
            } else {
                page.to_html()
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    log_info!("Wrote {}", path.display());
                    Ok(())
                }
                None => write_stdout(&rendered),
            }
        }
        Command::Config { action } => match action {
            ConfigAction::Show => print_json(&settings),
            ConfigAction::Init { force } => {
                if app.settings.path().exists() && !force {
                    bail!(
                        "Refusing to overwrite existing file: {}",
                        app.settings.path().display()
                    );
                }
                app.settings.save()?;
                println!("Created {}", app.settings.path().display());
                Ok(())
            }
        },
    }
}

fn generate_manifests(root: &Path, settings: &SiteSettings) -> Result<()> {
    log_info!("Generating manifest files for all phases...");
    let outcomes = ManifestGenerator::new(root, settings).generate_all()?;

    for outcome in &outcomes {
        match outcome {
            GenerationOutcome::Written {
                path, documents, ..
            } => println!("✓ {} ({documents} files)", path.display()),
            GenerationOutcome::MissingFolder { path, .. } => {
                println!("- skipped {} (missing)", path.display())
            }
        }
    }
    Ok(())
}

fn set_node(app: &AppState, node: &NodeArgs, expanded: bool) -> Result<()> {
    let key = node.key()?;
    app.expand_state()?.set_expanded(key, expanded)?;
    println!("{key} {}", if expanded { "expanded" } else { "collapsed" });
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    write_stdout(&format!("{}\n", serde_json::to_string_pretty(value)?))
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
