//! Phase page composition: resolves the `phase`/`file` query, loads the
//! manifest and content, and assembles breadcrumb, sidebar, body and
//! previous/next buttons.

pub mod content;

use std::fmt::Write;
use std::io;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use url::form_urlencoded;

use crate::manifest::generator::extract_title;
use crate::manifest::{load_phase_manifest, FolderManifest};
use crate::navigation::{phase_href, NavLinks, NavigationSequence, PhaseOrder};
use crate::settings::{PhaseInfo, SiteSettings};
use crate::toc::{build_tree, render_html, ExpandStateStore, StateStorage, TocTree};
use crate::utils::{escape_html, format_filename};

pub use content::{extract_main_content, fix_relative_links};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_warn};

const HOME_PAGE: &str = "index.html";
const FALLBACK_DESCRIPTION: &str = "This phase of the research journey.";

/// Query parameters of a phase page. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub phase: Option<String>,
    pub file: Option<String>,
}

impl PageQuery {
    pub fn parse(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let mut parsed = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = Some(value.into_owned()).filter(|v| !v.is_empty());
            match key.as_ref() {
                "phase" if parsed.phase.is_none() => parsed.phase = value,
                "file" if parsed.file.is_none() => parsed.file = value,
                _ => {}
            }
        }
        parsed
    }
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("No phase specified")]
    MissingPhase,
    #[error("Invalid phase number")]
    InvalidPhase(String),
    #[error("Could not load content: {file}")]
    ContentUnavailable {
        file: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Crumb {
    fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: Some(href.into()),
        }
    }

    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: None,
        }
    }
}

/// A fully resolved phase page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhasePage {
    pub title: String,
    pub breadcrumb: Vec<Crumb>,
    /// Absent when the query was rejected before any loading.
    pub toc: Option<TocTree>,
    pub content_html: String,
    /// Absent when the requested file is not part of the phase.
    pub nav: Option<NavLinks>,
}

/// Validates the `phase` parameter; runs before anything is loaded.
pub fn resolve_phase<'s>(
    settings: &'s SiteSettings,
    query: &PageQuery,
) -> Result<&'s PhaseInfo, PageError> {
    let raw = query.phase.as_deref().ok_or(PageError::MissingPhase)?;
    raw.trim()
        .parse::<u32>()
        .ok()
        .and_then(|number| settings.phase(number))
        .ok_or_else(|| PageError::InvalidPhase(raw.to_string()))
}

pub struct PageLoader<'a, S> {
    root: &'a Path,
    settings: &'a SiteSettings,
    state: &'a ExpandStateStore<S>,
}

impl<'a, S: StateStorage> PageLoader<'a, S> {
    pub fn new(root: &'a Path, settings: &'a SiteSettings, state: &'a ExpandStateStore<S>) -> Self {
        Self {
            root,
            settings,
            state,
        }
    }

    pub async fn load(&self, query: &PageQuery) -> PhasePage {
        let phase = match resolve_phase(self.settings, query) {
            Ok(phase) => phase,
            Err(err) => {
                log_warn!("Rejected page query {query:?}: {err}");
                return self.rejected_page(&err);
            }
        };

        let manifest = load_phase_manifest(self.root, self.settings, phase).await;
        let current = query.file.as_deref();
        let toc = build_tree(phase, &manifest, current, self.state);

        let mut breadcrumb = vec![
            Crumb::link("Home", HOME_PAGE),
            Crumb::link(phase.name.clone(), phase_href(phase.number, None)),
        ];

        let content_html = match current {
            None => introduction_html(phase),
            Some(file) => match self.load_content(phase, &manifest, file).await {
                Ok((body, title)) => {
                    breadcrumb.push(Crumb::text(title));
                    body
                }
                Err(err) => {
                    log_error!("Error loading content: {err:#}");
                    error_html(&err.to_string(), &phase_href(phase.number, None), &phase.name)
                }
            },
        };

        let nav = NavigationSequence::from_manifest(phase.number, &manifest)
            .links(current, &PhaseOrder::from_settings(self.settings));
        if nav.is_none() {
            log_warn!("{} is not listed for phase {}; hiding navigation", current.unwrap_or(""), phase.number);
        }

        PhasePage {
            title: format!("{}{}", phase.name, self.settings.title_suffix),
            breadcrumb,
            toc: Some(toc),
            content_html,
            nav,
        }
    }

    /// Reads a content file and returns its main body with links fixed,
    /// plus its display title. An untitled document falls back to its
    /// manifest title, then to its filename.
    async fn load_content(
        &self,
        phase: &PhaseInfo,
        manifest: &FolderManifest,
        file: &str,
    ) -> Result<(String, String), PageError> {
        let unavailable = |source: io::Error| PageError::ContentUnavailable {
            file: file.to_string(),
            source,
        };

        if file.contains(['/', '\\']) || file == ".." {
            return Err(unavailable(io::Error::new(
                io::ErrorKind::InvalidInput,
                "file must name a document inside the phase folder",
            )));
        }

        let path = self.root.join(self.settings.phase_dir(phase)).join(file);
        let html = tokio::fs::read_to_string(&path).await.map_err(unavailable)?;

        let title = extract_title(&html, &self.settings.title_suffix)
            .or_else(|| manifest.find(file).map(|doc| doc.display_title()))
            .unwrap_or_else(|| format_filename(file));
        let body = fix_relative_links(
            extract_main_content(&html),
            &self.settings.phase_url_base(phase),
        );
        Ok((body, title))
    }

    fn rejected_page(&self, err: &PageError) -> PhasePage {
        PhasePage {
            title: format!("Error{}", self.settings.title_suffix),
            breadcrumb: vec![Crumb::link("Home", HOME_PAGE)],
            toc: None,
            content_html: error_html(&err.to_string(), HOME_PAGE, "home page"),
            nav: None,
        }
    }
}

fn introduction_html(phase: &PhaseInfo) -> String {
    let description = if phase.description.trim().is_empty() {
        FALLBACK_DESCRIPTION
    } else {
        phase.description.as_str()
    };
    format!(
        concat!(
            "<div class=\"phase-introduction\">\n",
            "  <h1>{}</h1>\n",
            "  <p class=\"phase-description\">{}</p>\n",
            "</div>\n",
            "<div class=\"empty-state\">\n",
            "  <p>Click \"Next\" below to view the phase overview, or select a specific document from the table of contents.</p>\n",
            "</div>\n"
        ),
        escape_html(&phase.name),
        escape_html(description)
    )
}

fn error_html(message: &str, back_href: &str, back_label: &str) -> String {
    format!(
        concat!(
            "<div class=\"empty-state\">\n",
            "  <h2>Error</h2>\n",
            "  <p>{}</p>\n",
            "  <p><a href=\"{}\">Return to {}</a></p>\n",
            "</div>\n"
        ),
        escape_html(message),
        escape_html(back_href),
        escape_html(back_label)
    )
}

impl PhasePage {
    /// Standalone HTML document for the page.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "<!DOCTYPE html>\n<html lang=\"en\">\n<head>");
        let _ = writeln!(out, "<meta charset=\"utf-8\">\n<title>{}</title>", escape_html(&self.title));
        out.push_str("</head>\n<body>\n");

        out.push_str("<nav id=\"breadcrumb\" class=\"breadcrumb\">\n<ol>\n");
        let last = self.breadcrumb.len().saturating_sub(1);
        for (index, crumb) in self.breadcrumb.iter().enumerate() {
            match &crumb.href {
                Some(href) if index < last => {
                    let _ = writeln!(
                        out,
                        "  <li><a href=\"{}\">{}</a></li>",
                        escape_html(href),
                        escape_html(&crumb.text)
                    );
                }
                _ => {
                    let _ = writeln!(out, "  <li>{}</li>", escape_html(&crumb.text));
                }
            }
        }
        out.push_str("</ol>\n</nav>\n");

        if let Some(toc) = &self.toc {
            let _ = write!(
                out,
                "<aside class=\"sidebar\">\n<h2 id=\"sidebarTitle\">{}</h2>\n<div id=\"tableOfContents\">\n{}</div>\n</aside>\n",
                escape_html(&toc.title),
                render_html(toc)
            );
        }

        let _ = write!(out, "<main id=\"contentArea\">\n{}</main>\n", self.content_html);

        let (previous, next) = match &self.nav {
            Some(nav) => (nav.previous.as_ref(), nav.next.as_ref()),
            None => (None, None),
        };
        out.push_str("<div class=\"page-navigation\">\n");
        for (id, label, target) in [("prevButton", "Previous", previous), ("nextButton", "Next", next)] {
            match target {
                Some(target) => {
                    let _ = writeln!(
                        out,
                        "  <a id=\"{id}\" class=\"nav-button\" href=\"{}\">{label}</a>",
                        escape_html(&target.href())
                    );
                }
                None => {
                    let _ = writeln!(out, "  <a id=\"{id}\" class=\"nav-button\" hidden>{label}</a>");
                }
            }
        }
        out.push_str("</div>\n</body>\n</html>\n");
        out
    }
}
