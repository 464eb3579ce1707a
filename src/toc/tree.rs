//! Sidebar table of contents: a serialisable tree plus its HTML rendering.

use std::fmt::Write;

use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::manifest::{DocumentRecord, FolderManifest, ManifestLayout};
use crate::navigation::phase_href;
use crate::settings::PhaseInfo;
use crate::toc::expand_state::{ExpandStateStore, NodeKey, StateStorage};
use crate::toc::grouping::{group_by_date_in, month_name};
use crate::utils::escape_html;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    pub file: String,
    pub title: String,
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthNode {
    pub month: String,
    pub key: String,
    pub expanded: bool,
    pub entries: Vec<TocEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearNode {
    pub year: i32,
    pub key: String,
    pub expanded: bool,
    pub months: Vec<MonthNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocTree {
    pub phase: u32,
    pub title: String,
    pub overview: Option<TocEntry>,
    pub years: Vec<YearNode>,
    pub undated: Vec<TocEntry>,
    /// Legacy manifests render as a plain list.
    pub flat: Vec<TocEntry>,
}

impl TocTree {
    pub fn is_empty(&self) -> bool {
        self.overview.is_none()
            && self.years.is_empty()
            && self.undated.is_empty()
            && self.flat.is_empty()
    }
}

pub fn build_tree<S: StateStorage>(
    phase: &PhaseInfo,
    manifest: &FolderManifest,
    current: Option<&str>,
    state: &ExpandStateStore<S>,
) -> TocTree {
    build_tree_in(phase, manifest, current, state, &Local)
}

pub fn build_tree_in<S: StateStorage, Tz: TimeZone>(
    phase: &PhaseInfo,
    manifest: &FolderManifest,
    current: Option<&str>,
    state: &ExpandStateStore<S>,
    tz: &Tz,
) -> TocTree {
    let entry = |doc: &DocumentRecord| TocEntry {
        file: doc.file.clone(),
        title: doc.display_title(),
        href: phase_href(phase.number, Some(&doc.file)),
        date: doc.date.clone(),
        category: doc.category.clone(),
        active: current == Some(doc.file.as_str()),
    };

    let mut tree = TocTree {
        phase: phase.number,
        title: phase.name.clone(),
        overview: None,
        years: Vec::new(),
        undated: Vec::new(),
        flat: Vec::new(),
    };

    if manifest.layout == ManifestLayout::Flat {
        tree.flat = manifest.documents.iter().map(entry).collect();
        if current.is_none() {
            if let Some(first) = tree.flat.first_mut() {
                first.active = true;
            }
        }
        return tree;
    }

    let groups = group_by_date_in(&manifest.documents, tz);
    tree.overview = manifest.overview().map(entry);
    tree.years = groups
        .years_descending()
        .map(|(year, months)| {
            let key = NodeKey::Year(year);
            YearNode {
                year,
                key: key.storage_key(),
                expanded: state.is_expanded(key),
                months: months
                    .iter()
                    .map(|(month, docs)| {
                        let key = NodeKey::Month(year, *month);
                        MonthNode {
                            month: month_name(*month).to_string(),
                            key: key.storage_key(),
                            expanded: state.is_expanded(key),
                            entries: docs.iter().map(entry).collect(),
                        }
                    })
                    .collect(),
            }
        })
        .collect();
    tree.undated = groups.undated().iter().map(entry).collect();
    tree
}

/// Renders the tree as the sidebar's inner HTML.
pub fn render_html(tree: &TocTree) -> String {
    if tree.is_empty() {
        return concat!(
            "<div class=\"empty-message\">\n",
            "  <p>No content available yet for this phase.</p>\n",
            "  <p><small>Content will be added as research progresses.</small></p>\n",
            "</div>\n"
        )
        .to_string();
    }

    let mut out = String::new();
    if !tree.flat.is_empty() {
        out.push_str("<ul class=\"toc-list\">\n");
        for entry in &tree.flat {
            push_entry(&mut out, entry, 1);
        }
        out.push_str("</ul>\n");
        return out;
    }

    out.push_str("<ul class=\"toc-tree\">\n");
    if let Some(overview) = &tree.overview {
        push_entry(&mut out, overview, 1);
    }
    for year in &tree.years {
        push_open_node(&mut out, "toc-year", &year.key, year.expanded, &year.year.to_string(), 1);
        for month in &year.months {
            push_open_node(&mut out, "toc-month", &month.key, month.expanded, &month.month, 3);
            for entry in &month.entries {
                push_entry(&mut out, entry, 5);
            }
            out.push_str("        </ul>\n      </li>\n");
        }
        out.push_str("    </ul>\n  </li>\n");
    }
    if !tree.undated.is_empty() {
        out.push_str("  <li class=\"toc-undated\">\n    <span class=\"toc-label\">Undated</span>\n    <ul>\n");
        for entry in &tree.undated {
            push_entry(&mut out, entry, 3);
        }
        out.push_str("    </ul>\n  </li>\n");
    }
    out.push_str("</ul>\n");
    out
}

fn push_open_node(out: &mut String, class: &str, key: &str, expanded: bool, label: &str, depth: usize) {
    let indent = "  ".repeat(depth);
    let state = if expanded { " expanded" } else { "" };
    let _ = writeln!(
        out,
        "{indent}<li class=\"{class}{state}\" data-key=\"{}\">",
        escape_html(key)
    );
    let _ = writeln!(
        out,
        "{indent}  <button class=\"toc-toggle\" aria-expanded=\"{expanded}\">{}</button>",
        escape_html(label)
    );
    let _ = writeln!(out, "{indent}  <ul{}>", if expanded { "" } else { " hidden" });
}

fn push_entry(out: &mut String, entry: &TocEntry, depth: usize) {
    let indent = "  ".repeat(depth);
    let class = if entry.active { " class=\"active\"" } else { "" };
    let _ = writeln!(
        out,
        "{indent}<li><a href=\"{}\"{class} data-file=\"{}\">{}</a></li>",
        escape_html(&entry.href),
        escape_html(&entry.file),
        escape_html(&entry.title)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SiteSettings;
    use crate::toc::expand_state::MemoryStorage;
    use chrono::{NaiveDate, Utc};

    fn phase() -> PhaseInfo {
        SiteSettings::default().phase(3).unwrap().clone()
    }

    fn store(storage: &MemoryStorage) -> ExpandStateStore<&MemoryStorage> {
        ExpandStateStore::with_today(storage, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
    }

    fn manifest() -> FolderManifest {
        FolderManifest::from_json(
            r#"{"documents": [
                {"file": "index.html", "title": "Overview", "isPhaseOverview": true},
                {"file": "old.html", "date": "2023-11-02"},
                {"file": "b.html", "date": "2024-03-05", "title": "B <draft>"},
                {"file": "c.html", "date": "2024-03-01"},
                {"file": "jan.html", "date": "2024-01-20"},
                {"file": "loose.html"}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn builds_years_descending_with_default_expansion() {
        let storage = MemoryStorage::new();
        let tree = build_tree_in(&phase(), &manifest(), Some("c.html"), &store(&storage), &Utc);

        assert_eq!(tree.title, "Literature Review");
        assert_eq!(tree.overview.as_ref().map(|o| o.title.as_str()), Some("Overview"));
        assert_eq!(tree.years.iter().map(|y| y.year).collect::<Vec<_>>(), vec![2024, 2023]);

        let this_year = &tree.years[0];
        assert!(this_year.expanded);
        let months: Vec<_> = this_year.months.iter().map(|m| (m.month.as_str(), m.expanded)).collect();
        assert_eq!(months, vec![("January", false), ("March", true)]);

        let march = &this_year.months[1];
        let files: Vec<_> = march.entries.iter().map(|e| (e.file.as_str(), e.active)).collect();
        assert_eq!(files, vec![("c.html", true), ("b.html", false)]);
        assert_eq!(march.entries[0].title, "C");
        assert!(!tree.years[1].expanded);
        assert_eq!(tree.undated.len(), 1);
    }

    #[test]
    fn stored_state_wins_over_default_policy() {
        let storage = MemoryStorage::new();
        let state = store(&storage);
        state.set_expanded(NodeKey::Year(2023), true).unwrap();
        state.set_expanded(NodeKey::Month(2024, 3), false).unwrap();

        let tree = build_tree_in(&phase(), &manifest(), None, &state, &Utc);
        assert!(tree.years[1].expanded);
        assert!(!tree.years[0].months[1].expanded);
    }

    #[test]
    fn empty_manifest_renders_empty_state() {
        let storage = MemoryStorage::new();
        let tree = build_tree_in(&phase(), &FolderManifest::empty(), None, &store(&storage), &Utc);
        assert!(tree.is_empty());
        assert!(render_html(&tree).contains("No content available yet for this phase."));
    }

    #[test]
    fn html_escapes_titles_and_marks_state() {
        let storage = MemoryStorage::new();
        let tree = build_tree_in(&phase(), &manifest(), Some("b.html"), &store(&storage), &Utc);
        let html = render_html(&tree);

        assert!(html.contains("B &lt;draft&gt;"));
        assert!(html.contains(r#"<li class="toc-year expanded" data-key="toc-year-2024">"#));
        assert!(html.contains(r#"<li class="toc-year" data-key="toc-year-2023">"#));
        assert!(html.contains(r#"<a href="phase.html?phase=3&amp;file=b.html" class="active" data-file="b.html">"#));
        assert!(html.find("Overview").unwrap() < html.find("toc-year-2024").unwrap());
        assert!(html.contains("Undated"));
    }

    #[test]
    fn flat_manifest_marks_first_entry_active_on_landing() {
        let manifest = FolderManifest::from_json(
            r#"{"files": [{"filename": "one.html"}, {"filename": "two.html"}]}"#,
        )
        .unwrap();
        let storage = MemoryStorage::new();

        let landing = build_tree_in(&phase(), &manifest, None, &store(&storage), &Utc);
        assert!(landing.years.is_empty());
        assert_eq!(landing.flat.iter().map(|e| e.active).collect::<Vec<_>>(), vec![true, false]);

        let second = build_tree_in(&phase(), &manifest, Some("two.html"), &store(&storage), &Utc);
        assert_eq!(second.flat.iter().map(|e| e.active).collect::<Vec<_>>(), vec![false, true]);
        assert!(render_html(&second).starts_with("<ul class=\"toc-list\">"));
    }
}
