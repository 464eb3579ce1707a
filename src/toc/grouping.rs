use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone};

use crate::manifest::DocumentRecord;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Full English name for a 1-based month number.
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.wrapping_sub(1) as usize)
        .copied()
        .unwrap_or("Unknown")
}

pub fn month_number(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|i| i as u32 + 1)
}

/// Documents partitioned by year, then month, each month sorted by date.
///
/// The overview record never appears here. Records without a usable date
/// are kept aside in `undated`, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateGroups {
    years: BTreeMap<i32, BTreeMap<u32, Vec<DocumentRecord>>>,
    undated: Vec<DocumentRecord>,
}

impl DateGroups {
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Number of grouped (dated) records.
    pub fn len(&self) -> usize {
        self.years
            .values()
            .flat_map(|months| months.values())
            .map(Vec::len)
            .sum()
    }

    /// Years newest first; months within a year in calendar order.
    pub fn years_descending(
        &self,
    ) -> impl Iterator<Item = (i32, &BTreeMap<u32, Vec<DocumentRecord>>)> {
        self.years.iter().rev().map(|(year, months)| (*year, months))
    }

    pub fn month(&self, year: i32, name: &str) -> Option<&[DocumentRecord]> {
        let month = month_number(name)?;
        self.years
            .get(&year)
            .and_then(|months| months.get(&month))
            .map(Vec::as_slice)
    }

    pub fn undated(&self) -> &[DocumentRecord] {
        &self.undated
    }

    /// Dated records oldest first: years ascending, months ascending, then
    /// the in-month order.
    pub fn chronological(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.years
            .values()
            .flat_map(|months| months.values())
            .flatten()
    }
}

/// Parses a manifest date into local wall-clock time for `tz`.
///
/// RFC 3339 timestamps are converted into `tz`; naive timestamps and plain
/// `YYYY-MM-DD` dates are taken as already local.
pub fn parse_document_date<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(tz).naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Groups documents by year and month in the invoker's local time zone.
pub fn group_by_date(documents: &[DocumentRecord]) -> DateGroups {
    group_by_date_in(documents, &Local)
}

pub fn group_by_date_in<Tz: TimeZone>(documents: &[DocumentRecord], tz: &Tz) -> DateGroups {
    let mut groups = DateGroups::default();
    let mut dated = Vec::with_capacity(documents.len());

    for doc in documents.iter().filter(|d| !d.is_phase_overview) {
        match doc.date.as_deref().and_then(|raw| parse_document_date(raw, tz)) {
            Some(when) => dated.push((when, doc)),
            None => {
                log_warn!("Document {} has no usable date; leaving it out of date groups", doc.file);
                groups.undated.push(doc.clone());
            }
        }
    }

    // Stable: equal dates keep manifest order.
    dated.sort_by_key(|(when, _)| *when);

    for (when, doc) in dated {
        groups
            .years
            .entry(when.year())
            .or_default()
            .entry(when.month())
            .or_default()
            .push(doc.clone());
    }

    groups
}
