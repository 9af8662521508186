use std::collections::HashMap;

use chrono::{DateTime, Utc};
use woothee::parser::Parser;

use crate::models::UrlRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Active,
    Expired,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Active => "Active",
            LinkStatus::Expired => "Expired",
        }
    }
}

/// A record paired with its status at the time the summary was taken.
#[derive(Debug, Clone)]
pub struct LinkRow {
    pub record: UrlRecord,
    pub status: LinkStatus,
}

/// Overview of every stored link.
#[derive(Debug, Clone)]
pub struct StatsSummary {
    pub rows: Vec<LinkRow>,
    pub total_links: usize,
    pub active_links: usize,
    pub total_clicks: u64,
}

impl StatsSummary {
    pub fn collect(records: Vec<UrlRecord>, now: DateTime<Utc>) -> Self {
        let rows: Vec<LinkRow> = records
            .into_iter()
            .map(|record| {
                let status = if record.is_expired(now) {
                    LinkStatus::Expired
                } else {
                    LinkStatus::Active
                };
                LinkRow { record, status }
            })
            .collect();

        Self {
            total_links: rows.len(),
            active_links: rows
                .iter()
                .filter(|r| r.status == LinkStatus::Active)
                .count(),
            total_clicks: rows.iter().map(|r| r.record.clicks).sum(),
            rows,
        }
    }
}

/// Per-link click breakdowns: `(name, count, pct_of_total)`, top 10 each.
#[derive(Debug, Clone, Default)]
pub struct ClickBreakdown {
    pub top_sources: Vec<(String, u64, u64)>,
    pub top_browsers: Vec<(String, u64, u64)>,
    pub top_os: Vec<(String, u64, u64)>,
}

impl ClickBreakdown {
    pub fn for_record(record: &UrlRecord) -> Self {
        let total = record.click_details.len() as u64;
        let parser = Parser::new();

        let agents: Vec<(Option<String>, Option<String>)> = record
            .click_details
            .iter()
            .map(|c| parse_user_agent(&parser, &c.user_agent))
            .collect();

        Self {
            top_sources: with_pct(
                count_field(record.click_details.iter().map(|c| Some(c.source.as_str()))),
                total,
            ),
            top_browsers: with_pct(
                count_field(agents.iter().map(|(browser, _)| browser.as_deref())),
                total,
            ),
            top_os: with_pct(count_field(agents.iter().map(|(_, os)| os.as_deref())), total),
        }
    }
}

/// `(browser_name, os_name)` from a User-Agent string, skipping unknowns.
fn parse_user_agent(parser: &Parser, ua: &str) -> (Option<String>, Option<String>) {
    if ua.is_empty() {
        return (None, None);
    }

    let known = |s: &str| (!s.is_empty() && s != "UNKNOWN").then(|| s.to_owned());

    match parser.parse(ua) {
        Some(result) => (known(result.name), known(result.os)),
        None => (None, None),
    }
}

/// Tally occurrences of each non-empty value, sort descending by count, and
/// return the top 10.
fn count_field<'a>(iter: impl Iterator<Item = Option<&'a str>>) -> Vec<(String, u64)> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for val in iter.flatten() {
        if !val.is_empty() {
            *counts.entry(val.to_owned()).or_insert(0) += 1;
        }
    }
    let mut sorted: Vec<(String, u64)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(10);
    sorted
}

fn with_pct(items: Vec<(String, u64)>, total: u64) -> Vec<(String, u64, u64)> {
    items
        .into_iter()
        .map(|(name, count)| {
            let pct = if total > 0 { count * 100 / total } else { 0 };
            (name, count, pct)
        })
        .collect()
}
