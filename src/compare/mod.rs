//! Playlist comparison.
//!
//! Compares two parsed playlists after canonical name resolution, so that
//! `CCTV-1 HD` on one side and `CCTV1` on the other still line up. Each
//! canonical name is classified by its URL sets: identical, differing, or
//! present on only one side.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use serde::Serialize;

use crate::mapping::ChannelMapper;
use crate::models::Channel;

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonEntry {
    pub name: String,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UrlDifference {
    pub name: String,
    pub left_urls: Vec<String>,
    pub right_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ComparisonReport {
    pub left_total: usize,
    pub right_total: usize,
    pub same: Vec<ComparisonEntry>,
    pub differing: Vec<UrlDifference>,
    pub only_left: Vec<ComparisonEntry>,
    pub only_right: Vec<ComparisonEntry>,
}

/// Canonical name -> sorted URL set. Nameless records cannot be matched by
/// identity and are left out of the comparison.
fn index_by_name(channels: &[Channel], mapper: &ChannelMapper) -> BTreeMap<String, BTreeSet<String>> {
    let mut index: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for channel in channels {
        let Some(raw) = channel.identity_name() else {
            continue;
        };
        let canonical = mapper.canonicalize(raw);
        index.entry(canonical).or_default().insert(channel.url.clone());
    }
    index
}

pub fn compare(left: &[Channel], right: &[Channel], mapper: &ChannelMapper) -> ComparisonReport {
    let left_index = index_by_name(left, mapper);
    let right_index = index_by_name(right, mapper);

    let mut report = ComparisonReport {
        left_total: left.len(),
        right_total: right.len(),
        ..Default::default()
    };

    let all_names: BTreeSet<&String> = left_index.keys().chain(right_index.keys()).collect();

    for name in all_names {
        match (left_index.get(name), right_index.get(name)) {
            (Some(left_urls), Some(right_urls)) if left_urls == right_urls => {
                report.same.push(entry(name, left_urls));
            }
            (Some(left_urls), Some(right_urls)) => {
                report.differing.push(UrlDifference {
                    name: name.clone(),
                    left_urls: left_urls.iter().cloned().collect(),
                    right_urls: right_urls.iter().cloned().collect(),
                });
            }
            (Some(left_urls), None) => report.only_left.push(entry(name, left_urls)),
            (None, Some(right_urls)) => report.only_right.push(entry(name, right_urls)),
            (None, None) => {}
        }
    }

    report
}

fn entry(name: &str, urls: &BTreeSet<String>) -> ComparisonEntry {
    ComparisonEntry {
        name: name.to_string(),
        urls: urls.iter().cloned().collect(),
    }
}

impl ComparisonReport {
    /// Plain-text report, section per classification.
    pub fn render(&self, left_label: &str, right_label: &str) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);

        let _ = writeln!(out, "Playlist URL comparison report");
        let _ = writeln!(out, "{rule}\n");
        let _ = writeln!(out, "Left:  {left_label}");
        let _ = writeln!(out, "Right: {right_label}\n");
        let _ = writeln!(out, "Left channels:  {}", self.left_total);
        let _ = writeln!(out, "Right channels: {}", self.right_total);
        let _ = writeln!(out, "Same URLs:      {}", self.same.len());
        let _ = writeln!(out, "Differing URLs: {}", self.differing.len());
        let _ = writeln!(out, "Only left:      {}", self.only_left.len());
        let _ = writeln!(out, "Only right:     {}", self.only_right.len());

        if !self.differing.is_empty() {
            let _ = writeln!(out, "\n{rule}\nChannels with differing URLs:\n{rule}");
            for diff in &self.differing {
                let _ = writeln!(out, "\n{}", diff.name);
                let _ = writeln!(out, "  left:");
                for url in &diff.left_urls {
                    let _ = writeln!(out, "    - {url}");
                }
                let _ = writeln!(out, "  right:");
                for url in &diff.right_urls {
                    let _ = writeln!(out, "    - {url}");
                }
            }
        }

        for (title, entries) in [
            ("Channels only on the left:", &self.only_left),
            ("Channels only on the right:", &self.only_right),
        ] {
            if entries.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n{rule}\n{title}\n{rule}");
            for entry in entries {
                let _ = writeln!(out, "\n{}", entry.name);
                for url in &entry.urls {
                    let _ = writeln!(out, "  - {url}");
                }
            }
        }

        out
    }
}
