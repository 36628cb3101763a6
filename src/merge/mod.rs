//! The merge engine.
//!
//! Combines channel records from any number of sources into one
//! deduplicated, ordered sequence. Records are walked in concatenated
//! source-priority order; the first record seen for a URL claims the slot
//! and its position, and later duplicates may only fill fields the slot
//! still has empty, never overwriting populated ones. The slot list and the
//! URL index are kept separately so ordering never depends on map iteration
//! order.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::mapping::DEFAULT_GROUP;
use crate::models::{non_empty, Channel};

/// One record dropped (folded into an earlier slot) during deduplication.
#[derive(Debug, Clone, Serialize)]
pub struct RemovedChannel {
    pub name: String,
    pub url: String,
    pub reason: String,
}

const DUPLICATE_URL_REASON: &str = "duplicate URL, folded into first occurrence";

#[derive(Debug, Clone, Default, Serialize)]
pub struct DedupReport {
    pub original_count: usize,
    pub retained_count: usize,
    pub removed: Vec<RemovedChannel>,
}

/// Merges the sources in caller-specified priority order. The result is
/// deduplicated by URL, gap-filled, grouped, and renumbered 1..N.
pub fn merge_sources(sources: Vec<Vec<Channel>>) -> Vec<Channel> {
    let (mut merged, report) = fold_by_url(sources.into_iter().flatten());
    debug!(
        original = report.original_count,
        retained = report.retained_count,
        "merged sources"
    );
    finalize(&mut merged);
    merged
}

/// Standalone dedup pass over a single already-parsed playlist. Unlike
/// [`merge_sources`], ids are left as they were; only the merge path
/// renumbers.
pub fn deduplicate(channels: Vec<Channel>) -> (Vec<Channel>, DedupReport) {
    fold_by_url(channels)
}

/// Walks records in order, keeping a URL-keyed index into the retained-slot
/// list. First appearance wins the slot; later duplicates are absorbed.
fn fold_by_url(channels: impl IntoIterator<Item = Channel>) -> (Vec<Channel>, DedupReport) {
    let mut slots: Vec<Channel> = Vec::new();
    let mut by_url: HashMap<String, usize> = HashMap::new();
    let mut report = DedupReport::default();

    for channel in channels {
        report.original_count += 1;
        if channel.url.is_empty() {
            // Readers drop these already; a record without a URL cannot
            // claim a slot.
            continue;
        }
        match by_url.get(&channel.url) {
            Some(&idx) => {
                report.removed.push(RemovedChannel {
                    name: channel.display_label().to_string(),
                    url: channel.url.clone(),
                    reason: DUPLICATE_URL_REASON.to_string(),
                });
                slots[idx].absorb(channel);
            }
            None => {
                by_url.insert(channel.url.clone(), slots.len());
                slots.push(channel);
            }
        }
    }

    report.retained_count = slots.len();
    (slots, report)
}

/// Post-merge fixups: every record ends with a group label, a display name
/// when a canonical name exists, and a fresh 1..N sequence id.
fn finalize(channels: &mut [Channel]) {
    for (idx, channel) in channels.iter_mut().enumerate() {
        if non_empty(&channel.group_title).is_none() {
            channel.group_title = Some(DEFAULT_GROUP.to_string());
        }
        if non_empty(&channel.channel_name).is_none() {
            channel.channel_name = channel.tvg_name.clone();
        }
        channel.tvg_id = Some((idx + 1) as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str, logo: &str, url: &str) -> Channel {
        let mut c = Channel::new(url);
        if !name.is_empty() {
            c.tvg_name = Some(name.to_string());
        }
        if !logo.is_empty() {
            c.tvg_logo = Some(logo.to_string());
        }
        c
    }

    #[test]
    fn urls_are_unique_after_merge() {
        let merged = merge_sources(vec![
            vec![channel("CCTV1", "", "rtp://u1"), channel("CCTV2", "", "rtp://u2")],
            vec![channel("CCTV1", "", "rtp://u1"), channel("CCTV3", "", "rtp://u3")],
        ]);

        let mut urls: Vec<&str> = merged.iter().map(|c| c.url.as_str()).collect();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), merged.len());
    }

    #[test]
    fn merging_a_source_with_itself_is_idempotent() {
        let source = vec![
            channel("CCTV1", "https://e/l1.png", "rtp://u1"),
            channel("CCTV2", "", "rtp://u2"),
        ];
        let once = merge_sources(vec![source.clone()]);
        let twice = merge_sources(vec![source.clone(), source]);

        assert_eq!(once, twice);
    }

    #[test]
    fn first_seen_fields_are_never_overwritten() {
        let merged = merge_sources(vec![
            vec![channel("CCTV1", "L1", "rtp://u")],
            vec![channel("CCTV-1", "", "rtp://u")],
        ]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].tvg_name.as_deref(), Some("CCTV1"));
        assert_eq!(merged[0].tvg_logo.as_deref(), Some("L1"));
    }

    #[test]
    fn later_sources_fill_gaps_at_the_first_seen_position() {
        let merged = merge_sources(vec![
            vec![channel("", "", "rtp://u"), channel("CCTV9", "", "rtp://v")],
            vec![channel("CCTV1", "L2", "rtp://u")],
        ]);

        assert_eq!(merged.len(), 2);
        // Position fixed at first appearance, fields taken from the filler.
        assert_eq!(merged[0].url, "rtp://u");
        assert_eq!(merged[0].tvg_name.as_deref(), Some("CCTV1"));
        assert_eq!(merged[0].tvg_logo.as_deref(), Some("L2"));
        assert_eq!(merged[1].url, "rtp://v");
    }

    #[test]
    fn order_is_first_appearance_across_sources() {
        let merged = merge_sources(vec![
            vec![channel("A", "", "rtp://a"), channel("B", "", "rtp://b")],
            vec![channel("C", "", "rtp://c"), channel("A", "", "rtp://a")],
        ]);

        let urls: Vec<&str> = merged.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["rtp://a", "rtp://b", "rtp://c"]);
    }

    #[test]
    fn ids_are_renumbered_consecutively() {
        let mut stale = channel("CCTV1", "", "rtp://u1");
        stale.tvg_id = Some(42);
        let merged = merge_sources(vec![vec![
            stale,
            channel("CCTV2", "", "rtp://u2"),
            channel("CCTV3", "", "rtp://u3"),
        ]]);

        let ids: Vec<u32> = merged.iter().map(|c| c.tvg_id.unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn nameless_records_get_the_default_group() {
        let merged = merge_sources(vec![vec![channel("", "", "rtp://u")]]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].group_title.as_deref(), Some(DEFAULT_GROUP));
        assert!(merged[0].tvg_name.is_none());
    }

    #[test]
    fn dedup_reports_removed_channels() {
        let (retained, report) = deduplicate(vec![
            channel("CCTV1", "", "rtp://u"),
            channel("CCTV1备用", "", "rtp://u"),
            channel("CCTV2", "", "rtp://v"),
        ]);

        assert_eq!(retained.len(), 2);
        assert_eq!(report.original_count, 3);
        assert_eq!(report.retained_count, 2);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].name, "CCTV1备用");
        assert_eq!(report.removed[0].url, "rtp://u");
        assert_eq!(report.removed[0].reason, DUPLICATE_URL_REASON);
    }

    #[test]
    fn dedup_does_not_renumber() {
        let mut first = channel("CCTV1", "", "rtp://u");
        first.tvg_id = Some(7);
        let (retained, _) = deduplicate(vec![first]);
        assert_eq!(retained[0].tvg_id, Some(7));
    }
}
