//! Identity and grouping resolution.
//!
//! Builds two read-only indexes from the loaded [`ChannelRules`]: a reverse
//! alias index (normalized alias -> canonical name) and an inverted category
//! index (normalized canonical name -> group label). Both are built once and
//! never mutated, so a mapper can be shared freely across concurrent probes.

use std::collections::HashMap;

use crate::config::ChannelRules;
use crate::models::{non_empty, Channel};

/// Fallback group label for channels no category claims.
pub const DEFAULT_GROUP: &str = "其他";

/// Comparison key for alias and category lookups: trimmed, uppercase-folded.
fn normalize(name: &str) -> String {
    name.trim().to_uppercase()
}

pub struct ChannelMapper {
    alias_index: HashMap<String, String>,
    group_index: HashMap<String, String>,
}

impl ChannelMapper {
    pub fn new(rules: &ChannelRules) -> Self {
        let mut alias_index = HashMap::new();
        for (canonical, aliases) in &rules.aliases {
            // A canonical name is always a fixed point of resolution.
            alias_index.insert(normalize(canonical), canonical.clone());
            for alias in aliases {
                alias_index
                    .entry(normalize(alias))
                    .or_insert_with(|| canonical.clone());
            }
        }

        let mut group_index = HashMap::new();
        for (label, members) in &rules.categories {
            for member in members {
                group_index
                    .entry(normalize(member))
                    .or_insert_with(|| label.clone());
            }
        }

        Self {
            alias_index,
            group_index,
        }
    }

    /// Resolves a raw channel name to its canonical form. Unmapped or empty
    /// names come back unchanged; resolution never fails and re-resolving a
    /// canonical name is a no-op.
    pub fn canonicalize(&self, raw: &str) -> String {
        if raw.trim().is_empty() {
            return raw.to_string();
        }
        self.alias_index
            .get(&normalize(raw))
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }

    /// Group label for a canonical name, falling back to [`DEFAULT_GROUP`].
    pub fn group_of(&self, canonical: &str) -> String {
        self.group_index
            .get(&normalize(canonical))
            .cloned()
            .unwrap_or_else(|| DEFAULT_GROUP.to_string())
    }

    /// Applies identity and grouping resolution to one record in place.
    ///
    /// Records with a resolvable name get their `tvg-name` replaced by the
    /// canonical form and their group taken from the category table. Nameless
    /// records are left alone; the merge engine assigns the default group
    /// after gap-filling has had a chance to supply a name.
    pub fn apply(&self, channel: &mut Channel) {
        let Some(raw) = channel.identity_name().map(str::to_string) else {
            return;
        };
        let canonical = self.canonicalize(&raw);
        channel.group_title = Some(self.group_of(&canonical));
        if non_empty(&channel.channel_name).is_none() {
            channel.channel_name = Some(canonical.clone());
        }
        channel.tvg_name = Some(canonical);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ChannelRules {
        toml::from_str(
            r#"
            [categories]
            "央视频道" = ["CCTV1", "CCTV2"]
            "卫视频道" = ["湖南卫视", "北京卫视"]

            [aliases]
            "CCTV1" = ["CCTV-1", "CCTV-1 HD", "CCTV1 HD"]
            "湖南卫视" = ["湖南卫视4K"]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn aliases_resolve_to_one_canonical_name() {
        let mapper = ChannelMapper::new(&rules());
        assert_eq!(mapper.canonicalize("CCTV-1"), "CCTV1");
        assert_eq!(mapper.canonicalize("CCTV-1 HD"), "CCTV1");
        assert_eq!(mapper.canonicalize("CCTV1 HD"), "CCTV1");
        assert_eq!(mapper.canonicalize("湖南卫视4K"), "湖南卫视");
    }

    #[test]
    fn canonical_names_are_fixed_points() {
        let mapper = ChannelMapper::new(&rules());
        assert_eq!(mapper.canonicalize("CCTV1"), "CCTV1");
        let once = mapper.canonicalize("CCTV-1 HD");
        assert_eq!(mapper.canonicalize(&once), once);
    }

    #[test]
    fn lookup_normalizes_case_and_whitespace() {
        let mapper = ChannelMapper::new(&rules());
        assert_eq!(mapper.canonicalize("  cctv-1 hd  "), "CCTV1");
    }

    #[test]
    fn unknown_names_fall_back_to_identity() {
        let mapper = ChannelMapper::new(&rules());
        assert_eq!(mapper.canonicalize("未知频道"), "未知频道");
        assert_eq!(mapper.canonicalize(""), "");
    }

    #[test]
    fn grouping_uses_category_table_with_default() {
        let mapper = ChannelMapper::new(&rules());
        assert_eq!(mapper.group_of("CCTV1"), "央视频道");
        assert_eq!(mapper.group_of("湖南卫视"), "卫视频道");
        assert_eq!(mapper.group_of("未知频道"), DEFAULT_GROUP);
    }

    #[test]
    fn apply_promotes_display_name_into_identity() {
        let mapper = ChannelMapper::new(&rules());
        let mut channel = Channel::new("rtp://239.1.1.1:9000");
        channel.channel_name = Some("CCTV-1 HD".to_string());

        mapper.apply(&mut channel);

        assert_eq!(channel.tvg_name.as_deref(), Some("CCTV1"));
        assert_eq!(channel.group_title.as_deref(), Some("央视频道"));
        // The original display label is preserved verbatim.
        assert_eq!(channel.channel_name.as_deref(), Some("CCTV-1 HD"));
    }

    #[test]
    fn apply_leaves_nameless_records_alone() {
        let mapper = ChannelMapper::new(&rules());
        let mut channel = Channel::new("rtp://239.1.1.1:9000");
        mapper.apply(&mut channel);
        assert!(channel.tvg_name.is_none());
        assert!(channel.group_title.is_none());
    }
}
