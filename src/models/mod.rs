use serde::{Deserialize, Serialize};

/// A single channel entry as it flows through the pipeline.
///
/// Field names mirror the on-disk M3U attribute names. `url` is the only
/// mandatory field and serves as the deduplication key; everything else may
/// be absent and gets resolved to a fallback downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    /// Sequence number, reassigned 1..N after merging. Input values are
    /// carried through verbatim conversions but carry no meaning otherwise.
    #[serde(rename = "tvg-id", skip_serializing_if = "Option::is_none")]
    pub tvg_id: Option<u32>,
    /// Canonical channel identity after alias resolution.
    #[serde(rename = "tvg-name", skip_serializing_if = "Option::is_none")]
    pub tvg_name: Option<String>,
    #[serde(rename = "tvg-logo", skip_serializing_if = "Option::is_none")]
    pub tvg_logo: Option<String>,
    #[serde(rename = "group-title", skip_serializing_if = "Option::is_none")]
    pub group_title: Option<String>,
    /// Human-facing label as it appeared in the source.
    #[serde(rename = "channel-name", skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    pub url: String,
}

impl Channel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            tvg_id: None,
            tvg_name: None,
            tvg_logo: None,
            group_title: None,
            channel_name: None,
            url: url.into(),
        }
    }

    pub fn with_name(url: impl Into<String>, name: impl Into<String>) -> Self {
        let mut channel = Self::new(url);
        channel.tvg_name = Some(name.into());
        channel
    }

    /// The name used for identity resolution and logo lookups: `tvg-name`
    /// when present, otherwise the display label.
    pub fn identity_name(&self) -> Option<&str> {
        non_empty(&self.tvg_name).or_else(|| non_empty(&self.channel_name))
    }

    /// Display label for reports: display name first, canonical as fallback.
    pub fn display_label(&self) -> &str {
        non_empty(&self.channel_name)
            .or_else(|| non_empty(&self.tvg_name))
            .unwrap_or("")
    }

    pub fn has_logo(&self) -> bool {
        non_empty(&self.tvg_logo).is_some()
    }

    /// Fills this channel's empty fields from `other` without touching any
    /// field that is already populated. The URL and position are never
    /// affected; this is the merge engine's gap-filling step.
    pub fn absorb(&mut self, other: Channel) {
        fill(&mut self.tvg_name, other.tvg_name);
        fill(&mut self.channel_name, other.channel_name);
        fill(&mut self.tvg_logo, other.tvg_logo);
        fill(&mut self.group_title, other.group_title);
    }
}

fn fill(target: &mut Option<String>, incoming: Option<String>) {
    if non_empty(target).is_none() {
        if let Some(value) = incoming.filter(|v| !v.is_empty()) {
            *target = Some(value);
        }
    }
}

pub(crate) fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// `#EXTM3U` header attributes captured from a parsed playlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistHeader {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "x-tvg-url", skip_serializing_if = "Option::is_none")]
    pub tvg_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_fills_only_empty_fields() {
        let mut first = Channel::with_name("rtp://239.1.1.1:9000", "CCTV1");
        first.tvg_logo = Some("https://example.com/l1.png".to_string());

        let mut second = Channel::with_name("rtp://239.1.1.1:9000", "CCTV-1");
        second.tvg_logo = Some("https://example.com/l2.png".to_string());
        second.group_title = Some("央视频道".to_string());

        first.absorb(second);

        assert_eq!(first.tvg_name.as_deref(), Some("CCTV1"));
        assert_eq!(first.tvg_logo.as_deref(), Some("https://example.com/l1.png"));
        assert_eq!(first.group_title.as_deref(), Some("央视频道"));
    }

    #[test]
    fn absorb_treats_empty_strings_as_absent() {
        let mut first = Channel::new("rtp://239.1.1.1:9000");
        first.tvg_name = Some(String::new());

        first.absorb(Channel::with_name("rtp://239.1.1.1:9000", "CCTV1"));

        assert_eq!(first.tvg_name.as_deref(), Some("CCTV1"));
    }

    #[test]
    fn identity_name_prefers_tvg_name() {
        let mut channel = Channel::with_name("rtp://239.1.1.1:9000", "CCTV1");
        channel.channel_name = Some("CCTV1综合".to_string());
        assert_eq!(channel.identity_name(), Some("CCTV1"));
        assert_eq!(channel.display_label(), "CCTV1综合");

        channel.tvg_name = None;
        assert_eq!(channel.identity_name(), Some("CCTV1综合"));
    }
}
