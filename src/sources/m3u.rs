//! Tag-based (M3U) reader.
//!
//! The grammar is the fixed `#EXTINF` form: an attribute line carrying
//! unordered `key="value"` pairs plus a trailing display label after the
//! final comma, followed by the next non-empty URL line. `#EXTM3U` lines
//! contribute header attributes. An `#EXTINF` line without a following URL
//! line yields no record.

use regex::Regex;
use tracing::debug;

use super::ParsedSource;
use crate::models::{Channel, PlaylistHeader};

/// URL schemes accepted on a URL line.
const URL_PREFIXES: [&str; 4] = ["http://", "https://", "rtp://", "udp://"];

pub struct M3uReader {
    tvg_id: Regex,
    tvg_name: Regex,
    tvg_logo: Regex,
    group_title: Regex,
    header_name: Regex,
    header_tvg_url: Regex,
}

impl Default for M3uReader {
    fn default() -> Self {
        Self::new()
    }
}

impl M3uReader {
    pub fn new() -> Self {
        // The patterns are fixed literals; compilation cannot fail.
        Self {
            tvg_id: Regex::new(r#"tvg-id="([^"]*)""#).unwrap(),
            tvg_name: Regex::new(r#"tvg-name="([^"]*)""#).unwrap(),
            tvg_logo: Regex::new(r#"tvg-logo="([^"]*)""#).unwrap(),
            group_title: Regex::new(r#"group-title="([^"]*)""#).unwrap(),
            header_name: Regex::new(r#"name="([^"]+)""#).unwrap(),
            header_tvg_url: Regex::new(r#"x-tvg-url="([^"]+)""#).unwrap(),
        }
    }

    pub fn parse(&self, content: &str) -> ParsedSource {
        let mut header = PlaylistHeader::default();
        let mut channels = Vec::new();
        let mut pending: Option<Channel> = None;

        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with("#EXTM3U") {
                self.parse_header_line(line, &mut header);
                continue;
            }

            if line.starts_with("#EXTINF") {
                if pending.is_some() {
                    debug!("dropping EXTINF entry without a URL line");
                }
                pending = Some(self.parse_extinf_line(line));
                continue;
            }

            if is_url_line(line) {
                if let Some(mut channel) = pending.take() {
                    channel.url = line.to_string();
                    channels.push(channel);
                }
            }
        }

        if pending.is_some() {
            debug!("dropping trailing EXTINF entry without a URL line");
        }

        ParsedSource { header, channels }
    }

    fn parse_header_line(&self, line: &str, header: &mut PlaylistHeader) {
        if let Some(captures) = self.header_name.captures(line) {
            header.name = Some(captures[1].to_string());
        }
        if let Some(captures) = self.header_tvg_url.captures(line) {
            header.tvg_url = Some(captures[1].to_string());
        }
    }

    /// Parses one `#EXTINF` line into a record with an empty URL; the caller
    /// fills the URL from the following line. Every attribute is optional.
    fn parse_extinf_line(&self, line: &str) -> Channel {
        let mut channel = Channel::new(String::new());

        channel.tvg_id = self
            .capture(&self.tvg_id, line)
            .and_then(|v| v.parse().ok());
        channel.tvg_name = self.capture(&self.tvg_name, line);
        channel.tvg_logo = self.capture(&self.tvg_logo, line);
        channel.group_title = self.capture(&self.group_title, line);

        // The display label is whatever follows the final comma. A segment
        // still carrying key="value" pairs means the line ends with its
        // attribute block and has no label.
        if let Some((_, label)) = line.rsplit_once(',') {
            let label = label.trim();
            if !label.is_empty() && !label.contains("=\"") {
                channel.channel_name = Some(label.to_string());
            }
        }

        channel
    }

    fn capture(&self, pattern: &Regex, line: &str) -> Option<String> {
        pattern
            .captures(line)
            .map(|c| c[1].to_string())
            .filter(|v| !v.is_empty())
    }
}

fn is_url_line(line: &str) -> bool {
    URL_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}
