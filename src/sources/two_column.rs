//! Two-column (`name,url`) reader.
//!
//! One channel per line. A URL beginning with `#` means the whole line is
//! commented out. A single `#` inside the URL separates two alternative
//! addresses for the same channel; both are kept as independent records.
//! The split happens at the first `#` only, so any later marker stays inside
//! the second candidate.

use tracing::debug;

use crate::models::Channel;

pub fn parse(content: &str) -> Vec<Channel> {
    let mut channels = Vec::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((name, url_part)) = line.split_once(',') else {
            debug!(line, "skipping malformed two-column line");
            continue;
        };
        let name = name.trim();
        let url_part = url_part.trim();

        if url_part.is_empty() {
            debug!(line, "skipping line without a URL");
            continue;
        }
        if url_part.starts_with('#') {
            debug!(name, "skipping commented-out channel");
            continue;
        }

        match url_part.split_once('#') {
            Some((first, second)) => {
                push(&mut channels, name, first.trim());
                push(&mut channels, name, second.trim());
            }
            None => push(&mut channels, name, url_part),
        }
    }

    channels
}

fn push(channels: &mut Vec<Channel>, name: &str, url: &str) {
    if url.is_empty() {
        return;
    }
    let mut channel = Channel::new(url);
    if !name.is_empty() {
        channel.tvg_name = Some(name.to_string());
    }
    channels.push(channel);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_channel_per_line() {
        let content = "CCTV1,rtp://239.1.1.1:9000\n\
                       CCTV2,rtp://239.1.1.2:9000\n\
                       \n\
                       湖南卫视,rtp://239.1.1.3:9000\n";
        let channels = parse(content);

        assert_eq!(channels.len(), 3);
        assert_eq!(channels[0].tvg_name.as_deref(), Some("CCTV1"));
        assert_eq!(channels[0].url, "rtp://239.1.1.1:9000");
        assert!(channels[0].tvg_logo.is_none());
        assert!(channels[0].group_title.is_none());
    }

    #[test]
    fn commented_url_skips_the_whole_channel() {
        let channels = parse("CCTV1,#rtp://239.1.1.1:9000\n");
        assert!(channels.is_empty());
    }

    #[test]
    fn internal_marker_splits_into_two_records() {
        let channels = parse("CCTV1,rtp://239.1.1.1:9000#rtp://239.1.1.9:9000\n");

        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].tvg_name.as_deref(), Some("CCTV1"));
        assert_eq!(channels[0].url, "rtp://239.1.1.1:9000");
        assert_eq!(channels[1].tvg_name.as_deref(), Some("CCTV1"));
        assert_eq!(channels[1].url, "rtp://239.1.1.9:9000");
    }

    #[test]
    fn split_happens_at_first_marker_only() {
        let channels = parse("CCTV1,rtp://a#rtp://b#rtp://c\n");

        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].url, "rtp://a");
        assert_eq!(channels[1].url, "rtp://b#rtp://c");
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let content = "not a channel line\nCCTV1,rtp://239.1.1.1:9000\n";
        let channels = parse(content);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].url, "rtp://239.1.1.1:9000");
    }

    #[test]
    fn whitespace_is_trimmed() {
        let channels = parse("  CCTV1 , rtp://239.1.1.1:9000  \n  \n");
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].tvg_name.as_deref(), Some("CCTV1"));
        assert_eq!(channels[0].url, "rtp://239.1.1.1:9000");
    }

    #[test]
    fn trailing_marker_yields_single_record() {
        let channels = parse("CCTV1,rtp://239.1.1.1:9000#\n");
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].url, "rtp://239.1.1.1:9000");
    }
}
