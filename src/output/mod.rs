//! Output encoders.
//!
//! Three encodings over the same final ordered sequence: a structured JSON
//! document, a fixed-column CSV table, and the M3U playlist form. The M3U
//! header is a byte-fixed two-line contract consumed by downstream players:
//! line 1 declares the playlist name, line 2 the artwork index URLs.

use std::fmt::Write as _;
use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{Channel, PlaylistHeader};

/// Fixed artwork-index declaration written as the second M3U header line.
pub const TVG_INDEX_URLS: &str = "https://epg.112114.xyz/pp.xml,http://epg.51zmt.top:8000/e.xml";

const CSV_HEADER: &str = "tvg-name,tvg-logo,tvg-id,group-title,channel-name,url";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
    M3u,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::M3u => "m3u",
        }
    }
}

#[derive(Serialize)]
struct PlaylistDocument<'a> {
    header: &'a PlaylistHeader,
    channels: &'a [Channel],
}

pub fn encode_json(header: &PlaylistHeader, channels: &[Channel]) -> Result<String, AppError> {
    let document = PlaylistDocument { header, channels };
    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn encode_csv(channels: &[Channel]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for channel in channels {
        let id = channel.tvg_id.map(|v| v.to_string()).unwrap_or_default();
        let row = [
            channel.tvg_name.as_deref().unwrap_or(""),
            channel.tvg_logo.as_deref().unwrap_or(""),
            id.as_str(),
            channel.group_title.as_deref().unwrap_or(""),
            channel.channel_name.as_deref().unwrap_or(""),
            channel.url.as_str(),
        ];
        let escaped: Vec<String> = row.iter().map(|field| csv_field(field)).collect();
        out.push_str(&escaped.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Renders the M3U playlist. `playlist_name` goes on the first header line;
/// the second line is the fixed artwork-index declaration.
pub fn encode_m3u(playlist_name: &str, channels: &[Channel]) -> String {
    let mut m3u = format!("#EXTM3U name=\"{playlist_name}\"\n");
    let _ = writeln!(m3u, "#EXTM3U x-tvg-url=\"{TVG_INDEX_URLS}\"");

    for channel in channels {
        let mut extinf = String::from("#EXTINF:-1");

        if let Some(tvg_id) = channel.tvg_id {
            let _ = write!(extinf, " tvg-id=\"{tvg_id}\"");
        }
        if let Some(tvg_name) = &channel.tvg_name {
            let _ = write!(extinf, " tvg-name=\"{tvg_name}\"");
        }
        if let Some(tvg_logo) = &channel.tvg_logo {
            let _ = write!(extinf, " tvg-logo=\"{tvg_logo}\"");
        }
        if let Some(group_title) = &channel.group_title {
            let _ = write!(extinf, " group-title=\"{group_title}\"");
        }
        let label = channel.display_label();
        if !label.is_empty() {
            let _ = write!(extinf, ",{label}");
        }

        m3u.push_str(&extinf);
        m3u.push('\n');
        m3u.push_str(&channel.url);
        m3u.push('\n');
    }

    m3u
}

/// Writes an output artifact, creating parent directories as needed. Write
/// failures are terminal and surfaced to the caller.
pub fn write_output(path: &Path, content: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Output {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
    }
    std::fs::write(path, content).map_err(|e| AppError::Output {
        path: path.to_path_buf(),
        source: e,
    })
}
