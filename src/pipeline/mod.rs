//! Per-playlist orchestration.
//!
//! Ties the stages together: read sources, resolve identity and grouping per
//! record, merge across sources, backfill logos, encode and write. Also
//! hosts the batch directory merge: input directories are scanned for
//! `*.txt` and `*.m3u` files, grouped by file stem (the playlist name), and
//! each group is merged in caller directory order: two-column files before
//! playlists within a directory, each sorted by name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::logo::{backfill_logos, LogoProbe, DEFAULT_PROBE_CONCURRENCY};
use crate::mapping::ChannelMapper;
use crate::merge::merge_sources;
use crate::models::{Channel, PlaylistHeader};
use crate::output::{self, OutputFormat};
use crate::sources::{read_source, ParsedSource, SourceFormat};

pub struct PipelineOptions {
    pub format: OutputFormat,
    /// Probe for missing artwork before writing M3U output.
    pub backfill: bool,
    pub probe_concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::M3u,
            backfill: true,
            probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedPlaylist {
    pub name: String,
    pub output: PathBuf,
    pub channel_count: usize,
    /// Channels still lacking artwork after backfill.
    pub missing_logos: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeRunReport {
    pub processed: Vec<ProcessedPlaylist>,
    pub failed: Vec<FailedFile>,
}

/// Per-field population summary of one channel listing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaylistSummary {
    pub total_channels: usize,
    pub channels_with_name: usize,
    pub channels_with_logo: usize,
    pub groups: BTreeMap<String, usize>,
}

pub fn summarize(channels: &[Channel]) -> PlaylistSummary {
    let mut summary = PlaylistSummary {
        total_channels: channels.len(),
        ..Default::default()
    };
    for channel in channels {
        if channel.identity_name().is_some() {
            summary.channels_with_name += 1;
        }
        if channel.has_logo() {
            summary.channels_with_logo += 1;
        }
        let group = channel.group_title.as_deref().unwrap_or("未分类");
        *summary.groups.entry(group.to_string()).or_insert(0) += 1;
    }
    summary
}

/// Reads one input file, selecting the grammar by extension.
pub fn read_file(path: &Path) -> Result<ParsedSource> {
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(SourceFormat::from_extension)
        .with_context(|| format!("unsupported input file: {}", path.display()))?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let parsed = read_source(&content, format);
    debug!(
        path = %path.display(),
        channels = parsed.channels.len(),
        "parsed source file"
    );
    Ok(parsed)
}

/// Merges already-parsed sources for one playlist: resolves identity and
/// grouping per record, then folds across sources in the given order.
pub fn merge_playlist(sources: Vec<Vec<Channel>>, mapper: &ChannelMapper) -> Vec<Channel> {
    let resolved = sources
        .into_iter()
        .map(|mut channels| {
            for channel in &mut channels {
                mapper.apply(channel);
            }
            channels
        })
        .collect();
    merge_sources(resolved)
}

/// Encodes and writes one playlist, probing for missing logos first when the
/// M3U encoder is selected. Returns the channels still lacking artwork.
pub async fn write_playlist(
    playlist_name: &str,
    header: &PlaylistHeader,
    channels: &mut Vec<Channel>,
    output_path: &Path,
    options: &PipelineOptions,
    probe: &dyn LogoProbe,
) -> Result<Vec<String>> {
    // Only the playlist encoder triggers backfill; the others serialize
    // whatever logo state is already present.
    if options.format == OutputFormat::M3u && options.backfill {
        let filled = backfill_logos(channels, probe, options.probe_concurrency).await;
        if filled > 0 {
            info!(playlist = playlist_name, filled, "backfilled logos");
        }
    }

    let content = match options.format {
        OutputFormat::Json => output::encode_json(header, channels)?,
        OutputFormat::Csv => output::encode_csv(channels),
        OutputFormat::M3u => output::encode_m3u(playlist_name, channels),
    };
    output::write_output(output_path, &content)?;

    let missing: Vec<String> = channels
        .iter()
        .filter(|c| !c.has_logo())
        .map(|c| c.display_label().to_string())
        .collect();
    Ok(missing)
}

/// Scans the input directories and groups source files by stem, preserving
/// caller directory order within each group.
fn collect_inputs(input_dirs: &[PathBuf]) -> Result<BTreeMap<String, Vec<PathBuf>>> {
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    for dir in input_dirs {
        let mut txt_files = Vec::new();
        let mut m3u_files = Vec::new();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("cannot read input directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            match path.extension().and_then(|e| e.to_str()) {
                Some("txt") => txt_files.push(path),
                Some("m3u") | Some("m3u8") => m3u_files.push(path),
                _ => {}
            }
        }
        txt_files.sort();
        m3u_files.sort();

        for path in txt_files.into_iter().chain(m3u_files) {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            groups.entry(stem.to_string()).or_default().push(path);
        }
    }

    Ok(groups)
}

/// Batch merge: one output playlist per distinct input file stem.
///
/// An unreadable source file fails only its playlist; configuration and
/// output-write faults abort the whole run.
pub async fn merge_directories(
    input_dirs: &[PathBuf],
    output_dir: &Path,
    mapper: &ChannelMapper,
    options: &PipelineOptions,
    probe: &dyn LogoProbe,
) -> Result<MergeRunReport> {
    let groups = collect_inputs(input_dirs)?;
    info!(playlists = groups.len(), "starting directory merge");

    let mut report = MergeRunReport::default();

    'playlists: for (name, paths) in groups {
        let mut sources = Vec::new();
        let mut header = PlaylistHeader::default();
        for path in &paths {
            match read_file(path) {
                Ok(parsed) => {
                    if header.name.is_none() {
                        header.name = parsed.header.name;
                    }
                    sources.push(parsed.channels);
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping playlist");
                    report.failed.push(FailedFile {
                        path: path.clone(),
                        error: format!("{error:#}"),
                    });
                    continue 'playlists;
                }
            }
        }

        let mut channels = merge_playlist(sources, mapper);
        let output_path = output_dir.join(format!("{name}.{}", options.format.extension()));
        let missing =
            write_playlist(&name, &header, &mut channels, &output_path, options, probe).await?;

        info!(
            playlist = %name,
            channels = channels.len(),
            missing_logos = missing.len(),
            "playlist written"
        );
        report.processed.push(ProcessedPlaylist {
            name,
            output: output_path,
            channel_count: channels.len(),
            missing_logos: missing,
        });
    }

    Ok(report)
}

impl MergeRunReport {
    /// Plain-text report of channels still lacking artwork, per playlist.
    pub fn render_missing_logos(&self) -> String {
        use std::fmt::Write as _;

        let mut out = String::from("Channels without a logo\n");
        out.push_str(&"=".repeat(60));
        out.push('\n');
        for playlist in &self.processed {
            if playlist.missing_logos.is_empty() {
                continue;
            }
            let _ = writeln!(
                out,
                "\n{} ({}):",
                playlist.name,
                playlist.missing_logos.len()
            );
            for name in &playlist.missing_logos {
                let _ = writeln!(out, "  - {name}");
            }
        }
        out
    }

    pub fn has_missing_logos(&self) -> bool {
        self.processed.iter().any(|p| !p.missing_logos.is_empty())
    }
}

/// Default output path for a single-file conversion when the caller gave
/// none: the input path with the target extension. Converting a file to its
/// own format would make that the input itself, so that case gets a
/// `generated` marker before the extension instead of clobbering the
/// source.
pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let candidate = input.with_extension(format.extension());
    if candidate == input {
        input.with_extension(format!("generated.{}", format.extension()))
    } else {
        candidate
    }
}

/// Deterministic playlist-name lookup for single-file conversion: the
/// parsed header name wins, then the output file stem.
pub fn playlist_name(header: &PlaylistHeader, output_path: &Path) -> String {
    header
        .name
        .clone()
        .or_else(|| {
            output_path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelRules;

    fn mapper() -> ChannelMapper {
        let rules: ChannelRules = toml::from_str(
            r#"
            [categories]
            "央视频道" = ["CCTV1", "CCTV2"]

            [aliases]
            "CCTV1" = ["CCTV-1", "CCTV-1 HD"]
            "#,
        )
        .unwrap();
        ChannelMapper::new(&rules)
    }

    #[test]
    fn merge_playlist_resolves_then_folds() {
        let sources = vec![
            vec![Channel::with_name("rtp://u1", "CCTV-1")],
            vec![Channel::with_name("rtp://u1", "CCTV-1 HD")],
        ];

        let merged = merge_playlist(sources, &mapper());

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].tvg_name.as_deref(), Some("CCTV1"));
        assert_eq!(merged[0].group_title.as_deref(), Some("央视频道"));
        assert_eq!(merged[0].tvg_id, Some(1));
    }

    #[test]
    fn summarize_counts_fields_and_groups() {
        let mut with_logo = Channel::with_name("rtp://u1", "CCTV1");
        with_logo.tvg_logo = Some("https://example.com/l.png".to_string());
        with_logo.group_title = Some("央视频道".to_string());
        let nameless = Channel::new("rtp://u2");

        let summary = summarize(&[with_logo, nameless]);

        assert_eq!(summary.total_channels, 2);
        assert_eq!(summary.channels_with_name, 1);
        assert_eq!(summary.channels_with_logo, 1);
        assert_eq!(summary.groups["央视频道"], 1);
        assert_eq!(summary.groups["未分类"], 1);
    }

    #[test]
    fn default_output_path_never_resolves_to_the_input() {
        let input = Path::new("playlists/湖南电信.m3u");

        let same_format = default_output_path(input, OutputFormat::M3u);
        assert_ne!(same_format, input);
        assert_eq!(same_format, Path::new("playlists/湖南电信.generated.m3u"));

        let other_format = default_output_path(input, OutputFormat::Json);
        assert_eq!(other_format, Path::new("playlists/湖南电信.json"));
    }

    #[test]
    fn playlist_name_prefers_header() {
        let header = PlaylistHeader {
            name: Some("湖南电信".to_string()),
            tvg_url: None,
        };
        assert_eq!(playlist_name(&header, Path::new("out/other.m3u")), "湖南电信");

        let empty = PlaylistHeader::default();
        assert_eq!(playlist_name(&empty, Path::new("out/湖北电信.m3u")), "湖北电信");
    }
}
