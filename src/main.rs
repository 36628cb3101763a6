use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use m3u_kit::{
    compare,
    config::ChannelRules,
    logo::{HttpLogoProbe, DEFAULT_PROBE_CONCURRENCY},
    mapping::ChannelMapper,
    merge,
    output::{self, OutputFormat},
    pipeline::{self, PipelineOptions},
};

#[derive(Parser)]
#[command(name = "m3u-kit")]
#[command(version = "0.1.0")]
#[command(about = "Parse, merge, deduplicate and export IPTV channel listings")]
struct Cli {
    /// Log level
    #[arg(short = 'v', long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one input file to another encoding
    Convert {
        /// Input file (.m3u/.m3u8 or two-column .txt)
        input: PathBuf,

        /// Output file path (defaults to the input with a new extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output encoding
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Channel rules file; when given, names and groups are resolved
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Remove duplicate URLs, keeping the first occurrence
        #[arg(long)]
        dedup: bool,

        /// Skip logo probing for M3U output
        #[arg(long)]
        no_backfill: bool,

        /// Print a parsing summary
        #[arg(short, long)]
        summary: bool,
    },

    /// Merge playlists grouped by file stem across input directories
    Merge {
        /// Input directories, in priority order (first wins ties)
        #[arg(short, long = "input-dir", required = true)]
        input_dirs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "m3u")]
        output_dir: PathBuf,

        /// Channel rules file (alias and category tables)
        #[arg(long)]
        rules: PathBuf,

        /// Output encoding
        #[arg(short, long, value_enum, default_value_t = OutputFormat::M3u)]
        format: OutputFormat,

        /// Skip logo probing for M3U output
        #[arg(long)]
        no_backfill: bool,

        /// Write the missing-logo report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Compare the URLs of two playlists after name resolution
    Compare {
        left: PathBuf,
        right: PathBuf,

        /// Write the comparison report to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Channel rules file used to line aliases up
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("m3u_kit={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Convert {
            input,
            output,
            format,
            rules,
            dedup,
            no_backfill,
            summary,
        } => run_convert(input, output, format, rules, dedup, no_backfill, summary).await,
        Command::Merge {
            input_dirs,
            output_dir,
            rules,
            format,
            no_backfill,
            report,
        } => run_merge(input_dirs, output_dir, rules, format, no_backfill, report).await,
        Command::Compare {
            left,
            right,
            output,
            rules,
        } => run_compare(left, right, output, rules),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_convert(
    input: PathBuf,
    output: Option<PathBuf>,
    format: OutputFormat,
    rules: Option<PathBuf>,
    dedup: bool,
    no_backfill: bool,
    summary: bool,
) -> Result<()> {
    let parsed = pipeline::read_file(&input)?;
    let header = parsed.header;
    let mut channels = parsed.channels;
    info!(channels = channels.len(), "parsed {}", input.display());

    if let Some(rules_path) = rules {
        let rules = ChannelRules::load(&rules_path)?;
        let mapper = ChannelMapper::new(&rules);
        for channel in &mut channels {
            mapper.apply(channel);
        }
    }

    if dedup {
        let (retained, report) = merge::deduplicate(channels);
        channels = retained;
        info!(
            original = report.original_count,
            retained = report.retained_count,
            removed = report.removed.len(),
            "deduplicated"
        );
    }

    if summary {
        let summary = pipeline::summarize(&channels);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    let output_path =
        output.unwrap_or_else(|| pipeline::default_output_path(&input, format));
    let name = pipeline::playlist_name(&header, &output_path);
    let options = PipelineOptions {
        format,
        backfill: !no_backfill,
        probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
    };
    let probe = HttpLogoProbe::new();
    pipeline::write_playlist(&name, &header, &mut channels, &output_path, &options, &probe)
        .await?;
    info!("wrote {}", output_path.display());
    Ok(())
}

async fn run_merge(
    input_dirs: Vec<PathBuf>,
    output_dir: PathBuf,
    rules: PathBuf,
    format: OutputFormat,
    no_backfill: bool,
    report: Option<PathBuf>,
) -> Result<()> {
    let rules = ChannelRules::load(&rules)?;
    let mapper = ChannelMapper::new(&rules);
    let options = PipelineOptions {
        format,
        backfill: !no_backfill,
        probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
    };
    let probe = HttpLogoProbe::new();

    let run =
        pipeline::merge_directories(&input_dirs, &output_dir, &mapper, &options, &probe).await?;

    info!(
        processed = run.processed.len(),
        failed = run.failed.len(),
        "directory merge finished"
    );
    for failed in &run.failed {
        eprintln!("failed: {}: {}", failed.path.display(), failed.error);
    }

    if run.has_missing_logos() {
        let report_path = report.unwrap_or_else(|| output_dir.join("no_logo_report.txt"));
        output::write_output(&report_path, &run.render_missing_logos())?;
        info!("missing-logo report written to {}", report_path.display());
    }

    Ok(())
}

fn run_compare(
    left: PathBuf,
    right: PathBuf,
    output: Option<PathBuf>,
    rules: Option<PathBuf>,
) -> Result<()> {
    let rules = match rules {
        Some(path) => ChannelRules::load(&path)?,
        None => ChannelRules::default(),
    };
    let mapper = ChannelMapper::new(&rules);

    let left_channels = pipeline::read_file(&left)
        .with_context(|| format!("cannot parse {}", left.display()))?
        .channels;
    let right_channels = pipeline::read_file(&right)
        .with_context(|| format!("cannot parse {}", right.display()))?
        .channels;

    let report = compare::compare(&left_channels, &right_channels, &mapper);
    let text = report.render(&left.display().to_string(), &right.display().to_string());

    match output {
        Some(path) => {
            output::write_output(&path, &text)?;
            info!("comparison report written to {}", path.display());
        }
        None => print!("{text}"),
    }

    Ok(())
}
