//! cutkit - Export naming and file utilities
//!
//! Command-line front end over the `cutkit_export` library. Results are
//! printed to stdout as JSON; logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

use cutkit_common::config::{ConfigResolver, TomlConfig};
use cutkit_common::OsFamily;
use cutkit_export::fsops::{self, RetryPolicy, TimestampTransfer};
use cutkit_export::naming::{
    extension, paths, plan_merged_file_name, plan_out_seg_file_names, GenerateOptions, PlanTarget,
    Segment,
};

/// Command-line arguments for cutkit
#[derive(Parser, Debug)]
#[command(name = "cutkit")]
#[command(about = "Output naming and file utilities for lossless video cutting")]
#[command(version)]
struct Args {
    /// Config file (overrides CUTKIT_CONFIG and the platform default)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Naming rules to apply (defaults to the host OS)
    #[arg(long, global = true, value_enum)]
    os: Option<OsArg>,

    /// Apply Windows-only name checks on every OS
    #[arg(long, global = true)]
    dev_mode: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OsArg {
    Windows,
    Mac,
    Unix,
}

impl From<OsArg> for OsFamily {
    fn from(arg: OsArg) -> Self {
        match arg {
            OsArg::Windows => OsFamily::Windows,
            OsArg::Mac => OsFamily::Mac,
            OsArg::Unix => OsFamily::Unix,
        }
    }
}

/// Naming inputs shared by `plan` and `merged-name`
#[derive(clap::Args, Debug)]
struct NamingArgs {
    /// Input media file
    #[arg(short, long)]
    input: String,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Name template (defaults to the configured one)
    #[arg(short, long)]
    template: Option<String>,

    /// Output container format, e.g. matroska
    #[arg(short, long)]
    format: Option<String>,

    /// Only replace path separators in template fields
    #[arg(long)]
    unsafe_names: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan output names for a list of segments
    Plan {
        /// JSON file with an array of {start, end, name, tags}
        #[arg(short, long)]
        segments: PathBuf,

        #[command(flatten)]
        naming: NamingArgs,
    },

    /// Plan the output name of a merge
    MergedName {
        #[command(flatten)]
        naming: NamingArgs,
    },

    /// List regular files below a directory
    Collect { dir: PathBuf },

    /// List the title VOB files of a VIDEO_TS directory
    VideoTs { dir: PathBuf },

    /// Compare total input and output sizes
    CheckSizes {
        #[arg(long, num_args = 1.., required = true)]
        inputs: Vec<PathBuf>,

        #[arg(long, num_args = 1.., required = true)]
        outputs: Vec<PathBuf>,
    },

    /// Permanently delete files, retrying transient failures
    Delete {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Copy shifted timestamps from an input to an output file
    TransferTimes {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,

        /// Cut-in point in seconds
        #[arg(long)]
        cut_from: f64,

        /// Cut-out point in seconds
        #[arg(long)]
        cut_to: f64,

        /// Duration of the input in seconds
        #[arg(long)]
        duration: f64,

        /// Input modification time marks the end of the recording
        #[arg(long)]
        input_is_end: bool,

        /// Output modification time should mark the end of the cut
        #[arg(long)]
        output_is_end: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Tracing comes up first; the config resolver logs while loading
    let initial_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directives("info")));
    let (filter, filter_handle) = reload::Layer::new(initial_filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ConfigResolver::new(args.config.clone())
        .resolve()
        .context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    if std::env::var_os("RUST_LOG").is_none() {
        filter_handle
            .reload(EnvFilter::new(log_directives(&config.logging.level)))
            .context("Failed to apply configured log level")?;
    }

    let os = args.os.map(OsFamily::from).unwrap_or_else(OsFamily::current);
    let dev_mode = args.dev_mode || config.export.dev_mode;
    debug!(%os, dev_mode, "Configuration resolved");

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let policy = RetryPolicy::from(&config.retry);

    match args.command {
        Command::Plan { segments, naming } => {
            let content = tokio::fs::read_to_string(&segments)
                .await
                .with_context(|| format!("Failed to read {}", segments.display()))?;
            let segments: Vec<Segment> =
                serde_json::from_str(&content).context("Invalid segments JSON")?;

            let (opts, target) = naming_inputs(&naming, &config, os, dev_mode)?;
            let template = naming
                .template
                .as_deref()
                .unwrap_or(&config.export.out_seg_template);

            let plan = plan_out_seg_file_names(&segments, template, &opts, &target)
                .context("Failed to generate output names")?;
            print_json(&plan)?;
        }

        Command::MergedName { naming } => {
            let (opts, target) = naming_inputs(&naming, &config, os, dev_mode)?;
            let template = naming
                .template
                .as_deref()
                .unwrap_or(&config.export.merged_file_template);

            let plan = plan_merged_file_name(template, &opts, &target)
                .context("Failed to generate merged name")?;
            print_json(&plan)?;
        }

        Command::Collect { dir } => {
            let files = tokio::task::spawn_blocking(move || fsops::collect_files_recursive(&dir))
                .await
                .context("Collect task failed")??;
            print_json(&files)?;
        }

        Command::VideoTs { dir } => {
            let parts = fsops::read_video_ts(&dir).await?;
            print_json(&parts)?;
        }

        Command::CheckSizes { inputs, outputs } => {
            let input_total = fsops::total_file_size(&inputs).await?;
            let output_total = fsops::total_file_size(&outputs).await?;
            info!(input_total, output_total, "Measured file sizes");

            let mismatch = fsops::check_file_sizes(input_total, output_total);
            print_json(&mismatch)?;
        }

        Command::Delete { files } => {
            let report = fsops::delete_files(&files, None, true, &policy, &cancel).await?;
            print_json(&report)?;
            if !report.is_complete() {
                bail!("{} of {} files could not be deleted", report.failed.len(), files.len());
            }
        }

        Command::TransferTimes {
            input,
            output,
            cut_from,
            cut_to,
            duration,
            input_is_end,
            output_is_end,
        } => {
            ensure_exists(&output)?;
            let transfer = TimestampTransfer {
                in_path: input,
                out_path: output,
                cut_from,
                cut_to,
                duration,
                treat_input_as_start: !input_is_end,
                treat_output_as_start: Some(!output_is_end),
            };
            fsops::transfer_timestamps(&transfer, &policy, &cancel).await;
        }
    }

    Ok(())
}

/// Build generation options and the validation target for one naming command
fn naming_inputs(
    naming: &NamingArgs,
    config: &TomlConfig,
    os: OsFamily,
    dev_mode: bool,
) -> Result<(GenerateOptions, PlanTarget)> {
    if naming.input.trim().is_empty() {
        bail!("Input path must not be empty");
    }

    let opts = GenerateOptions {
        input_path: naming.input.clone(),
        ext: extension::output_extension(&naming.input, naming.format.as_deref(), os),
        safe_output_file_name: config.export.safe_output_file_name && !naming.unsafe_names,
        min_zero_padding: config.export.min_zero_padding,
        os,
        epoch_ms: chrono::Utc::now().timestamp_millis(),
    };

    let target = PlanTarget {
        output_dir: naming
            .output_dir
            .clone()
            .unwrap_or_else(|| paths::dir_name(&naming.input, os)),
        dev_mode,
    };

    Ok((opts, target))
}

/// Filter directives applying `level` to every cutkit crate
fn log_directives(level: &str) -> String {
    format!("cutkit={0},cutkit_export={0},cutkit_common={0}", level)
}

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Cancel in-flight retries on Ctrl+C
async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, cancelling");
        cancel.cancel();
    }
}
